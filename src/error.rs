//! Engine error types.
//!
//! Every variant is a fatal precondition violation: the engine is a one-shot
//! deterministic transform, so any failure aborts the whole invocation before
//! (or instead of) producing output. Capacity clamping of the requested
//! quantile count is silent and intentionally *not* represented here.

/// Preprocessing precondition violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreprocessError {
    #[error("column index {index} out of range for {ncols} columns")]
    ColumnOutOfRange { index: usize, ncols: usize },

    #[error(
        "distinguished columns must be distinct \
         (patient={patient}, t_start={t_start}, t_end={t_end}, delta={delta})"
    )]
    DuplicateSchemaColumn {
        patient: usize,
        t_start: usize,
        t_end: usize,
        delta: usize,
    },

    #[error("rows must be sorted by (patient, t_start); violated at row {row}")]
    UnsortedInput { row: usize },

    #[error("patient ids must be numbered contiguously from 1; found {found} at row {row}")]
    PatientNumbering { row: usize, found: f64 },

    #[error("held-out feature matrix has {got} columns, trained configuration expects {expected}")]
    ColumnCountMismatch { expected: usize, got: usize },

    #[error("column map has {got} entries for a feature matrix with {expected} columns")]
    ColumnMapLength { expected: usize, got: usize },

    #[error("held-out column {position} maps to {index}, which is not a trained covariate column")]
    NotACovariate { position: usize, index: usize },
}
