//! Distinguished-column schema and dataset preconditions.

use super::DenseMatrix;
use crate::error::PreprocessError;

/// Resolved indices of the four distinguished survival columns.
///
/// Name lookup happens in the glue layer; the engine only ever sees indices.
/// All remaining columns are covariates. `t_start` stays a covariate in the
/// expanded output (the sub-interval start time is itself a predictor), while
/// `patient`, `delta` and `t_end` are excluded from the covariate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntervalSchema {
    /// Patient id column (integer-valued, numbered `1..=npatients`).
    pub patient: usize,
    /// Interval start time column.
    pub t_start: usize,
    /// Interval end time column; reinterpreted as duration `dt` after expansion.
    pub t_end: usize,
    /// Event indicator column (0/1).
    pub delta: usize,
}

impl IntervalSchema {
    /// Create a schema from resolved column indices.
    pub fn new(patient: usize, t_start: usize, t_end: usize, delta: usize) -> Self {
        Self {
            patient,
            t_start,
            t_end,
            delta,
        }
    }

    /// Check that all indices are in range and pairwise distinct.
    pub fn validate(&self, ncols: usize) -> Result<(), PreprocessError> {
        for index in [self.patient, self.t_start, self.t_end, self.delta] {
            if index >= ncols {
                return Err(PreprocessError::ColumnOutOfRange { index, ncols });
            }
        }
        let mut seen = [self.patient, self.t_start, self.t_end, self.delta];
        seen.sort_unstable();
        if seen.windows(2).any(|w| w[0] == w[1]) {
            return Err(PreprocessError::DuplicateSchemaColumn {
                patient: self.patient,
                t_start: self.t_start,
                t_end: self.t_end,
                delta: self.delta,
            });
        }
        Ok(())
    }

    /// Whether `col` is excluded from the covariate set.
    #[inline]
    pub fn is_reserved(&self, col: usize) -> bool {
        col == self.patient || col == self.t_end || col == self.delta
    }

    /// Covariate column indices in original order (`ncols - 3` entries).
    pub fn covariate_columns(&self, ncols: usize) -> Vec<usize> {
        (0..ncols).filter(|&c| !self.is_reserved(c)).collect()
    }
}

/// Validate the dataset preconditions and return the patient count.
///
/// Checks, before any computation touches the data:
/// - patient ids are integer-valued and numbered contiguously from 1,
/// - rows are sorted by `(patient, t_start)`.
///
/// The sort invariant is what makes per-patient row ranges contiguous, which
/// every later stage relies on.
pub fn validate_dataset(
    data: &DenseMatrix<f64>,
    schema: &IntervalSchema,
) -> Result<usize, PreprocessError> {
    schema.validate(data.num_cols())?;

    let mut npatients = 0usize;
    let mut prev_pid = 0usize;
    let mut prev_start = f64::NEG_INFINITY;

    for (row, values) in data.rows().enumerate() {
        let pid_raw = values[schema.patient];
        if !pid_raw.is_finite() || pid_raw.fract() != 0.0 || pid_raw < 1.0 {
            return Err(PreprocessError::PatientNumbering {
                row,
                found: pid_raw,
            });
        }
        let pid = pid_raw as usize;

        if pid == prev_pid + 1 {
            // New patient: ids must increase by exactly one.
            npatients = pid;
            prev_pid = pid;
            prev_start = f64::NEG_INFINITY;
        } else if pid != prev_pid {
            if pid < prev_pid {
                return Err(PreprocessError::UnsortedInput { row });
            }
            return Err(PreprocessError::PatientNumbering {
                row,
                found: pid_raw,
            });
        }

        let t_start = values[schema.t_start];
        if t_start < prev_start {
            return Err(PreprocessError::UnsortedInput { row });
        }
        prev_start = t_start;
    }

    Ok(npatients)
}
