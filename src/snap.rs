//! Snapping held-out covariates onto the trained quantile grid.
//!
//! Inference-time data must share the training discretization: every held-out
//! value is replaced by the boundary of the quantile bin it falls into, column
//! by column, using the retained [`QuantileTable`]. The adjustment is
//! column-independent and parallel across rows.

use rayon::prelude::*;

use crate::data::{DenseMatrix, IntervalSchema};
use crate::error::PreprocessError;
use crate::parallelism::Parallelism;
use crate::quantile::QuantileTable;

/// Below this many rows the per-row dispatch is not worth spawning for.
const MIN_ROWS_PER_THREAD: usize = 256;

/// Snap every value of `features` onto its column's quantile grid.
///
/// `column_map[k]` gives the *training* column index corresponding to
/// held-out column `k` (the glue layer resolves names to indices). Each value
/// is replaced by the smallest breakpoint of its mapped column that is `>=`
/// the value; values above the grid clamp to the last breakpoint. Applying
/// the adjustment twice is a no-op.
///
/// Preconditions, checked before any row is touched:
/// - `features` has exactly `table.num_cols() - 3` columns (every training
///   column except `patient`, `delta` and `t_end`),
/// - `column_map` has one entry per held-out column,
/// - every mapped index is an in-range, non-reserved training column.
pub fn snap_to_grid(
    features: &DenseMatrix<f64>,
    column_map: &[usize],
    schema: &IntervalSchema,
    table: &QuantileTable,
    parallelism: Parallelism,
) -> Result<DenseMatrix<f64>, PreprocessError> {
    let got = features.num_cols();
    let expected = table.num_cols().saturating_sub(3);
    if got != expected {
        return Err(PreprocessError::ColumnCountMismatch { expected, got });
    }
    if column_map.len() != got {
        return Err(PreprocessError::ColumnMapLength {
            expected: got,
            got: column_map.len(),
        });
    }
    for (position, &index) in column_map.iter().enumerate() {
        if index >= table.num_cols() || schema.is_reserved(index) {
            return Err(PreprocessError::NotACovariate { position, index });
        }
    }

    let ncols = got;
    let mut out = features.as_slice().to_vec();

    let snap_row = |row: &mut [f64]| {
        for (k, &cj) in column_map.iter().enumerate() {
            row[k] = snap_up(table.column(cj), row[k]);
        }
    };

    let parallelism = parallelism.correct_for_workload(features.num_rows(), MIN_ROWS_PER_THREAD);
    if ncols > 0 {
        if parallelism.allows_parallel() {
            out.par_chunks_mut(ncols).for_each(snap_row);
        } else {
            out.chunks_mut(ncols).for_each(snap_row);
        }
    }

    Ok(DenseMatrix::from_vec(out, features.num_rows(), ncols))
}

/// Smallest breakpoint `>= v`, clamping above the grid to the last one.
///
/// `breaks` must be ascending and non-empty. Breakpoints map to themselves,
/// which makes the adjustment idempotent.
#[inline]
fn snap_up(breaks: &[f64], v: f64) -> f64 {
    let pos = breaks.partition_point(|&b| b < v);
    if pos == breaks.len() {
        breaks[breaks.len() - 1]
    } else {
        breaks[pos]
    }
}
