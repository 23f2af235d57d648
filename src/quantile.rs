//! Per-column quantile breakpoint estimation.
//!
//! Every column of the training matrix is summarized by `quant_per_column`
//! ascending breakpoints of its empirical distribution. When duration
//! weighting is enabled, each row contributes proportionally to its interval
//! length `t_end - t_start`, which corrects the bias toward patients with
//! many short rows. Columns are independent and estimated in parallel.

use rayon::prelude::*;

use crate::data::{DenseMatrix, IntervalSchema};
use crate::parallelism::Parallelism;

/// Hard cap on breakpoints per column; requests above it are clamped silently.
pub const MAX_QUANTILES: usize = 256;

/// Quantile breakpoints for every column of a training matrix.
///
/// Stored column-contiguous: column `j` occupies
/// `breaks[j * q .. (j + 1) * q]`, ascending, with the last breakpoint equal
/// to the column maximum. The table is the retained training artifact: it is
/// consumed once to place split knots during expansion and again, possibly
/// much later, to snap held-out covariates onto the same grid.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuantileTable {
    breaks: Box<[f64]>,
    quants_per_column: usize,
    num_cols: usize,
}

impl QuantileTable {
    /// Build a table from pre-computed breakpoints.
    ///
    /// # Panics
    ///
    /// Panics if `breaks.len() != quants_per_column * num_cols`.
    pub fn from_parts(breaks: Vec<f64>, quants_per_column: usize, num_cols: usize) -> Self {
        assert_eq!(
            breaks.len(),
            quants_per_column * num_cols,
            "Breakpoint length {} does not match {} quantiles x {} columns",
            breaks.len(),
            quants_per_column,
            num_cols
        );
        Self {
            breaks: breaks.into_boxed_slice(),
            quants_per_column,
            num_cols,
        }
    }

    /// Estimate breakpoints for every column of `data`.
    ///
    /// `quant_per_column` is clamped to `1..=MAX_QUANTILES`. Breakpoint `i`
    /// of a column sits at probability `(i + 1) / q`: the first value whose
    /// cumulative weight reaches that fraction of the total. With
    /// `weighted == false` all weights are 1 and this is the plain empirical
    /// quantile. Ties are broken by input row order (stable sort), so the
    /// result is deterministic for a fixed input ordering.
    pub fn estimate(
        data: &DenseMatrix<f64>,
        schema: &IntervalSchema,
        quant_per_column: usize,
        weighted: bool,
        parallelism: Parallelism,
    ) -> Self {
        let q = quant_per_column.clamp(1, MAX_QUANTILES);
        let ncols = data.num_cols();
        let nrows = data.num_rows();

        let weights: Option<Vec<f64>> = weighted.then(|| {
            data.rows()
                .map(|row| row[schema.t_end] - row[schema.t_start])
                .collect()
        });

        let estimate_column = |col: usize| -> Vec<f64> {
            let mut order: Vec<usize> = (0..nrows).collect();
            // Stable sort: equal values keep input row order.
            order.sort_by(|&a, &b| {
                let va = data.row_slice(a)[col];
                let vb = data.row_slice(b)[col];
                va.total_cmp(&vb)
            });
            column_breaks(data, col, &order, weights.as_deref(), q)
        };

        let parallelism = parallelism.correct_for_workload(ncols, 2);
        let columns: Vec<Vec<f64>> = if parallelism.allows_parallel() {
            (0..ncols).into_par_iter().map(estimate_column).collect()
        } else {
            (0..ncols).map(estimate_column).collect()
        };

        let mut breaks = Vec::with_capacity(q * ncols);
        for col in columns {
            breaks.extend(col);
        }
        Self::from_parts(breaks, q, ncols)
    }

    /// Breakpoints per column.
    #[inline]
    pub fn quants_per_column(&self) -> usize {
        self.quants_per_column
    }

    /// Number of columns.
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Ascending breakpoints of column `j`.
    ///
    /// # Panics
    ///
    /// Panics if `j >= num_cols()`.
    #[inline]
    pub fn column(&self, j: usize) -> &[f64] {
        let start = j * self.quants_per_column;
        &self.breaks[start..start + self.quants_per_column]
    }

    /// Deduplicated split knots drawn from the time-axis column.
    ///
    /// Repeated breakpoints (heavy ties in the time distribution) would only
    /// produce zero-length sub-intervals, so duplicates are dropped.
    pub fn time_knots(&self, t_end_col: usize) -> Vec<f64> {
        let mut knots = self.column(t_end_col).to_vec();
        knots.dedup();
        knots
    }
}

/// Breakpoints of one column given its sorted row order and optional weights.
fn column_breaks(
    data: &DenseMatrix<f64>,
    col: usize,
    order: &[usize],
    weights: Option<&[f64]>,
    q: usize,
) -> Vec<f64> {
    let nrows = order.len();
    if nrows == 0 {
        return vec![0.0; q];
    }

    // Degenerate weighting (all-zero durations) falls back to plain counts.
    let effective: Option<&[f64]> = match weights {
        Some(w) if w.iter().sum::<f64>() > 0.0 => Some(w),
        _ => None,
    };
    let total: f64 = effective.map_or(nrows as f64, |w| w.iter().sum());
    let weight_of = |row: usize| effective.map_or(1.0, |w| w[row]);

    let mut breaks = Vec::with_capacity(q);
    let mut cursor = 0usize;
    let mut cum = weight_of(order[0]);
    for i in 0..q {
        if i + 1 == q {
            // p = 1 is the column maximum by definition; do not let float
            // accumulation stop the scan one element short.
            cursor = nrows - 1;
        }
        let target = (i + 1) as f64 / q as f64 * total;
        while cum < target && cursor + 1 < nrows {
            cursor += 1;
            cum += weight_of(order[cursor]);
        }
        breaks.push(data.row_slice(order[cursor])[col]);
    }
    breaks
}
