//! Per-patient input/output row-range bookkeeping.
//!
//! Splitting happens in two passes: this module's sequential prefix pass
//! determines, per patient, how many output rows the expansion will emit, so
//! the caller can allocate the output buffer up front and workers can later
//! write disjoint ranges without coordination.

use std::ops::Range;

use crate::data::{DenseMatrix, IntervalSchema};
use crate::quantile::QuantileTable;

/// Per-patient correspondence between input and output row ranges.
///
/// Holds `npatients + 1` monotone offsets for each side; patient `i` owns the
/// half-open input range `in_lbs[i]..in_lbs[i + 1]` and the output range
/// `out_lbs[i]..out_lbs[i + 1]`. The final sentinels equal the total input
/// and output row counts.
///
/// The map is a transient, single-owner resource: it is produced here,
/// consumed by value in [`crate::expand::expand`], and dropped there on every
/// exit path. Use-after-release is unrepresentable.
#[derive(Debug, PartialEq, Eq)]
pub struct BoundaryMap {
    in_lbs: Box<[usize]>,
    out_lbs: Box<[usize]>,
}

impl BoundaryMap {
    /// Compute the boundary map for a validated dataset.
    ///
    /// Each input row expands into `1 + k` output rows, where `k` is the
    /// number of time-axis quantile knots strictly inside `(t_start, t_end)`.
    /// A row with no internal knots passes through unsplit; zero-length
    /// intervals therefore contribute exactly one row.
    ///
    /// Input ranges are derived purely from the sorted patient column.
    /// Callers must have run [`crate::data::validate_dataset`] first; the
    /// contiguity of per-patient ranges depends on it.
    pub fn compute(
        data: &DenseMatrix<f64>,
        schema: &IntervalSchema,
        npatients: usize,
        table: &QuantileTable,
    ) -> Self {
        let knots = table.time_knots(schema.t_end);

        let mut in_lbs = vec![0usize; npatients + 1];
        let mut out_lbs = vec![0usize; npatients + 1];

        let mut out_count = 0usize;
        for (row, values) in data.rows().enumerate() {
            let pid = values[schema.patient] as usize;
            debug_assert!((1..=npatients).contains(&pid), "unvalidated patient id");

            out_count += 1 + knots_inside(&knots, values[schema.t_start], values[schema.t_end]);
            // Running sentinel: each row of patient `pid` pushes its upper
            // bound forward; the lower bound is the previous patient's
            // sentinel, fixed once that patient's rows are exhausted.
            in_lbs[pid] = row + 1;
            out_lbs[pid] = out_count;
        }

        // Forward-fill patients without rows (cannot occur after validation,
        // but keeps the offsets monotone regardless).
        for p in 1..=npatients {
            if in_lbs[p] < in_lbs[p - 1] {
                in_lbs[p] = in_lbs[p - 1];
                out_lbs[p] = out_lbs[p - 1];
            }
        }

        Self {
            in_lbs: in_lbs.into_boxed_slice(),
            out_lbs: out_lbs.into_boxed_slice(),
        }
    }

    /// Number of patients.
    #[inline]
    pub fn npatients(&self) -> usize {
        self.in_lbs.len() - 1
    }

    /// Total number of output rows the expansion will produce.
    #[inline]
    pub fn out_nrows(&self) -> usize {
        *self.out_lbs.last().unwrap_or(&0)
    }

    /// Total number of input rows covered by the map.
    #[inline]
    pub fn in_nrows(&self) -> usize {
        *self.in_lbs.last().unwrap_or(&0)
    }

    /// Input row range of patient `i` (zero-based patient index).
    #[inline]
    pub fn in_range(&self, i: usize) -> Range<usize> {
        self.in_lbs[i]..self.in_lbs[i + 1]
    }

    /// Output row range of patient `i` (zero-based patient index).
    #[inline]
    pub fn out_range(&self, i: usize) -> Range<usize> {
        self.out_lbs[i]..self.out_lbs[i + 1]
    }
}

/// Number of knots strictly inside the open interval `(t_start, t_end)`.
///
/// `knots` must be ascending. A knot equal to either endpoint does not split:
/// it would only create a zero-length sub-interval.
#[inline]
pub(crate) fn knots_inside(knots: &[f64], t_start: f64, t_end: f64) -> usize {
    let lo = knots.partition_point(|&k| k <= t_start);
    let hi = knots.partition_point(|&k| k < t_end);
    hi.saturating_sub(lo)
}
