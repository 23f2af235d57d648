//! Row expansion at quantile knots.
//!
//! Materializes the expanded output matrix: every input interval is replaced
//! by consecutive sub-intervals bounded by the time-axis quantile knots that
//! fall inside it. Patients are independent units of work; the output buffer
//! is pre-split into disjoint per-patient chunks (sized by the
//! [`BoundaryMap`]) so workers never write overlapping ranges.

use rayon::prelude::*;

use crate::boundary::{knots_inside, BoundaryMap};
use crate::data::{DenseMatrix, IntervalSchema};
use crate::parallelism::Parallelism;
use crate::quantile::QuantileTable;

/// Fewer patients per thread than this and the chunked dispatch costs more
/// than it saves.
const MIN_PATIENTS_PER_THREAD: usize = 32;

/// Expand `data` into its sub-interval representation.
///
/// Consumes the [`BoundaryMap`] by value: the map is a single-use resource
/// and is dropped here on every path.
///
/// Per emitted row:
/// - covariates and the patient id are copied unchanged from the source row,
/// - `t_start` becomes the sub-interval's own start,
/// - `t_end` is reinterpreted as the sub-interval duration `dt`,
/// - `delta` is zeroed everywhere except the terminal sub-interval, which
///   keeps the source row's indicator.
///
/// Rows are written in patient order and, within a patient, in time order.
///
/// # Panics
///
/// Panics if the map does not cover `data` (`map.in_nrows() != data.num_rows()`);
/// both must come from the same `preprocess` invocation.
pub fn expand(
    data: &DenseMatrix<f64>,
    schema: &IntervalSchema,
    map: BoundaryMap,
    table: &QuantileTable,
    parallelism: Parallelism,
) -> DenseMatrix<f64> {
    assert_eq!(
        map.in_nrows(),
        data.num_rows(),
        "Boundary map covers {} rows, dataset has {}",
        map.in_nrows(),
        data.num_rows()
    );

    let ncols = data.num_cols();
    let npatients = map.npatients();
    let out_nrows = map.out_nrows();
    let knots = table.time_knots(schema.t_end);

    let mut out = vec![0.0f64; out_nrows * ncols];

    // Carve the output into per-patient chunks. Each chunk is owned by
    // exactly one worker, so the parallel loop needs no synchronization.
    let mut chunks: Vec<(usize, &mut [f64])> = Vec::with_capacity(npatients);
    let mut rest = out.as_mut_slice();
    for p in 0..npatients {
        let len = map.out_range(p).len() * ncols;
        let (chunk, tail) = rest.split_at_mut(len);
        chunks.push((p, chunk));
        rest = tail;
    }

    let fill = |(p, chunk): (usize, &mut [f64])| {
        fill_patient(data, schema, &knots, map.in_range(p), chunk);
    };

    let parallelism = parallelism.correct_for_workload(npatients, MIN_PATIENTS_PER_THREAD);
    if parallelism.allows_parallel() {
        chunks.into_par_iter().for_each(fill);
    } else {
        chunks.into_iter().for_each(fill);
    }

    drop(map);
    DenseMatrix::from_vec(out, out_nrows, ncols)
}

/// Emit all sub-interval rows for one patient into its output chunk.
fn fill_patient(
    data: &DenseMatrix<f64>,
    schema: &IntervalSchema,
    knots: &[f64],
    in_rows: std::ops::Range<usize>,
    chunk: &mut [f64],
) {
    let ncols = data.num_cols();
    let mut cursor = 0usize;

    for r in in_rows {
        let src = data.row_slice(r);
        let t_start = src[schema.t_start];
        let t_end = src[schema.t_end];

        // Zero-length intervals can land hi before lo; clamp so they emit a
        // single unsplit row.
        let lo = knots.partition_point(|&k| k <= t_start);
        let hi = knots.partition_point(|&k| k < t_end).max(lo);
        debug_assert_eq!(hi - lo, knots_inside(knots, t_start, t_end));

        let mut sub_start = t_start;
        for &knot in &knots[lo..hi] {
            let dst = &mut chunk[cursor * ncols..(cursor + 1) * ncols];
            dst.copy_from_slice(src);
            dst[schema.t_start] = sub_start;
            dst[schema.t_end] = knot - sub_start;
            dst[schema.delta] = 0.0;
            sub_start = knot;
            cursor += 1;
        }

        // Terminal sub-interval covers the original end point and keeps the
        // event indicator.
        let dst = &mut chunk[cursor * ncols..(cursor + 1) * ncols];
        dst.copy_from_slice(src);
        dst[schema.t_start] = sub_start;
        dst[schema.t_end] = t_end - sub_start;
        cursor += 1;
    }

    debug_assert_eq!(cursor * ncols, chunk.len(), "chunk not filled exactly");
}
