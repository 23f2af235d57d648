//! End-to-end preprocessing tests.
//!
//! Focused on engine invariants over realistic synthetic data: boundary
//! partitioning, duration mass conservation, event placement, and the
//! training/inference grid round trip.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use survbin::assert_approx_eq_f64;
use survbin::data::{DenseMatrix, IntervalSchema};
use survbin::error::PreprocessError;
use survbin::pipeline::{PreprocessOptions, Preprocessor};
use survbin::quantile::{QuantileTable, MAX_QUANTILES};
use survbin::testing::{assert_slices_approx_eq, DEFAULT_TOLERANCE};

// Columns: patient, t_start, t_end, delta, age, dose.
const NCOLS: usize = 6;

fn schema() -> IntervalSchema {
    IntervalSchema::new(0, 1, 2, 3)
}

/// Synthetic longitudinal dataset: `npatients` patients with 1-3 chained
/// intervals each, sorted by (patient, t_start), ids contiguous from 1.
fn synthetic_dataset(npatients: usize, seed: u64) -> DenseMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows: Vec<f64> = Vec::new();
    let mut nrows = 0;

    for pid in 1..=npatients {
        let n_intervals = rng.gen_range(1..=3);
        let age = rng.gen_range(20.0..90.0);
        let mut t = 0.0;
        for k in 0..n_intervals {
            let dur = rng.gen_range(0.5..20.0);
            let terminal = k + 1 == n_intervals;
            let delta = if terminal && rng.gen_bool(0.4) { 1.0 } else { 0.0 };
            let dose = rng.gen_range(0.0..10.0);
            rows.extend_from_slice(&[pid as f64, t, t + dur, delta, age, dose]);
            t += dur;
            nrows += 1;
        }
    }

    DenseMatrix::from_vec(rows, nrows, NCOLS)
}

fn fit(data: &DenseMatrix<f64>, options: PreprocessOptions) -> survbin::pipeline::Fitted {
    Preprocessor::new(options)
        .fit(data, schema())
        .expect("synthetic dataset should satisfy all preconditions")
}

#[test]
fn expansion_preserves_duration_mass_per_patient() {
    let data = synthetic_dataset(120, 7);
    let fitted = fit(&data, PreprocessOptions::default());
    let out = fitted.expanded();

    for pid in 1..=fitted.npatients() {
        let original: f64 = data
            .rows()
            .filter(|r| r[0] == pid as f64)
            .map(|r| r[2] - r[1])
            .sum();
        let expanded: f64 = out
            .rows()
            .filter(|r| r[0] == pid as f64)
            .map(|r| r[2]) // t_end column now holds dt
            .sum();
        assert_approx_eq_f64!(
            original,
            expanded,
            DEFAULT_TOLERANCE,
            "patient {pid} duration mass"
        );
    }
}

#[test]
fn events_land_exactly_on_terminal_sub_intervals() {
    let data = synthetic_dataset(150, 13);
    let fitted = fit(&data, PreprocessOptions::default());
    let out = fitted.expanded();

    // One nonzero delta per original event row, nowhere else.
    let original_events: f64 = data.column_values(3).iter().sum();
    let expanded_events: f64 = out.column_values(3).iter().sum();
    assert_eq!(original_events, expanded_events);

    // Every event row must close an original interval: its start plus dt is
    // an original t_end of the same patient with delta set.
    for row in out.rows().filter(|r| r[3] != 0.0) {
        let end = row[1] + row[2];
        let closes_event_interval = data
            .rows()
            .any(|r| r[0] == row[0] && r[3] != 0.0 && (r[2] - end).abs() < 1e-9);
        assert!(
            closes_event_interval,
            "event row of patient {} ends at {end} which is no original event end",
            row[0]
        );
    }
}

#[test]
fn expanded_rows_stay_grouped_and_time_ordered() {
    let data = synthetic_dataset(80, 29);
    let fitted = fit(&data, PreprocessOptions::default());
    let out = fitted.expanded();

    let patients = fitted.patients();
    assert!(patients.windows(2).all(|w| w[0] <= w[1]), "patient order broken");

    let mut prev_pid = 0;
    let mut prev_start = f64::NEG_INFINITY;
    for row in out.rows() {
        let pid = row[0] as usize;
        if pid != prev_pid {
            prev_pid = pid;
            prev_start = f64::NEG_INFINITY;
        }
        assert!(row[1] >= prev_start, "time order broken within patient {pid}");
        prev_start = row[1];
    }
}

#[test]
fn expansion_never_reduces_row_count() {
    for seed in [1, 2, 3] {
        let data = synthetic_dataset(60, seed);
        let fitted = fit(&data, PreprocessOptions::default());
        assert!(fitted.expanded().num_rows() >= data.num_rows());
    }
}

#[test]
fn covariates_are_copied_unchanged_onto_sub_intervals() {
    let data = synthetic_dataset(40, 5);
    let fitted = fit(&data, PreprocessOptions::default());

    // Age (column 4) is constant per patient in the generator; it must stay
    // constant across that patient's expanded rows and match the original.
    for pid in 1..=fitted.npatients() {
        let original_age = data
            .rows()
            .find(|r| r[0] == pid as f64)
            .map(|r| r[4])
            .expect("patient has rows");
        for row in fitted.expanded().rows().filter(|r| r[0] == pid as f64) {
            assert_eq!(row[4], original_age);
        }
    }
}

#[test]
fn requested_quantile_count_is_clamped() {
    let data = synthetic_dataset(30, 11);
    let fitted = fit(
        &data,
        PreprocessOptions {
            quant_per_column: 500,
            ..Default::default()
        },
    );
    assert_eq!(fitted.quantiles().quants_per_column(), MAX_QUANTILES);
}

#[test]
fn thread_hint_does_not_change_results() {
    let data = synthetic_dataset(200, 17);
    // Auto uses the global pool, 2 runs on a dedicated capped pool, 1 stays
    // sequential; all three must agree bit for bit.
    let auto = fit(
        &data,
        PreprocessOptions {
            nthreads: -1,
            ..Default::default()
        },
    );
    let capped = fit(
        &data,
        PreprocessOptions {
            nthreads: 2,
            ..Default::default()
        },
    );
    let single = fit(
        &data,
        PreprocessOptions {
            nthreads: 1,
            ..Default::default()
        },
    );
    assert_slices_approx_eq(auto.expanded().as_slice(), single.expanded().as_slice(), 0.0);
    assert_slices_approx_eq(capped.expanded().as_slice(), single.expanded().as_slice(), 0.0);
    assert_eq!(auto.quantiles(), single.quantiles());
    assert_eq!(capped.quantiles(), single.quantiles());
}

#[test]
fn weighted_and_unweighted_grids_differ_on_skewed_durations() {
    let data = synthetic_dataset(100, 23);
    let unweighted = fit(&data, PreprocessOptions::default());
    let weighted = fit(
        &data,
        PreprocessOptions {
            weighted: true,
            ..Default::default()
        },
    );
    assert_ne!(unweighted.quantiles(), weighted.quantiles());
}

#[test]
fn snap_round_trip_against_trained_grid() {
    let train = synthetic_dataset(100, 31);
    let fitted = fit(&train, PreprocessOptions::default());

    // Held-out features in training covariate order: t_start, age, dose.
    let column_map = fitted.covariate_columns();
    assert_eq!(column_map, vec![1, 4, 5]);

    let mut rng = StdRng::seed_from_u64(97);
    let heldout_values: Vec<f64> = (0..50 * 3)
        .map(|i| match i % 3 {
            0 => rng.gen_range(0.0..60.0),
            1 => rng.gen_range(20.0..90.0),
            _ => rng.gen_range(0.0..10.0),
        })
        .collect();
    let heldout = DenseMatrix::from_vec(heldout_values, 50, 3);

    let snapped = fitted.snap_to_grid(&heldout, &column_map).unwrap();
    assert_eq!(snapped.num_rows(), 50);
    assert_eq!(snapped.num_cols(), 3);

    // Every snapped value lies on the grid, and snapping is idempotent.
    for (k, &cj) in column_map.iter().enumerate() {
        let grid = fitted.quantiles().column(cj);
        for v in snapped.column_values(k) {
            assert!(grid.contains(&v), "column {k}: {v} not on grid");
        }
    }
    let twice = fitted.snap_to_grid(&snapped, &column_map).unwrap();
    assert_eq!(snapped, twice);
}

#[test]
fn heldout_width_mismatch_is_a_precondition_violation() {
    let train = synthetic_dataset(20, 41);
    let fitted = fit(&train, PreprocessOptions::default());

    let heldout = DenseMatrix::from_vec(vec![1.0, 2.0], 1, 2);
    let err = fitted.snap_to_grid(&heldout, &[1, 4]).unwrap_err();
    assert_eq!(err, PreprocessError::ColumnCountMismatch { expected: 3, got: 2 });
}

#[test]
fn quantile_table_survives_serde_round_trip() {
    let data = synthetic_dataset(50, 43);
    let fitted = fit(&data, PreprocessOptions::default());

    let json = serde_json::to_string(fitted.quantiles()).unwrap();
    let restored: QuantileTable = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, fitted.quantiles());
}

#[test]
fn unsorted_input_fails_fast() {
    let rows = vec![
        1.0, 0.0, 5.0, 0.0, 50.0, 1.0, //
        2.0, 0.0, 5.0, 0.0, 50.0, 1.0, //
        1.0, 5.0, 8.0, 1.0, 50.0, 1.0,
    ];
    let data = DenseMatrix::from_vec(rows, 3, NCOLS);
    let err = Preprocessor::default().fit(&data, schema()).unwrap_err();
    assert!(matches!(err, PreprocessError::UnsortedInput { .. }));
}
