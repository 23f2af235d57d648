//! End-to-end preprocessing driver.
//!
//! Ties the engine stages together in their required order: validate, estimate
//! quantiles, compute boundaries, expand. The quantile table is retained on
//! the fitted result so held-out covariates can be snapped onto the same grid
//! later; the boundary map lives only inside [`Preprocessor::fit`].

use crate::boundary::BoundaryMap;
use crate::data::{validate_dataset, DenseMatrix, IntervalSchema};
use crate::error::PreprocessError;
use crate::expand::expand;
use crate::parallelism::{with_worker_pool, Parallelism};
use crate::quantile::QuantileTable;
use crate::snap::snap_to_grid;

/// Recognized preprocessing options.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PreprocessOptions {
    /// Quantile breakpoints per column; clamped to
    /// [`crate::quantile::MAX_QUANTILES`].
    pub quant_per_column: usize,
    /// Weight each row's quantile contribution by its interval duration.
    pub weighted: bool,
    /// Worker count; non-positive means auto-detect.
    pub nthreads: i32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            quant_per_column: 20,
            weighted: false,
            nthreads: -1,
        }
    }
}

/// Configured entry point for the training path.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    options: PreprocessOptions,
}

impl Preprocessor {
    /// Create a preprocessor with the given options.
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    /// The configured options.
    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Run the full training-path transform.
    ///
    /// Validates the dataset, estimates per-column quantiles, computes the
    /// per-patient boundary map, and expands every interval at the time-axis
    /// knots. Fails fast on precondition violations without producing any
    /// output.
    ///
    /// An explicit thread hint (`nthreads > 1`) runs the parallel stages on a
    /// dedicated pool of that size; auto (`nthreads <= 0`) uses the global
    /// pool.
    pub fn fit(
        &self,
        data: &DenseMatrix<f64>,
        schema: IntervalSchema,
    ) -> Result<Fitted, PreprocessError> {
        let npatients = validate_dataset(data, &schema)?;
        let nthreads = self.options.nthreads;

        with_worker_pool(nthreads, move || {
            let parallelism = Parallelism::from_hint(nthreads);
            let table = QuantileTable::estimate(
                data,
                &schema,
                self.options.quant_per_column,
                self.options.weighted,
                parallelism,
            );
            let map = BoundaryMap::compute(data, &schema, npatients, &table);
            let expanded = expand(data, &schema, map, &table, parallelism);

            Ok(Fitted {
                expanded,
                table,
                schema,
                npatients,
                nthreads,
            })
        })
    }
}

/// Result of a training-path run.
///
/// Owns the expanded dataset and the retained quantile grid. The engine's
/// contract ends at these raw buffers; assembling named tabular structures is
/// glue-layer work.
#[derive(Debug, Clone)]
pub struct Fitted {
    expanded: DenseMatrix<f64>,
    table: QuantileTable,
    schema: IntervalSchema,
    npatients: usize,
    nthreads: i32,
}

impl Fitted {
    /// The expanded dataset (`out_nrows x ncols`; `t_end` now holds `dt`).
    pub fn expanded(&self) -> &DenseMatrix<f64> {
        &self.expanded
    }

    /// The trained quantile grid.
    pub fn quantiles(&self) -> &QuantileTable {
        &self.table
    }

    /// The schema the grid was trained with.
    pub fn schema(&self) -> &IntervalSchema {
        &self.schema
    }

    /// Number of patients in the training data.
    pub fn npatients(&self) -> usize {
        self.npatients
    }

    /// Patient id of every expanded row, for downstream grouping.
    pub fn patients(&self) -> Vec<usize> {
        self.expanded
            .column_values(self.schema.patient)
            .into_iter()
            .map(|pid| pid as usize)
            .collect()
    }

    /// Original indices of the covariate columns, in column order.
    pub fn covariate_columns(&self) -> Vec<usize> {
        self.schema.covariate_columns(self.expanded.num_cols())
    }

    /// Covariate matrix of the expanded dataset (`out_nrows x (ncols - 3)`).
    ///
    /// Contains every column except `patient`, `delta` and `t_end`; the
    /// sub-interval start time remains a covariate.
    pub fn covariates(&self) -> DenseMatrix<f64> {
        self.expanded.select_columns(&self.covariate_columns())
    }

    /// Two-column `(delta, dt)` target matrix of the expanded dataset.
    pub fn targets(&self) -> DenseMatrix<f64> {
        self.expanded
            .select_columns(&[self.schema.delta, self.schema.t_end])
    }

    /// Snap a held-out covariate matrix onto the trained quantile grid.
    ///
    /// `column_map[k]` is the training column index of held-out column `k`.
    /// See [`crate::snap::snap_to_grid`] for the precondition set. Runs under
    /// the same thread hint the fit used.
    pub fn snap_to_grid(
        &self,
        features: &DenseMatrix<f64>,
        column_map: &[usize],
    ) -> Result<DenseMatrix<f64>, PreprocessError> {
        with_worker_pool(self.nthreads, || {
            snap_to_grid(
                features,
                column_map,
                &self.schema,
                &self.table,
                Parallelism::from_hint(self.nthreads),
            )
        })
    }
}
