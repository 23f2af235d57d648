//! Numeric input abstractions for the preprocessing engine.
//!
//! The engine operates on plain row-major `f64` matrices with explicit shape
//! metadata. Column-name bookkeeping is glue-layer responsibility: the four
//! distinguished survival columns (`patient`, `t_start`, `t_end`, `delta`)
//! arrive as resolved indices in an [`IntervalSchema`].

mod dense;
mod schema;

pub use dense::DenseMatrix;
pub use schema::{validate_dataset, IntervalSchema};
