//! survbin: quantile-binned row expansion for survival data.
//!
//! This crate discretizes continuous patient time-interval data into a
//! piecewise representation suitable for counting-process / piecewise-constant
//! hazard modeling: per-column quantile breakpoints are estimated over the
//! training data, every patient interval is split at the time-axis breakpoints
//! that fall inside it, and held-out covariates can later be snapped onto the
//! same discretization grid.

pub mod boundary;
pub mod data;
pub mod error;
pub mod expand;
pub mod parallelism;
pub mod pipeline;
pub mod quantile;
pub mod snap;
pub mod testing;
