//! Testing utilities for survbin.
//!
//! Assertion helpers shared by unit and integration tests.
//!
//! ```ignore
//! use survbin::assert_approx_eq_f64;
//! use survbin::testing::DEFAULT_TOLERANCE;
//! ```

use approx::AbsDiffEq;

/// Default tolerance for floating point comparisons; the engine works in f64
/// and values are O(1)-O(100), so absolute comparison is appropriate.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Assert that two f64 values are approximately equal.
///
/// # Examples
///
/// ```
/// # use survbin::assert_approx_eq_f64;
/// assert_approx_eq_f64!(1.0, 1.0 + 1e-12, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq_f64 {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val: f64 = $left;
        let right_val: f64 = $right;
        let tol: f64 = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                left_val, right_val, diff, tol
            );
        }
    }};
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {{
        let left_val: f64 = $left;
        let right_val: f64 = $right;
        let tol: f64 = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)` - {}\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                format_args!($($arg)+), left_val, right_val, diff, tol
            );
        }
    }};
}

/// Assert that two f64 slices are element-wise approximately equal.
pub fn assert_slices_approx_eq(left: &[f64], right: &[f64], tolerance: f64) {
    assert_eq!(
        left.len(),
        right.len(),
        "slice lengths differ: {} vs {}",
        left.len(),
        right.len()
    );
    for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        assert!(
            l.abs_diff_eq(r, tolerance),
            "slices differ at index {i}: {l} vs {r} (tolerance {tolerance})"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_macro_accepts_close_values() {
        assert_approx_eq_f64!(1.0, 1.0 + 1e-12, DEFAULT_TOLERANCE);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn approx_macro_rejects_distant_values() {
        assert_approx_eq_f64!(1.0, 2.0, DEFAULT_TOLERANCE);
    }

    #[test]
    fn slice_helper_compares_elementwise() {
        assert_slices_approx_eq(&[1.0, 2.0], &[1.0, 2.0 + 1e-12], DEFAULT_TOLERANCE);
    }
}
