//! Shared test utilities for the EODS client workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A scripted [`HttpBackend`](eods_common::HttpBackend) fake that replays
//!   queued replies and records every request
//! - Catalog search and WPS response fixtures
//! - In-memory zip archive builders
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, ScriptedBackend};
//! ```

pub mod archive;
pub mod backend;
pub mod fixtures;

// Re-export commonly used items at the crate root
pub use archive::*;
pub use backend::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(0.075_f64, 0.0750001_f64, 1e-6); // passes
/// assert_approx_eq!(0.1_f64, 0.2_f64, 1e-6);         // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(0.075, (0.05 + 0.10) / 2.0, 1e-12);
        assert_approx_eq!(0.0, 0.0, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(0.175, 0.1, 0.001);
    }
}
