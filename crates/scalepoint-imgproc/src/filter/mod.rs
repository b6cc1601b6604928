//! Filter operations
//!
//! This module provides the convolution kernels and filter operations the
//! derivative engines and blur routines are built on.

/// Filter kernels
pub mod kernels;

/// Generic kernel convolution
mod convolution;
pub use convolution::*;

/// Blur operations
mod ops;
pub use ops::*;
