#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
/// scale space feature detection module.
pub mod features;

/// image filtering module.
pub mod filter;

/// first order image derivatives module.
pub mod gradient;

/// second order image derivatives module.
pub mod hessian;

/// module containing parallization utilities.
pub mod parallel;

/// gaussian scale space module.
pub mod scale_space;

/// image thresholding module.
pub mod threshold;
