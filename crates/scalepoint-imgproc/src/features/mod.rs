//! Feature detection operations
//!
//! This module provides scale space interest point detection built on the
//! derivative and blur machinery in the rest of the crate.

mod hessian_laplace;
pub use hessian_laplace::*;
