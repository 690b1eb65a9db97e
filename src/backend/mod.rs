//! # Numeric backend
//!
//! Dense storage is `ndarray` (`Array1` for weight vectors and labels,
//! `Array2` for feature matrices and one-vs-all weight matrices). This module
//! only abstracts over the element type, so the same estimator code runs in
//! single or double precision.
//!
//! | Element | Use case                                   |
//! |---------|--------------------------------------------|
//! | `f64`   | Default                                    |
//! | `f32`   | Large feature matrices, BLAS-style inputs  |

/// Scalar element trait and its `f32`/`f64` implementations.
pub mod scalar;

pub use scalar::ScalarOps;
