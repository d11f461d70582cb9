//! `intersection-estimator` is a Rust crate designed to estimate the number of distinct elements
//! in a stream and the overlap between two independently built streams, using fixed-size memory.
//!
//! This library uses HyperLogLog registers over pre-hashed 32-bit values, with union via
//! register-wise maxima and intersection via inclusion-exclusion over three cardinality estimates.
//!
//! # Example
//! ```
//! use intersection_estimator::Estimator;
//!
//! let mut lhs = Estimator::new(2048)?;
//! let mut rhs = Estimator::new(2048)?;
//!
//! // Hashes are supplied by the caller; these are crafted to hit
//! // distinct registers so the small-range estimates are exact.
//! for k in 0..4u32 {
//!     lhs.add((k << 21) | (1 << 20));
//! }
//! for k in 2..6u32 {
//!     rhs.add((k << 21) | (1 << 20));
//! }
//!
//! assert_eq!(lhs.count(), 4);
//! assert_eq!(rhs.count(), 4);
//! assert_eq!(lhs.merge(&rhs)?.count(), 6);
//! assert_eq!(lhs.intersect(&rhs)?, 2);
//! # Ok::<(), intersection_estimator::EstimatorError>(())
//! ```
pub mod estimator;
mod registers;

pub use estimator::{Estimator, EstimatorError};
