//! gradeboard-stats - Statistical core for grade-distribution graphs
//!
//! This crate provides the numeric primitives behind the grade histogram
//! and CDF views:
//!
//! - **GradeSeries**: a run-length-compressed empirical CDF over one
//!   population slice, with rank, quantile, and filtering queries
//! - **GradeKde**: an Epanechnikov kernel density estimate derived from a
//!   series, used for histogram-style rendering
//!
//! # Design Philosophy
//!
//! Grade populations are small (tens to low thousands of students) but the
//! same distribution is queried many times while a graph is interactive, so
//! the compressed CDF form is preferred over raw samples:
//! - One entry per distinct value instead of one per student
//! - O(log n) rank and quantile queries
//! - Cheap to ship over the wire alongside per-user identity

pub mod kde;
pub mod series;

pub use kde::*;
pub use series::*;
