//! gradeboard-core - aggregate grade statistics for assignment graphs
//!
//! Wraps the numeric primitives of `gradeboard-stats` in the shape the
//! server API speaks: one [`GradeStats`] per assignment, holding named
//! population slices (`"all"`, `"extension"`, `"noextra"`, ...) plus
//! display metadata. Constructed once from a JSON payload and read-only
//! thereafter.

pub mod error;
pub mod stats;

pub use error::*;
pub use stats::*;
