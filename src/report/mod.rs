//! Summary output modules.
//!
//! Aggregated rows leave the program either as CSV files or as a
//! line-oriented stdout report, never both in one invocation.

pub mod writer;

pub use writer::*;
