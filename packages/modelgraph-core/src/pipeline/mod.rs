//! Build entry point
//!
//! [`Compilation`] runs the three phases over a config tree and keeps their
//! results, so that a changed tree can be rebuilt incrementally.

mod compilation;

pub use compilation::{BuildReport, Compilation};
