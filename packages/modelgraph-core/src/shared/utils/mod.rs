//! Shared utilities

pub mod path;

pub use path::{check_identifier, join_path, split_first, split_path, PathStack};
