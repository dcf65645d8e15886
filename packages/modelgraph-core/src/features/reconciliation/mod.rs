//! Reconciliation engine
//!
//! Identity-based diff/sync of a live sequence against a new sequence. Used
//! for child definitions, interpretations and instances, and for add-on lists.

mod sync;

pub use sync::{synchronize, SyncHandler, SyncStats};
