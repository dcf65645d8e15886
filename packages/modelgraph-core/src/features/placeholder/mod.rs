//! Placeholder / deferred value protocol
//!
//! - [`Hollow`]: explicit {Empty, TypeBound, ValueBound} state machine
//! - [`PlaceholderValue`] / [`PlaceholderSynth`]: namespace entries with
//!   deferred type and value
//! - [`DeclarationCache`]: compute-once cache of schema-derived declarations

mod cache;
mod hollow;
mod value;

pub use cache::{DeclarationCache, ElementValueDecl, ElementValueSpec};
pub use hollow::{Hollow, HollowState, SatisfyPolicy};
pub use value::{PlaceholderSynth, PlaceholderValue, TypeCallback};
