//! Vertical slices of the compiler

pub mod addons;
pub mod element;
pub mod elements;
pub mod expression;
pub mod model_namespace;
pub mod placeholder;
pub mod reconciliation;
pub mod sort;
pub mod value_synth;
