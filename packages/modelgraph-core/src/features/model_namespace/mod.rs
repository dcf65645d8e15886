//! Model Namespace
//!
//! Hierarchical symbol table of named, typed declarations.
//!
//! Lifecycle of a namespace:
//! 1. [`ModelSetBuilder`]: mutable, owned by one compilation; registration of
//!    a duplicate name fails with `Conflict`
//! 2. [`ModelSet`]: sealed, immutable, shared for dotted-path lookup
//! 3. [`InterpretedModelSet`]: compiled makers turned into typed syntheses
//! 4. [`ModelScope`]: live values for one runtime instantiation

mod builder;
mod component;
mod interpreted;
mod model_set;
mod scope;

pub use builder::ModelSetBuilder;
pub use component::{CompiledValue, ComponentId, ComponentKind, ModelComponent};
pub use interpreted::{InterpretedModelSet, ResolvedComponent};
pub use model_set::ModelSet;
pub use scope::ModelScope;
