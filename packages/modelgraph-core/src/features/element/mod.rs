//! Element lifecycle
//!
//! Each logical construct of a config tree moves through three phases, each
//! updatable in place while keeping one [`Identity`](crate::shared::models::Identity):
//! - [`ElementDef`]: compile phase, built from a schema node
//! - [`ElementInterp`]: type-resolved against an [`InterpretEnv`]
//! - [`ElementInstance`]: bound to a runtime scope
//!
//! Element-specific behaviour plugs in through [`KindDef`], [`KindInterp`] and
//! [`KindInstance`], registered per schema type in an [`ElementRegistry`].

mod definition;
mod env;
mod instance;
mod interpretation;
mod registry;
mod session;

pub use definition::{DefCore, ElementDef, KindDef};
pub use env::{InterpretEnv, InterpretFrame};
pub use instance::{ElementInstance, KindInstance};
pub use interpretation::{ElementInterp, KindInterp};
pub use registry::{AddOnFactory, ElementRegistry, KindFactory};
pub use session::CompileSession;
