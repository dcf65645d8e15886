//! Value Synthesis
//!
//! A [`ValueSynth`] is the type-resolved form of a model component: it knows
//! its [`InstanceType`] and produces a live value for a runtime scope.
//!
//! Stateful syntheses (settable values, events, collections) are cached by
//! the scope; derived ones are recomputed on every read so they always
//! reflect their inputs.

mod constant;
mod containers;
mod reference;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub use constant::{ConstantSynth, ConstantValue};
pub use containers::{CollectionSynth, EventSynth, SettableSynth, SubModelSynth};
pub use reference::{ComponentRef, ConvertSynth};

use crate::errors::InstantiateResult;
use crate::features::model_namespace::{ComponentId, ModelScope};
use crate::features::placeholder::PlaceholderSynth;
use crate::shared::models::{InstanceType, LiveValue, Value};

pub trait ValueSynth: Send + Sync + fmt::Debug + 'static {
    fn instance_type(&self) -> &InstanceType;

    /// Live value for `scope`
    fn get(&self, scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue>;

    /// Plain value currently held for `scope`
    fn current(&self, scope: &Arc<ModelScope>) -> InstantiateResult<Value> {
        Ok(self.get(scope)?.current())
    }

    /// Whether the scope must create the value once and keep it
    fn is_stateful(&self) -> bool {
        false
    }

    /// Components this synthesis reads
    fn components(&self) -> Vec<ComponentId> {
        Vec::new()
    }

    fn as_placeholder(&self) -> Option<&PlaceholderSynth> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}
