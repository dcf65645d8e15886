//! Compiled makers for declared values

use std::sync::Arc;

use crate::errors::{InterpretResult, TypeResolutionError};
use crate::features::element::InterpretEnv;
use crate::features::expression::Expression;
use crate::features::model_namespace::{CompiledValue, ComponentId};
use crate::features::value_synth::{CollectionSynth, EventSynth, SettableSynth, ValueSynth};
use crate::shared::models::{FilePosition, ModelShape, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MakerKind {
    /// Settable value, optionally initialized from an expression
    Settable,
    /// Recomputed from an expression on every read
    Derived,
    Event,
    Collection,
}

impl MakerKind {
    pub fn shape(&self) -> ModelShape {
        match self {
            MakerKind::Settable | MakerKind::Derived => ModelShape::Value,
            MakerKind::Event => ModelShape::Event,
            MakerKind::Collection => ModelShape::Collection,
        }
    }
}

/// Namespace entry for a `value`, `derived`, `event` or `list` element
#[derive(Debug)]
pub struct ValueMaker {
    pub kind: MakerKind,
    pub name: String,
    /// Declared element type, as written
    pub type_text: Option<(String, FilePosition)>,
    pub init: Option<Arc<dyn Expression>>,
}

impl ValueMaker {
    fn declared_type(&self, env: &InterpretEnv) -> InterpretResult<Option<ValueType>> {
        match &self.type_text {
            Some((text, position)) => env
                .resolve_type(text)
                .map(Some)
                .map_err(|err| err.at(position.clone(), text.len())),
            None => Ok(None),
        }
    }

    fn make(&self, env: &mut InterpretEnv) -> InterpretResult<Arc<dyn ValueSynth>> {
        let declared = self.declared_type(env)?;
        match self.kind {
            MakerKind::Settable => {
                let init = match &self.init {
                    Some(init) => Some(init.evaluate(declared.as_ref(), env)?),
                    None => None,
                };
                let ty = match (declared, &init) {
                    (Some(ty), _) => ty,
                    (None, Some(init)) => init.instance_type().element_type().cloned().unwrap_or_default(),
                    (None, None) => return Err(self.untyped()),
                };
                Ok(Arc::new(SettableSynth::new(ty, init)))
            }
            MakerKind::Derived => {
                let init = self.init.as_ref().ok_or_else(|| {
                    TypeResolutionError::new(format!("Derived value '{}' has no expression", self.name))
                })?;
                init.evaluate(declared.as_ref(), env)
            }
            MakerKind::Event => {
                let ty = declared.ok_or_else(|| self.untyped())?;
                Ok(Arc::new(EventSynth::new(ty)))
            }
            MakerKind::Collection => {
                let target = declared.clone().map(ValueType::list);
                let init = match &self.init {
                    Some(init) => Some(init.evaluate(target.as_ref(), env)?),
                    None => None,
                };
                let ty = match (declared, &init) {
                    (Some(ty), _) => ty,
                    (None, Some(init)) => match init.instance_type().element_type() {
                        Some(ValueType::List(element)) => (**element).clone(),
                        Some(other) => other.clone(),
                        None => ValueType::Any,
                    },
                    (None, None) => return Err(self.untyped()),
                };
                Ok(Arc::new(CollectionSynth::new(ty, init.into_iter().collect())))
            }
        }
    }

    fn untyped(&self) -> TypeResolutionError {
        TypeResolutionError::new(format!(
            "Value '{}' needs a type or an initial value",
            self.name
        ))
    }
}

impl CompiledValue for ValueMaker {
    fn shape(&self) -> ModelShape {
        self.kind.shape()
    }

    fn interpret(&self, _id: &ComponentId, env: &mut InterpretEnv) -> InterpretResult<Arc<dyn ValueSynth>> {
        self.make(env)
            .map_err(|err| err.wrap(format!("Could not interpret value '{}'", self.name)))
    }
}
