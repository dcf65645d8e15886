//! Model components
//!
//! A component is one named entry of a namespace. Its compiled form is a
//! [`CompiledValue`] (a maker that turns into a typed [`ValueSynth`] at
//! interpretation) or a nested [`ModelSet`].

use std::fmt;
use std::sync::Arc;

use super::model_set::ModelSet;
use crate::errors::InterpretResult;
use crate::features::element::InterpretEnv;
use crate::features::placeholder::PlaceholderValue;
use crate::features::value_synth::ValueSynth;
use crate::shared::models::{FilePosition, Identity, ModelShape};

/// Address of a component: owning model plus dotted path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    pub model: Identity,
    pub path: Arc<str>,
}

impl ComponentId {
    pub fn new(model: Identity, path: impl Into<Arc<str>>) -> Self {
        Self {
            model,
            path: path.into(),
        }
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Compiled value maker
pub trait CompiledValue: Send + Sync + fmt::Debug {
    /// Shape known at definition time
    fn shape(&self) -> ModelShape;

    /// Resolve types and produce the synthesis for `id`
    fn interpret(&self, id: &ComponentId, env: &mut InterpretEnv) -> InterpretResult<Arc<dyn ValueSynth>>;

    fn as_placeholder(&self) -> Option<&PlaceholderValue> {
        None
    }
}

#[derive(Debug, Clone)]
pub enum ComponentKind {
    Value(Arc<dyn CompiledValue>),
    SubModel(Arc<ModelSet>),
}

/// Sealed namespace entry
#[derive(Debug, Clone)]
pub struct ModelComponent {
    pub id: ComponentId,
    pub name: String,
    pub kind: ComponentKind,
    /// Identity of the element that declared it
    pub source: Option<Identity>,
    pub position: Option<FilePosition>,
}

impl ModelComponent {
    pub fn shape(&self) -> ModelShape {
        match &self.kind {
            ComponentKind::Value(v) => v.shape(),
            ComponentKind::SubModel(_) => ModelShape::SubModel,
        }
    }

    pub fn as_sub_model(&self) -> Option<&Arc<ModelSet>> {
        match &self.kind {
            ComponentKind::SubModel(m) => Some(m),
            ComponentKind::Value(_) => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&PlaceholderValue> {
        match &self.kind {
            ComponentKind::Value(v) => v.as_placeholder(),
            ComponentKind::SubModel(_) => None,
        }
    }
}
