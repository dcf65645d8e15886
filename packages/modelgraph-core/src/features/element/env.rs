//! Interpretation-phase context
//!
//! [`InterpretEnv`] is passed explicitly through every interpretation call.
//! It holds the innermost interpreted namespace and a stack of frames, one per
//! element currently interpreting. Elements expose values on their frame
//! (their element type, their sort type) so that placeholder type callbacks
//! can read the state of the element that declared them.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::config::BuildConfig;
use crate::errors::{InterpretResult, TypeResolutionError};
use crate::features::element::ElementRegistry;
use crate::features::expression::{DefaultExpressionParser, ExpressionParser};
use crate::features::model_namespace::{ComponentId, InterpretedModelSet, ResolvedComponent};
use crate::features::value_synth::ValueSynth;
use crate::shared::models::{Identity, ValueType};

/// State of one element while it interprets
#[derive(Debug)]
pub struct InterpretFrame {
    pub owner: Identity,
    pub type_name: String,
    exposed: FxHashMap<String, ValueType>,
}

impl InterpretFrame {
    pub fn exposed(&self, key: &str) -> Option<&ValueType> {
        self.exposed.get(key)
    }
}

#[derive(Debug)]
pub struct InterpretEnv {
    models: Arc<InterpretedModelSet>,
    registry: Arc<ElementRegistry>,
    parser: Arc<dyn ExpressionParser>,
    config: Arc<BuildConfig>,
    frames: Vec<InterpretFrame>,
}

impl InterpretEnv {
    pub fn new(models: Arc<InterpretedModelSet>) -> Self {
        Self {
            models,
            registry: Arc::new(ElementRegistry::standard()),
            parser: Arc::new(DefaultExpressionParser),
            config: Arc::new(BuildConfig::default()),
            frames: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<ElementRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ExpressionParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_config(mut self, config: Arc<BuildConfig>) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn parser(&self) -> &Arc<dyn ExpressionParser> {
        &self.parser
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Namespace
    // ═══════════════════════════════════════════════════════════════════════

    /// Innermost interpreted namespace
    pub fn models(&self) -> &Arc<InterpretedModelSet> {
        &self.models
    }

    /// Make `models` the innermost namespace, returning the previous one
    pub fn swap_models(&mut self, models: Arc<InterpretedModelSet>) -> Arc<InterpretedModelSet> {
        std::mem::replace(&mut self.models, models)
    }

    /// Resolve a dotted path through the innermost namespace and its parents
    pub fn resolve(&mut self, path: &str) -> InterpretResult<ResolvedComponent> {
        let models = self.models.clone();
        models.resolve(path, self)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.models.contains_path(path)
    }

    /// Synthesis of a component known by id
    pub fn interpret_id(&mut self, id: &ComponentId) -> InterpretResult<Arc<dyn ValueSynth>> {
        let mut current = Some(self.models.clone());
        while let Some(set) = current {
            if set.owns(id.model) {
                return set.interpret_id(id, self);
            }
            current = set.parent();
        }
        Err(TypeResolutionError::new(format!(
            "Model value '{}' is not visible here",
            id
        )))
    }

    /// Parse a type attribute, including registered named types
    pub fn resolve_type(&self, text: &str) -> InterpretResult<ValueType> {
        self.registry.resolve_type(text).map_err(TypeResolutionError::new)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Frames
    // ═══════════════════════════════════════════════════════════════════════

    pub(crate) fn enter(&mut self, owner: Identity, type_name: &str) {
        self.frames.push(InterpretFrame {
            owner,
            type_name: type_name.to_string(),
            exposed: FxHashMap::default(),
        });
    }

    pub(crate) fn exit(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Frame of an element that is currently interpreting
    pub fn frame(&self, owner: Identity) -> Option<&InterpretFrame> {
        self.frames.iter().rev().find(|f| f.owner == owner)
    }

    /// Publish a type on the frame of `owner`
    pub fn expose(&mut self, owner: Identity, key: &str, ty: ValueType) -> InterpretResult<()> {
        let frame = self
            .frames
            .iter_mut()
            .rev()
            .find(|f| f.owner == owner)
            .ok_or_else(|| TypeResolutionError::new(format!("Element {} is not interpreting", owner)))?;
        frame.exposed.insert(key.to_string(), ty);
        Ok(())
    }

    pub fn exposed(&self, owner: Identity, key: &str) -> Option<&ValueType> {
        self.frame(owner).and_then(|f| f.exposed(key))
    }

    /// Innermost frame exposing `key`
    pub fn nearest_exposed(&self, key: &str) -> Option<&ValueType> {
        self.frames.iter().rev().find_map(|f| f.exposed(key))
    }
}
