//! Definition-phase context
//!
//! One [`CompileSession`] per definition pass. It carries the shared
//! collaborators (registry, config, expression parser, declaration cache),
//! collects diagnostics so siblings keep compiling after an error, and owns
//! the stack of namespace frames that model-declaring elements write into.

use std::sync::Arc;
use tracing::warn;

use crate::config::BuildConfig;
use crate::errors::{CompileError, CompileResult, Diagnostic};
use crate::features::element::ElementRegistry;
use crate::features::expression::{Expression, ExpressionParser};
use crate::features::model_namespace::ModelSetBuilder;
use crate::features::placeholder::DeclarationCache;
use crate::shared::models::{FilePosition, Identity};
use crate::shared::utils::{join_path, PathStack};

/// Namespace being filled by one element's subtree
#[derive(Debug)]
struct ModelFrame {
    owner: Identity,
    label: String,
    path: String,
    /// Created on first write
    builder: Option<ModelSetBuilder>,
}

#[derive(Debug)]
pub struct CompileSession {
    registry: Arc<ElementRegistry>,
    config: Arc<BuildConfig>,
    parser: Arc<dyn ExpressionParser>,
    cache: Arc<DeclarationCache>,
    errors: Vec<CompileError>,
    warnings: Vec<Diagnostic>,
    frames: Vec<ModelFrame>,
    elements: PathStack,
}

impl CompileSession {
    pub fn new(
        registry: Arc<ElementRegistry>,
        config: Arc<BuildConfig>,
        parser: Arc<dyn ExpressionParser>,
        cache: Arc<DeclarationCache>,
    ) -> Self {
        Self {
            registry,
            config,
            parser,
            cache,
            errors: Vec::new(),
            warnings: Vec::new(),
            frames: Vec::new(),
            elements: PathStack::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ElementRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<DeclarationCache> {
        &self.cache
    }

    pub fn parse_expression(
        &self,
        text: &str,
        position: Option<FilePosition>,
    ) -> CompileResult<Arc<dyn Expression>> {
        self.parser.parse(text, position)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Diagnostics
    // ═══════════════════════════════════════════════════════════════════════

    /// Record an error; the pass continues with sibling elements
    pub fn report(&mut self, error: CompileError) {
        if self.errors.len() < self.config.max_diagnostics {
            self.errors.push(error);
        }
    }

    /// Record a warning, or an error under `warnings_as_errors`
    pub fn warn(&mut self, message: impl Into<String>, position: Option<FilePosition>) {
        let message = message.into();
        if self.config.warnings_as_errors {
            self.report(CompileError::new(message).at_opt(position));
            return;
        }
        warn!(element = %self.elements.path(), "{}", message);
        self.warnings.push(Diagnostic::warning(message, position));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn take_errors(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.errors)
    }

    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Element nesting
    // ═══════════════════════════════════════════════════════════════════════

    pub(crate) fn enter(&mut self, label: &str, position: &FilePosition) -> CompileResult<()> {
        if self.elements.depth() >= self.config.max_depth {
            return Err(CompileError::new(format!(
                "Element nesting exceeds the maximum depth of {}",
                self.config.max_depth
            ))
            .at(position.clone(), 0));
        }
        self.elements.push(label);
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.elements.pop();
    }

    /// Dotted path of the elements being defined, for logging
    pub fn element_path(&self) -> String {
        self.elements.path()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Namespace frames
    // ═══════════════════════════════════════════════════════════════════════

    /// Open a frame whose builder is created on first write
    pub fn push_lazy_frame(&mut self, owner: Identity, label: impl Into<String>) {
        self.frames.push(ModelFrame {
            owner,
            label: label.into(),
            path: String::new(),
            builder: None,
        });
    }

    /// Open a frame for a named sub-model of the current frame
    pub fn push_sub_model_frame(&mut self, owner: Identity, name: &str) {
        let path = self
            .frames
            .last()
            .map(|f| join_path(&f.path, name))
            .unwrap_or_else(|| name.to_string());
        let builder = ModelSetBuilder::new(owner, name)
            .with_path(path.clone())
            .with_name_checking(self.config.check_names);
        self.frames.push(ModelFrame {
            owner,
            label: name.to_string(),
            path,
            builder: Some(builder),
        });
    }

    /// Close the frame opened by `owner`, returning its builder if anything
    /// was written
    pub fn pop_frame(&mut self, owner: Identity) -> CompileResult<Option<ModelSetBuilder>> {
        match self.frames.last() {
            Some(frame) if frame.owner == owner => {}
            Some(frame) => {
                return Err(CompileError::new(format!(
                    "Model frame '{}' closed out of order",
                    frame.label
                )))
            }
            None => return Err(CompileError::new("No model frame to close")),
        }
        Ok(self.frames.pop().and_then(|f| f.builder))
    }

    /// Builder of the innermost frame, created if needed
    pub fn builder_mut(&mut self) -> CompileResult<&mut ModelSetBuilder> {
        let check_names = self.config.check_names;
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| CompileError::new("No model is available to declare values in"))?;
        let ModelFrame {
            owner,
            label,
            path,
            builder,
        } = frame;
        Ok(builder.get_or_insert_with(|| {
            ModelSetBuilder::new(*owner, label.clone())
                .with_path(path.clone())
                .with_name_checking(check_names)
        }))
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop frames left open by a failed element
    pub(crate) fn truncate_frames(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::expression::DefaultExpressionParser;
    use crate::features::value_synth::ConstantValue;
    use crate::shared::models::{Value, ValueType};

    fn session(config: BuildConfig) -> CompileSession {
        CompileSession::new(
            Arc::new(ElementRegistry::standard()),
            Arc::new(config),
            Arc::new(DefaultExpressionParser),
            Arc::new(DeclarationCache::new()),
        )
    }

    #[test]
    fn test_lazy_frame_without_writes_yields_nothing() {
        let mut s = session(BuildConfig::default());
        let owner = Identity::fresh();
        s.push_lazy_frame(owner, "local");
        assert!(s.pop_frame(owner).unwrap().is_none());
    }

    #[test]
    fn test_writes_go_to_innermost_frame() {
        let mut s = session(BuildConfig::default());
        let outer = Identity::fresh();
        let inner = Identity::fresh();
        s.push_lazy_frame(outer, "local");
        s.push_sub_model_frame(inner, "m");
        let id = s
            .builder_mut()
            .unwrap()
            .add_value("y", Arc::new(ConstantValue::new(ValueType::Int, Value::Int(1))), None, None)
            .unwrap();
        assert_eq!(id.path.as_ref(), "m.y");
        assert!(s.pop_frame(outer).is_err());
        assert_eq!(s.pop_frame(inner).unwrap().unwrap().len(), 1);
        assert!(s.pop_frame(outer).unwrap().is_none());
    }

    #[test]
    fn test_warnings_promoted() {
        let mut s = session(BuildConfig::default().with_warnings_as_errors(true));
        s.warn("unused", None);
        assert!(s.warnings().is_empty());
        assert_eq!(s.errors().len(), 1);
    }

    #[test]
    fn test_max_diagnostics() {
        let mut config = BuildConfig::default();
        config.max_diagnostics = 2;
        let mut s = session(config);
        for i in 0..5 {
            s.report(CompileError::new(format!("e{}", i)));
        }
        assert_eq!(s.take_errors().len(), 2);
        assert!(!s.has_errors());
    }

    #[test]
    fn test_depth_limit() {
        let mut s = session(BuildConfig::default().with_max_depth(2));
        let pos = FilePosition::unknown();
        s.enter("a", &pos).unwrap();
        s.enter("b", &pos).unwrap();
        assert!(s.enter("c", &pos).is_err());
        assert_eq!(s.element_path(), "a.b");
    }
}
