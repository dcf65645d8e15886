//! Three-phase build and incremental rebuild
//!
//! ```text
//! SchemaNode ──▶ ElementDef ──▶ ElementInterp ──▶ ElementInstance
//!               (CompileSession) (InterpretEnv)    (ModelScope)
//! ```
//!
//! A rebuild reuses the root definition when the new root node has the same
//! type and name, and reconciles everything below it by structure
//! (definitions) and by identity (interpretations and instances).

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{BuildConfig, Validatable};
use crate::errors::{BuildError, BuildResult, Diagnostic, InstantiateResult, InstantiationError};
use crate::features::element::{
    CompileSession, ElementDef, ElementInstance, ElementInterp, ElementRegistry, InterpretEnv,
};
use crate::features::expression::{DefaultExpressionParser, ExpressionParser};
use crate::features::model_namespace::{InterpretedModelSet, ModelScope, ModelSet};
use crate::features::placeholder::DeclarationCache;
use crate::features::reconciliation::SyncStats;
use crate::shared::models::{LiveValue, SchemaNode, Value};

/// Outcome of a successful build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub definitions: SyncStats,
    pub interpretations: SyncStats,
    pub instances: SyncStats,
    pub warnings: Vec<Diagnostic>,
}

impl BuildReport {
    /// No element was created or destroyed in any phase
    pub fn is_stable(&self) -> bool {
        self.definitions.is_stable() && self.interpretations.is_stable() && self.instances.is_stable()
    }
}

#[derive(Debug)]
pub struct Compilation {
    registry: Arc<ElementRegistry>,
    config: Arc<BuildConfig>,
    parser: Arc<dyn ExpressionParser>,
    cache: Arc<DeclarationCache>,
    environment: Arc<InterpretedModelSet>,
    environment_scope: Arc<ModelScope>,
    definition: Option<ElementDef>,
    interpretation: Option<ElementInterp>,
    instance: Option<ElementInstance>,
}

impl Compilation {
    pub fn new(registry: Arc<ElementRegistry>) -> Self {
        let environment = InterpretedModelSet::new(ModelSet::empty("environment"), None);
        Self {
            registry,
            config: Arc::new(BuildConfig::default()),
            parser: Arc::new(DefaultExpressionParser),
            cache: Arc::new(DeclarationCache::new()),
            environment_scope: ModelScope::instantiate(environment.clone(), None),
            environment,
            definition: None,
            interpretation: None,
            instance: None,
        }
    }

    /// Compilation with the stock element kinds
    pub fn standard() -> Self {
        Self::new(Arc::new(ElementRegistry::standard()))
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ExpressionParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Share a declaration cache with other compilations
    pub fn with_cache(mut self, cache: Arc<DeclarationCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Namespace the document is compiled in; required values resolve here
    pub fn with_environment(mut self, models: Arc<ModelSet>) -> Self {
        self.environment = InterpretedModelSet::new(models, None);
        self.environment_scope = ModelScope::instantiate(self.environment.clone(), None);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<DeclarationCache> {
        &self.cache
    }

    pub fn environment_scope(&self) -> &Arc<ModelScope> {
        &self.environment_scope
    }

    pub fn definition(&self) -> Option<&ElementDef> {
        self.definition.as_ref()
    }

    pub fn interpretation(&self) -> Option<&ElementInterp> {
        self.interpretation.as_ref()
    }

    pub fn instance(&self) -> Option<&ElementInstance> {
        self.instance.as_ref()
    }

    /// Scope of the root element, or the environment scope when the root has
    /// no local model
    pub fn root_scope(&self) -> Option<&Arc<ModelScope>> {
        self.instance.as_ref().and_then(ElementInstance::scope)
    }

    /// Current value at a dotted path of the root scope
    pub fn value_at(&self, path: &str) -> InstantiateResult<Value> {
        self.require_root_scope()?.value_at(path)
    }

    /// Satisfy a placeholder of the root scope with the configured default
    /// policy
    pub fn satisfy(&self, path: &str, value: LiveValue) -> InstantiateResult<bool> {
        let scope = self.require_root_scope()?;
        let id = scope.find_id(path)?;
        scope.satisfy(&id, value, self.config.default_satisfy_policy)
    }

    fn require_root_scope(&self) -> InstantiateResult<&Arc<ModelScope>> {
        self.root_scope()
            .ok_or_else(|| InstantiationError::new("Nothing has been built yet"))
    }

    /// Build from scratch, discarding any previous result
    pub fn build(&mut self, node: &dyn SchemaNode) -> BuildResult<BuildReport> {
        self.discard();
        self.rebuild(node)
    }

    /// Bring the built tree in line with `node`, reusing what is unchanged
    pub fn rebuild(&mut self, node: &dyn SchemaNode) -> BuildResult<BuildReport> {
        self.config.validate()?;
        let started = Instant::now();
        let mut report = BuildReport::default();

        // Definition
        let mut session = CompileSession::new(
            self.registry.clone(),
            self.config.clone(),
            self.parser.clone(),
            self.cache.clone(),
        );
        let reuse = self
            .definition
            .as_ref()
            .map_or(false, |def| def.matches_node(node));
        if !reuse {
            self.discard();
            report.definitions.created += 1;
        } else {
            report.definitions.updated += 1;
        }
        let mut definition = match self.definition.take() {
            Some(def) => def,
            None => match ElementDef::create(node, &mut session) {
                Ok(def) => def,
                Err(err) => return Err(BuildError::Compile(vec![err])),
            },
        };
        if let Err(err) = definition.update(node, &mut session) {
            session.report(err);
        }
        report.definitions.merge(tree_sync(&definition, ElementDef::children, ElementDef::last_sync));
        report.warnings = session.take_warnings();
        self.definition = Some(definition);
        if session.has_errors() {
            return Err(BuildError::Compile(session.take_errors()));
        }
        let Some(definition) = self.definition.as_ref() else {
            return Err(BuildError::Compile(Vec::new()));
        };
        debug!(identity = %definition.identity(), "build: definition complete");

        // Interpretation
        let mut env = InterpretEnv::new(self.environment.clone())
            .with_registry(self.registry.clone())
            .with_parser(self.parser.clone())
            .with_config(self.config.clone());
        let mut interpretation = match self.interpretation.take() {
            Some(interp) if interp.identity() == definition.identity() => {
                report.interpretations.updated += 1;
                interp
            }
            _ => {
                report.interpretations.created += 1;
                ElementInterp::new(definition)
            }
        };
        let interpreted = interpretation.update(definition, &mut env);
        report
            .interpretations
            .merge(tree_sync(&interpretation, ElementInterp::children, ElementInterp::last_sync));
        self.interpretation = Some(interpretation);
        interpreted?;
        let Some(interpretation) = self.interpretation.as_ref() else {
            return Err(BuildError::Instantiation(InstantiationError::new("Interpretation is missing")));
        };
        debug!(identity = %interpretation.identity(), "build: interpretation complete");

        // Instance
        let mut instance = match self.instance.take() {
            Some(instance) if instance.identity() == interpretation.identity() => {
                report.instances.updated += 1;
                instance
            }
            _ => {
                report.instances.created += 1;
                ElementInstance::new(interpretation)
            }
        };
        let instantiated = instance.update(interpretation, &self.environment_scope);
        report
            .instances
            .merge(tree_sync(&instance, ElementInstance::children, ElementInstance::last_sync));
        if instantiated.is_ok() {
            instance.instantiated();
        }
        self.instance = Some(instance);
        instantiated?;

        info!(
            definitions = ?report.definitions,
            interpretations = ?report.interpretations,
            instances = ?report.instances,
            warnings = report.warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "build complete"
        );
        Ok(report)
    }

    /// Drop every phase object, destroying interpretations and instances
    fn discard(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            instance.destroy();
        }
        if let Some(mut interpretation) = self.interpretation.take() {
            interpretation.destroy();
        }
        self.definition = None;
    }
}

/// Child reconciliation counts of a whole phase tree
fn tree_sync<T>(root: &T, children: fn(&T) -> &[T], stats: fn(&T) -> SyncStats) -> SyncStats {
    let mut total = stats(root);
    for child in children(root) {
        total.merge(tree_sync(child, children, stats));
    }
    total
}
