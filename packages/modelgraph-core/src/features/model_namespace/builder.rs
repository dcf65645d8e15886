//! Mutable namespace builder
//!
//! Owned by exactly one in-progress compilation. Names are unique per
//! builder; entries inherited through [`ModelSet::wrap`] may be shadowed.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

use super::component::{CompiledValue, ComponentId, ComponentKind, ModelComponent};
use super::model_set::ModelSet;
use crate::errors::{NamespaceError, NamespaceResult};
use crate::shared::models::{FilePosition, Identity};
use crate::shared::utils::{check_identifier, join_path};

#[derive(Debug)]
enum Entry {
    Sealed(ModelComponent),
    Open {
        builder: ModelSetBuilder,
        source: Option<Identity>,
        position: Option<FilePosition>,
    },
}

/// Namespace under construction
#[derive(Debug)]
pub struct ModelSetBuilder {
    id: Identity,
    label: String,
    path: String,
    check_names: bool,
    entries: IndexMap<String, Entry>,
    inherits: Vec<Arc<ModelSet>>,
}

impl ModelSetBuilder {
    /// Root builder owned by `id` (usually the declaring element's identity)
    pub fn new(id: Identity, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            path: String::new(),
            check_names: false,
            entries: IndexMap::new(),
            inherits: Vec::new(),
        }
    }

    /// Dotted prefix used for component paths of this builder
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_name_checking(mut self, enabled: bool) -> Self {
        self.check_names = enabled;
        self
    }

    pub(crate) fn inheriting(mut self, parent: Arc<ModelSet>) -> Self {
        self.inherits.push(parent);
        self
    }

    pub fn id(&self) -> Identity {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` is declared directly in this builder
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn check_new_name(&self, name: &str) -> NamespaceResult<()> {
        if self.check_names {
            check_identifier(name).map_err(|reason| NamespaceError::IllegalName {
                name: name.to_string(),
                reason,
            })?;
        }
        if self.entries.contains_key(name) {
            return Err(NamespaceError::Conflict {
                name: name.to_string(),
                model: self.display_name(),
            });
        }
        Ok(())
    }

    fn display_name(&self) -> String {
        if self.path.is_empty() {
            self.label.clone()
        } else {
            self.path.clone()
        }
    }

    fn component_id(&self, name: &str) -> ComponentId {
        ComponentId::new(self.id, join_path(&self.path, name))
    }

    /// Register a value component
    pub fn add_value(
        &mut self,
        name: &str,
        value: Arc<dyn CompiledValue>,
        source: Option<Identity>,
        position: Option<FilePosition>,
    ) -> NamespaceResult<ComponentId> {
        self.check_new_name(name)?;
        let id = self.component_id(name);
        debug!(model = %self.display_name(), component = %id, "namespace: add value");
        self.entries.insert(
            name.to_string(),
            Entry::Sealed(ModelComponent {
                id: id.clone(),
                name: name.to_string(),
                kind: ComponentKind::Value(value),
                source,
                position,
            }),
        );
        Ok(id)
    }

    /// Open a named sub-model inside this builder
    pub fn create_sub_model(&mut self, name: &str) -> NamespaceResult<&mut ModelSetBuilder> {
        self.check_new_name(name)?;
        let child = ModelSetBuilder::new(Identity::fresh(), name)
            .with_path(join_path(&self.path, name))
            .with_name_checking(self.check_names);
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert(Entry::Open {
                builder: child,
                source: None,
                position: None,
            });
        match entry {
            Entry::Open { builder, .. } => Ok(builder),
            Entry::Sealed(_) => Err(NamespaceError::Conflict {
                name: name.to_string(),
                model: self.label.clone(),
            }),
        }
    }

    /// Register an already sealed sub-model
    pub fn add_sub_model(
        &mut self,
        name: &str,
        model: Arc<ModelSet>,
        source: Option<Identity>,
        position: Option<FilePosition>,
    ) -> NamespaceResult<ComponentId> {
        self.check_new_name(name)?;
        let id = self.component_id(name);
        debug!(model = %self.display_name(), component = %id, "namespace: add sub-model");
        self.entries.insert(
            name.to_string(),
            Entry::Sealed(ModelComponent {
                id: id.clone(),
                name: name.to_string(),
                kind: ComponentKind::SubModel(model),
                source,
                position,
            }),
        );
        Ok(id)
    }

    /// Freeze into an immutable, shareable view
    pub fn seal(self) -> Arc<ModelSet> {
        let id = self.id;
        let path = self.path.clone();
        let components = self
            .entries
            .into_iter()
            .map(|(name, entry)| {
                let component = match entry {
                    Entry::Sealed(component) => component,
                    Entry::Open {
                        builder,
                        source,
                        position,
                    } => ModelComponent {
                        id: ComponentId::new(id, join_path(&path, &name)),
                        name: name.clone(),
                        kind: ComponentKind::SubModel(builder.seal()),
                        source,
                        position,
                    },
                };
                (name, Arc::new(component))
            })
            .collect();
        debug!(model = %self.label, "namespace: sealed");
        Arc::new(ModelSet::from_parts(
            self.id,
            self.label,
            self.path,
            components,
            self.inherits,
        ))
    }
}
