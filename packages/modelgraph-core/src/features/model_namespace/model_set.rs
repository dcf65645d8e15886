//! Sealed namespace
//!
//! Immutable after sealing and freely shared for lookup. Lookup rules:
//! - an undotted name resolves locally, then through inherited sets
//! - a dotted path resolves its first segment the same way, then each further
//!   segment inside the sub-model named by the previous one

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::sync::Arc;

use super::builder::ModelSetBuilder;
use super::component::ModelComponent;
use crate::errors::{NamespaceError, NamespaceResult};
use crate::shared::models::Identity;
use crate::shared::utils::split_first;

#[derive(Debug)]
pub struct ModelSet {
    id: Identity,
    label: String,
    path: String,
    components: IndexMap<String, Arc<ModelComponent>>,
    inherits: Vec<Arc<ModelSet>>,
}

impl ModelSet {
    pub(crate) fn from_parts(
        id: Identity,
        label: String,
        path: String,
        components: IndexMap<String, Arc<ModelComponent>>,
        inherits: Vec<Arc<ModelSet>>,
    ) -> Self {
        Self {
            id,
            label,
            path,
            components,
            inherits,
        }
    }

    /// Sealed empty set
    pub fn empty(label: impl Into<String>) -> Arc<Self> {
        ModelSetBuilder::new(Identity::fresh(), label).seal()
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

    /// Number of components declared directly in this set
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components declared directly in this set, in declaration order
    pub fn components(&self) -> impl Iterator<Item = &Arc<ModelComponent>> {
        self.components.values()
    }

    pub fn inherited(&self) -> &[Arc<ModelSet>] {
        &self.inherits
    }

    /// Local and inherited components, local first, shadowed entries omitted
    pub fn visible_components(&self) -> Vec<Arc<ModelComponent>> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        self.collect_visible(&mut seen, &mut out);
        out
    }

    fn collect_visible(
        &self,
        seen: &mut FxHashSet<String>,
        out: &mut Vec<Arc<ModelComponent>>,
    ) {
        for (name, component) in &self.components {
            if seen.insert(name.clone()) {
                out.push(component.clone());
            }
        }
        for parent in &self.inherits {
            parent.collect_visible(seen, out);
        }
    }

    /// Entry for an undotted name: local first, then inherited
    pub fn get_local(&self, name: &str) -> Option<&Arc<ModelComponent>> {
        self.components
            .get(name)
            .or_else(|| self.inherits.iter().find_map(|p| p.get_local(name)))
    }

    /// Entry at a dotted path
    pub fn get_component(&self, path: &str) -> NamespaceResult<Arc<ModelComponent>> {
        self.get_nested(path, path)
    }

    /// Component declared by the element with identity `source`, searching
    /// sub-models depth-first
    pub fn find_by_source(&self, source: Identity) -> Option<Arc<ModelComponent>> {
        self.components.values().find_map(|c| {
            if c.source == Some(source) {
                Some(c.clone())
            } else {
                c.as_sub_model().and_then(|sub| sub.find_by_source(source))
            }
        })
    }

    fn get_nested(&self, path: &str, full: &str) -> NamespaceResult<Arc<ModelComponent>> {
        let (first, rest) = split_first(path);
        let component = self
            .get_local(first)
            .ok_or_else(|| NamespaceError::not_found(full))?;
        match rest {
            None => Ok(component.clone()),
            Some(rest) => match component.as_sub_model() {
                Some(sub) => sub.get_nested(rest, full),
                None => Err(NamespaceError::not_found_because(
                    full,
                    format!("'{}' is not a model", first),
                )),
            },
        }
    }

    /// Whether components with this owner id belong to this set, its
    /// inherited sets or any nested sub-model
    pub fn owns(&self, model: Identity) -> bool {
        self.id == model
            || self.inherits.iter().any(|p| p.owns(model))
            || self
                .components
                .values()
                .filter_map(|c| c.as_sub_model())
                .any(|sub| sub.owns(model))
    }

    /// Builder for a child scope that sees every entry of `self` without
    /// mutating it; new entries may shadow inherited ones
    pub fn wrap(self: &Arc<Self>, id: Identity, label: impl Into<String>) -> ModelSetBuilder {
        ModelSetBuilder::new(id, label).inheriting(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::value_synth::ConstantValue;
    use crate::shared::models::{ModelShape, Value, ValueType};
    use pretty_assertions::assert_eq;

    fn sample() -> Arc<ModelSet> {
        let mut root = ModelSetBuilder::new(Identity::fresh(), "root");
        root.add_value(
            "x",
            Arc::new(ConstantValue::new(ValueType::Int, Value::Int(5))),
            None,
            None,
        )
        .unwrap();
        root.create_sub_model("m")
            .unwrap()
            .add_value(
                "y",
                Arc::new(ConstantValue::new(ValueType::Int, Value::Int(6))),
                None,
                None,
            )
            .unwrap();
        root.seal()
    }

    #[test]
    fn test_dotted_lookup() {
        let models = sample();
        assert_eq!(models.get_component("m.y").unwrap().name, "y");
        assert_eq!(models.get_component("m").unwrap().shape(), ModelShape::SubModel);
    }

    #[test]
    fn test_dotted_through_value_is_not_found() {
        let models = sample();
        let err = models.get_component("x.y").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Nothing at 'x.y' ('x' is not a model)");
        assert!(models.get_component("q").unwrap_err().is_not_found());
        assert!(models.get_component("m.q").unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_by_source() {
        let element = Identity::fresh();
        let mut root = ModelSetBuilder::new(Identity::fresh(), "root");
        root.create_sub_model("m")
            .unwrap()
            .add_value(
                "w",
                Arc::new(ConstantValue::new(ValueType::Int, Value::Int(1))),
                Some(element),
                None,
            )
            .unwrap();
        let models = root.seal();
        assert_eq!(models.find_by_source(element).unwrap().id.path.as_ref(), "m.w");
        assert!(models.find_by_source(Identity::fresh()).is_none());
    }

    #[test]
    fn test_wrap_inherits_without_mutating() {
        let parent = sample();
        let mut child = parent.wrap(Identity::fresh(), "child");
        child
            .add_value(
                "x",
                Arc::new(ConstantValue::new(ValueType::String, Value::str("shadow"))),
                None,
                None,
            )
            .unwrap();
        child
            .add_value(
                "z",
                Arc::new(ConstantValue::new(ValueType::Int, Value::Int(1))),
                None,
                None,
            )
            .unwrap();
        let child = child.seal();

        assert_eq!(child.get_component("x").unwrap().id.model, child.id());
        assert_eq!(child.get_component("m.y").unwrap().name, "y");
        assert!(parent.get_component("z").is_err());
        assert_eq!(parent.len(), 2);
        let names: Vec<_> = child.visible_components().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["x", "z", "m"]);
        assert!(child.owns(parent.id()));
    }
}
