//! Element kinds and add-on capabilities
//!
//! The registry maps schema node types to element kinds and add-on names to
//! add-on factories. Kinds may extend another kind, inheriting its implied
//! add-ons and its element-value declarations. Add-ons declare the add-ons
//! they require; [`ElementRegistry::add_ons_for`] orders them so that
//! requirements come first.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;

use super::definition::KindDef;
use crate::errors::{CompileError, CompileResult};
use crate::features::addons::{
    AddOnDef, ElementModelDef, LocalModelDef, NamedDef, RequiredModelsDef, TypedDef, ELEMENT_MODEL,
    EXT_VALUE_TYPE, LOCAL_MODEL, NAMED, REQUIRED_MODELS, TYPED,
};
use crate::features::elements::{
    ExtValueDef, GroupDef, ListDef, ModelDef, ValueDef, DERIVED_TYPE, EVENT_TYPE, GROUP_TYPE, LIST_TYPE,
    MODELS_TYPE, MODEL_TYPE, REQUIRED_TYPE, VALUE_TYPE,
};
use crate::features::placeholder::{DeclarationCache, ElementValueDecl, ElementValueSpec};
use crate::features::sort::{SortDef, SORT_BY_TYPE, SORT_TYPE};
use crate::shared::models::{ModelShape, ValueType};

pub type KindFactory = Arc<dyn Fn() -> Box<dyn KindDef> + Send + Sync>;
pub type AddOnFactory = Arc<dyn Fn() -> Box<dyn AddOnDef> + Send + Sync>;

struct KindEntry {
    extends: Option<String>,
    add_ons: Vec<String>,
    factory: KindFactory,
}

struct AddOnEntry {
    requires: Vec<String>,
    factory: AddOnFactory,
}

#[derive(Default)]
pub struct ElementRegistry {
    kinds: FxHashMap<String, KindEntry>,
    add_ons: FxHashMap<String, AddOnEntry>,
    element_values: FxHashMap<String, Vec<ElementValueSpec>>,
    types: FxHashMap<String, ValueType>,
}

impl fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.kinds.keys().collect();
        kinds.sort();
        let mut add_ons: Vec<_> = self.add_ons.keys().collect();
        add_ons.sort();
        f.debug_struct("ElementRegistry")
            .field("kinds", &kinds)
            .field("add_ons", &add_ons)
            .field("types", &self.types.len())
            .finish()
    }
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element kind for schema type `name`
    pub fn register_kind<F>(&mut self, name: &str, extends: Option<&str>, add_ons: &[&str], factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn KindDef> + Send + Sync + 'static,
    {
        self.kinds.insert(
            name.to_string(),
            KindEntry {
                extends: extends.map(str::to_string),
                add_ons: add_ons.iter().map(|s| s.to_string()).collect(),
                factory: Arc::new(factory),
            },
        );
        self
    }

    pub fn register_add_on<F>(&mut self, name: &str, requires: &[&str], factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn AddOnDef> + Send + Sync + 'static,
    {
        self.add_ons.insert(
            name.to_string(),
            AddOnEntry {
                requires: requires.iter().map(|s| s.to_string()).collect(),
                factory: Arc::new(factory),
            },
        );
        self
    }

    /// Declare an element-scoped placeholder on schema type `type_name`
    pub fn declare_element_value(&mut self, type_name: &str, spec: ElementValueSpec) -> &mut Self {
        self.element_values
            .entry(type_name.to_string())
            .or_default()
            .push(spec);
        self
    }

    /// Make a named record or custom type usable in `type` attributes
    pub fn register_type(&mut self, name: &str, ty: ValueType) -> &mut Self {
        self.types.insert(name.to_string(), ty);
        self
    }

    pub fn resolve_type(&self, text: &str) -> Result<ValueType, String> {
        ValueType::parse_with(text, &|name| self.types.get(name).cloned())
    }

    pub fn knows(&self, type_name: &str) -> bool {
        self.kinds.contains_key(type_name)
    }

    pub fn create_kind(&self, type_name: &str) -> CompileResult<Box<dyn KindDef>> {
        self.kinds
            .get(type_name)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| CompileError::new(format!("Unknown element type '{}'", type_name)))
    }

    /// `type_name` followed by the kinds it extends, nearest first
    fn lineage(&self, type_name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.kinds.get_key_value(type_name);
        while let Some((name, entry)) = current {
            if chain.contains(&name.as_str()) {
                break;
            }
            chain.push(name.as_str());
            current = entry
                .extends
                .as_deref()
                .and_then(|parent| self.kinds.get_key_value(parent));
        }
        chain
    }

    /// Whether `type_name` is `ancestor` or extends it
    pub fn is_a(&self, type_name: &str, ancestor: &str) -> bool {
        self.lineage(type_name).contains(&ancestor)
    }

    /// Add-ons of an element: those implied by its kind lineage, then those
    /// requested on the node, ordered so that requirements come first
    pub fn add_ons_for(&self, type_name: &str, explicit: &[&str]) -> CompileResult<Vec<String>> {
        let mut requested: Vec<&str> = Vec::new();
        for kind in self.lineage(type_name).into_iter().rev() {
            if let Some(entry) = self.kinds.get(kind) {
                requested.extend(entry.add_ons.iter().map(String::as_str));
            }
        }
        requested.extend(explicit.iter().copied());

        let mut ordered = Vec::new();
        let mut done = FxHashSet::default();
        let mut visiting = Vec::new();
        for name in requested {
            self.visit_add_on(name, &mut visiting, &mut done, &mut ordered)?;
        }
        Ok(ordered)
    }

    fn visit_add_on<'a>(
        &'a self,
        name: &'a str,
        visiting: &mut Vec<&'a str>,
        done: &mut FxHashSet<&'a str>,
        ordered: &mut Vec<String>,
    ) -> CompileResult<()> {
        if done.contains(name) {
            return Ok(());
        }
        if visiting.contains(&name) {
            return Err(CompileError::new(format!(
                "Add-on dependency cycle through '{}'",
                name
            )));
        }
        let entry = self
            .add_ons
            .get(name)
            .ok_or_else(|| CompileError::new(format!("Unknown add-on '{}'", name)))?;
        visiting.push(name);
        for required in &entry.requires {
            self.visit_add_on(required, visiting, done, ordered)?;
        }
        visiting.pop();
        done.insert(name);
        ordered.push(name.to_string());
        Ok(())
    }

    pub fn create_add_on(&self, name: &str) -> CompileResult<Box<dyn AddOnDef>> {
        self.add_ons
            .get(name)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| CompileError::new(format!("Unknown add-on '{}'", name)))
    }

    /// Element-value declarations of `type_name`, inherited ones included.
    /// A declaration with the same key as an inherited one replaces it.
    pub fn element_value_decls(
        &self,
        type_name: &str,
        cache: &DeclarationCache,
    ) -> CompileResult<Arc<Vec<ElementValueDecl>>> {
        cache.get_or_compute(type_name, || {
            let mut decls: Vec<ElementValueDecl> = Vec::new();
            for kind in self.lineage(type_name).into_iter().rev() {
                for spec in self.element_values.get(kind).into_iter().flatten() {
                    let decl = ElementValueDecl {
                        spec: spec.clone(),
                        declared_by: kind.to_string(),
                    };
                    match decls.iter().position(|d| d.spec.key() == spec.key()) {
                        Some(index) => decls[index] = decl,
                        None => decls.push(decl),
                    }
                }
            }
            Ok(decls)
        })
    }

    /// Registry with every stock element kind and add-on
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register_add_on(NAMED, &[], || Box::new(NamedDef::default()))
            .register_add_on(TYPED, &[], || Box::new(TypedDef::default()))
            .register_add_on(LOCAL_MODEL, &[], || Box::new(LocalModelDef::default()))
            .register_add_on(ELEMENT_MODEL, &[LOCAL_MODEL], || Box::new(ElementModelDef::default()))
            .register_add_on(REQUIRED_MODELS, &[LOCAL_MODEL], || Box::new(RequiredModelsDef::default()));

        registry
            .register_kind(GROUP_TYPE, None, &[], || Box::new(GroupDef::default()))
            .register_kind(MODELS_TYPE, Some(GROUP_TYPE), &[LOCAL_MODEL], || Box::new(GroupDef::default()))
            .register_kind(REQUIRED_TYPE, Some(GROUP_TYPE), &[REQUIRED_MODELS], || Box::new(GroupDef::default()))
            .register_kind(EXT_VALUE_TYPE, None, &[NAMED, TYPED], || Box::new(ExtValueDef))
            .register_kind(MODEL_TYPE, None, &[NAMED], || Box::new(ModelDef::default()))
            .register_kind(VALUE_TYPE, None, &[NAMED, TYPED], || Box::new(ValueDef::settable()))
            .register_kind(DERIVED_TYPE, None, &[NAMED, TYPED], || Box::new(ValueDef::derived()))
            .register_kind(EVENT_TYPE, None, &[NAMED, TYPED], || Box::new(ValueDef::event()))
            .register_kind(LIST_TYPE, None, &[NAMED, TYPED], || Box::new(ListDef::default()))
            .register_kind(SORT_TYPE, None, &[LOCAL_MODEL, ELEMENT_MODEL], || Box::new(SortDef::default()))
            .register_kind(SORT_BY_TYPE, Some(SORT_TYPE), &[], || Box::new(SortDef::default()));

        registry
            .declare_element_value(SORT_TYPE, ElementValueSpec::from_attribute("sort-value-as", ModelShape::Value))
            .declare_element_value(
                SORT_TYPE,
                ElementValueSpec::from_attribute("sort-compare-value-as", ModelShape::Value),
            );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::elements::GroupDef;

    #[test]
    fn test_lineage_and_is_a() {
        let registry = ElementRegistry::standard();
        assert!(registry.is_a(SORT_BY_TYPE, SORT_TYPE));
        assert!(registry.is_a(MODELS_TYPE, GROUP_TYPE));
        assert!(!registry.is_a(SORT_TYPE, SORT_BY_TYPE));
        assert!(!registry.is_a("unknown", GROUP_TYPE));
    }

    #[test]
    fn test_add_ons_requirements_first() {
        let registry = ElementRegistry::standard();
        let names = registry.add_ons_for(GROUP_TYPE, &[ELEMENT_MODEL]).unwrap();
        assert_eq!(names, vec![LOCAL_MODEL, ELEMENT_MODEL]);
        let names = registry.add_ons_for(SORT_BY_TYPE, &[]).unwrap();
        assert_eq!(names, vec![LOCAL_MODEL, ELEMENT_MODEL]);
    }

    #[test]
    fn test_add_on_cycle_rejected() {
        let mut registry = ElementRegistry::new();
        registry
            .register_add_on("a", &["b"], || Box::new(NamedDef::default()))
            .register_add_on("b", &["a"], || Box::new(NamedDef::default()))
            .register_kind("x", None, &["a"], || Box::new(GroupDef::default()));
        let err = registry.add_ons_for("x", &[]).unwrap_err();
        assert!(err.message().contains("cycle"));
        assert!(registry.add_ons_for("y", &["missing"]).is_err());
    }

    #[test]
    fn test_element_values_inherited_once() {
        let registry = ElementRegistry::standard();
        let cache = DeclarationCache::new();
        let decls = registry.element_value_decls(SORT_BY_TYPE, &cache).unwrap();
        let keys: Vec<_> = decls.iter().map(|d| d.spec.key()).collect();
        assert_eq!(keys, vec!["sort-value-as", "sort-compare-value-as"]);
        assert!(decls.iter().all(|d| d.declared_by == SORT_TYPE));
        registry.element_value_decls(SORT_BY_TYPE, &cache).unwrap();
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn test_named_types() {
        let mut registry = ElementRegistry::standard();
        registry.register_type("Money", ValueType::custom("Money", true));
        assert_eq!(registry.resolve_type("list<Money>").unwrap(), ValueType::list(ValueType::custom("Money", true)));
        assert!(registry.resolve_type("Nope").is_err());
        assert!(registry.create_kind("nope").is_err());
    }
}
