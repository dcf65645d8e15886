//! Cross-document declaration cache
//!
//! Element-value declarations are derived from schema types and are the same
//! for every document using the type. Pipelines compiling documents in
//! parallel share one cache; each schema type is computed at most once no
//! matter how many threads ask for it at the same time.

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::errors::CompileResult;
use crate::shared::models::{ModelShape, ValueType};

/// Schema-level declaration of an element-scoped placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct ElementValueSpec {
    /// Attribute of the element whose text names the value
    pub name_attribute: Option<String>,
    /// Name used when there is no naming attribute
    pub fixed_name: Option<String>,
    pub shape: ModelShape,
    /// Declared element type; `None` defers it to the owning element
    pub value_type: Option<ValueType>,
}

impl ElementValueSpec {
    pub fn from_attribute(attribute: impl Into<String>, shape: ModelShape) -> Self {
        Self {
            name_attribute: Some(attribute.into()),
            fixed_name: None,
            shape,
            value_type: None,
        }
    }

    pub fn fixed(name: impl Into<String>, shape: ModelShape) -> Self {
        Self {
            name_attribute: None,
            fixed_name: Some(name.into()),
            shape,
            value_type: None,
        }
    }

    pub fn with_type(mut self, ty: ValueType) -> Self {
        self.value_type = Some(ty);
        self
    }

    /// Key under which overriding declarations replace inherited ones
    pub fn key(&self) -> &str {
        self.name_attribute
            .as_deref()
            .or(self.fixed_name.as_deref())
            .unwrap_or("")
    }
}

/// Declaration resolved for one schema type
#[derive(Debug, Clone, PartialEq)]
pub struct ElementValueDecl {
    pub spec: ElementValueSpec,
    /// Schema type the spec was declared on (the type itself or an ancestor)
    pub declared_by: String,
}

type Slot = Arc<OnceCell<Arc<Vec<ElementValueDecl>>>>;

#[derive(Debug, Default)]
pub struct DeclarationCache {
    entries: DashMap<String, Slot>,
    computations: AtomicUsize,
}

impl DeclarationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declarations for `type_name`, computing them on first request
    pub fn get_or_compute<F>(&self, type_name: &str, compute: F) -> CompileResult<Arc<Vec<ElementValueDecl>>>
    where
        F: FnOnce() -> CompileResult<Vec<ElementValueDecl>>,
    {
        if let Some(slot) = self.entries.get(type_name) {
            if let Some(decls) = slot.value().get() {
                return Ok(decls.clone());
            }
        }

        // Clone the cell out so the shard lock is not held while computing
        let slot = self
            .entries
            .entry(type_name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        slot.get_or_try_init(|| {
            self.computations.fetch_add(1, Ordering::SeqCst);
            debug!(type_name, "declaration cache: computing");
            compute().map(Arc::new)
        })
        .map(Arc::clone)
    }

    /// Number of computations performed so far
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CompileError;
    use std::sync::Barrier;

    fn decls(type_name: &str) -> Vec<ElementValueDecl> {
        vec![ElementValueDecl {
            spec: ElementValueSpec::from_attribute("sort-value-as", ModelShape::Value),
            declared_by: type_name.to_string(),
        }]
    }

    #[test]
    fn test_computes_once_per_type() {
        let cache = DeclarationCache::new();
        let first = cache.get_or_compute("sort", || Ok(decls("sort"))).unwrap();
        let second = cache
            .get_or_compute("sort", || panic!("must not recompute"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        cache.get_or_compute("sort-by", || Ok(decls("sort"))).unwrap();
        assert_eq!(cache.computations(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_computation_is_retried() {
        let cache = DeclarationCache::new();
        assert!(cache
            .get_or_compute("sort", || Err(CompileError::new("broken schema")))
            .is_err());
        assert!(cache.get_or_compute("sort", || Ok(decls("sort"))).is_ok());
        assert_eq!(cache.computations(), 2);
    }

    #[test]
    fn test_concurrent_requests_compute_once() {
        let cache = DeclarationCache::new();
        let barrier = Barrier::new(8);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    barrier.wait();
                    let result = cache.get_or_compute("sort", || {
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        Ok(decls("sort"))
                    });
                    assert_eq!(result.unwrap().len(), 1);
                });
            }
        });
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn test_spec_key() {
        assert_eq!(
            ElementValueSpec::from_attribute("sort-value-as", ModelShape::Value).key(),
            "sort-value-as"
        );
        assert_eq!(ElementValueSpec::fixed("row", ModelShape::Value).key(), "row");
    }
}
