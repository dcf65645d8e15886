//! Model shapes and instance types
//!
//! A component's *shape* says what kind of live container it is (single value,
//! event stream, collection, ...). Its *instance type* is the shape plus the
//! element type parameters, e.g. `Value<int>` or `Map<string, float>`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::ValueType;

/// Kind of live container a model component produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelShape {
    Value,
    Event,
    Action,
    Collection,
    SortedCollection,
    Set,
    SortedSet,
    Map,
    SortedMap,
    MultiMap,
    /// Nested namespace
    SubModel,
}

impl ModelShape {
    /// Number of element type parameters
    pub fn param_count(&self) -> usize {
        match self {
            ModelShape::SubModel => 0,
            ModelShape::Map | ModelShape::SortedMap | ModelShape::MultiMap => 2,
            _ => 1,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            ModelShape::Collection
                | ModelShape::SortedCollection
                | ModelShape::Set
                | ModelShape::SortedSet
        )
    }

    pub fn is_map(&self) -> bool {
        self.param_count() == 2
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelShape::Value => "Value",
            ModelShape::Event => "Event",
            ModelShape::Action => "Action",
            ModelShape::Collection => "Collection",
            ModelShape::SortedCollection => "SortedCollection",
            ModelShape::Set => "Set",
            ModelShape::SortedSet => "SortedSet",
            ModelShape::Map => "Map",
            ModelShape::SortedMap => "SortedMap",
            ModelShape::MultiMap => "MultiMap",
            ModelShape::SubModel => "Model",
        }
    }

    /// Whether a component of shape `other` may stand where `self` is expected
    pub fn accepts(&self, other: ModelShape) -> bool {
        match (self, other) {
            (a, b) if *a == b => true,
            (ModelShape::Collection, b) => b.is_collection(),
            (ModelShape::Set, ModelShape::SortedSet) => true,
            (ModelShape::Map, ModelShape::SortedMap) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ModelShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape plus element type parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceType {
    pub shape: ModelShape,
    pub params: Vec<ValueType>,
}

impl InstanceType {
    /// Build an instance type, checking the parameter count against the shape
    pub fn new(shape: ModelShape, params: Vec<ValueType>) -> Result<Self, String> {
        if params.len() != shape.param_count() {
            return Err(format!(
                "{} takes {} type parameter(s), got {}",
                shape,
                shape.param_count(),
                params.len()
            ));
        }
        Ok(Self { shape, params })
    }

    pub fn value(ty: ValueType) -> Self {
        Self {
            shape: ModelShape::Value,
            params: vec![ty],
        }
    }

    pub fn event(ty: ValueType) -> Self {
        Self {
            shape: ModelShape::Event,
            params: vec![ty],
        }
    }

    pub fn action(ty: ValueType) -> Self {
        Self {
            shape: ModelShape::Action,
            params: vec![ty],
        }
    }

    pub fn collection(ty: ValueType) -> Self {
        Self {
            shape: ModelShape::Collection,
            params: vec![ty],
        }
    }

    pub fn sorted_collection(ty: ValueType) -> Self {
        Self {
            shape: ModelShape::SortedCollection,
            params: vec![ty],
        }
    }

    pub fn map(key: ValueType, value: ValueType) -> Self {
        Self {
            shape: ModelShape::Map,
            params: vec![key, value],
        }
    }

    pub fn sub_model() -> Self {
        Self {
            shape: ModelShape::SubModel,
            params: Vec::new(),
        }
    }

    /// Element type of a single-parameter shape
    pub fn element_type(&self) -> Option<&ValueType> {
        match self.params.as_slice() {
            [only] => Some(only),
            [_, value] => Some(value),
            _ => None,
        }
    }

    pub fn is_assignable_from(&self, other: &InstanceType) -> bool {
        self.shape.accepts(other.shape)
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.is_assignable_from(b))
    }

    pub fn can_convert_from(&self, other: &InstanceType) -> bool {
        self.shape.accepts(other.shape)
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.can_convert_from(b))
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shape)?;
        if !self.params.is_empty() {
            write!(f, "<")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}
