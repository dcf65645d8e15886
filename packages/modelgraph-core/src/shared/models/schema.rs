//! Schema node contract
//!
//! The compiler consumes config trees through [`SchemaNode`] read accessors
//! only. Validation of node types and attributes against a toolkit is the
//! job of whatever produces the nodes. [`ConfigNode`] is an in-memory
//! implementation used by embedders that build trees programmatically.

use indexmap::IndexMap;
use std::fmt;

use super::span::FilePosition;

/// Read access to one typed config-tree node
pub trait SchemaNode: fmt::Debug {
    /// Schema type of the node (`value`, `model`, `sort`, ...)
    fn type_name(&self) -> &str;

    /// Add-ons requested explicitly on this node
    fn add_ons(&self) -> Vec<&str>;

    fn attribute(&self, name: &str) -> Option<&str>;

    fn attribute_names(&self) -> Vec<&str>;

    fn attribute_position(&self, name: &str) -> Option<FilePosition>;

    /// Raw text content
    fn value(&self) -> Option<&str>;

    fn value_position(&self) -> Option<FilePosition>;

    fn children(&self) -> Vec<&dyn SchemaNode>;

    fn position(&self) -> FilePosition;
}

/// In-memory config node
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    type_name: String,
    add_ons: Vec<String>,
    attributes: IndexMap<String, (String, FilePosition)>,
    value: Option<(String, FilePosition)>,
    children: Vec<ConfigNode>,
    position: FilePosition,
}

impl ConfigNode {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            add_ons: Vec::new(),
            attributes: IndexMap::new(),
            value: None,
            children: Vec::new(),
            position: FilePosition::unknown(),
        }
    }

    pub fn at(mut self, position: FilePosition) -> Self {
        self.position = position;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn add_on(mut self, name: impl Into<String>) -> Self {
        self.add_ons.push(name.into());
        self
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.value = Some((value.into(), self.position.clone()));
        self
    }

    pub fn child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let position = self.position.clone();
        self.attributes.insert(name.into(), (value.into(), position));
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name).map(|(v, _)| v)
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        self.value = Some((value.into(), self.position.clone()));
    }

    pub fn children_mut(&mut self) -> &mut Vec<ConfigNode> {
        &mut self.children
    }
}

impl SchemaNode for ConfigNode {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn add_ons(&self) -> Vec<&str> {
        self.add_ons.iter().map(String::as_str).collect()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|(v, _)| v.as_str())
    }

    fn attribute_names(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    fn attribute_position(&self, name: &str) -> Option<FilePosition> {
        self.attributes.get(name).map(|(_, p)| p.clone())
    }

    fn value(&self) -> Option<&str> {
        self.value.as_ref().map(|(v, _)| v.as_str())
    }

    fn value_position(&self) -> Option<FilePosition> {
        self.value.as_ref().map(|(_, p)| p.clone())
    }

    fn children(&self) -> Vec<&dyn SchemaNode> {
        self.children.iter().map(|c| c as &dyn SchemaNode).collect()
    }

    fn position(&self) -> FilePosition {
        self.position.clone()
    }
}
