//! Element types and plain values
//!
//! [`ValueType`] is the element type carried by a model component
//! (`Value<int>`, `Event<string>`, ...). [`Value`] is the plain data that flows
//! through live containers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record type: named structure with ordered fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<(String, ValueType)>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    pub fn field_type(&self, name: &str) -> Option<&ValueType> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }
}

/// Element type of a model component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Top type; accepts every value
    Any,
    Bool,
    Int,
    Float,
    String,
    List(Box<ValueType>),
    Record(RecordType),
    /// Embedder-supplied type, opaque to the compiler
    Custom { name: String, ordered: bool },
}

impl ValueType {
    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn custom(name: impl Into<String>, ordered: bool) -> Self {
        ValueType::Custom {
            name: name.into(),
            ordered,
        }
    }

    /// Parse a type attribute (`int`, `string`, `list<float>`, ...)
    ///
    /// Names that are not built in are handed to `resolve_named`, which is how
    /// embedder record and custom types become visible.
    pub fn parse_with<F>(text: &str, resolve_named: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<ValueType>,
    {
        let text = text.trim();
        if let Some(inner) = text
            .strip_prefix("list<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Ok(ValueType::list(Self::parse_with(inner, resolve_named)?));
        }
        match text {
            "any" => Ok(ValueType::Any),
            "bool" | "boolean" => Ok(ValueType::Bool),
            "int" | "integer" | "long" => Ok(ValueType::Int),
            "float" | "double" => Ok(ValueType::Float),
            "string" => Ok(ValueType::String),
            "" => Err("Empty type".to_string()),
            other => resolve_named(other).ok_or_else(|| format!("Unrecognized type '{}'", other)),
        }
    }

    /// Parse a built-in type name
    pub fn parse(text: &str) -> Result<Self, String> {
        Self::parse_with(text, &|_| None)
    }

    /// Whether a value of type `other` can be used where `self` is expected
    /// without conversion
    pub fn is_assignable_from(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Any, _) => true,
            (ValueType::List(a), ValueType::List(b)) => a.is_assignable_from(b),
            (a, b) => a == b,
        }
    }

    /// Whether a value of type `other` can be converted into `self`
    pub fn can_convert_from(&self, other: &ValueType) -> bool {
        if self.is_assignable_from(other) {
            return true;
        }
        match (self, other) {
            (ValueType::Float, ValueType::Int) => true,
            (ValueType::String, ValueType::Bool | ValueType::Int | ValueType::Float) => true,
            (ValueType::List(a), ValueType::List(b)) => a.can_convert_from(b),
            _ => false,
        }
    }

    /// Whether values of this type have a natural ordering
    pub fn has_natural_order(&self) -> bool {
        match self {
            ValueType::Bool | ValueType::Int | ValueType::Float | ValueType::String => true,
            ValueType::Custom { ordered, .. } => *ordered,
            ValueType::Any | ValueType::List(_) | ValueType::Record(_) => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }
}

impl Default for ValueType {
    fn default() -> Self {
        ValueType::Any
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::String => write!(f, "string"),
            ValueType::List(inner) => write!(f, "list<{}>", inner),
            ValueType::Record(record) => write!(f, "{}", record.name),
            ValueType::Custom { name, .. } => write!(f, "{}", name),
        }
    }
}

/// Plain data value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Record {
        type_name: String,
        fields: IndexMap<String, Value>,
    },
}

impl Value {
    pub fn str(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    pub fn record<I, K>(type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Record {
            type_name: type_name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Whether this value can be stored in a component of type `ty`
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (ty, self) {
            (_, Value::Null) | (ValueType::Any, _) => true,
            (ValueType::Bool, Value::Bool(_))
            | (ValueType::Int, Value::Int(_))
            | (ValueType::Float, Value::Float(_))
            | (ValueType::String, Value::Str(_)) => true,
            (ValueType::List(inner), Value::List(items)) => {
                items.iter().all(|item| item.conforms_to(inner))
            }
            (ValueType::Record(record), Value::Record { type_name, .. }) => {
                &record.name == type_name
            }
            (ValueType::Custom { .. }, Value::Record { type_name, .. }) => {
                type_name == &ty.to_string()
            }
            _ => false,
        }
    }

    /// Convert this value for storage in a component of type `target`
    pub fn convert_to(&self, target: &ValueType) -> Result<Value, String> {
        if self.conforms_to(target) {
            return Ok(self.clone());
        }
        match (target, self) {
            (ValueType::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
            (ValueType::String, Value::Bool(_) | Value::Int(_) | Value::Float(_)) => {
                Ok(Value::Str(self.to_string()))
            }
            (ValueType::List(inner), Value::List(items)) => items
                .iter()
                .map(|item| item.convert_to(inner))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            _ => Err(format!("Cannot convert {} to {}", self, target)),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record { type_name, fields } => {
                write!(f, "{}{{", type_name)?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builtin_types() {
        assert_eq!(ValueType::parse("int").unwrap(), ValueType::Int);
        assert_eq!(ValueType::parse("boolean").unwrap(), ValueType::Bool);
        assert_eq!(
            ValueType::parse("list<string>").unwrap(),
            ValueType::list(ValueType::String)
        );
        assert!(ValueType::parse("widget").is_err());
    }

    #[test]
    fn test_parse_named_type() {
        let point = ValueType::Record(RecordType::new("Point").field("x", ValueType::Int));
        let resolved = ValueType::parse_with("list<Point>", &|name| {
            (name == "Point").then(|| point.clone())
        })
        .unwrap();
        assert_eq!(resolved, ValueType::list(point));
    }

    #[test]
    fn test_assignability() {
        assert!(ValueType::Any.is_assignable_from(&ValueType::Int));
        assert!(!ValueType::Int.is_assignable_from(&ValueType::Any));
        assert!(!ValueType::Float.is_assignable_from(&ValueType::Int));
        assert!(ValueType::Float.can_convert_from(&ValueType::Int));
        assert!(ValueType::String.can_convert_from(&ValueType::Int));
        assert!(!ValueType::Int.can_convert_from(&ValueType::String));
    }

    #[test]
    fn test_natural_order() {
        assert!(ValueType::String.has_natural_order());
        assert!(ValueType::custom("Version", true).has_natural_order());
        assert!(!ValueType::custom("Widget", false).has_natural_order());
        assert!(!ValueType::Record(RecordType::new("Point")).has_natural_order());
    }

    #[test]
    fn test_convert() {
        assert_eq!(
            Value::Int(3).convert_to(&ValueType::Float).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            Value::Int(3).convert_to(&ValueType::String).unwrap(),
            Value::str("3")
        );
        assert!(Value::str("x").convert_to(&ValueType::Int).is_err());
        assert_eq!(Value::Null.convert_to(&ValueType::Int).unwrap(), Value::Null);
    }

    #[test]
    fn test_record_field_access() {
        let p = Value::record("Point", [("x", Value::Int(1)), ("y", Value::Int(2))]);
        assert_eq!(p.field("y"), Some(&Value::Int(2)));
        assert_eq!(p.to_string(), "Point{x: 1, y: 2}");
    }
}
