//! Environment and compilation builders

use std::sync::Arc;

use modelgraph_core::features::value_synth::ConstantValue;
use modelgraph_core::shared::models::RecordType;
use modelgraph_core::{Compilation, ElementRegistry, Identity, ModelSet, ModelSetBuilder, Value, ValueType};

/// Builder for the namespace a document is compiled in
#[derive(Debug)]
pub struct EnvironmentBuilder {
    builder: ModelSetBuilder,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            builder: ModelSetBuilder::new(Identity::fresh(), "environment"),
        }
    }

    /// Add a constant value
    pub fn with_constant(mut self, name: &str, ty: ValueType, value: Value) -> Self {
        self.builder
            .add_value(name, Arc::new(ConstantValue::new(ty, value)), None, None)
            .unwrap();
        self
    }

    pub fn build(self) -> Arc<ModelSet> {
        self.builder.seal()
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `Row { name: string, n: int }`
pub fn row_type() -> RecordType {
    RecordType::new("Row")
        .field("name", ValueType::String)
        .field("n", ValueType::Int)
}

pub fn row(name: &str, n: i64) -> Value {
    Value::record("Row", [("name", Value::str(name)), ("n", Value::Int(n))])
}

/// Stock registry with `Row` registered as a named type
pub fn registry_with_rows() -> Arc<ElementRegistry> {
    let mut registry = ElementRegistry::standard();
    registry.register_type("Row", ValueType::Record(row_type()));
    Arc::new(registry)
}

/// Compilation over an environment holding `rows`
pub fn compilation_with_rows(rows: Vec<Value>) -> Compilation {
    let environment = EnvironmentBuilder::new()
        .with_constant("rows", ValueType::list(ValueType::Record(row_type())), Value::List(rows))
        .build();
    Compilation::new(registry_with_rows()).with_environment(environment)
}
