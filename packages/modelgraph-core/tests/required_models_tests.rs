//! Required external values supplied by the compilation environment

mod common;

use common::*;
use modelgraph_core::{Compilation, ConfigNode, Value, ValueType};
use pretty_assertions::assert_eq;

fn ext(name: &str, ty: &str) -> ConfigNode {
    ConfigNode::new("ext-value").attr("name", name).attr("type", ty)
}

fn required<I>(children: I) -> ConfigNode
where
    I: IntoIterator<Item = ConfigNode>,
{
    children
        .into_iter()
        .fold(ConfigNode::new("required"), |root, child| root.child(child))
}

#[test]
fn test_required_value_imported() {
    let environment = EnvironmentBuilder::new()
        .with_constant("limit", ValueType::Int, Value::Int(5))
        .build();
    let mut compilation = Compilation::standard().with_environment(environment);
    let doc = required([ext("limit", "int"), derived("double", "limit * 2")]);
    compilation.build(&doc).unwrap();

    assert_value(&compilation, "limit", Value::Int(5));
    assert_value(&compilation, "double", Value::Int(10));
}

#[test]
fn test_required_value_from_source() {
    let environment = EnvironmentBuilder::new()
        .with_constant("max_items", ValueType::Int, Value::Int(3))
        .build();
    let mut compilation = Compilation::standard().with_environment(environment);
    let doc = required([ext("limit", "int").attr("source", "max_items")]);
    compilation.build(&doc).unwrap();

    assert_value(&compilation, "limit", Value::Int(3));
}

#[test]
fn test_required_value_converted() {
    let environment = EnvironmentBuilder::new()
        .with_constant("count", ValueType::Int, Value::Int(7))
        .build();
    let mut compilation = Compilation::standard().with_environment(environment);
    let doc = required([ext("label", "string").attr("source", "count")]);
    compilation.build(&doc).unwrap();

    assert_value(&compilation, "label", Value::str("7"));
}

#[test]
fn test_missing_required_value() {
    let mut compilation = Compilation::standard();
    let doc = required([ext("limit", "int")]);
    let result = compilation.build(&doc);
    assert_interpretation_error(
        &result,
        "Model value 'limit' is required to apply required but is not present",
    );
}

#[test]
fn test_incompatible_required_value() {
    let environment = EnvironmentBuilder::new()
        .with_constant("limit", ValueType::String, Value::str("many"))
        .build();
    let mut compilation = Compilation::standard().with_environment(environment);
    let result = compilation.build(&required([ext("limit", "int")]));
    assert_interpretation_error(&result, "Model value 'limit' is Value<string>, but Value<int> is required");
}

#[test]
fn test_ext_value_needs_type() {
    let doc = required([ConfigNode::new("ext-value").attr("name", "limit")]);
    let result = Compilation::standard().build(&doc);
    assert_compile_error(&result, "Required value 'limit' must declare its type");
}

#[test]
fn test_environment_survives_rebuild() {
    let environment = EnvironmentBuilder::new()
        .with_constant("limit", ValueType::Int, Value::Int(5))
        .build();
    let mut compilation = Compilation::standard().with_environment(environment);
    let doc = required([ext("limit", "int"), derived("double", "limit * 2")]);
    compilation.build(&doc).unwrap();
    let scope = compilation.environment_scope().clone();

    let report = compilation.rebuild(&doc).unwrap();
    assert!(report.is_stable());
    assert!(std::sync::Arc::ptr_eq(compilation.environment_scope(), &scope));
    assert_eq!(compilation.value_at("double").unwrap(), Value::Int(10));
}
