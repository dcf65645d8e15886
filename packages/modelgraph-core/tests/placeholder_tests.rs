//! Placeholder values: deferred types and deferred live values

use std::sync::Arc;

use modelgraph_core::features::placeholder::{PlaceholderValue, TypeCallback};
use modelgraph_core::features::value_synth::ConstantValue;
use modelgraph_core::{
    Identity, InstanceType, InterpretEnv, InterpretedModelSet, LiveValue, ModelScope, ModelSetBuilder, ModelShape,
    SatisfyPolicy, Value, ValueType,
};
use pretty_assertions::assert_eq;

fn int(i: i64) -> LiveValue {
    LiveValue::constant(ValueType::Int, Value::Int(i))
}

/// Interpreted scope holding `placeholder` as `p` next to a constant `k`
fn scope_with(placeholder: PlaceholderValue) -> Arc<ModelScope> {
    let mut builder = ModelSetBuilder::new(Identity::fresh(), "root");
    builder.add_value("p", Arc::new(placeholder), None, None).unwrap();
    builder
        .add_value("k", Arc::new(ConstantValue::new(ValueType::Int, Value::Int(1))), None, None)
        .unwrap();
    let models = InterpretedModelSet::new(builder.seal(), None);
    let mut env = InterpretEnv::new(models.clone());
    models.interpret_all(&mut env).unwrap();
    ModelScope::instantiate(models, None)
}

#[test]
fn test_retyping_names_both_types() {
    let placeholder = PlaceholderValue::typed("title", InstanceType::value(ValueType::String), None);
    let err = placeholder
        .satisfy_type(InstanceType::value(ValueType::Int))
        .unwrap_err();
    assert!(err.message().contains("Value<string>"), "{}", err);
    assert!(err.message().contains("Value<int>"), "{}", err);

    // The same type again is accepted
    placeholder
        .satisfy_type(InstanceType::value(ValueType::String))
        .unwrap();
}

#[test]
fn test_shape_is_enforced() {
    let placeholder = PlaceholderValue::new("changed", ModelShape::Event, None);
    assert!(placeholder
        .satisfy_type(InstanceType::value(ValueType::Int))
        .is_err());
    placeholder
        .satisfy_type(InstanceType::event(ValueType::Int))
        .unwrap();
}

#[test]
fn test_untyped_placeholder_fails_interpretation() {
    let mut builder = ModelSetBuilder::new(Identity::fresh(), "root");
    builder
        .add_value("p", Arc::new(PlaceholderValue::new("p", ModelShape::Value, None)), None, None)
        .unwrap();
    let models = InterpretedModelSet::new(builder.seal(), None);
    let mut env = InterpretEnv::new(models.clone());
    let err = models.interpret_all(&mut env).unwrap_err();
    assert!(
        err.message().contains("was not specified before being needed"),
        "{}",
        err
    );
}

#[test]
fn test_type_from_callback() {
    let placeholder = PlaceholderValue::new("p", ModelShape::Value, None);
    let callback: TypeCallback = Arc::new(|_env: &InterpretEnv| Ok(InstanceType::value(ValueType::Int)));
    placeholder.set_type_callback(callback);
    assert!(placeholder.has_type_source());

    let scope = scope_with(placeholder);
    let id = scope.find_id("p").unwrap();
    scope.satisfy(&id, int(4), SatisfyPolicy::Error).unwrap();
    assert_eq!(scope.value_at("p").unwrap(), Value::Int(4));
}

#[test]
fn test_read_before_satisfaction() {
    let scope = scope_with(PlaceholderValue::typed("p", InstanceType::value(ValueType::Int), None));
    let err = scope.value_at("p").unwrap_err();
    assert_eq!(err.message(), "Model value 'p' has not been satisfied");
    assert_eq!(scope.value_at("k").unwrap(), Value::Int(1));
}

#[test]
fn test_satisfy_policies() {
    let scope = scope_with(PlaceholderValue::typed("p", InstanceType::value(ValueType::Int), None));
    let id = scope.find_id("p").unwrap();

    assert!(scope.satisfy(&id, int(1), SatisfyPolicy::Error).unwrap());
    assert!(scope.satisfy(&id, int(2), SatisfyPolicy::Error).is_err());
    assert_eq!(scope.value_at("p").unwrap(), Value::Int(1));

    assert!(!scope.satisfy(&id, int(3), SatisfyPolicy::Ignore).unwrap());
    assert_eq!(scope.value_at("p").unwrap(), Value::Int(1));

    assert!(scope.satisfy(&id, int(4), SatisfyPolicy::Replace).unwrap());
    assert_eq!(scope.value_at("p").unwrap(), Value::Int(4));
    assert!(scope.is_satisfied(&id));
}

#[test]
fn test_satisfy_checks_type() {
    let scope = scope_with(PlaceholderValue::typed("p", InstanceType::value(ValueType::Int), None));
    let id = scope.find_id("p").unwrap();
    let text = LiveValue::constant(ValueType::String, Value::str("four"));
    assert!(scope.satisfy(&id, text, SatisfyPolicy::Replace).is_err());
    assert!(!scope.is_satisfied(&id));
}

#[test]
fn test_copied_scope_has_fresh_slots() {
    let scope = scope_with(PlaceholderValue::typed("p", InstanceType::value(ValueType::Int), None));
    let id = scope.find_id("p").unwrap();
    scope.satisfy(&id, int(9), SatisfyPolicy::Error).unwrap();

    let copy = scope.copy();
    assert!(!copy.is_satisfied(&id));
    assert!(copy.value_at("p").is_err());
    assert_eq!(scope.value_at("p").unwrap(), Value::Int(9));
}

#[test]
fn test_satisfy_only_placeholders() {
    let scope = scope_with(PlaceholderValue::typed("p", InstanceType::value(ValueType::Int), None));
    let id = scope.find_id("k").unwrap();
    let err = scope.satisfy(&id, int(2), SatisfyPolicy::Replace).unwrap_err();
    assert_eq!(err.message(), "Model value 'k' is not a placeholder");
}
