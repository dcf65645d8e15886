//! Assertions over build results

use modelgraph_core::{BuildError, BuildReport, BuildResult, Compilation, Value};

/// Assert the build failed in the definition pass with an error containing
/// `needle`
pub fn assert_compile_error(result: &BuildResult<BuildReport>, needle: &str) {
    match result {
        Err(BuildError::Compile(errors)) => assert!(
            errors.iter().any(|e| e.to_string().contains(needle)),
            "Expected a compile error containing {needle:?}, got: {:?}",
            errors.iter().map(|e| e.to_string()).collect::<Vec<_>>()
        ),
        other => panic!("Expected compile errors, got: {other:?}"),
    }
}

/// Assert the build failed while interpreting, with `needle` somewhere in the
/// error chain
pub fn assert_interpretation_error(result: &BuildResult<BuildReport>, needle: &str) {
    match result {
        Err(BuildError::Interpretation(err)) => assert!(
            err.chain_messages().iter().any(|m| m.contains(needle)),
            "Expected an interpretation error containing {needle:?}, got: {:?}",
            err.chain_messages()
        ),
        other => panic!("Expected an interpretation error, got: {other:?}"),
    }
}

/// Assert the value at `path` of the root scope
pub fn assert_value(compilation: &Compilation, path: &str, expected: Value) {
    let actual = compilation
        .value_at(path)
        .unwrap_or_else(|err| panic!("No value at {path:?}: {err}"));
    assert_eq!(actual, expected, "Value at {path:?}");
}

pub fn ints(values: &[i64]) -> Value {
    Value::List(values.iter().copied().map(Value::Int).collect())
}
