//! Sorted collections: natural order, sort-with and sort-by

mod common;

use common::*;
use modelgraph_core::{Compilation, ConfigNode, Value};
use pretty_assertions::assert_eq;

fn sorted_ints(sort: ConfigNode) -> Compilation {
    let doc = models([list("xs", "int", "[3, 1, 2]").child(sort)]);
    let mut compilation = Compilation::standard();
    compilation.build(&doc).unwrap();
    compilation
}

#[test]
fn test_natural_ascending() {
    let compilation = sorted_ints(ConfigNode::new("sort"));
    assert_value(&compilation, "xs", ints(&[1, 2, 3]));
}

#[test]
fn test_natural_descending() {
    let compilation = sorted_ints(ConfigNode::new("sort").attr("ascending", "false"));
    assert_value(&compilation, "xs", ints(&[3, 2, 1]));
}

#[test]
fn test_unsorted_list_keeps_order() {
    let mut compilation = Compilation::standard();
    compilation.build(&models([list("xs", "int", "[3, 1, 2]")])).unwrap();
    assert_value(&compilation, "xs", ints(&[3, 1, 2]));
}

#[test]
fn test_sort_with_expression() {
    let sort = ConfigNode::new("sort")
        .attr("sort-value-as", "a")
        .attr("sort-compare-value-as", "b")
        .attr("sort-with", "b - a");
    let compilation = sorted_ints(sort);
    assert_value(&compilation, "xs", ints(&[3, 2, 1]));
}

#[test]
fn test_sort_with_descending_inverts() {
    let sort = ConfigNode::new("sort")
        .attr("sort-value-as", "a")
        .attr("sort-compare-value-as", "b")
        .attr("sort-with", "b - a")
        .attr("ascending", "false");
    let compilation = sorted_ints(sort);
    assert_value(&compilation, "xs", ints(&[1, 2, 3]));
}

#[test]
fn test_sort_with_strings() {
    let sort = ConfigNode::new("sort")
        .attr("sort-value-as", "a")
        .attr("sort-compare-value-as", "b")
        .attr("sort-with", "compare(len(a), len(b))");
    let doc = models([list("words", "string", "['ccc', 'a', 'bb']").child(sort)]);
    let mut compilation = Compilation::standard();
    compilation.build(&doc).unwrap();
    assert_value(
        &compilation,
        "words",
        Value::List(vec![Value::str("a"), Value::str("bb"), Value::str("ccc")]),
    );
}

fn sort_rows() -> ConfigNode {
    ConfigNode::new("sort")
        .attr("sort-value-as", "r")
        .child(ConfigNode::new("sort-by").text("r.name"))
        .child(ConfigNode::new("sort-by").text("r.n"))
}

#[test]
fn test_sort_by_keys_in_order() {
    let mut compilation = compilation_with_rows(vec![row("b", 1), row("a", 2), row("a", 1)]);
    let doc = models([list("sorted", "Row", "rows").child(sort_rows())]);
    compilation.build(&doc).unwrap();

    assert_value(
        &compilation,
        "sorted",
        Value::List(vec![row("a", 1), row("a", 2), row("b", 1)]),
    );
}

#[test]
fn test_sort_by_key_descending() {
    let mut compilation = compilation_with_rows(vec![row("b", 1), row("a", 2), row("a", 1)]);
    let sort = ConfigNode::new("sort")
        .attr("sort-value-as", "r")
        .child(ConfigNode::new("sort-by").text("r.name"))
        .child(ConfigNode::new("sort-by").attr("ascending", "false").text("r.n"));
    let doc = models([list("sorted", "Row", "rows").child(sort)]);
    compilation.build(&doc).unwrap();

    assert_value(
        &compilation,
        "sorted",
        Value::List(vec![row("a", 2), row("a", 1), row("b", 1)]),
    );
}

#[test]
fn test_missing_natural_order_is_compile_error() {
    let mut compilation = compilation_with_rows(vec![row("a", 1)]);
    let doc = models([list("sorted", "Row", "rows").child(ConfigNode::new("sort"))]);
    let result = compilation.build(&doc);
    assert_compile_error(&result, "Row has no natural ordering; use either sort-with or sort-by");
}

#[test]
fn test_sort_with_and_sort_by_together() {
    let mut compilation = compilation_with_rows(vec![row("a", 1)]);
    let sort = ConfigNode::new("sort")
        .attr("sort-value-as", "r")
        .attr("sort-compare-value-as", "s")
        .attr("sort-with", "compare(r.n, s.n)")
        .child(ConfigNode::new("sort-by").text("r.name"));
    let doc = models([list("sorted", "Row", "rows").child(sort)]);
    let result = compilation.build(&doc);
    assert_compile_error(&result, "sort-with or sort-by may be used, but not both");
}

#[test]
fn test_sort_with_requires_both_names() {
    let doc = models([list("xs", "int", "[1]").child(
        ConfigNode::new("sort")
            .attr("sort-value-as", "a")
            .attr("sort-with", "a"),
    )]);
    let result = Compilation::standard().build(&doc);
    assert_compile_error(&result, "sort-with must be used with sort-compare-value-as");
}

#[test]
fn test_sort_by_requires_value_name() {
    let doc = models([list("xs", "int", "[1]")
        .child(ConfigNode::new("sort").child(ConfigNode::new("sort-by").text("1")))]);
    let result = Compilation::standard().build(&doc);
    assert_compile_error(&result, "sort-by must be used with sort-value-as");
}

#[test]
fn test_unused_names_warn() {
    let doc = models([list("xs", "int", "[2, 1]").child(ConfigNode::new("sort").attr("sort-value-as", "v"))]);
    let mut compilation = Compilation::standard();
    let report = compilation.build(&doc).unwrap();

    let messages: Vec<_> = report.warnings.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(messages, vec!["sort-value-as is not used with default sorting"]);
    assert_value(&compilation, "xs", ints(&[1, 2]));
}

#[test]
fn test_sort_outside_collection() {
    let doc = models([ConfigNode::new("sort")]);
    let result = Compilation::standard().build(&doc);
    assert_interpretation_error(&result, "sort is not inside a sortable collection");
}

#[test]
fn test_two_sorts_rejected() {
    let doc = models([list("xs", "int", "[1]")
        .child(ConfigNode::new("sort"))
        .child(ConfigNode::new("sort").attr("ascending", "false"))]);
    let result = Compilation::standard().build(&doc);
    assert_compile_error(&result, "may declare only one sort");
}

#[test]
fn test_resort_after_rebuild() {
    let mut compilation = sorted_ints(ConfigNode::new("sort"));
    let doc = models([list("xs", "int", "[3, 1, 2]").child(ConfigNode::new("sort").attr("ascending", "false"))]);
    let report = compilation.rebuild(&doc).unwrap();
    assert!(report.is_stable());
    assert_value(&compilation, "xs", ints(&[3, 2, 1]));
}

#[test]
fn test_inconsistent_sort_with_keeps_every_item() {
    let items: Vec<String> = (0..64).map(|i| i.to_string()).collect();
    let doc = models([list("xs", "int", &format!("[{}]", items.join(", "))).child(
        ConfigNode::new("sort")
            .attr("sort-value-as", "a")
            .attr("sort-compare-value-as", "b")
            .attr("sort-with", "(a + b) % 3 - 1"),
    )]);
    let mut compilation = Compilation::standard();
    compilation.build(&doc).unwrap();

    let mut sorted = match compilation.value_at("xs").unwrap() {
        Value::List(values) => values,
        other => panic!("expected a list, got {}", other),
    };
    assert_eq!(sorted.len(), 64);
    sorted.sort_by_key(|v| match v {
        Value::Int(i) => *i,
        _ => i64::MAX,
    });
    assert_eq!(sorted, (0..64).map(Value::Int).collect::<Vec<_>>());
}

fn row_without_n(name: &str) -> Value {
    Value::record("Row", [("name", Value::str(name)), ("n", Value::Null)])
}

#[test]
fn test_null_comparison_defers_to_next_key() {
    // A missing n makes `a - b` null, so the name decides those pairs
    let mut compilation = compilation_with_rows(vec![row("y", 2), row_without_n("b"), row("z", 1)]);
    let sort = ConfigNode::new("sort")
        .attr("sort-value-as", "r")
        .child(
            ConfigNode::new("sort-by")
                .attr("sort-value-as", "a")
                .attr("sort-compare-value-as", "b")
                .attr("sort-with", "a - b")
                .text("r.n"),
        )
        .child(ConfigNode::new("sort-by").text("r.name"));
    let doc = models([list("sorted", "Row", "rows").child(sort)]);
    compilation.build(&doc).unwrap();

    assert_value(
        &compilation,
        "sorted",
        Value::List(vec![row_without_n("b"), row("z", 1), row("y", 2)]),
    );
}
