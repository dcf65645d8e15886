//! Document fixtures

use modelgraph_core::ConfigNode;

/// `<value name=.. type=..>text</value>`
pub fn value(name: &str, ty: &str, text: &str) -> ConfigNode {
    ConfigNode::new("value").attr("name", name).attr("type", ty).text(text)
}

/// `<derived name=..>expr</derived>`
pub fn derived(name: &str, expr: &str) -> ConfigNode {
    ConfigNode::new("derived").attr("name", name).text(expr)
}

/// `<list name=.. type=..>items</list>`
pub fn list(name: &str, ty: &str, items: &str) -> ConfigNode {
    ConfigNode::new("list").attr("name", name).attr("type", ty).text(items)
}

/// `<models>` root holding `children`
pub fn models<I>(children: I) -> ConfigNode
where
    I: IntoIterator<Item = ConfigNode>,
{
    children
        .into_iter()
        .fold(ConfigNode::new("models"), |root, child| root.child(child))
}

/// Root with `n` independent int values `v0..vn`
pub fn fixture_n_values(n: usize) -> ConfigNode {
    models((0..n).map(|i| value(&format!("v{i}"), "int", &i.to_string())))
}

/// `x = 5`, `y = x * 2`
pub fn fixture_simple_document() -> ConfigNode {
    models([value("x", "int", "5"), derived("y", "x * 2")])
}
