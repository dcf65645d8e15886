//! Dotted component paths
//!
//! Namespace lookups take dotted paths (`model.sub.value`). [`PathStack`]
//! tracks the sub-model nesting while definitions declare components so each
//! component knows its full path.

/// Reserved words that may not be used as component names
const RESERVED: &[&str] = &[
    "true", "false", "null", "this", "if", "else", "for", "return", "new",
];

/// Split a dotted path into its segments
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// Split off the first segment of a dotted path
pub fn split_first(path: &str) -> (&str, Option<&str>) {
    match path.find('.') {
        Some(dot) => (&path[..dot], Some(&path[dot + 1..])),
        None => (path, None),
    }
}

pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Check a component name: letters, digits, `_`, `$`, `-`; must not start with a
/// digit and must not be a reserved word.
pub fn check_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| "Name must not be empty".to_string())?;
    if first.is_ascii_digit() {
        return Err(format!("Name '{}' must not start with a digit", name));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '$' || *c == '-'))
    {
        return Err(format!("Illegal character '{}' in name '{}'", bad, name));
    }
    if RESERVED.contains(&name) {
        return Err(format!("'{}' is a reserved word", name));
    }
    Ok(())
}

/// Stack of nested sub-model names
#[derive(Debug, Clone, Default)]
pub struct PathStack {
    segments: Vec<String>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.segments.push(name.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Current dotted prefix
    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    /// Path of `name` declared at the current depth
    pub fn path_with(&self, name: &str) -> String {
        join_path(&self.path(), name)
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Run `f` with `name` pushed
    pub fn with_segment<F, R>(&mut self, name: impl Into<String>, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.push(name);
        let result = f(self);
        self.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_first() {
        assert_eq!(split_first("m.y"), ("m", Some("y")));
        assert_eq!(split_first("a.b.c"), ("a", Some("b.c")));
        assert_eq!(split_first("x"), ("x", None));
        assert_eq!(split_path("a.b.c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("rowCount").is_ok());
        assert!(check_identifier("$tmp_1").is_ok());
        assert!(check_identifier("sort-key").is_ok());
        assert!(check_identifier("1st").is_err());
        assert!(check_identifier("a.b").is_err());
        assert!(check_identifier("null").is_err());
        assert!(check_identifier("").is_err());
    }

    #[test]
    fn test_path_stack() {
        let mut stack = PathStack::new();
        assert_eq!(stack.path_with("x"), "x");
        let nested = stack.with_segment("m", |s| s.with_segment("n", |s| s.path_with("y")));
        assert_eq!(nested, "m.n.y");
        assert_eq!(stack.depth(), 0);
    }
}
