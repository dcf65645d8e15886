//! Source location types
//!
//! Positions attached to definitions and diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Position of a config node (or one of its attributes) in its source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePosition {
    pub file: Arc<str>,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
    /// Character offset from the start of the file
    pub offset: u32,
}

impl FilePosition {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            offset: 0,
        }
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Position used for nodes that were built in memory
    pub fn unknown() -> Self {
        Self::new("<memory>", 0, 0)
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }

    /// Position `chars` characters further along the same line
    pub fn advance(&self, chars: u32) -> Self {
        Self {
            file: self.file.clone(),
            line: self.line,
            column: self.column + chars,
            offset: self.offset + chars,
        }
    }
}

impl Default for FilePosition {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let pos = FilePosition::new("app.xml", 3, 14);
        assert_eq!(pos.to_string(), "app.xml:3:14");
        assert_eq!(FilePosition::unknown().to_string(), "<memory>");
    }

    #[test]
    fn test_advance() {
        let pos = FilePosition::new("app.xml", 3, 14).with_offset(40);
        let moved = pos.advance(5);
        assert_eq!(moved.column, 19);
        assert_eq!(moved.offset, 45);
        assert_eq!(moved.line, 3);
    }

    #[test]
    fn test_yaml_keeps_file_name() {
        let pos = FilePosition::new("app.xml", 3, 14).with_offset(40);
        let text = serde_yaml::to_string(&pos).unwrap();
        assert!(text.contains("file: app.xml"));
        let back: FilePosition = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, pos);
    }
}
