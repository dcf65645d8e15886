//! Errors raised while loading or validating a [`super::BuildConfig`]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Numeric setting outside its accepted bounds
    #[error("Build setting '{field}' is {value}, expected {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Key the loader does not recognise
    #[error("Unknown field '{field}' in build configuration. {suggestion}")]
    UnknownField {
        field: String,
        suggestion: String,
        valid_fields: Vec<String>,
    },

    #[error("Build configuration has no 'version' key; start the document with 'version: 1'")]
    MissingVersion,

    #[error("Build configuration version {found} is not understood (known: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("No preset called '{0}' (expected strict, balanced or lenient)")]
    UnknownPreset(String),

    #[error("Malformed build configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Unknown key, with the nearest valid key as a suggestion
    pub fn unknown_field_with_suggestion(field: impl Into<String>, valid_fields: Vec<String>) -> Self {
        let field = field.into();
        let suggestion = nearest_key(&field, &valid_fields);

        Self::UnknownField {
            field,
            suggestion,
            valid_fields,
        }
    }
}

fn nearest_key(target: &str, keys: &[String]) -> String {
    match keys.iter().min_by_key(|key| edit_distance(target, key)) {
        Some(key) => format!("Did you mean '{}'?", key),
        None => "No keys are accepted here".to_string(),
    }
}

/// Levenshtein distance over chars, two-row variant
fn edit_distance(s1: &str, s2: &str) -> usize {
    let b: Vec<char> = s2.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, c1) in s1.chars().enumerate() {
        current[0] = i + 1;
        for (j, c2) in b.iter().enumerate() {
            let cost = usize::from(c1 != *c2);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("max_depth", "max_depth"), 0);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn test_nearest_key() {
        let keys = vec![
            "max_depth".to_string(),
            "max_diagnostics".to_string(),
            "check_names".to_string(),
        ];

        assert!(nearest_key("max_depht", &keys).contains("max_depth"));
        assert_eq!(nearest_key("x", &[]), "No keys are accepted here");
    }

    #[test]
    fn test_range_message() {
        let err = ConfigError::range_with_hint("max_depth", 0, 1, 4096, "Nesting depth must be at least 1");
        let msg = err.to_string();
        assert!(msg.contains("max_depth"));
        assert!(msg.contains("1..=4096"));
        assert!(msg.contains("at least 1"));
    }
}
