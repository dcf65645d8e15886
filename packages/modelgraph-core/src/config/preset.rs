//! Preset configurations
//!
//! Presets provide complete defaults for the build knobs.

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Build preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Reject anything questionable
    ///
    /// - Names checked as identifiers
    /// - Warnings promoted to errors
    /// - Shallow nesting limit
    Strict,

    /// Default for most embedders
    ///
    /// - Names checked
    /// - Warnings reported, not fatal
    Balanced,

    /// Accept legacy documents
    ///
    /// - No name checking
    /// - Deep nesting allowed
    Lenient,
}

impl Preset {
    /// Parse preset from string
    pub fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "balanced" => Ok(Self::Balanced),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Lenient => "lenient",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Balanced
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!(Preset::from_str("strict").unwrap(), Preset::Strict);
        assert_eq!(Preset::from_str("BALANCED").unwrap(), Preset::Balanced);
        assert_eq!(Preset::from_str("lenient").unwrap(), Preset::Lenient);
        assert!(matches!(
            Preset::from_str("fast"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_preset_display() {
        assert_eq!(Preset::Strict.to_string(), "strict");
        assert_eq!(Preset::default().to_string(), "balanced");
    }
}
