//! Build configuration
//!
//! Knobs for one compilation. Start from a [`Preset`] and override fields, or
//! load a YAML document:
//!
//! ```yaml
//! version: 1
//! preset: strict
//! max_depth: 64
//! default_satisfy_policy: replace
//! ```

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::{check_range, Validatable};
use crate::features::placeholder::SatisfyPolicy;

const SUPPORTED_VERSIONS: &[u32] = &[1];

const FIELDS: &[&str] = &[
    "max_depth",
    "max_diagnostics",
    "check_names",
    "warnings_as_errors",
    "default_satisfy_policy",
];

/// Settings for a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub preset: Preset,

    /// Maximum element nesting depth
    pub max_depth: usize,

    /// Stop collecting definition diagnostics after this many errors
    pub max_diagnostics: usize,

    /// Validate declared component names as identifiers
    pub check_names: bool,

    /// Promote definition warnings to errors
    pub warnings_as_errors: bool,

    /// Collision policy used where a caller does not pass one
    pub default_satisfy_policy: SatisfyPolicy,
}

impl BuildConfig {
    /// Complete configuration for a preset
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Strict => Self {
                preset,
                max_depth: 64,
                max_diagnostics: 50,
                check_names: true,
                warnings_as_errors: true,
                default_satisfy_policy: SatisfyPolicy::Error,
            },
            Preset::Balanced => Self {
                preset,
                max_depth: 256,
                max_diagnostics: 200,
                check_names: true,
                warnings_as_errors: false,
                default_satisfy_policy: SatisfyPolicy::Error,
            },
            Preset::Lenient => Self {
                preset,
                max_depth: 4096,
                max_diagnostics: 1000,
                check_names: false,
                warnings_as_errors: false,
                default_satisfy_policy: SatisfyPolicy::Error,
            },
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    pub fn with_check_names(mut self, enabled: bool) -> Self {
        self.check_names = enabled;
        self
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let doc: serde_yaml::Mapping = serde_yaml::from_str(text)?;

        let version = doc
            .get("version")
            .ok_or(ConfigError::MissingVersion)?;
        let version: u32 = serde_yaml::from_value(version.clone())?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = match doc.get("preset") {
            Some(value) => {
                let name: String = serde_yaml::from_value(value.clone())?;
                Preset::from_str(&name)?
            }
            None => Preset::default(),
        };
        let mut config = Self::preset(preset);

        for (key, value) in &doc {
            let key: String = serde_yaml::from_value(key.clone())?;
            let value = value.clone();
            match key.as_str() {
                "version" | "preset" => {}
                "max_depth" => config.max_depth = serde_yaml::from_value(value)?,
                "max_diagnostics" => config.max_diagnostics = serde_yaml::from_value(value)?,
                "check_names" => config.check_names = serde_yaml::from_value(value)?,
                "warnings_as_errors" => config.warnings_as_errors = serde_yaml::from_value(value)?,
                "default_satisfy_policy" => {
                    config.default_satisfy_policy = serde_yaml::from_value(value)?
                }
                other => {
                    return Err(ConfigError::unknown_field_with_suggestion(
                        other,
                        FIELDS.iter().map(|f| f.to_string()).collect(),
                    ))
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        let mut body = serde_yaml::to_string(self)?;
        body.insert_str(0, "version: 1\n");
        Ok(body)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

impl Validatable for BuildConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_range(
            "max_depth",
            self.max_depth,
            1,
            65_536,
            "Nesting depth must allow at least the root element",
        )?;
        check_range(
            "max_diagnostics",
            self.max_diagnostics,
            1,
            1_000_000,
            "At least one diagnostic must be reportable",
        )?;
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "BuildConfig"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for preset in [Preset::Strict, Preset::Balanced, Preset::Lenient] {
            assert!(BuildConfig::preset(preset).validate().is_ok());
        }
        assert!(BuildConfig::preset(Preset::Strict).warnings_as_errors);
        assert!(!BuildConfig::preset(Preset::Lenient).check_names);
    }

    #[test]
    fn test_from_yaml_overrides() {
        let config = BuildConfig::from_yaml_str(
            "version: 1\npreset: lenient\nmax_depth: 12\ndefault_satisfy_policy: replace\n",
        )
        .unwrap();
        assert_eq!(config.preset, Preset::Lenient);
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.default_satisfy_policy, SatisfyPolicy::Replace);
        assert!(!config.check_names);
    }

    #[test]
    fn test_from_yaml_requires_version() {
        assert!(matches!(
            BuildConfig::from_yaml_str("preset: strict\n"),
            Err(ConfigError::MissingVersion)
        ));
        assert!(matches!(
            BuildConfig::from_yaml_str("version: 3\n"),
            Err(ConfigError::UnsupportedVersion { found: 3, .. })
        ));
    }

    #[test]
    fn test_from_yaml_unknown_field_suggests() {
        let err = BuildConfig::from_yaml_str("version: 1\nmax_dept: 3\n").unwrap_err();
        assert!(err.to_string().contains("Did you mean 'max_depth'?"));
    }

    #[test]
    fn test_from_yaml_range_checked() {
        assert!(matches!(
            BuildConfig::from_yaml_str("version: 1\nmax_depth: 0\n"),
            Err(ConfigError::Range { .. })
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = BuildConfig::preset(Preset::Strict).with_max_depth(9);
        let text = config.to_yaml_string().unwrap();
        assert_eq!(BuildConfig::from_yaml_str(&text).unwrap(), config);
    }
}
