//! Build configuration
//!
//! - [`BuildConfig`]: knobs for one compilation, YAML-loadable
//! - [`Preset`]: complete defaults (strict / balanced / lenient)
//! - [`Validatable`]: range checking with actionable hints

pub mod build_config;
pub mod error;
pub mod preset;
pub mod validation;

pub use build_config::BuildConfig;
pub use error::{ConfigError, ConfigResult};
pub use preset::Preset;
pub use validation::Validatable;
