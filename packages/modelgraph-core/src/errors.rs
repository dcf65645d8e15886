//! Error types for modelgraph-core
//!
//! Three diagnostic categories follow the compilation phases:
//! - [`CompileError`]: schema-shape violations, duplicate declarations, bad
//!   literals. Collected per definition pass; siblings keep compiling.
//! - [`TypeResolutionError`]: unresolved symbols, type mismatches. Fatal to the
//!   interpretation subtree; containing constructs may [`wrap`](TypeResolutionError::wrap) it.
//! - [`InstantiationError`]: unsatisfied placeholders, missing external values,
//!   impossible conversions. Fatal to the build.
//!
//! Every diagnostic carries a message, an optional file position, a span length
//! and an optional cause, which is exposed through `std::error::Error::source`.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;
use crate::shared::models::FilePosition;

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Message with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub position: Option<FilePosition>,
    pub span_length: usize,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            span_length: 0,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, position: Option<FilePosition>) -> Self {
        Self {
            position,
            severity: Severity::Warning,
            ..Self::new(message)
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(pos) => write!(f, "{}: {}", pos, self.message),
            None => f.write_str(&self.message),
        }
    }
}

macro_rules! phase_error {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Error)]
        #[error("{diagnostic}")]
        pub struct $name {
            pub diagnostic: Diagnostic,
            #[source]
            cause: Option<Cause>,
        }

        impl $name {
            pub fn new(message: impl Into<String>) -> Self {
                Self {
                    diagnostic: Diagnostic::new(message),
                    cause: None,
                }
            }

            /// Attach a position unless one is already recorded
            pub fn at(mut self, position: FilePosition, span_length: usize) -> Self {
                if self.diagnostic.position.is_none() {
                    self.diagnostic.position = Some(position);
                    self.diagnostic.span_length = span_length;
                }
                self
            }

            pub fn at_opt(self, position: Option<FilePosition>) -> Self {
                match position {
                    Some(pos) => self.at(pos, 0),
                    None => self,
                }
            }

            pub fn with_cause<E>(mut self, cause: E) -> Self
            where
                E: StdError + Send + Sync + 'static,
            {
                self.cause = Some(Box::new(cause));
                self
            }

            /// New error with `context` as its message and `self` as its cause.
            /// The position is inherited when present.
            pub fn wrap(self, context: impl Into<String>) -> Self {
                let position = self.diagnostic.position.clone();
                let span_length = self.diagnostic.span_length;
                let mut wrapped = Self::new(context).with_cause(self);
                wrapped.diagnostic.position = position;
                wrapped.diagnostic.span_length = span_length;
                wrapped
            }

            pub fn message(&self) -> &str {
                &self.diagnostic.message
            }

            pub fn position(&self) -> Option<&FilePosition> {
                self.diagnostic.position.as_ref()
            }

            /// Messages from this error down its cause chain
            pub fn chain_messages(&self) -> Vec<String> {
                let mut messages = vec![self.diagnostic.message.clone()];
                let mut next = StdError::source(self);
                while let Some(err) = next {
                    messages.push(match err.downcast_ref::<$name>() {
                        Some(own) => own.diagnostic.message.clone(),
                        None => err.to_string(),
                    });
                    next = err.source();
                }
                messages
            }
        }
    };
}

phase_error!(
    /// Definition-phase error
    CompileError
);

phase_error!(
    /// Interpretation-phase error
    TypeResolutionError
);

phase_error!(
    /// Instance-phase error
    InstantiationError
);

/// Namespace operation failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NamespaceError {
    /// Name already declared in the same scope
    #[error("A value named '{name}' is already declared in '{model}'")]
    Conflict { name: String, model: String },

    /// Nothing registered at the path
    #[error("Nothing at '{path}'{detail}")]
    NotFound { path: String, detail: String },

    /// Name rejected by identifier checking
    #[error("Illegal name '{name}': {reason}")]
    IllegalName { name: String, reason: String },
}

impl NamespaceError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            path: path.into(),
            detail: String::new(),
        }
    }

    pub fn not_found_because(path: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::NotFound {
            path: path.into(),
            detail: format!(" ({})", detail),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<NamespaceError> for CompileError {
    fn from(err: NamespaceError) -> Self {
        CompileError::new(err.to_string()).with_cause(err)
    }
}

impl From<NamespaceError> for TypeResolutionError {
    fn from(err: NamespaceError) -> Self {
        TypeResolutionError::new(err.to_string()).with_cause(err)
    }
}

impl From<NamespaceError> for InstantiationError {
    fn from(err: NamespaceError) -> Self {
        InstantiationError::new(err.to_string()).with_cause(err)
    }
}

/// Failure of a whole build
#[derive(Debug, Error)]
pub enum BuildError {
    /// All errors reported by the definition pass
    #[error("{}", summarize(.0))]
    Compile(Vec<CompileError>),

    #[error("Interpretation failed: {0}")]
    Interpretation(#[from] TypeResolutionError),

    #[error("Instantiation failed: {0}")]
    Instantiation(#[from] InstantiationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BuildError {
    pub fn compile_errors(&self) -> &[CompileError] {
        match self {
            BuildError::Compile(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[CompileError]) -> String {
    match errors {
        [] => "Compilation failed".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
pub type InterpretResult<T> = Result<T, TypeResolutionError>;
pub type InstantiateResult<T> = Result<T, InstantiationError>;
pub type NamespaceResult<T> = Result<T, NamespaceError>;
pub type BuildResult<T> = Result<T, BuildError>;
