use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library.
///
/// Variants follow the failure classes of a generation run: locator misses
/// (`PackageNotFound`, `TypeNotFound`), directive grammar errors, duplicate
/// routes, and document validation. Locator and grammar errors are
/// recoverable in lax mode and are collected as diagnostics; the others abort
/// document emission.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("invalid go.mod {}: {message}", file.display())]
    Manifest { file: PathBuf, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("cannot locate package {package} (needed for {type_name})")]
    PackageNotFound { package: String, type_name: String },

    #[error("cannot find definition of {type_name} in package {package}")]
    TypeNotFound { package: String, type_name: String },

    #[error("invalid type reference \"{0}\"")]
    InvalidReference(String),

    #[error("invalid compound type: {0}")]
    CompoundType(String),

    #[error("can not parse {directive} comment \"{line}\": {message}")]
    Grammar {
        directive: String,
        line: String,
        message: String,
    },

    #[error("already exists, {path} [{method}]")]
    DuplicateRoute { path: String, method: String },

    #[error("{0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Builds a grammar error for one directive line.
    pub fn grammar(directive: &str, line: &str, message: impl Into<String>) -> Self {
        Error::Grammar {
            directive: directive.to_string(),
            line: line.to_string(),
            message: message.into(),
        }
    }

    /// Whether lax mode may turn this error into a diagnostic and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PackageNotFound { .. }
                | Error::Grammar { .. }
                | Error::CompoundType(_)
                | Error::InvalidReference(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}
