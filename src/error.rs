//! Error types for backup-config-resolver.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for configuration resolution.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to load configuration from a source.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Failed to deserialize the populated schema into a record.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A line of an environment file could not be parsed as assignments.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Shell expansion of an environment file line failed.
    #[error("Failed to expand line {line}: {reason}")]
    Expansion {
        /// 1-based line number inside the file
        line: usize,
        /// What the expander rejected
        reason: String,
    },

    /// The environment file directory does not exist.
    ///
    /// This is the one recoverable condition: the resolver falls back to the
    /// process environment when it sees it.
    #[error("Environment file directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The volume inventory could not be queried.
    #[error("Volume inventory error: {0}")]
    Inventory(String),

    /// The strategy identifier is not one of `env`, `confd` or `labels`.
    #[error("Received unknown config strategy: {0}")]
    UnknownStrategy(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// An error annotated with the context it happened in.
    #[error("{context}: {source}")]
    Context {
        /// Where the error happened (file, volume, stage)
        context: String,
        /// The underlying error
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Wrap this error with additional context.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a missing env directory.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::DirectoryNotFound(_) => true,
            Self::Context { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// The innermost error, looking through any context wrapping.
    pub fn root_cause(&self) -> &ConfigError {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Extension for attaching context to results.
pub trait ResultExt<T> {
    /// Wrap the error, if any, with the given context.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wrap the error, if any, with lazily built context.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

/// Validation error for configuration values.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name or label key
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
