//! Error types and Result aliases for shellgate

use std::fmt;
use std::path::PathBuf;

/// Result type alias for shellgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shellgate
#[derive(Debug)]
pub enum Error {
    // === Shell channel errors ===
    /// Failed to create PTY
    PtyCreationFailed {
        command: String,
        reason: String,
    },

    /// Failed to spawn the shell in the PTY
    CommandSpawnFailed {
        command: String,
        reason: String,
    },

    /// Failed to clone PTY reader
    PtyReaderCloneFailed {
        reason: String,
    },

    /// Failed to take PTY writer
    PtyWriterTakeFailed {
        reason: String,
    },

    /// Failed to write a line to the shell
    ShellWriteFailed {
        reason: String,
    },

    /// The shell process has exited
    ShellNotRunning,

    // === Pipeline errors ===
    /// No preprocessor with this name in the chain
    UnknownPreprocessor {
        name: String,
    },

    // === Handler errors ===
    /// Expression or calculator evaluation failed
    EvaluationFailed {
        expression: String,
        reason: String,
    },

    /// The host could not open a file
    FileOpenFailed {
        path: PathBuf,
        reason: String,
    },

    /// The host could not show documentation
    DocumentationFailed {
        topic: String,
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Configuration file not found
    ConfigNotFound,

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    /// Failed to serialize configuration
    ConfigSerializationFailed {
        format: String,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Shell channel errors
            Error::PtyCreationFailed { command, reason } => {
                write!(f, "Failed to create PTY for '{}': {}", command, reason)
            }
            Error::CommandSpawnFailed { command, reason } => {
                write!(f, "Failed to spawn shell '{}': {}", command, reason)
            }
            Error::PtyReaderCloneFailed { reason } => {
                write!(f, "Failed to clone PTY reader: {}", reason)
            }
            Error::PtyWriterTakeFailed { reason } => {
                write!(f, "Failed to take PTY writer: {}", reason)
            }
            Error::ShellWriteFailed { reason } => {
                write!(f, "Failed to write to shell: {}", reason)
            }
            Error::ShellNotRunning => write!(f, "Shell process is not running"),

            // Pipeline errors
            Error::UnknownPreprocessor { name } => {
                write!(f, "No preprocessor named '{}' in the chain", name)
            }

            // Handler errors
            Error::EvaluationFailed { expression, reason } => {
                write!(f, "Failed to evaluate '{}': {}", expression, reason)
            }
            Error::FileOpenFailed { path, reason } => {
                write!(f, "Failed to open '{}': {}", path.display(), reason)
            }
            Error::DocumentationFailed { topic, reason } => {
                write!(f, "Failed to show documentation for '{}': {}", topic, reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigNotFound => write!(f, "Configuration file not found"),
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }
            Error::ConfigSerializationFailed { format, reason } => {
                write!(f, "Failed to serialize config as {}: {}", format, reason)
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
