//! Error types for engine and snapshot operations.
//!
//! Errors are categorized so the command layer can pick the right message
//! and advice. Transport errors always name the operation and the resource
//! they were issued against, so a failed restore step can be identified from
//! the error alone.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for enginekit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of enginekit errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The addressed resource does not exist.
    NotFound,
    /// The operation cannot proceed in the current state.
    PreconditionFailed,
    /// An API call failed.
    Transport,
    /// Missing or malformed caller input.
    InvalidInput,
    /// A persisted document could not be decoded.
    Decode,
    /// Local file system error.
    Io,
}

impl ErrorCategory {
    /// Whether re-running the same command may succeed without changes.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Resource not found",
            Self::PreconditionFailed => "Precondition failed",
            Self::Transport => "API request failed",
            Self::InvalidInput => "Invalid input",
            Self::Decode => "Invalid document",
            Self::Io => "File system error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the project, location, collection and resource ID",
            Self::PreconditionFailed => {
                "Pass --allow-create to create a missing engine, or target an existing one"
            }
            Self::Transport => {
                "Check credentials and permissions; re-running converges from the current state"
            }
            Self::InvalidInput => "Check the command arguments and flags",
            Self::Decode => "Verify the snapshot file is valid JSON produced by gemctl",
            Self::Io => "Check the path exists and is readable/writable",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the platform or handling snapshots.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource does not exist.
    #[error("not found: {resource}")]
    NotFound {
        /// Fully-qualified resource name.
        resource: String,
    },

    /// The operation is not allowed in the current state.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// An API call failed.
    #[error("failed to {operation} {resource}: {message}")]
    Transport {
        /// Operation being performed, e.g. "delete agent".
        operation: String,
        /// Resource the operation targeted.
        resource: String,
        /// HTTP status code if the server answered.
        status: Option<u16>,
        /// Error detail.
        message: String,
    },

    /// Missing or malformed input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Malformed persisted document.
    #[error("failed to decode snapshot: {0}")]
    Decode(String),

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a transport error for an operation against a resource.
    pub fn transport(
        operation: impl Into<String>,
        resource: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            operation: operation.into(),
            resource: resource.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::PreconditionFailed(_) => ErrorCategory::PreconditionFailed,
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::InvalidInput(_) => ErrorCategory::InvalidInput,
            Error::Decode(_) => ErrorCategory::Decode,
            Error::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Whether this error means the resource is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
