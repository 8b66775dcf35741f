//! Common error types used throughout ghostforge.
//!
//! The variants follow the ingestion failure taxonomy: validation and
//! persistence failures abort a request, provider failures abort the item they
//! concern, and tool failures are recoverable at the batch level.

/// Common error type for ghostforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field was missing or a request was malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The metadata provider reported no result for a reference.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The metadata provider could not be reached or returned garbage.
    #[error("Provider error: {0}")]
    Provider(String),

    /// A database operation failed; the surrounding transaction was rolled back.
    #[error("Database error: {0}")]
    Database(String),

    /// An external tool (prober, transcoder, subtitle converter) failed.
    #[error("Tool error: {tool}: {message}")]
    Tool { tool: String, message: String },

    /// The batch was cancelled before the operation completed.
    #[error("Cancelled")]
    Cancelled,

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Provider error.
    pub fn provider<S: Into<String>>(msg: S) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Tool error.
    pub fn tool<T: Into<String>, S: Into<String>>(tool: T, msg: S) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: msg.into(),
        }
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error must abort the whole ingestion request.
    ///
    /// Tool failures degrade a single item; everything else is surfaced.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Tool { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
