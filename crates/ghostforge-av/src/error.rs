//! Error types for ghostforge-av.

use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running external media tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool failed to execute or exited non-zero.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// The tool ran longer than its allotted time and was killed.
    #[error("{tool} timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    /// The surrounding batch was cancelled while the tool was running.
    #[error("{tool} cancelled")]
    Cancelled { tool: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    fn tool_name(&self) -> &str {
        match self {
            Self::ToolNotFound { tool }
            | Self::ToolFailed { tool, .. }
            | Self::ParseError { tool, .. }
            | Self::Timeout { tool, .. }
            | Self::Cancelled { tool } => tool,
            Self::Io(_) | Self::Json(_) | Self::InvalidInput(_) => "media",
        }
    }
}

impl From<Error> for ghostforge_common::Error {
    fn from(err: Error) -> Self {
        if err.is_cancelled() {
            return ghostforge_common::Error::Cancelled;
        }
        ghostforge_common::Error::tool(err.tool_name().to_string(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::tool_failed("ffmpeg", "exited with status 1");
        assert_eq!(
            err.to_string(),
            "tool execution failed: ffmpeg: exited with status 1"
        );

        let err = Error::Timeout {
            tool: "ffprobe".into(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "ffprobe timed out after 5s");
    }

    #[test]
    fn test_into_common_error() {
        let common: ghostforge_common::Error = Error::parse_error("ffprobe", "bad json").into();
        match common {
            ghostforge_common::Error::Tool { tool, message } => {
                assert_eq!(tool, "ffprobe");
                assert!(message.contains("bad json"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let common: ghostforge_common::Error = Error::Cancelled {
            tool: "ffmpeg".into(),
        }
        .into();
        assert!(matches!(common, ghostforge_common::Error::Cancelled));
    }
}
