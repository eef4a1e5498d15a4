//! Error types for ToolGate
//!
//! All errors are managed centrally in a single enum. Per-call failures
//! (a tool that returned an error, a timed-out execution) travel as
//! `ToolResult` values, not as `Err` - this enum covers the conditions
//! that abort an operation or a whole request.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ToolGate error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Permissions
    // ========================================================================
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ========================================================================
    // Sessions
    // ========================================================================
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    // ========================================================================
    // Tools
    // ========================================================================
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {tool} - {message}")]
    ToolExecution { tool: String, message: String },

    // ========================================================================
    // Formatting
    // ========================================================================
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Formatting error: {0}")]
    Formatting(String),

    // ========================================================================
    // Execution
    // ========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // General
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // External error conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Other
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is reported per call, leaving sibling calls in
    /// the same batch unaffected
    pub fn is_per_call(&self) -> bool {
        matches!(
            self,
            Error::PermissionDenied(_)
                | Error::ToolNotFound(_)
                | Error::ToolExecution { .. }
                | Error::Timeout(_)
                | Error::Formatting(_)
        )
    }

    /// Whether this error aborts the whole request before any tool runs
    pub fn is_request_level(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFormat(_) | Error::InvalidInput(_) | Error::Config(_)
        )
    }

    /// Tool execution error helper
    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From implementations (additional conversions)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
