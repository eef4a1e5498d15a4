//! Common types: tool calls, tool results, conversation messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// Tool Call
// ============================================================================

/// A single requested tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Create a call with a generated ID
    pub fn named(name: impl Into<String>, arguments: Value) -> Self {
        let id = format!("call_{}", &Uuid::new_v4().simple().to_string()[..8]);
        Self::new(id, name, arguments)
    }
}

// ============================================================================
// Tool Result
// ============================================================================

/// Result of a tool invocation
///
/// An immutable value: `data` is present iff the call succeeded, `error`
/// iff it failed. Failures are ordinary values so that a batch can carry
/// a mix of successes and failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the invocation succeeded
    pub success: bool,

    /// Result payload (present iff success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error description (present iff failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a success result
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create a failure result
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Error message, or a generic fallback for malformed results
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown error")
    }
}

// ============================================================================
// Conversation Messages
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A role-tagged turn in a session's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,

    /// Role of this message
    pub role: MessageRole,

    /// Text content
    pub content: String,

    /// The tool call this message carries or answers (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,

    /// When the message was appended
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            tool_call: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message announcing a tool call
    pub fn assistant_call(call: ToolCall) -> Self {
        let mut msg = Self::new(MessageRole::Assistant, String::new());
        msg.tool_call = Some(call);
        msg
    }

    /// Create a tool message carrying a (formatted) result
    pub fn tool_result(call: ToolCall, content: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageRole::Tool, content);
        msg.tool_call = Some(call);
        msg
    }
}
