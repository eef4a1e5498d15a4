//! Core types shared by every layer

mod types;

pub use types::{Message, MessageRole, ToolCall, ToolResult};
