//! Echo tool - returns its input, used to exercise the call pipeline

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{Tool, ToolDef};
use toolgate_foundation::ToolResult;

/// Echo tool for testing tool invocation end to end
pub struct EchoTool;

#[derive(Debug, Deserialize)]
struct EchoParams {
    message: String,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    suffix: Option<String>,
}

impl EchoTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> ToolDef {
        ToolDef::builder("echo", "Return the input message, optionally decorated.")
            .string_param("message", "The message to return", true)
            .string_param("prefix", "Optional prefix prepended to the message", false)
            .string_param("suffix", "Optional suffix appended to the message", false)
            .build()
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let params: EchoParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::fail(format!("Invalid parameters: {}", e)),
        };

        let mut processed = params.message.clone();
        if let Some(prefix) = &params.prefix {
            processed = format!("{} {}", prefix, processed);
        }
        if let Some(suffix) = &params.suffix {
            processed = format!("{} {}", processed, suffix);
        }

        ToolResult::ok(json!({
            "original_message": params.message,
            "processed_message": processed,
            "prefix": params.prefix,
            "suffix": params.suffix,
        }))
    }
}
