//! # toolgate-tool
//!
//! Tool system for ToolGate providing:
//! - Tool trait and definition builder
//! - ToolRegistry (explicit, injected - no global state)
//! - Builtin tools (echo, weather, http_request)

pub mod builtin;
pub mod registry;
pub mod r#trait;

pub use r#trait::{Tool, ToolDef, ToolDefBuilder, ToolParameters};
pub use registry::ToolRegistry;

// Re-export builtin tools
pub use builtin::{echo::EchoTool, http::HttpRequestTool, weather::WeatherTool};
