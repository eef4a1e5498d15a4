//! # toolgate-dispatch
//!
//! Dispatch layer for ToolGate providing:
//! - Invocation Dispatcher (batch and streaming orchestration)
//! - Result Formatter (json, markdown, text, html)
//! - Dispatch event taxonomy + stream state machine
//! - Single-flight de-duplication per cache fingerprint
//!
//! The API layer hands the dispatcher a session ID, a list of tool
//! calls, a mode, and an output format; it gets back an aggregated
//! response or a channel of typed events. Everything else (HTTP, auth,
//! SSE encoding) lives above this crate.

pub mod dispatcher;
pub mod event;
pub mod format;
pub mod single_flight;

pub use dispatcher::{
    DispatchMode, DispatchRequest, DispatchResponse, Dispatcher, DispatcherConfig,
};
pub use event::{DispatchEvent, StreamState};
pub use format::{
    format_call_result, format_result, FormatMetadata, FormattedResult, OutputFormat,
};
pub use single_flight::SingleFlight;
