//! # toolgate-foundation
//!
//! Foundation layer for ToolGate:
//! - Core: shared types (ToolCall, ToolResult, Message)
//! - Cache: fingerprinted result cache with TTL and LRU eviction
//! - Session: per-conversation history and tool permissions
//! - Config: unified settings (GateConfig)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Dispatcher (Layer3)                                 │
//! │        │                                             │
//! │        ├──► Session Store (permission, history)      │
//! │        ├──► Result Cache  (lookup / store)           │
//! │        └──► Tool Registry (Layer2, on miss)          │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod session;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core types
// ============================================================================
pub use core::{Message, MessageRole, ToolCall, ToolResult};

// ============================================================================
// Cache
// ============================================================================
pub use cache::{hash_params, CacheKey, CacheStats, LruCache, ResultCache};

// ============================================================================
// Session
// ============================================================================
pub use session::{PermissionPolicy, Session, SessionStore};

// ============================================================================
// Config
// ============================================================================
pub use config::{CacheConfig, DispatchConfig, GateConfig, SessionConfig, GATE_CONFIG_FILE};
