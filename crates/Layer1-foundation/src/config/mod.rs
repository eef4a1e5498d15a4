//! Configuration
//!
//! One `GateConfig` with a section per subsystem, loadable from TOML.
//! Every field has a default, so a missing file or a partial file is
//! always valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::PermissionPolicy;

/// Default configuration filename
pub const GATE_CONFIG_FILE: &str = "toolgate.toml";

// ============================================================================
// Sections
// ============================================================================

/// Result cache policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for stored entries, in seconds
    pub ttl_secs: u64,

    /// Maximum number of live entries
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Session store policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle period after which a session is swept, in seconds
    pub idle_timeout_secs: u64,

    /// What an empty allow-list means
    pub default_policy: PermissionPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            default_policy: PermissionPolicy::AllowByDefault,
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Dispatcher policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Per-call execution budget, in seconds
    pub tool_timeout_secs: u64,

    /// Buffer size of the streaming event channel
    pub event_buffer: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 5,
            event_buffer: 64,
        }
    }
}

impl DispatchConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

// ============================================================================
// GateConfig
// ============================================================================

/// Unified ToolGate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub cache: CacheConfig,
    pub session: SessionConfig,
    pub dispatch: DispatchConfig,
}

impl GateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GateConfig::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.session.idle_timeout(), Duration::from_secs(3600));
        assert_eq!(config.session.default_policy, PermissionPolicy::AllowByDefault);
        assert_eq!(config.dispatch.tool_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GateConfig::from_toml(
            r#"
            [cache]
            ttl_secs = 60

            [session]
            default_policy = "deny_by_default"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.max_entries, 1000); // default survives
        assert_eq!(config.session.default_policy, PermissionPolicy::DenyByDefault);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = GateConfig::from_toml("cache = 12").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
