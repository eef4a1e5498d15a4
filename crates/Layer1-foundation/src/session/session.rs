//! Session state: message history, tool allow-list, activity timestamps

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Message;

/// What an empty allow-list means
///
/// The allow-list semantics are security-relevant, so the default is an
/// explicit, injected policy rather than an implicit behavior:
/// `AllowByDefault` treats an empty set as "no restriction", matching
/// permissive single-tenant deployments; `DenyByDefault` treats it as
/// "nothing allowed until granted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    AllowByDefault,
    DenyByDefault,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::AllowByDefault
    }
}

/// Generate a fresh session identifier
pub(crate) fn generate_session_id() -> String {
    format!("session-{}", Uuid::new_v4().simple())
}

/// Per-conversation state
///
/// Owned by the `SessionStore` and mutated only through it; callers get
/// snapshots, never live references into the store.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    messages: Vec<Message>,
    allowed_tools: HashSet<String>,
    created_at: DateTime<Utc>,
    last_activity: Instant,
}

impl Session {
    pub(crate) fn new(session_id: String) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
            allowed_tools: HashSet::new(),
            created_at: Utc::now(),
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Mark the session active now
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// How long the session has been idle
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Append a message and refresh activity
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// Snapshot of the history (later mutation does not affect the copy)
    pub fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Drop the history, keeping permissions
    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.touch();
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    pub fn allow(&mut self, tool_name: impl Into<String>) {
        self.allowed_tools.insert(tool_name.into());
        self.touch();
    }

    pub fn allow_many<I, S>(&mut self, tool_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools.extend(tool_names.into_iter().map(Into::into));
        self.touch();
    }

    pub fn disallow(&mut self, tool_name: &str) {
        self.allowed_tools.remove(tool_name);
        self.touch();
    }

    /// Remove every grant, returning the session to the default policy
    pub fn reset_permissions(&mut self) {
        self.allowed_tools.clear();
        self.touch();
    }

    /// Whether the session permits a tool under the given policy
    ///
    /// An empty allow-list defers to the policy; a non-empty one is
    /// authoritative.
    pub fn is_allowed(&self, tool_name: &str, policy: PermissionPolicy) -> bool {
        if self.allowed_tools.is_empty() {
            return policy == PermissionPolicy::AllowByDefault;
        }
        self.allowed_tools.contains(tool_name)
    }

    pub fn allowed_tools(&self) -> Vec<String> {
        self.allowed_tools.iter().cloned().collect()
    }
}
