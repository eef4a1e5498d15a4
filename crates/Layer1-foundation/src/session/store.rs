//! Session Store
//!
//! Shared map of live sessions. Sessions are created on demand, expire
//! after a configurable idle period, and are only ever mutated through
//! the operations here so the activity timestamps stay honest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::Message;
use crate::error::{Error, Result};
use crate::session::session::{generate_session_id, PermissionPolicy, Session};

/// Default idle timeout before a session is swept
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Store of per-conversation sessions
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    policy: PermissionPolicy,
}

impl SessionStore {
    /// Create a store with the default (allow-by-default) policy
    pub fn new() -> Self {
        Self::with_policy(PermissionPolicy::default())
    }

    /// Create a store with an explicit empty-allow-list policy
    pub fn with_policy(policy: PermissionPolicy) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// The configured empty-allow-list policy
    pub fn policy(&self) -> PermissionPolicy {
        self.policy
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Allocate a fresh session and return its ID
    pub async fn create(&self) -> String {
        let session = Session::new(generate_session_id());
        let id = session.id().to_string();
        self.sessions.write().await.insert(id.clone(), session);
        info!(session_id = %id, "session created");
        id
    }

    /// Resolve a session exactly once per request
    ///
    /// Returns `(session_id, is_new)`. A supplied ID that is absent
    /// (never created, deleted, or swept mid-flight) yields a fresh
    /// session under that same ID rather than an error.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> (String, bool) {
        let mut sessions = self.sessions.write().await;

        if let Some(id) = session_id {
            if let Some(session) = sessions.get_mut(id) {
                session.touch();
                return (id.to_string(), false);
            }
        }

        let session = Session::new(
            session_id
                .map(str::to_string)
                .unwrap_or_else(generate_session_id),
        );
        let id = session.id().to_string();
        sessions.insert(id.clone(), session);
        info!(session_id = %id, "session created");
        (id, true)
    }

    /// Idempotent removal; returns whether a session was present
    pub async fn delete(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            debug!(session_id, "session deleted");
        }
        removed
    }

    /// Remove every session idle longer than `idle_timeout`
    ///
    /// Intended to run periodically, independent of request handling. A
    /// dispatch racing the sweep simply recreates its session on the next
    /// `get_or_create`.
    pub async fn sweep_expired(&self, idle_timeout: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.idle_for() <= idle_timeout);
        let swept = before - sessions.len();
        if swept > 0 {
            info!(swept, "swept idle sessions");
        }
        swept
    }

    /// Spawn a background task that sweeps idle sessions on an interval
    ///
    /// Runs until the returned handle is aborted or dropped by the
    /// caller's runtime shutting down.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        idle_timeout: Duration,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.sweep_expired(idle_timeout).await;
            }
        })
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Clone of the full session state (for inspection/reporting)
    pub async fn snapshot(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Append a message to a session's history
    pub async fn append_message(&self, session_id: &str, message: Message) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        session.append_message(message);
        Ok(())
    }

    /// Snapshot of a session's history
    pub async fn messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        Ok(session.messages())
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    /// Grant a tool to a session
    pub async fn allow(&self, session_id: &str, tool_name: &str) -> Result<()> {
        self.with_session(session_id, |s| s.allow(tool_name)).await
    }

    /// Grant several tools at once
    pub async fn allow_many(&self, session_id: &str, tool_names: &[&str]) -> Result<()> {
        self.with_session(session_id, |s| s.allow_many(tool_names.iter().copied()))
            .await
    }

    /// Revoke a tool from a session
    pub async fn disallow(&self, session_id: &str, tool_name: &str) -> Result<()> {
        self.with_session(session_id, |s| s.disallow(tool_name)).await
    }

    /// Clear all grants, returning the session to the default policy
    pub async fn reset_permissions(&self, session_id: &str) -> Result<()> {
        self.with_session(session_id, Session::reset_permissions).await
    }

    /// Whether a session permits a tool under the configured policy
    pub async fn is_allowed(&self, session_id: &str, tool_name: &str) -> Result<bool> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        Ok(session.is_allowed(tool_name, self.policy))
    }

    async fn with_session<F>(&self, session_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        f(session);
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_or_create() {
        let store = SessionStore::new();

        let id = store.create().await;
        let (resolved, is_new) = store.get_or_create(Some(&id)).await;
        assert_eq!(resolved, id);
        assert!(!is_new);

        let (_, is_new) = store.get_or_create(None).await;
        assert!(is_new);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_absent_id_recreated_under_same_id() {
        let store = SessionStore::new();
        let (id, is_new) = store.get_or_create(Some("session-ghost")).await;
        assert!(is_new);
        assert_eq!(id, "session-ghost");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = SessionStore::new();
        let id = store.create().await;

        assert!(store.delete(&id).await);
        assert!(!store.delete(&id).await);
        assert!(store.snapshot(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_idle_sessions() {
        let store = SessionStore::new();
        let idle = store.create().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let fresh = store.create().await;

        let swept = store.sweep_expired(Duration::from_millis(15)).await;
        assert_eq!(swept, 1);
        assert!(store.snapshot(&idle).await.is_none());
        assert!(store.snapshot(&fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_activity_refresh_prevents_sweep() {
        let store = SessionStore::new();
        let id = store.create().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Any store operation on the session refreshes its activity
        store.allow(&id, "echo").await.unwrap();
        let swept = store.sweep_expired(Duration::from_millis(15)).await;
        assert_eq!(swept, 0);
    }

    #[tokio::test]
    async fn test_background_sweeper() {
        let store = Arc::new(SessionStore::new());
        store.create().await;

        let handle = store.spawn_sweeper(Duration::from_millis(10), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.len().await, 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_permission_operations() {
        let store = SessionStore::with_policy(PermissionPolicy::DenyByDefault);
        let id = store.create().await;

        assert!(!store.is_allowed(&id, "weather").await.unwrap());
        store.allow(&id, "weather").await.unwrap();
        assert!(store.is_allowed(&id, "weather").await.unwrap());
        store.disallow(&id, "weather").await.unwrap();
        assert!(!store.is_allowed(&id, "weather").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_session_is_an_error_for_mutations() {
        let store = SessionStore::new();
        let err = store.allow("session-missing", "echo").await.unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_history_snapshot() {
        let store = SessionStore::new();
        let id = store.create().await;

        store.append_message(&id, Message::user("hi")).await.unwrap();
        let snapshot = store.messages(&id).await.unwrap();
        store.append_message(&id, Message::user("again")).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.messages(&id).await.unwrap().len(), 2);
    }
}
