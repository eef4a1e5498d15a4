//! Session management
//!
//! A session scopes conversation history and tool permissions to one
//! logical conversation. Sessions live only in memory and disappear on
//! explicit deletion or idle expiry; both are normal outcomes, not
//! faults.

mod session;
mod store;

pub use session::{PermissionPolicy, Session};
pub use store::{SessionStore, DEFAULT_IDLE_TIMEOUT};
