//! Result caching
//!
//! ## Components
//!
//! - **key**: canonical fingerprint of tool name + parameters
//! - **lru**: generic least-recently-used cache
//! - **store**: the shared `ResultCache` with TTL and statistics

mod key;
mod lru;
mod store;

pub use key::{hash_params, CacheKey};
pub use lru::LruCache;
pub use store::{CacheStats, ResultCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
