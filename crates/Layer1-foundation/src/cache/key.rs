//! Cache key fingerprinting
//!
//! A fingerprint is derived from the tool name plus a canonical hash of
//! the parameters: object keys are visited in sorted order, so two
//! parameter maps with the same values but different field ordering
//! produce the same key.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::Value;

/// Compute a canonical hash for a JSON value
///
/// Each node is tagged with its type before hashing so that e.g. the
/// string "1" and the number 1 cannot collide structurally.
pub fn hash_params(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_value(value, &mut hasher);
    hasher.finish()
}

fn hash_value(value: &Value, hasher: &mut DefaultHasher) {
    match value {
        Value::Null => {
            hasher.write_u8(0);
        }
        Value::Bool(b) => {
            hasher.write_u8(1);
            b.hash(hasher);
        }
        Value::Number(n) => {
            hasher.write_u8(2);
            // String form gives consistent hashing across integer/float reprs
            n.to_string().hash(hasher);
        }
        Value::String(s) => {
            hasher.write_u8(3);
            s.hash(hasher);
        }
        Value::Array(arr) => {
            hasher.write_u8(4);
            hasher.write_usize(arr.len());
            for item in arr {
                hash_value(item, hasher);
            }
        }
        Value::Object(obj) => {
            hasher.write_u8(5);
            hasher.write_usize(obj.len());
            // Sorted keys make the fingerprint order-independent
            let mut keys: Vec<_> = obj.keys().collect();
            keys.sort();
            for key in keys {
                key.hash(hasher);
                if let Some(v) = obj.get(key) {
                    hash_value(v, hasher);
                }
            }
        }
    }
}

/// Fingerprint addressing one cached tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tool_name: String,
    params_hash: u64,
}

impl CacheKey {
    pub fn new(tool_name: &str, params: &Value) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            params_hash: hash_params(params),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }
}
