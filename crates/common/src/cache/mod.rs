//! Cache key derivation
//!
//! Result caching happens outside the engines. This module only derives the
//! key a caller should cache under: engine name, snapshot version and the
//! serialized request parameters, hashed with SHA-256.

use crate::errors::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Key prefix for namespacing
pub const CACHE_KEY_PREFIX: &str = "litgraph";

/// Derive the cache key for one analysis request
pub fn cache_key<P: Serialize>(engine: &str, snapshot_version: &str, params: &P) -> Result<String> {
    let encoded = serde_json::to_vec(params)?;

    let mut hasher = Sha256::new();
    hasher.update(engine.as_bytes());
    hasher.update([0u8]);
    hasher.update(snapshot_version.as_bytes());
    hasher.update([0u8]);
    hasher.update(&encoded);
    let hash = hex::encode(hasher.finalize());

    Ok(format!("{}:{}:{}", CACHE_KEY_PREFIX, engine, &hash[..32]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_stable() {
        let params = json!({ "decay": 0.5, "max_depth": 3 });
        let a = cache_key("influence", "v1", &params).unwrap();
        let b = cache_key("influence", "v1", &params).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("litgraph:influence:"));
    }

    #[test]
    fn test_key_changes_with_snapshot_and_params() {
        let params = json!({ "decay": 0.5 });
        let base = cache_key("influence", "v1", &params).unwrap();
        assert_ne!(base, cache_key("influence", "v2", &params).unwrap());
        assert_ne!(base, cache_key("influence", "v1", &json!({ "decay": 0.6 })).unwrap());
        assert_ne!(base, cache_key("similarity", "v1", &params).unwrap());
    }
}
