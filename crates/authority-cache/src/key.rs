//! Deterministic cache key construction.
//!
//! Key shape: `authority:<principal>:<resource>:<operation>:<digest>`.
//! The context digest is a full SHA-256 over the sorted context pairs, so
//! two requests with the same context produce the same key regardless of
//! the order the keys were supplied in.

use authority_core::Context;
use sha2::{Digest, Sha256};

/// Namespace prefix for every key written by this service.
///
/// Scoped invalidation and `clear` only ever touch keys under this prefix,
/// so a Redis instance shared with other subsystems is safe.
pub const NAMESPACE: &str = "authority:";

/// Digest used when no context was supplied.
const EMPTY_CONTEXT_DIGEST: &str = "none";

/// Build the cache key for one check. Pure and total.
#[must_use]
pub fn decision_key(
    principal_id: &str,
    resource: &str,
    operation: &str,
    context: &Context,
) -> String {
    format!(
        "{NAMESPACE}{principal_id}:{resource}:{operation}:{}",
        context_digest(context)
    )
}

/// Key prefix owned by a single principal, used for scoped invalidation.
#[must_use]
pub fn principal_prefix(principal_id: &str) -> String {
    format!("{NAMESPACE}{principal_id}:")
}

/// Digest the context into a fixed-length token.
///
/// Context keys are already lexicographically ordered (`BTreeMap`), so the
/// serialization `key:value|key:value|...` is stable. Values render as
/// compact JSON.
fn context_digest(context: &Context) -> String {
    if context.is_empty() {
        return EMPTY_CONTEXT_DIGEST.to_string();
    }

    let serialized = context
        .iter()
        .map(|(key, value)| format!("{key}:{value}"))
        .collect::<Vec<_>>()
        .join("|");

    hex::encode(Sha256::digest(serialized.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable_under_context_reordering() {
        let mut first = Context::new();
        first.insert("a".into(), serde_json::json!(1));
        first.insert("b".into(), serde_json::json!(2));

        let mut second = Context::new();
        second.insert("b".into(), serde_json::json!(2));
        second.insert("a".into(), serde_json::json!(1));

        assert_eq!(
            decision_key("user-1", "orders", "read", &first),
            decision_key("user-1", "orders", "read", &second)
        );
    }

    #[test]
    fn different_contexts_yield_different_keys() {
        let mut first = Context::new();
        first.insert("soldToId".into(), serde_json::json!("1000"));

        let mut second = Context::new();
        second.insert("soldToId".into(), serde_json::json!("2000"));

        assert_ne!(
            decision_key("user-1", "sap:orders", "read", &first),
            decision_key("user-1", "sap:orders", "read", &second)
        );
    }

    #[test]
    fn empty_context_uses_sentinel_digest() {
        let key = decision_key("user-1", "products", "read", &Context::new());
        assert_eq!(key, "authority:user-1:products:read:none");
    }

    #[test]
    fn structured_context_values_are_stable() {
        let mut first = Context::new();
        first.insert("filter".into(), serde_json::json!({"region": "EU", "tier": 2}));

        let mut second = Context::new();
        second.insert("filter".into(), serde_json::json!({"region": "EU", "tier": 2}));

        assert_eq!(
            decision_key("user-1", "orders", "read", &first),
            decision_key("user-1", "orders", "read", &second)
        );
    }

    #[test]
    fn principal_prefix_scopes_keys() {
        let key = decision_key("user-1", "orders", "read", &Context::new());
        assert!(key.starts_with(&principal_prefix("user-1")));
        // The trailing colon keeps "user-1" from matching "user-10" keys.
        assert!(!key.starts_with(&principal_prefix("user-10")));
        assert!(principal_prefix("user-1").starts_with(NAMESPACE));
    }
}
