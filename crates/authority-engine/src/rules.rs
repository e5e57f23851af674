//! The authorization rule table.
//!
//! # Evaluation order
//!
//! First match wins, default is deny:
//!
//! 1. `admin` role: full access.
//! 2. `content-admin` role: product and content resources only.
//! 3. Everyone else (the `customer` role and anonymous principals share
//!    one branch): public reads, order creation, SAP resources with a
//!    sold-to context, and the diagnostic test resources.
//! 4. Deny.
//!
//! The table is intentionally closed: extending it means adding another
//! branch here, not parsing policy syntax.

use std::time::Instant;

use authority_core::{AccessCheck, Decision, DecisionMetadata, roles};

/// Resources readable by any principal.
const PUBLIC_READ_RESOURCES: [&str; 3] = ["products", "news", "orders"];

/// Evaluate the rule table for one check.
///
/// Deterministic for identical inputs: `allowed` and `reason` never vary
/// between calls. The returned metadata records wall-clock execution time
/// and always carries `cached = false`; the cache layer alone rewrites
/// that flag.
#[must_use]
pub fn decide(check: &AccessCheck) -> Decision {
    let started = Instant::now();
    let allow = allow_reason(check);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    let metadata = DecisionMetadata::computed(
        &check.resource,
        &check.operation,
        check.roles.clone(),
        elapsed_ms,
    );

    let decision = match allow {
        Some(reason) => Decision::allow(reason, metadata),
        None => Decision::deny("Access denied", metadata),
    };

    tracing::debug!(
        principal = %check.principal_id,
        resource = %check.resource,
        operation = %check.operation,
        allowed = decision.allowed,
        reason = %decision.reason,
        "authorization decision"
    );

    decision
}

/// Walk the rule table; `Some(reason)` on the first allowing rule.
fn allow_reason(check: &AccessCheck) -> Option<&'static str> {
    if check.has_role(roles::ADMIN) {
        return Some("Admin access granted");
    }

    if check.has_role(roles::CONTENT_ADMIN) {
        if check.resource == "products" {
            return Some("Content admin product access granted");
        }
        if check.resource.contains("news") || check.resource.contains("content") {
            return Some("Content admin content access granted");
        }
        // Strict else-if chain: a content admin outside its resources does
        // not fall through to the customer rules.
        return None;
    }

    if check.operation == "read" && PUBLIC_READ_RESOURCES.contains(&check.resource.as_str()) {
        return Some("Customer read access granted");
    }

    if check.operation == "create" && check.resource == "orders" {
        return Some("Customer order creation allowed");
    }

    if check.resource.starts_with("sap:") && has_sold_to(check) {
        return Some("SAP customer access granted");
    }

    if check.resource == "cache-test" || check.resource == "test" {
        return Some("Test resource access granted");
    }

    None
}

/// A non-empty `soldToId` in the request context.
fn has_sold_to(check: &AccessCheck) -> bool {
    match check.context.get("soldToId") {
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(serde_json::Value::Null) | None => false,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authority_core::Context;

    fn check(resource: &str, operation: &str, roles: &[&str]) -> AccessCheck {
        AccessCheck::new("user-1", resource, operation)
            .with_roles(roles.iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn admin_is_allowed_everything() {
        for (resource, operation) in [
            ("products", "read"),
            ("secret-resource", "delete"),
            ("sap:orders", "write"),
        ] {
            let decision = decide(&check(resource, operation, &["admin"]));
            assert!(decision.allowed, "{resource}/{operation}");
            assert_eq!(decision.reason, "Admin access granted");
        }
    }

    #[test]
    fn content_admin_products_and_content() {
        let decision = decide(&check("products", "update", &["content-admin"]));
        assert!(decision.allowed);
        assert_eq!(decision.reason, "Content admin product access granted");

        let decision = decide(&check("news-articles", "update", &["content-admin"]));
        assert!(decision.allowed);
        assert_eq!(decision.reason, "Content admin content access granted");

        let decision = decide(&check("page-content", "delete", &["content-admin"]));
        assert!(decision.allowed);
    }

    #[test]
    fn content_admin_does_not_inherit_customer_rules() {
        // "orders"/"read" is a customer rule, but the content-admin branch
        // is a strict else-if chain.
        let decision = decide(&check("orders", "read", &["content-admin"]));
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Access denied");
    }

    #[test]
    fn customer_public_reads() {
        for resource in ["products", "news", "orders"] {
            let decision = decide(&check(resource, "read", &["customer"]));
            assert!(decision.allowed, "{resource}");
            assert_eq!(decision.reason, "Customer read access granted");
        }

        let decision = decide(&check("products", "delete", &["customer"]));
        assert!(!decision.allowed);
    }

    #[test]
    fn customer_order_creation() {
        let decision = decide(&check("orders", "create", &["customer"]));
        assert!(decision.allowed);
        assert_eq!(decision.reason, "Customer order creation allowed");
    }

    #[test]
    fn anonymous_shares_the_customer_branch() {
        let decision = decide(&check("news", "read", &[]));
        assert!(decision.allowed);
        assert_eq!(decision.reason, "Customer read access granted");
    }

    #[test]
    fn sap_resource_requires_sold_to_context() {
        let mut context = Context::new();
        context.insert("soldToId".into(), serde_json::json!("0001002003"));
        let with_context = check("sap:orders", "read", &["customer"]).with_context(context);
        let decision = decide(&with_context);
        assert!(decision.allowed);
        assert_eq!(decision.reason, "SAP customer access granted");

        let decision = decide(&check("sap:orders", "read", &["customer"]));
        assert!(!decision.allowed);

        let mut empty = Context::new();
        empty.insert("soldToId".into(), serde_json::json!(""));
        let decision = decide(&check("sap:orders", "read", &[]).with_context(empty));
        assert!(!decision.allowed);
    }

    #[test]
    fn diagnostic_resources_pass_through() {
        for resource in ["cache-test", "test"] {
            let decision = decide(&check(resource, "read", &[]));
            assert!(decision.allowed, "{resource}");
            assert_eq!(decision.reason, "Test resource access granted");
        }
    }

    #[test]
    fn default_deny() {
        let decision = decide(&check("secret-resource", "delete", &[]));
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Access denied");
    }

    #[test]
    fn decisions_are_deterministic() {
        let input = check("orders", "create", &["customer"]);
        let first = decide(&input);
        let second = decide(&input);
        assert_eq!(first.allowed, second.allowed);
        assert_eq!(first.reason, second.reason);
    }

    #[test]
    fn engine_never_marks_cached() {
        let decision = decide(&check("orders", "read", &["customer"]));
        assert!(!decision.metadata.cached);
        assert!(decision.metadata.cache_source.is_none());
        assert_eq!(decision.metadata.roles, vec!["customer".to_string()]);
        assert_eq!(decision.metadata.resource, "orders");
        assert_eq!(decision.metadata.operation, "read");
    }
}
