//! Input to an authorization check.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request context supplied with a check.
///
/// A `BTreeMap` keeps keys in lexicographic order, so two contexts with the
/// same pairs are structurally equal regardless of the order they were
/// supplied in.
pub type Context = BTreeMap<String, serde_json::Value>;

/// Well-known role names used by the decision rules.
pub mod roles {
    /// Full access to every resource and operation.
    pub const ADMIN: &str = "admin";

    /// Access to product and content resources.
    pub const CONTENT_ADMIN: &str = "content-admin";

    /// Default role for authenticated principals without an explicit role.
    pub const CUSTOMER: &str = "customer";
}

/// One authorization check: who wants to do what to which resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCheck {
    /// Principal the check is performed for.
    pub principal_id: String,

    /// Named resource being accessed, e.g. `products` or `sap:orders`.
    pub resource: String,

    /// Operation attempted on the resource, e.g. `read` or `create`.
    pub operation: String,

    /// Roles in effect for the principal. Empty for anonymous principals.
    pub roles: Vec<String>,

    /// Optional request context; empty map means no context.
    #[serde(default)]
    pub context: Context,
}

impl AccessCheck {
    /// Build a check with no roles and no context.
    #[must_use]
    pub fn new(
        principal_id: impl Into<String>,
        resource: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            resource: resource.into(),
            operation: operation.into(),
            roles: Vec::new(),
            context: Context::new(),
        }
    }

    /// Set the roles in effect.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// Set the request context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Whether the principal holds the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
