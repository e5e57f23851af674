//! The identity resolution boundary.
//!
//! Resolving a bearer credential to a principal and role set is an
//! external concern; the gateway only depends on the [`IdentityResolver`]
//! trait. The shipped implementation reads a static token map from
//! configuration. An unknown or absent credential resolves to no identity,
//! which the orchestrator treats as the anonymous principal.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{HeaderMap, header::AUTHORIZATION};

use authority_core::roles;

use crate::config::{AuthSettings, TokenIdentity};

/// Principal used when no identity can be resolved.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Identity resolved from a bearer credential.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    /// Principal the credential belongs to.
    pub principal_id: String,

    /// Single role read from account metadata; `customer` when unset.
    pub role: String,
}

/// Trait for resolving bearer credentials to identities.
///
/// Abstracts the session/account lookup so tests can substitute a
/// deterministic resolver.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a bearer token. `None` means unauthenticated.
    async fn resolve_bearer(&self, token: &str) -> Option<ResolvedIdentity>;
}

/// Config-driven resolver over a static token map.
pub struct StaticTokenResolver {
    tokens: HashMap<String, TokenIdentity>,
}

impl StaticTokenResolver {
    #[must_use]
    pub fn from_config(auth: &AuthSettings) -> Self {
        Self {
            tokens: auth.tokens.clone(),
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
    async fn resolve_bearer(&self, token: &str) -> Option<ResolvedIdentity> {
        self.tokens.get(token).map(|identity| ResolvedIdentity {
            principal_id: identity.user_id.clone(),
            role: identity
                .role
                .clone()
                .unwrap_or_else(|| roles::CUSTOMER.to_string()),
        })
    }
}

/// Extract the bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
