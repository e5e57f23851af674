//! Request orchestration: single check, batch check, invalidation, status.
//!
//! Each flow is request-scoped and linear: resolve identity, build the
//! cache key, consult the cache, compute on miss, store, respond. The
//! cache is the only shared resource; concurrent identical misses may both
//! compute and both write (last write wins, accepted).

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use authority_cache::decision_key;
use authority_core::{AccessCheck, Context, Decision};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::identity::{ANONYMOUS_PRINCIPAL, ResolvedIdentity, bearer_token};
use crate::server::AppState;

/// Features advertised by the status endpoint.
const FEATURES: [&str; 4] = [
    "single-check",
    "batch-check",
    "decision-caching",
    "scoped-invalidation",
];

// ---- Request / response types ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// Overrides the authenticated principal when present.
    #[serde(default)]
    pub user_id: Option<String>,
    pub resource: String,
    pub operation: String,
    #[serde(default)]
    pub context: Context,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub success: bool,
    pub decision: Decision,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub checks: Vec<CheckRequest>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    /// Keyed by input position: `check_0`, `check_1`, ...
    pub decisions: IndexMap<String, Decision>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateRequest {
    #[serde(default)]
    pub target_user_id: Option<String>,
    #[serde(default)]
    pub invalidate_all: bool,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

// ---- Handlers ----

/// `POST /` - evaluate one check, cache-first.
pub async fn check(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let identity = resolve_identity(&state, &headers).await;
    let decision = run_check(&state, identity.as_ref(), request).await?;
    Ok(Json(CheckResponse {
        success: true,
        decision,
    }))
}

/// `POST /batch` - evaluate an ordered list of checks independently.
///
/// There is no partial-success contract: one invalid entry fails the whole
/// request with a 400.
pub async fn batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let identity = resolve_identity(&state, &headers).await;

    let mut decisions = IndexMap::with_capacity(request.checks.len());
    for (index, entry) in request.checks.into_iter().enumerate() {
        let decision = run_check(&state, identity.as_ref(), entry).await?;
        decisions.insert(format!("check_{index}"), decision);
    }

    Ok(Json(BatchResponse {
        success: true,
        decisions,
    }))
}

/// `DELETE /invalidate` - clear everything or one principal's entries.
pub async fn invalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    if request.invalidate_all {
        state.cache.clear().await;
        tracing::info!("authorization cache cleared");
        return Ok(Json(InvalidateResponse {
            success: true,
            message: "Authorization cache cleared".to_string(),
        }));
    }

    let identity = resolve_identity(&state, &headers).await;
    let target = request
        .target_user_id
        .or_else(|| identity.map(|i| i.principal_id));
    let Some(target) = target else {
        return Err(ApiError::BadRequest(
            "No invalidation target: supply targetUserId, set invalidateAll, or authenticate"
                .to_string(),
        ));
    };

    let removed = state.cache.invalidate_principal(&target).await;
    tracing::info!(principal = %target, removed, "scoped cache invalidation");
    Ok(Json(InvalidateResponse {
        success: true,
        message: format!("Invalidated {removed} cached decisions for {target}"),
    }))
}

/// `GET /status` - read-only cache and feature introspection.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.cache.stats().await;
    let body = json!({
        "success": true,
        "status": "ok",
        "cache": cache,
        "features": FEATURES,
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

/// `GET /healthz` - liveness probe.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `GET /metrics` - Prometheus scrape output.
pub async fn metrics() -> impl IntoResponse {
    match crate::metrics::render_metrics() {
        Some(body) => (StatusCode::OK, body).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not initialized").into_response(),
    }
}

// ---- Orchestration ----

async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Option<ResolvedIdentity> {
    let token = bearer_token(headers)?;
    state.identity.resolve_bearer(token).await
}

/// One check: validate, build the key, cache-first, compute-and-store on miss.
async fn run_check(
    state: &AppState,
    identity: Option<&ResolvedIdentity>,
    request: CheckRequest,
) -> Result<Decision, ApiError> {
    if request.resource.is_empty() {
        return Err(ApiError::BadRequest("resource must not be empty".to_string()));
    }
    if request.operation.is_empty() {
        return Err(ApiError::BadRequest(
            "operation must not be empty".to_string(),
        ));
    }

    // Body-supplied identity is authoritative; otherwise the resolved
    // principal; otherwise anonymous with no roles.
    let principal_id = request
        .user_id
        .or_else(|| identity.map(|i| i.principal_id.clone()))
        .unwrap_or_else(|| ANONYMOUS_PRINCIPAL.to_string());
    let roles = identity
        .map(|i| vec![i.role.clone()])
        .unwrap_or_default();

    let check = AccessCheck {
        principal_id,
        resource: request.resource,
        operation: request.operation,
        roles,
        context: request.context,
    };

    let cache_key = decision_key(
        &check.principal_id,
        &check.resource,
        &check.operation,
        &check.context,
    );

    if let Some(cached) = state.cache.get(&cache_key).await {
        crate::metrics::record_decision(cached.allowed, true);
        return Ok(cached);
    }

    let decision = authority_engine::decide(&check);
    state
        .cache
        .set(&cache_key, &decision, state.decision_ttl)
        .await;
    crate::metrics::record_decision(decision.allowed, false);
    Ok(decision)
}
