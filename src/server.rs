//! HTTP surface. Routes stay thin: authenticate, decode, delegate to the
//! handler, wrap the success envelope. All policy lives in `handlers`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::handlers::{self, AppContext, GenerateRequest, RefreshRequest};
use crate::store::{BriefFilter, SortField, SortOrder};
use crate::traits::IdentityProvider;
use crate::types::User;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    pub identity: Arc<dyn IdentityProvider>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/briefs/generate", post(generate_handler))
        .route("/api/briefs", get(list_handler))
        .route(
            "/api/briefs/:id",
            get(get_handler).patch(patch_handler).delete(delete_handler),
        )
        .route("/api/briefs/:id/refresh", post(refresh_handler))
        .route(
            "/api/user/linkedin",
            post(connect_profile_handler).delete(disconnect_profile_handler),
        )
        .route("/api/user/linkedin/sync", post(sync_profile_handler))
        .with_state(state)
}

pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Verify the bearer token and resolve the local user record, creating it on
/// first sight. A rejected token is 401; an unreachable verifier is 500.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token =
        bearer_token(headers).ok_or_else(|| ApiError::Auth("missing bearer token".to_string()))?;
    let identity = state
        .identity
        .verify(token)
        .await
        .map_err(ApiError::persistence)?
        .ok_or_else(|| ApiError::Auth("invalid or expired token".to_string()))?;
    state
        .ctx
        .store
        .get_or_create_user(&identity)
        .await
        .map_err(ApiError::persistence)
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    search: Option<String>,
    goal: Option<String>,
    saved: Option<bool>,
    sort: Option<String>,
    order: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl ListParams {
    fn into_filter(self) -> BriefFilter {
        let defaults = BriefFilter::default();
        BriefFilter {
            search: self.search,
            goal: self.goal,
            saved_only: self.saved.unwrap_or(false),
            sort: match self.sort.as_deref() {
                Some("profile_name") => SortField::ProfileName,
                _ => SortField::CreatedAt,
            },
            order: match self.order.as_deref() {
                Some("asc") => SortOrder::Asc,
                _ => SortOrder::Desc,
            },
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SavedPatch {
    is_saved: bool,
}

#[derive(Debug, Deserialize)]
struct ConnectRequest {
    linkedin_url: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let brief = handlers::generate_brief(&state.ctx, &user, req).await?;
    Ok(Json(json!({ "success": true, "brief": brief })))
}

async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let page = handlers::list_briefs(&state.ctx, &user, params.into_filter()).await?;
    Ok(Json(json!({
        "success": true,
        "briefs": page.briefs,
        "pagination": {
            "total": page.total,
            "page": page.page,
            "limit": page.limit,
            "has_more": page.has_more,
        },
    })))
}

async fn get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let brief = handlers::get_brief(&state.ctx, &user, id).await?;
    Ok(Json(json!({ "success": true, "brief": brief })))
}

async fn patch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(patch): Json<SavedPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let brief = handlers::set_brief_saved(&state.ctx, &user, id, patch.is_saved).await?;
    Ok(Json(json!({ "success": true, "brief": brief })))
}

async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    handlers::delete_brief(&state.ctx, &user, id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let brief = handlers::refresh_brief(&state.ctx, &user, id, req).await?;
    Ok(Json(json!({ "success": true, "brief": brief })))
}

async fn connect_profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ConnectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let updated = handlers::connect_profile(&state.ctx, &user, &req.linkedin_url).await?;
    Ok(Json(json!({
        "success": true,
        "linkedin_url": updated.linkedin_url,
        "linkedin_data": updated.linkedin_data,
    })))
}

async fn sync_profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let updated = handlers::sync_profile(&state.ctx, &user).await?;
    Ok(Json(json!({
        "success": true,
        "linkedin_url": updated.linkedin_url,
        "linkedin_data": updated.linkedin_data,
    })))
}

async fn disconnect_profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    handlers::disconnect_profile(&state.ctx, &user).await?;
    Ok(Json(json!({ "success": true })))
}
