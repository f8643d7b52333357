//! HTTP API endpoints.
//!
//! JSON in and out, camelCase field names. Errors render as
//! `{"error": "..."}` with a status derived from [`CoreError`].

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::auth::{self, AuthConfig};
use crate::error::{CoreError, CoreResult};
use crate::protocol::{
    CandidateQuery, CharacterResults, SkipReceipt, SkipRequest, VoteReceipt, VoteRequest,
};
use crate::state::AppState;
use crate::stats_store::validate_session_id;
use crate::store::StoreSnapshot;
use crate::types::*;

/// All `/api` routes; admin routes sit behind Basic auth
pub fn router(state: Arc<AppState>, auth_config: Arc<AuthConfig>) -> Router {
    let admin = Router::new()
        .route("/api/state/export", get(export_state))
        .route("/api/state/import", post(import_state))
        .route_layer(middleware::from_fn_with_state(
            auth_config,
            auth::admin_auth_middleware,
        ));

    Router::new()
        .route("/api/character/random", get(random_character))
        .route("/api/character/{id}/vote", post(vote))
        .route("/api/character/{id}/skip", post(skip))
        .route("/api/character/{id}/results", get(results))
        .route("/api/tags", get(list_tags))
        .route("/api/user/{session_id}/interactions", get(interactions))
        .route(
            "/api/user/{session_id}/stats",
            get(get_stats).put(put_stats).delete(reset_stats),
        )
        .merge(admin)
        .with_state(state)
}

/// GET /api/character/random?tags=a,b&exclude=c&excludeIds=1,2
pub async fn random_character(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CandidateQuery>,
) -> CoreResult<Json<CharacterWithTags>> {
    let filter = query.to_filter();
    Ok(Json(state.select_random(&filter).await?))
}

/// POST /api/character/{id}/vote
///
/// An unreadable body is treated as an empty one, so it fails validation
/// like a body without `sessionId`.
pub async fn vote(
    State(state): State<Arc<AppState>>,
    Path(character_id): Path<CharacterId>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> CoreResult<Json<VoteReceipt>> {
    let (session_id, vote) = lenient_body(body).validate()?;
    Ok(Json(state.record_vote(character_id, &session_id, vote).await?))
}

/// POST /api/character/{id}/skip
pub async fn skip(
    State(state): State<Arc<AppState>>,
    Path(character_id): Path<CharacterId>,
    body: Result<Json<SkipRequest>, JsonRejection>,
) -> CoreResult<Json<SkipReceipt>> {
    let session_id = lenient_body(body).validate()?;
    Ok(Json(state.record_skip(character_id, &session_id).await?))
}

/// GET /api/character/{id}/results
///
/// Current aggregate without recording anything, e.g. after a skip.
pub async fn results(
    State(state): State<Arc<AppState>>,
    Path(character_id): Path<CharacterId>,
) -> CoreResult<Json<CharacterResults>> {
    Ok(Json(state.get_results(character_id).await?))
}

/// GET /api/tags
pub async fn list_tags(State(state): State<Arc<AppState>>) -> CoreResult<Json<Vec<TagName>>> {
    Ok(Json(state.tag_universe().await?))
}

/// GET /api/user/{session_id}/interactions
pub async fn interactions(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> CoreResult<Json<Vec<InteractionEvent>>> {
    Ok(Json(state.session_interactions(&session_id).await?))
}

/// GET /api/user/{session_id}/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> CoreResult<Json<VisitorStats>> {
    validate_session_id(&session_id)?;
    Ok(Json(state.stats.load(&session_id).await?))
}

/// PUT /api/user/{session_id}/stats
///
/// Stores the blob under the path's session id, whatever the body says.
pub async fn put_stats(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    body: Result<Json<VisitorStats>, JsonRejection>,
) -> CoreResult<Json<VisitorStats>> {
    validate_session_id(&session_id)?;
    let mut stats = strict_body(body)?;
    stats.session_id = session_id;
    state.stats.save(&stats).await?;
    Ok(Json(stats))
}

/// DELETE /api/user/{session_id}/stats
///
/// Returns fresh stats under a new session id.
pub async fn reset_stats(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> CoreResult<Json<VisitorStats>> {
    validate_session_id(&session_id)?;
    Ok(Json(state.stats.reset(&session_id).await?))
}

/// Export catalog and interaction log as JSON.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> CoreResult<Json<StoreSnapshot>> {
    Ok(Json(state.store.export().await?))
}

/// Replace catalog and interaction log with a snapshot.
///
/// POST /api/state/import
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StoreSnapshot>, JsonRejection>,
) -> CoreResult<Json<serde_json::Value>> {
    let snapshot = strict_body(body)?;
    state.store.import(snapshot).await.map_err(|e| {
        tracing::error!("State import failed: {}", e);
        CoreError::from(e)
    })?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Body for routes whose validation reports missing fields itself
fn lenient_body<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Unreadable request body: {}", rejection.body_text());
            T::default()
        }
    }
}

/// Body that must parse; rejections become a 400 in the usual error shape
fn strict_body<T>(body: Result<Json<T>, JsonRejection>) -> CoreResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| CoreError::Validation(rejection.body_text()))
}
