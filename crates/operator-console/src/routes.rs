use crate::{error::ApiError, state::AppState, ws};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use common::{
    overlays::{OverlayRecord, PositionPatch},
    streams::{StreamMessage, StreamRequest},
};
use overlay_session::{DraftUpdate, SessionSnapshot};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/session", get(get_session))
        .route("/api/session/refresh", post(refresh_session))
        .route("/api/session/edit/:id", post(edit_session))
        .route("/api/session/reset", post(reset_session))
        .route("/api/session/draft", patch(patch_draft))
        .route("/api/session/draft/logo", post(stage_logo))
        .route("/api/session/submit", post(submit_session))
        .route("/api/overlays", get(list_overlays))
        .route("/api/overlays/:id/position", put(commit_drag))
        .route("/api/overlays/:id", delete(delete_overlay))
        .route("/api/stream/start", post(start_stream))
        .route("/api/stream/stop", post(stop_stream))
        .route("/api/stream/restart", post(restart_stream))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Anything the API does not claim is served from the built panel bundle.
    let frontend =
        ServeDir::new(&state.config.frontend_dir).append_index_html_on_directories(true);
    Router::new().merge(api).fallback_service(frontend)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "operator-console",
        "version": common::VERSION,
    }))
}

async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match state.session.refresh().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "detail": err.to_string() })),
        ),
    }
}

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot().await)
}

async fn refresh_session(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    state.session.refresh().await?;
    Ok(Json(state.session.snapshot().await))
}

async fn edit_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    state.session.begin_edit(&id).await?;
    Ok(Json(state.session.snapshot().await))
}

async fn reset_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    state.session.begin_create().await;
    Json(state.session.snapshot().await)
}

async fn patch_draft(
    State(state): State<AppState>,
    Json(update): Json<DraftUpdate>,
) -> Json<SessionSnapshot> {
    state.session.update_draft(update).await;
    Json(state.session.snapshot().await)
}

async fn stage_logo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(err.to_string()))?
    {
        if field.name() != Some("logo") {
            continue;
        }
        let filename = field.file_name().unwrap_or("logo").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(err.to_string()))?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("empty logo file"));
        }
        state.session.stage_asset(filename, bytes.to_vec()).await;
        return Ok(Json(state.session.snapshot().await));
    }
    Err(ApiError::bad_request("multipart field 'logo' required"))
}

async fn submit_session(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiError> {
    state.session.submit_draft().await?;
    Ok(Json(state.session.snapshot().await))
}

async fn list_overlays(State(state): State<AppState>) -> Json<Vec<OverlayRecord>> {
    Json(state.session.snapshot().await.overlays)
}

async fn commit_drag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PositionPatch>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    state.session.commit_drag(&id, body.position).await?;
    Ok(Json(state.session.snapshot().await))
}

async fn delete_overlay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    state.session.delete_record(&id).await?;
    Ok(Json(state.session.snapshot().await))
}

async fn start_stream(
    State(state): State<AppState>,
    Json(request): Json<StreamRequest>,
) -> Result<Json<StreamMessage>, ApiError> {
    if request.rtsp_url.trim().is_empty() {
        return Err(ApiError::bad_request("rtspUrl required"));
    }
    let message = state.stream.start(&request).await?;
    info!(rtsp = %request.rtsp_url, "stream start requested");
    Ok(Json(message))
}

async fn stop_stream(State(state): State<AppState>) -> Result<Json<StreamMessage>, ApiError> {
    let message = state.stream.stop().await?;
    info!("stream stop requested");
    Ok(Json(message))
}

async fn restart_stream(
    State(state): State<AppState>,
    Json(request): Json<StreamRequest>,
) -> Result<Json<StreamMessage>, ApiError> {
    if request.rtsp_url.trim().is_empty() {
        return Err(ApiError::bad_request("rtspUrl required"));
    }
    let message = state.stream.restart(&request).await?;
    info!(rtsp = %request.rtsp_url, "stream restart requested");
    Ok(Json(message))
}
