//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use rollreq_domain::{HistoryEntry, HistoryEntryId, RequestId, RollCatalog, RollGroup};
use rollreq_shared::{ResultsSnapshot, StyleSettings};

use crate::app::App;
use crate::use_cases::{DecodedLink, ShareError, SharedGroups};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/catalog", get(get_catalog))
        .route("/api/style", get(get_style))
        .route("/api/history", get(list_history))
        .route("/api/history/{id}", get(get_history_entry))
        .route("/api/requests/{id}/results", get(get_results))
        .route("/api/share/encode", post(encode_groups))
        .route("/api/share/decode", post(decode_groups))
        .route("/api/share/links", post(decode_links))
}

async fn health() -> &'static str {
    "OK"
}

async fn get_catalog(State(app): State<Arc<App>>) -> Json<RollCatalog> {
    Json(app.catalog.as_ref().clone())
}

async fn get_style(State(app): State<Arc<App>>) -> Result<Json<StyleSettings>, ApiError> {
    let style = app
        .use_cases
        .settings
        .get_style()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(style))
}

// =============================================================================
// History
// =============================================================================

async fn list_history(State(app): State<Arc<App>>) -> Json<Vec<HistoryEntry>> {
    Json(app.stores.history.list().await)
}

async fn get_history_entry(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryEntry>, ApiError> {
    let entry = app
        .stores
        .history
        .get(HistoryEntryId::from_uuid(id))
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(entry))
}

// =============================================================================
// Results
// =============================================================================

/// One-off snapshot: attaches an engine, reads it, and detaches.
async fn get_results(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultsSnapshot>, ApiError> {
    let request = app
        .stores
        .requests
        .get(RequestId::from_uuid(id))
        .ok_or(ApiError::NotFound)?;
    let handle = app.use_cases.results.attach(request).await;
    let snapshot = handle.current_results();
    handle.detach();
    Ok(Json(snapshot))
}

// =============================================================================
// Share links
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct EncodeBody {
    pub groups: Vec<RollGroup>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecodeBody {
    pub encoded: String,
}

#[derive(Debug, Deserialize)]
pub struct LinksBody {
    pub text: String,
}

async fn encode_groups(
    State(app): State<Arc<App>>,
    Json(body): Json<EncodeBody>,
) -> Result<Json<SharedGroups>, ApiError> {
    let shared = app
        .use_cases
        .share
        .encode(&body.groups, body.label.as_deref())?;
    Ok(Json(shared))
}

async fn decode_groups(
    State(app): State<Arc<App>>,
    Json(body): Json<DecodeBody>,
) -> Result<Json<Vec<RollGroup>>, ApiError> {
    Ok(Json(app.use_cases.share.decode(&body.encoded)?))
}

async fn decode_links(
    State(app): State<Arc<App>>,
    Json(body): Json<LinksBody>,
) -> Json<Vec<DecodedLink>> {
    Json(app.use_cases.share.decode_links(&body.text))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                )
                    .into_response()
            }
        }
    }
}

impl From<ShareError> for ApiError {
    fn from(e: ShareError) -> Self {
        match e {
            ShareError::Decode(e) => ApiError::BadRequest(e.to_string()),
            ShareError::Encode(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<crate::infrastructure::ports::RepoError> for ApiError {
    fn from(e: crate::infrastructure::ports::RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
