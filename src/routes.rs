use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::db::Database;
use crate::error::ApiError;
use crate::models::{MessageResponse, Source, StoriesPage, StoryResponse};

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
}

/// Build the full application router: JSON API, health check and the
/// frontend bundle as a fallback.
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = FsPath::new(&state.config.static_dir);
    // Client-side routes such as /story/1 resolve to the SPA entry point.
    let frontend = ServeDir::new(static_dir)
        .fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/stories", get(list_stories))
        .route("/api/stories/:id", get(get_story))
        .route("/api/sources", get(list_sources))
        .route("/api/pipeline/trigger", post(trigger_pipeline))
        .route("/api", any(api_not_found))
        .route("/api/", any(api_not_found))
        .route("/api/*rest", any(api_not_found))
        .route("/health", get(health))
        .fallback_service(frontend)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct StoriesQuery {
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<i64>,
}

/// `?page=` means the same as leaving `page` out.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

pub async fn list_stories(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StoriesQuery>, QueryRejection>,
) -> Result<Json<StoriesPage>, ApiError> {
    let Query(query) = query.map_err(|e| {
        debug!("Rejected stories query: {}", e.body_text());
        ApiError::BadRequest("Invalid query parameters".to_string())
    })?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = state.config.page_size(query.limit);
    let topic = query.topic.as_deref().filter(|t| !t.is_empty());

    let stories = state
        .db
        .get_stories(page, limit, topic)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch stories", e))?;

    Ok(Json(stories))
}

pub async fn get_story(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<StoryResponse>, ApiError> {
    let Path(id) = id.map_err(|e| {
        debug!("Rejected story id: {}", e.body_text());
        ApiError::BadRequest("Invalid story id".to_string())
    })?;

    let story = state
        .db
        .get_story(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch story", e))?
        .ok_or_else(|| ApiError::NotFound("Story not found".to_string()))?;

    Ok(Json(story))
}

pub async fn list_sources(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Source>>, ApiError> {
    let sources = state
        .db
        .get_sources()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch sources", e))?;

    Ok(Json(sources))
}

/// Acknowledges a pipeline run. Ingestion and processing are not wired up,
/// so nothing is scheduled.
pub async fn trigger_pipeline() -> Json<MessageResponse> {
    info!("Pipeline trigger requested");
    Json(MessageResponse::new("Pipeline triggered successfully"))
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

pub async fn health() -> impl IntoResponse {
    "OK"
}
