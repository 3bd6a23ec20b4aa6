use crate::{
    errors::ApiError,
    models::{DecodeResponse, EncodeRequest, EncodeResponse, SearchParams, UrlRecord, UrlStats},
    validation::validate_url,
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// POST /api/encode
///
/// Validate the submitted URL, register it and hand back the public short URL.
pub async fn encode(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EncodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EncodeResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidUrl(e.body_text()))?;
    let url = validate_url(&request.url)?;

    let record = state.registry.register(&url)?;
    tracing::info!("Registered '{}' -> {}", record.short_code, record.original_url);

    Ok((
        StatusCode::CREATED,
        Json(EncodeResponse {
            short_url: state.config.short_url(&record.short_code),
        }),
    ))
}

/// GET /api/decode/:code
pub async fn decode(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<DecodeResponse>, ApiError> {
    let record = state.registry.resolve(&code)?;
    Ok(Json(DecodeResponse {
        original_url: record.original_url,
    }))
}

/// GET /api/statistic/:code
pub async fn statistic(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<UrlStats>, ApiError> {
    Ok(Json(state.registry.statistics(&code)?))
}

/// GET /api/list
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<UrlRecord>> {
    Json(state.registry.list())
}

/// GET /api/search?q=
///
/// A missing `q` behaves like an empty query.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<UrlRecord>> {
    let query = params.q.unwrap_or_default();
    Json(state.registry.search(&query))
}

/// DELETE /:code
///
/// Always 200; the body says whether a record was actually removed.
pub async fn remove(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Json<bool> {
    let removed = state.registry.remove(&code);
    if removed {
        tracing::info!("Deleted short code '{}'", code);
    }
    Json(removed)
}
