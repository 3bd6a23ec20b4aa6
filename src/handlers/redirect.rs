use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// GET /:code
///
/// 1. Resolve the short code; unknown codes get a 404.
/// 2. Record the visit as a separate registry call. A miss here (the link was
///    deleted in between) is logged and does not affect the redirect.
/// 3. Return a 302 to the original URL.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    // ── 1. Resolve URL ─────────────────────────────────────────────────────
    let record = state.registry.resolve(&code)?;

    // ── 2. Count the visit ─────────────────────────────────────────────────
    if state.registry.record_visit(&code) {
        tracing::debug!("Visit recorded for '{}'", code);
    } else {
        tracing::warn!(
            "Visit recording: link '{}' disappeared between resolve and record",
            code
        );
    }

    // ── 3. Redirect ────────────────────────────────────────────────────────
    Ok((StatusCode::FOUND, [(header::LOCATION, record.original_url)]).into_response())
}
