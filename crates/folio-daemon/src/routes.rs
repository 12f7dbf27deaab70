//! Axum router and all HTTP handlers for folio-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. The scenario tests in `tests/` compose the router
//! directly.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use folio_schemas::{ArtworkId, ArtworkInput, ReorderRequest};
use tracing::{info, warn};

use crate::{
    api_types::{DbStatusResponse, DeleteResponse, HealthResponse, ReorderResponse},
    auth,
    error::{ApiError, ApiResult},
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router. The
/// admin gate is part of the router since it is part of the API contract.
pub fn build_router(state: Arc<AppState>) -> Router {
    let admin = middleware::from_fn_with_state(Arc::clone(&state), auth::require_admin);

    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/db/status", get(db_status))
        .route(
            "/api/artworks",
            get(list_artworks).merge(post(create_artwork).route_layer(admin.clone())),
        )
        .route(
            "/api/artworks/reorder",
            post(reorder_artworks).route_layer(admin.clone()),
        )
        .route(
            "/api/artworks/:id",
            get(get_artwork).merge(
                put(replace_artwork)
                    .delete(delete_artwork)
                    .route_layer(admin),
            ),
        )
        .with_state(state)
}

/// Path ids must be positive integers.
fn parse_id(raw: &str) -> ApiResult<ArtworkId> {
    match raw.parse::<ArtworkId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation(format!(
            "artwork id must be a positive integer, got '{raw}'"
        ))),
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(v)| v)
        .map_err(|rej| ApiError::validation(rej.body_text()))
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/db/status
// ---------------------------------------------------------------------------

pub(crate) async fn db_status(State(st): State<Arc<AppState>>) -> ApiResult<Json<DbStatusResponse>> {
    let s = st.catalog.status().await?;
    Ok(Json(DbStatusResponse {
        ok: s.ok,
        backend: s.backend.to_string(),
        has_schema: s.has_schema,
    }))
}

// ---------------------------------------------------------------------------
// /api/artworks (reads)
// ---------------------------------------------------------------------------

pub(crate) async fn list_artworks(State(st): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let artworks = st.catalog.list().await?;
    Ok(Json(artworks))
}

pub(crate) async fn get_artwork(
    State(st): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    let artwork = st.catalog.get(id).await?;
    Ok(Json(artwork))
}

// ---------------------------------------------------------------------------
// /api/artworks (admin)
// ---------------------------------------------------------------------------

pub(crate) async fn create_artwork(
    State(st): State<Arc<AppState>>,
    body: Result<Json<ArtworkInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let input = json_body(body)?;
    let created = st.catalog.create(input).await?;
    info!(id = created.id, order = created.order, "artwork created");
    Ok(Json(created))
}

pub(crate) async fn replace_artwork(
    State(st): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Result<Json<ArtworkInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    let input = json_body(body)?;
    let updated = st.catalog.replace(id, input).await?;
    info!(id, order = updated.order, "artwork updated");
    Ok(Json(updated))
}

pub(crate) async fn delete_artwork(
    State(st): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    st.catalog.delete(id).await?;
    info!(id, "artwork deleted");
    Ok(Json(DeleteResponse {
        message: "Artwork deleted".to_string(),
        id,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/artworks/reorder
// ---------------------------------------------------------------------------

pub(crate) async fn reorder_artworks(
    State(st): State<Arc<AppState>>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(body)?;
    let outcome = st.catalog.reorder(&req.items).await?;

    let contiguous = outcome.report.is_contiguous();
    if !contiguous {
        warn!(
            gaps = ?outcome.report.gaps,
            duplicates = ?outcome.report.duplicates,
            out_of_range = ?outcome.report.out_of_range,
            "reorder left the collection non-contiguous"
        );
    }
    info!(moves = req.items.len(), contiguous, "artworks reordered");

    Ok(Json(ReorderResponse {
        ordering: outcome.ordering,
        contiguous,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_positive_integers_only() {
        assert_eq!(parse_id("12").unwrap(), 12);
        for bad in ["0", "-3", "abc", "1.5", ""] {
            assert_eq!(parse_id(bad).unwrap_err().code(), "VALIDATION", "{bad}");
        }
    }
}
