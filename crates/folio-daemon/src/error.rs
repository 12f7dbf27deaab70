//! API error type and HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_order::{PartialFailure, ReconcileError};
use folio_schemas::ArtworkId;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error body. `unappliedIds` is present only for write-sequence
/// failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Stable machine-readable error code.
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unapplied_ids: Option<Vec<ArtworkId>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    unapplied_ids: Option<Vec<ArtworkId>>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            unapplied_ids: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }

    /// Some writes landed, the rest did not.
    pub fn partial_failure(p: &PartialFailure) -> Self {
        Self {
            unapplied_ids: Some(p.unapplied_ids()),
            ..Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PARTIAL_FAILURE",
                p.to_string(),
            )
        }
    }

    /// The whole operation was rolled back: every planned write is unapplied.
    pub fn rolled_back(p: &PartialFailure) -> Self {
        let ids = p.applied.iter().chain(&p.unapplied).map(|w| w.id).collect();
        Self {
            unapplied_ids: Some(ids),
            ..Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ROLLED_BACK",
                format!("transaction rolled back: {}", p.cause),
            )
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiErrorBody {
                code: self.code.to_string(),
                message: self.message,
                unapplied_ids: self.unapplied_ids,
            }),
        )
            .into_response()
    }
}

impl From<ReconcileError> for ApiError {
    fn from(value: ReconcileError) -> Self {
        match value {
            ReconcileError::Validation(e) => Self::validation(e.to_string()),
            ReconcileError::PartialFailure(p) => Self::partial_failure(&p),
            ReconcileError::StoreUnavailable(e) => Self::store_unavailable(e.to_string()),
            ReconcileError::SnapshotFailed(e) => Self::internal(e.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Invalid(message) => Self::validation(message),
            CatalogError::NotFound(id) => Self::not_found(format!("artwork {id} not found")),
            CatalogError::Reconcile(e) => e.into(),
            CatalogError::RolledBack(p) => Self::rolled_back(&p),
            CatalogError::Unavailable(message) => Self::store_unavailable(message),
            CatalogError::Internal(message) => Self::internal(message),
        }
    }
}
