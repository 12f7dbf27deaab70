//! Request and response types for folio-daemon HTTP endpoints that are not
//! plain `folio_schemas` records.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use folio_order::OrderSlot;
use folio_schemas::ArtworkId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /v1/db/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStatusResponse {
    pub ok: bool,
    /// "postgres" | "memory"
    pub backend: String,
    /// Whether the artworks table exists (always true for memory).
    pub has_schema: bool,
}

// ---------------------------------------------------------------------------
// DELETE /api/artworks/:id
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: ArtworkId,
}

// ---------------------------------------------------------------------------
// POST /api/artworks/reorder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderResponse {
    /// Every artwork's `(id, order)`, ascending by order then id.
    pub ordering: Vec<OrderSlot>,
    /// False when the caller's list left gaps or duplicates behind.
    pub contiguous: bool,
}
