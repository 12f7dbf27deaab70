//! Artwork catalog backends.
//!
//! Handlers talk to an `Arc<dyn Catalog>`; every mutating call runs the order
//! reconciler before it returns, so the caller always sees the final order.

mod memory;
mod pg;

pub use memory::MemoryCatalog;
pub use pg::PgCatalog;

use std::fmt;

use async_trait::async_trait;
use folio_order::{ContiguityReport, OrderSlot, PartialFailure, ReconcileError, ValidationError};
use folio_schemas::{Artwork, ArtworkId, ArtworkInput, OrderMove};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub backend: &'static str,
    pub ok: bool,
    pub has_schema: bool,
}

/// Ordering after a reorder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub ordering: Vec<OrderSlot>,
    pub report: ContiguityReport,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn status(&self) -> Result<StoreStatus, CatalogError>;

    /// Ascending by order, then id.
    async fn list(&self) -> Result<Vec<Artwork>, CatalogError>;

    async fn get(&self, id: ArtworkId) -> Result<Artwork, CatalogError>;

    /// Insert and place at `input.order` (append when absent).
    async fn create(&self, input: ArtworkInput) -> Result<Artwork, CatalogError>;

    /// Replace metadata; relocate when `input.order` is present.
    async fn replace(&self, id: ArtworkId, input: ArtworkInput) -> Result<Artwork, CatalogError>;

    /// Delete; compacts the remaining records when configured to.
    async fn delete(&self, id: ArtworkId) -> Result<(), CatalogError>;

    async fn reorder(&self, moves: &[OrderMove]) -> Result<ReorderOutcome, CatalogError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Request body failed field validation.
    Invalid(String),
    NotFound(ArtworkId),
    Reconcile(ReconcileError),
    /// A write failed inside a transaction; nothing was persisted.
    RolledBack(PartialFailure),
    Unavailable(String),
    Internal(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Invalid(m) => write!(f, "invalid artwork: {m}"),
            CatalogError::NotFound(id) => write!(f, "artwork {id} not found"),
            CatalogError::Reconcile(e) => write!(f, "{e}"),
            CatalogError::RolledBack(p) => write!(f, "rolled back: {p}"),
            CatalogError::Unavailable(m) => write!(f, "store unavailable: {m}"),
            CatalogError::Internal(m) => write!(f, "internal: {m}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<ReconcileError> for CatalogError {
    fn from(e: ReconcileError) -> Self {
        CatalogError::Reconcile(e)
    }
}

impl From<ValidationError> for CatalogError {
    fn from(e: ValidationError) -> Self {
        CatalogError::Reconcile(ReconcileError::Validation(e))
    }
}

impl From<folio_schemas::FieldError> for CatalogError {
    fn from(e: folio_schemas::FieldError) -> Self {
        CatalogError::Invalid(e.to_string())
    }
}

/// `id` must be in the snapshot and `desired`, when given, in 1..=N.
///
/// Checked before any write so a bad relocation never leaves metadata
/// half-updated in sequential mode.
pub(crate) fn check_relocation(
    snapshot: &[OrderSlot],
    id: ArtworkId,
    desired: Option<i32>,
) -> Result<(), CatalogError> {
    if !snapshot.iter().any(|s| s.id == id) {
        return Err(CatalogError::NotFound(id));
    }
    if let Some(d) = desired {
        let max = i32::try_from(snapshot.len()).unwrap_or(i32::MAX);
        if d < 1 || d > max {
            return Err(ValidationError::PositionOutOfRange { desired: d, max }.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots() -> Vec<OrderSlot> {
        vec![OrderSlot::new(1, 1), OrderSlot::new(2, 2)]
    }

    #[test]
    fn relocation_of_unknown_id_is_not_found() {
        assert_eq!(
            check_relocation(&slots(), 9, Some(1)),
            Err(CatalogError::NotFound(9))
        );
    }

    #[test]
    fn relocation_bounds_are_one_to_n() {
        assert!(check_relocation(&slots(), 1, Some(2)).is_ok());
        assert!(check_relocation(&slots(), 1, None).is_ok());
        assert!(matches!(
            check_relocation(&slots(), 1, Some(3)),
            Err(CatalogError::Reconcile(ReconcileError::Validation(
                ValidationError::PositionOutOfRange { desired: 3, max: 2 }
            )))
        ));
        assert!(check_relocation(&slots(), 1, Some(0)).is_err());
    }
}
