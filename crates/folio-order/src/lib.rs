//! folio-order
//!
//! Order reconciler for the artworks collection.
//!
//! Architectural decisions:
//! - Planning is deterministic, pure logic over an `(id, order)` snapshot.
//!   No IO, no clock.
//! - Application issues one write per changed record, in plan order, through
//!   an [`OrderStore`]. A failed write stops the sequence and is reported with
//!   the exact unapplied tail. Nothing is rolled back here; atomicity is the
//!   store's business (see `folio-db`'s transactional store).
//! - Insert/update/compact always yield a contiguous 1..N ordering. Raw
//!   reorder trusts the caller unless [`ReorderPolicy::RequirePermutation`]
//!   is selected.

mod engine;
mod error;
mod memory;
mod store;
mod types;

pub use engine::{
    append_order, compact, contiguity, insert_with_position, project, reorder, sort_snapshot,
    tentative_order, update_with_position, validate_permutation,
};
pub use error::{PartialFailure, ReconcileError, StoreError, StoreErrorKind, ValidationError};
pub use memory::MemoryOrderStore;
pub use store::{
    apply_reorder, apply_writes, load_snapshot, reconcile_compact, reconcile_insert,
    reconcile_update, OrderStore,
};
pub use types::*;
