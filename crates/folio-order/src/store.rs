//! Applying plans against a store.
//!
//! The functions here read a fresh snapshot, plan with [`crate::engine`],
//! then issue the planned writes one by one. They never retry and never roll
//! back: a failure is reported with the exact tail of writes that did not
//! happen.

use async_trait::async_trait;
use folio_schemas::{ArtworkId, OrderMove};
use tracing::{debug, error, info};

use crate::engine;
use crate::{
    OrderSlot, OrderWrite, PartialFailure, ReconcileError, RenumberPlan, ReorderPolicy,
    StoreError, StoreErrorKind,
};

/// Persistence surface the reconciler needs.
///
/// Implemented over a connection pool, over an open transaction, and in
/// memory. Methods take `&mut self` so a transaction can be driven directly.
#[async_trait]
pub trait OrderStore: Send {
    /// Every record of the collection, ascending by order then id.
    async fn load_ordering(&mut self) -> Result<Vec<OrderSlot>, StoreError>;

    /// Set one record's order. A missing record is [`StoreError::not_found`].
    async fn write_order(&mut self, write: OrderWrite) -> Result<(), StoreError>;
}

/// Read the snapshot. Connection failures surface as
/// [`ReconcileError::StoreUnavailable`]; anything else the store reports is
/// [`ReconcileError::SnapshotFailed`].
pub async fn load_snapshot<S>(store: &mut S) -> Result<Vec<OrderSlot>, ReconcileError>
where
    S: OrderStore + ?Sized,
{
    store.load_ordering().await.map_err(|e| match e.kind {
        StoreErrorKind::Unavailable => ReconcileError::StoreUnavailable(e),
        StoreErrorKind::NotFound | StoreErrorKind::Rejected => ReconcileError::SnapshotFailed(e),
    })
}

/// Issue `writes` in sequence. Stops at the first failure.
pub async fn apply_writes<S>(store: &mut S, writes: &[OrderWrite]) -> Result<(), PartialFailure>
where
    S: OrderStore + ?Sized,
{
    for (idx, w) in writes.iter().enumerate() {
        if let Err(cause) = store.write_order(*w).await {
            error!(
                id = w.id,
                order = w.order,
                applied = idx,
                unapplied = writes.len() - idx,
                error = %cause,
                "order write failed; sequence stopped"
            );
            return Err(PartialFailure {
                applied: writes[..idx].to_vec(),
                unapplied: writes[idx..].to_vec(),
                cause,
            });
        }
        debug!(id = w.id, order = w.order, "order write applied");
    }
    Ok(())
}

async fn apply_plan<S>(store: &mut S, plan: RenumberPlan, op: &'static str) -> Result<RenumberPlan, ReconcileError>
where
    S: OrderStore + ?Sized,
{
    apply_writes(store, &plan.writes).await?;
    info!(op, records = plan.ordering.len(), writes = plan.writes.len(), "ordering reconciled");
    Ok(plan)
}

/// Reconcile after `new_id` has been inserted with its tentative order.
///
/// The snapshot must already contain `new_id`; its stored order is used as
/// the baseline, so a record inserted with `tentative_order` causes no write
/// for itself.
pub async fn reconcile_insert<S>(
    store: &mut S,
    new_id: ArtworkId,
    desired: Option<i32>,
) -> Result<RenumberPlan, ReconcileError>
where
    S: OrderStore + ?Sized,
{
    let snapshot = load_snapshot(store).await?;
    let (inserted, existing): (Vec<OrderSlot>, Vec<OrderSlot>) =
        snapshot.iter().partition(|s| s.id == new_id);
    if inserted.is_empty() {
        return Err(crate::ValidationError::UnknownRecord(new_id).into());
    }

    let mut plan = engine::insert_with_position(&existing, new_id, desired)?;
    plan.rebase_writes(&snapshot);
    apply_plan(store, plan, "insert").await
}

/// Relocate existing record `id` to `desired`.
pub async fn reconcile_update<S>(
    store: &mut S,
    id: ArtworkId,
    desired: i32,
) -> Result<RenumberPlan, ReconcileError>
where
    S: OrderStore + ?Sized,
{
    let snapshot = load_snapshot(store).await?;
    let plan = engine::update_with_position(&snapshot, id, desired)?;
    apply_plan(store, plan, "update").await
}

/// Renumber to 1..=N. Used after delete and by the operator repair pass.
pub async fn reconcile_compact<S>(store: &mut S) -> Result<RenumberPlan, ReconcileError>
where
    S: OrderStore + ?Sized,
{
    let snapshot = load_snapshot(store).await?;
    let plan = engine::compact(&snapshot);
    apply_plan(store, plan, "compact").await
}

/// Apply caller-supplied `(id, order)` pairs in the given sequence.
///
/// Under [`ReorderPolicy::Trust`] no snapshot is read and the result may be
/// non-contiguous if the caller sent a bad list. Returns the writes issued.
pub async fn apply_reorder<S>(
    store: &mut S,
    moves: &[OrderMove],
    policy: ReorderPolicy,
) -> Result<Vec<OrderWrite>, ReconcileError>
where
    S: OrderStore + ?Sized,
{
    let writes = engine::reorder(moves)?;
    if policy == ReorderPolicy::RequirePermutation {
        let snapshot = load_snapshot(store).await?;
        engine::validate_permutation(&snapshot, moves)?;
    }
    apply_writes(store, &writes).await?;
    info!(writes = writes.len(), ?policy, "reorder applied");
    Ok(writes)
}
