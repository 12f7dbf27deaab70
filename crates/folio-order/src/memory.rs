//! In-memory [`OrderStore`].
//!
//! Clones share the same state, so two handles can model two concurrent
//! requests against one collection. Failure injection is available under
//! `cfg(test)` or the `testkit` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use folio_schemas::ArtworkId;

use crate::{OrderSlot, OrderStore, OrderWrite, StoreError, StoreErrorKind};

#[derive(Debug, Default)]
struct Inner {
    slots: Vec<OrderSlot>,
    /// Successful writes, in the order they landed.
    log: Vec<OrderWrite>,
    /// Write attempts seen since the failure was armed.
    attempts: usize,
    fail_at: Option<(usize, StoreErrorKind)>,
    fail_reads: Option<StoreErrorKind>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryOrderStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(slots: impl IntoIterator<Item = OrderSlot>) -> Self {
        let store = Self::new();
        store.lock().slots = slots.into_iter().collect();
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicked holder cannot leave the Vec half-written; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a record (what an insert does before reconciliation).
    pub fn insert(&self, id: ArtworkId, order: i32) {
        self.lock().slots.push(OrderSlot::new(id, order));
    }

    /// Remove a record; returns whether it existed.
    pub fn remove(&self, id: ArtworkId) -> bool {
        let mut g = self.lock();
        let before = g.slots.len();
        g.slots.retain(|s| s.id != id);
        g.slots.len() != before
    }

    pub fn contains(&self, id: ArtworkId) -> bool {
        self.lock().slots.iter().any(|s| s.id == id)
    }

    pub fn order_of(&self, id: ArtworkId) -> Option<i32> {
        self.lock()
            .slots
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.order)
    }

    /// Current ordering, ascending by order then id.
    pub fn ordering(&self) -> Vec<OrderSlot> {
        let mut v = self.lock().slots.clone();
        v.sort_by_key(|s| (s.order, s.id));
        v
    }

    pub fn write_log(&self) -> Vec<OrderWrite> {
        self.lock().log.clone()
    }

    /// Fail the `nth` (1-based) write attempt from now on with `kind`.
    #[cfg(any(test, feature = "testkit"))]
    pub fn fail_on_write(&self, nth: usize, kind: StoreErrorKind) {
        let mut g = self.lock();
        g.attempts = 0;
        g.fail_at = Some((nth, kind));
    }

    /// Make every snapshot read fail with `kind`.
    #[cfg(any(test, feature = "testkit"))]
    pub fn fail_reads(&self, kind: StoreErrorKind) {
        self.lock().fail_reads = Some(kind);
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn load_ordering(&mut self) -> Result<Vec<OrderSlot>, StoreError> {
        if let Some(kind) = self.lock().fail_reads {
            return Err(StoreError {
                kind,
                message: "memory store: reads disabled".to_string(),
            });
        }
        Ok(self.ordering())
    }

    async fn write_order(&mut self, write: OrderWrite) -> Result<(), StoreError> {
        let mut g = self.lock();
        g.attempts += 1;
        if let Some((nth, kind)) = g.fail_at {
            if g.attempts == nth {
                return Err(StoreError {
                    kind,
                    message: format!("injected failure on write #{nth}"),
                });
            }
        }

        let Some(slot) = g.slots.iter_mut().find(|s| s.id == write.id) else {
            return Err(StoreError::not_found(write.id));
        };
        slot.order = write.order;
        g.log.push(write);
        Ok(())
    }
}
