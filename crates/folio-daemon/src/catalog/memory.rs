use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_config::OrderingConfig;
use folio_order::{
    apply_reorder, contiguity, load_snapshot, reconcile_compact, reconcile_insert,
    reconcile_update, tentative_order, MemoryOrderStore,
};
use folio_schemas::{Artwork, ArtworkFields, ArtworkId, ArtworkInput, OrderMove};
use tokio::sync::Mutex;

use super::{check_relocation, Catalog, CatalogError, ReorderOutcome, StoreStatus};

#[derive(Debug, Clone)]
struct Record {
    fields: ArtworkFields,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Records {
    by_id: BTreeMap<ArtworkId, Record>,
    next_id: ArtworkId,
}

/// Process-local catalog for development and in-process tests.
///
/// Metadata lives here; orders live in a [`MemoryOrderStore`] so the
/// reconciler runs exactly as it does against Postgres. One async mutex
/// serializes every operation. Writes are not transactional: a failed order
/// write is reported as a partial failure.
#[derive(Debug)]
pub struct MemoryCatalog {
    records: Mutex<Records>,
    orders: MemoryOrderStore,
    ordering: OrderingConfig,
}

impl MemoryCatalog {
    pub fn new(ordering: OrderingConfig) -> Self {
        Self {
            records: Mutex::new(Records {
                by_id: BTreeMap::new(),
                next_id: 1,
            }),
            orders: MemoryOrderStore::new(),
            ordering,
        }
    }

    /// Shared handle to the order store backing this catalog.
    pub fn order_store(&self) -> MemoryOrderStore {
        self.orders.clone()
    }

    fn artwork(&self, records: &Records, id: ArtworkId) -> Result<Artwork, CatalogError> {
        let rec = records.by_id.get(&id).ok_or(CatalogError::NotFound(id))?;
        let order = self
            .orders
            .order_of(id)
            .ok_or_else(|| CatalogError::Internal(format!("artwork {id} has no order")))?;
        Ok(Artwork {
            id,
            fields: rec.fields.clone(),
            order,
            created_at: rec.created_at,
            updated_at: rec.updated_at,
        })
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn status(&self) -> Result<StoreStatus, CatalogError> {
        Ok(StoreStatus {
            backend: "memory",
            ok: true,
            has_schema: true,
        })
    }

    async fn list(&self) -> Result<Vec<Artwork>, CatalogError> {
        let records = self.records.lock().await;
        self.orders
            .ordering()
            .iter()
            .map(|s| self.artwork(&records, s.id))
            .collect()
    }

    async fn get(&self, id: ArtworkId) -> Result<Artwork, CatalogError> {
        let records = self.records.lock().await;
        self.artwork(&records, id)
    }

    async fn create(&self, input: ArtworkInput) -> Result<Artwork, CatalogError> {
        input.fields.validate()?;
        let mut records = self.records.lock().await;
        let mut store = self.orders.clone();

        let snapshot = load_snapshot(&mut store).await?;
        let tentative = tentative_order(&snapshot, input.order)?;

        let id = records.next_id;
        records.next_id += 1;
        let now = Utc::now();
        records.by_id.insert(
            id,
            Record {
                fields: input.fields,
                created_at: now,
                updated_at: now,
            },
        );
        store.insert(id, tentative);

        reconcile_insert(&mut store, id, input.order).await?;
        self.artwork(&records, id)
    }

    async fn replace(&self, id: ArtworkId, input: ArtworkInput) -> Result<Artwork, CatalogError> {
        input.fields.validate()?;
        let mut records = self.records.lock().await;
        let mut store = self.orders.clone();

        let snapshot = load_snapshot(&mut store).await?;
        check_relocation(&snapshot, id, input.order)?;

        let rec = records
            .by_id
            .get_mut(&id)
            .ok_or(CatalogError::NotFound(id))?;
        rec.fields = input.fields;
        rec.updated_at = Utc::now();

        if let Some(desired) = input.order {
            reconcile_update(&mut store, id, desired).await?;
        }
        self.artwork(&records, id)
    }

    async fn delete(&self, id: ArtworkId) -> Result<(), CatalogError> {
        let mut records = self.records.lock().await;
        if records.by_id.remove(&id).is_none() {
            return Err(CatalogError::NotFound(id));
        }
        self.orders.remove(id);

        if self.ordering.compact_on_delete {
            reconcile_compact(&mut self.orders.clone()).await?;
        }
        Ok(())
    }

    async fn reorder(&self, moves: &[OrderMove]) -> Result<ReorderOutcome, CatalogError> {
        let _records = self.records.lock().await;
        let mut store = self.orders.clone();

        apply_reorder(&mut store, moves, self.ordering.reorder_policy).await?;

        let ordering = store.ordering();
        let report = contiguity(&ordering);
        Ok(ReorderOutcome { ordering, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, order: Option<i32>) -> ArtworkInput {
        ArtworkInput {
            fields: ArtworkFields::titled(title),
            order,
        }
    }

    async fn titles(c: &MemoryCatalog) -> Vec<String> {
        c.list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.fields.title)
            .collect()
    }

    #[tokio::test]
    async fn create_appends_then_places() {
        let c = MemoryCatalog::new(OrderingConfig::default());
        c.create(input("A", None)).await.unwrap();
        c.create(input("B", None)).await.unwrap();
        c.create(input("C", None)).await.unwrap();
        let d = c.create(input("D", Some(2))).await.unwrap();

        assert_eq!(d.order, 2);
        assert_eq!(titles(&c).await, vec!["A", "D", "B", "C"]);
    }

    #[tokio::test]
    async fn create_out_of_range_leaves_nothing() {
        let c = MemoryCatalog::new(OrderingConfig::default());
        c.create(input("A", None)).await.unwrap();
        let err = c.create(input("B", Some(3))).await.unwrap_err();
        assert!(matches!(err, CatalogError::Reconcile(_)));
        assert_eq!(titles(&c).await, vec!["A"]);
    }

    #[tokio::test]
    async fn delete_compacts_when_configured() {
        let c = MemoryCatalog::new(OrderingConfig::default());
        let a = c.create(input("A", None)).await.unwrap();
        let b = c.create(input("B", None)).await.unwrap();
        c.delete(a.id).await.unwrap();
        assert_eq!(c.get(b.id).await.unwrap().order, 1);
    }

    #[tokio::test]
    async fn delete_leaves_gap_when_compaction_disabled() {
        let c = MemoryCatalog::new(OrderingConfig {
            compact_on_delete: false,
            ..OrderingConfig::default()
        });
        let a = c.create(input("A", None)).await.unwrap();
        let b = c.create(input("B", None)).await.unwrap();
        c.delete(a.id).await.unwrap();
        assert_eq!(c.get(b.id).await.unwrap().order, 2);
    }

    #[tokio::test]
    async fn replace_unknown_is_not_found() {
        let c = MemoryCatalog::new(OrderingConfig::default());
        let err = c.replace(7, input("X", None)).await.unwrap_err();
        assert_eq!(err, CatalogError::NotFound(7));
    }

    #[tokio::test]
    async fn blank_title_is_invalid() {
        let c = MemoryCatalog::new(OrderingConfig::default());
        let err = c.create(input("  ", None)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }
}
