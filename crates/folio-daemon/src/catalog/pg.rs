use async_trait::async_trait;
use folio_config::{OrderingConfig, WriteMode};
use folio_db::PgOrderStore;
use folio_order::{
    apply_reorder, contiguity, load_snapshot, reconcile_compact, reconcile_insert,
    reconcile_update, tentative_order, ReconcileError, ReorderPolicy, StoreErrorKind,
};
use folio_schemas::{Artwork, ArtworkId, ArtworkInput, OrderMove};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgConnection;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, warn};

use super::{check_relocation, Catalog, CatalogError, ReorderOutcome, StoreStatus};

/// PostgreSQL-backed catalog.
///
/// Under [`WriteMode::Transactional`] every mutation runs in one transaction
/// holding the ordering advisory lock, so concurrent reconciliations are
/// serialized and a failed write leaves nothing behind. Under
/// [`WriteMode::Sequential`] each statement autocommits.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
    ordering: OrderingConfig,
}

impl PgCatalog {
    pub fn new(pool: PgPool, ordering: OrderingConfig) -> Self {
        Self { pool, ordering }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn open(&self) -> Result<WriteConn, CatalogError> {
        match self.ordering.write_mode {
            WriteMode::Transactional => {
                let mut tx = self.pool.begin().await.map_err(sqlx_err)?;
                folio_db::lock_ordering(&mut *tx).await.map_err(db_err)?;
                Ok(WriteConn::Tx(tx))
            }
            WriteMode::Sequential => Ok(WriteConn::Plain(
                self.pool.acquire().await.map_err(sqlx_err)?,
            )),
        }
    }

    /// Commit on success. On failure roll back and, in transactional mode,
    /// report a write failure as a rollback rather than a partial failure.
    async fn finish<T>(
        &self,
        conn: WriteConn,
        result: Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        match result {
            Ok(v) => {
                conn.commit().await?;
                Ok(v)
            }
            Err(e) => {
                let rolled_back = conn.abort().await;
                match e {
                    CatalogError::Reconcile(ReconcileError::PartialFailure(p)) if rolled_back => {
                        Err(CatalogError::RolledBack(p))
                    }
                    other => Err(other),
                }
            }
        }
    }
}

enum WriteConn {
    Tx(Transaction<'static, Postgres>),
    Plain(PoolConnection<Postgres>),
}

impl WriteConn {
    fn conn(&mut self) -> &mut PgConnection {
        match self {
            WriteConn::Tx(tx) => &mut **tx,
            WriteConn::Plain(c) => &mut **c,
        }
    }

    async fn commit(self) -> Result<(), CatalogError> {
        if let WriteConn::Tx(tx) = self {
            tx.commit().await.map_err(sqlx_err)?;
        }
        Ok(())
    }

    /// Roll back if in a transaction. Returns whether a rollback happened.
    async fn abort(self) -> bool {
        match self {
            WriteConn::Tx(tx) => {
                if let Err(e) = tx.rollback().await {
                    // The server rolls back on disconnect anyway.
                    warn!(error = %e, "explicit rollback failed");
                }
                true
            }
            WriteConn::Plain(_) => false,
        }
    }
}

fn sqlx_err(e: sqlx::Error) -> CatalogError {
    match folio_db::store_error_kind(&e) {
        StoreErrorKind::Unavailable => CatalogError::Unavailable(e.to_string()),
        _ => CatalogError::Internal(e.to_string()),
    }
}

fn db_err(e: anyhow::Error) -> CatalogError {
    error!("database call failed: {e:#}");
    if folio_db::is_unavailable(&e) {
        CatalogError::Unavailable(format!("{e:#}"))
    } else {
        CatalogError::Internal(format!("{e:#}"))
    }
}

async fn fetch_on(conn: &mut PgConnection, id: ArtworkId) -> Result<Artwork, CatalogError> {
    folio_db::fetch_artwork(conn, id)
        .await
        .map_err(db_err)?
        .ok_or(CatalogError::NotFound(id))
}

async fn create_on(conn: &mut PgConnection, input: &ArtworkInput) -> Result<Artwork, CatalogError> {
    let snapshot = load_snapshot(&mut PgOrderStore::new(&mut *conn)).await?;
    let tentative = tentative_order(&snapshot, input.order)?;

    let id = folio_db::insert_artwork(&mut *conn, &input.fields, tentative)
        .await
        .map_err(db_err)?;
    reconcile_insert(&mut PgOrderStore::new(&mut *conn), id, input.order).await?;

    fetch_on(conn, id).await
}

async fn replace_on(
    conn: &mut PgConnection,
    id: ArtworkId,
    input: &ArtworkInput,
) -> Result<Artwork, CatalogError> {
    let snapshot = load_snapshot(&mut PgOrderStore::new(&mut *conn)).await?;
    check_relocation(&snapshot, id, input.order)?;

    if !folio_db::update_artwork_fields(&mut *conn, id, &input.fields)
        .await
        .map_err(db_err)?
    {
        return Err(CatalogError::NotFound(id));
    }
    if let Some(desired) = input.order {
        reconcile_update(&mut PgOrderStore::new(&mut *conn), id, desired).await?;
    }

    fetch_on(conn, id).await
}

async fn delete_on(
    conn: &mut PgConnection,
    id: ArtworkId,
    compact: bool,
) -> Result<(), CatalogError> {
    if !folio_db::delete_artwork(&mut *conn, id).await.map_err(db_err)? {
        return Err(CatalogError::NotFound(id));
    }
    if compact {
        reconcile_compact(&mut PgOrderStore::new(conn)).await?;
    }
    Ok(())
}

async fn reorder_on(
    conn: &mut PgConnection,
    moves: &[OrderMove],
    policy: ReorderPolicy,
) -> Result<ReorderOutcome, CatalogError> {
    let mut store = PgOrderStore::new(conn);
    apply_reorder(&mut store, moves, policy).await?;

    let ordering = load_snapshot(&mut store).await?;
    let report = contiguity(&ordering);
    Ok(ReorderOutcome { ordering, report })
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn status(&self) -> Result<StoreStatus, CatalogError> {
        let st = folio_db::status(&self.pool).await.map_err(db_err)?;
        Ok(StoreStatus {
            backend: "postgres",
            ok: st.ok,
            has_schema: st.has_artworks_table,
        })
    }

    async fn list(&self) -> Result<Vec<Artwork>, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(sqlx_err)?;
        folio_db::list_artworks(&mut conn).await.map_err(db_err)
    }

    async fn get(&self, id: ArtworkId) -> Result<Artwork, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(sqlx_err)?;
        fetch_on(&mut conn, id).await
    }

    async fn create(&self, input: ArtworkInput) -> Result<Artwork, CatalogError> {
        input.fields.validate()?;
        let mut w = self.open().await?;
        let result = create_on(w.conn(), &input).await;
        self.finish(w, result).await
    }

    async fn replace(&self, id: ArtworkId, input: ArtworkInput) -> Result<Artwork, CatalogError> {
        input.fields.validate()?;
        let mut w = self.open().await?;
        let result = replace_on(w.conn(), id, &input).await;
        self.finish(w, result).await
    }

    async fn delete(&self, id: ArtworkId) -> Result<(), CatalogError> {
        let mut w = self.open().await?;
        let result = delete_on(w.conn(), id, self.ordering.compact_on_delete).await;
        self.finish(w, result).await
    }

    async fn reorder(&self, moves: &[OrderMove]) -> Result<ReorderOutcome, CatalogError> {
        let mut w = self.open().await?;
        let result = reorder_on(w.conn(), moves, self.ordering.reorder_policy).await;
        self.finish(w, result).await
    }
}
