//! PostgreSQL persistence for the artworks catalog.
//!
//! Every statement takes a `&mut PgConnection`, so the same functions run
//! against a pooled connection (autocommit) or inside an open transaction
//! (`&mut *tx`). [`PgOrderStore`] adapts a connection to the reconciler's
//! [`OrderStore`].

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use folio_config::DatabaseConfig;
use folio_order::{OrderSlot, OrderStore, OrderWrite, RenumberPlan, StoreError, StoreErrorKind};
use folio_schemas::{Artwork, ArtworkFields, ArtworkId};
use sqlx::postgres::{PgConnection, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

pub use sqlx::PgPool;

pub const ENV_DB_URL: &str = "FOLIO_DATABASE_URL";

/// Key for the transaction-scoped advisory lock serializing reconciliation.
/// Arbitrary but fixed; every writer of `artworks.sort_order` must use it.
pub const ORDERING_LOCK_KEY: i64 = 0x466f_6c69_6f4f_7264; // "FolioOrd"

const ARTWORK_COLUMNS: &str =
    r#"id, title, description, image_url, project, year, "type", sort_order, created_at, updated_at"#;

/// Connect with the configured pool limits.
pub async fn connect(cfg: &DatabaseConfig, url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Connect using FOLIO_DATABASE_URL and default pool limits. Test helper.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL)
        .with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&DatabaseConfig::default(), &url).await
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbStatus {
    pub ok: bool,
    pub has_artworks_table: bool,
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='artworks'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_artworks_table: exists,
    })
}

// ---------------------------------------------------------------------------
// Artworks
// ---------------------------------------------------------------------------

fn artwork_from_row(row: &PgRow) -> Result<Artwork> {
    Ok(Artwork {
        id: row.try_get("id")?,
        fields: ArtworkFields {
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            image_url: row.try_get("image_url")?,
            project: row.try_get("project")?,
            year: row.try_get("year")?,
            kind: row.try_get("type")?,
        },
        order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// All artworks ascending by order, then id.
pub async fn list_artworks(conn: &mut PgConnection) -> Result<Vec<Artwork>> {
    let rows = sqlx::query(&format!(
        "select {ARTWORK_COLUMNS} from artworks order by sort_order asc, id asc"
    ))
    .fetch_all(&mut *conn)
    .await
    .context("list_artworks failed")?;

    rows.iter().map(artwork_from_row).collect()
}

pub async fn fetch_artwork(conn: &mut PgConnection, id: ArtworkId) -> Result<Option<Artwork>> {
    let row = sqlx::query(&format!("select {ARTWORK_COLUMNS} from artworks where id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("fetch_artwork failed")?;

    row.as_ref().map(artwork_from_row).transpose()
}

/// Insert with a tentative order; returns the generated id.
pub async fn insert_artwork(
    conn: &mut PgConnection,
    fields: &ArtworkFields,
    order: i32,
) -> Result<ArtworkId> {
    let (id,): (ArtworkId,) = sqlx::query_as(
        r#"
        insert into artworks (title, description, image_url, project, year, "type", sort_order)
        values ($1, $2, $3, $4, $5, $6, $7)
        returning id
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.image_url)
    .bind(&fields.project)
    .bind(fields.year)
    .bind(&fields.kind)
    .bind(order)
    .fetch_one(&mut *conn)
    .await
    .context("insert_artwork failed")?;

    Ok(id)
}

/// Replace display metadata. Returns false when no row has `id`.
pub async fn update_artwork_fields(
    conn: &mut PgConnection,
    id: ArtworkId,
    fields: &ArtworkFields,
) -> Result<bool> {
    let res = sqlx::query(
        r#"
        update artworks
        set title = $1, description = $2, image_url = $3, project = $4, year = $5,
            "type" = $6, updated_at = now()
        where id = $7
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.image_url)
    .bind(&fields.project)
    .bind(fields.year)
    .bind(&fields.kind)
    .bind(id)
    .execute(&mut *conn)
    .await
    .context("update_artwork_fields failed")?;

    Ok(res.rows_affected() == 1)
}

/// Returns false when no row has `id`.
pub async fn delete_artwork(conn: &mut PgConnection, id: ArtworkId) -> Result<bool> {
    let res = sqlx::query("delete from artworks where id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("delete_artwork failed")?;

    Ok(res.rows_affected() == 1)
}

/// Take the ordering advisory lock for the rest of the current transaction.
///
/// Outside a transaction the lock is released as soon as the statement
/// finishes, which serializes nothing.
pub async fn lock_ordering(conn: &mut PgConnection) -> Result<()> {
    sqlx::query("select pg_advisory_xact_lock($1)")
        .bind(ORDERING_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .context("ordering lock failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// OrderStore over a connection
// ---------------------------------------------------------------------------

/// Classify a driver error for the reconciler.
pub fn store_error_kind(err: &sqlx::Error) -> StoreErrorKind {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => StoreErrorKind::Unavailable,
        sqlx::Error::RowNotFound => StoreErrorKind::NotFound,
        _ => StoreErrorKind::Rejected,
    }
}

/// True when `err` (anywhere in its context chain) is a connectivity failure.
pub fn is_unavailable(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<sqlx::Error>())
        .any(|e| store_error_kind(e) == StoreErrorKind::Unavailable)
}

fn to_store_error(err: sqlx::Error) -> StoreError {
    StoreError {
        kind: store_error_kind(&err),
        message: err.to_string(),
    }
}

/// [`OrderStore`] over one connection. Pass `&mut *tx` to make every write
/// part of that transaction.
pub struct PgOrderStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgOrderStore<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore<'_> {
    async fn load_ordering(&mut self) -> Result<Vec<OrderSlot>, StoreError> {
        let rows: Vec<(ArtworkId, i32)> =
            sqlx::query_as("select id, sort_order from artworks order by sort_order asc, id asc")
                .fetch_all(&mut *self.conn)
                .await
                .map_err(to_store_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, order)| OrderSlot::new(id, order))
            .collect())
    }

    async fn write_order(&mut self, write: OrderWrite) -> Result<(), StoreError> {
        let res = sqlx::query("update artworks set sort_order = $1 where id = $2")
            .bind(write.order)
            .bind(write.id)
            .execute(&mut *self.conn)
            .await
            .map_err(to_store_error)?;

        if res.rows_affected() == 0 {
            return Err(StoreError::not_found(write.id));
        }
        Ok(())
    }
}

/// Operator repair: renumber the whole collection to 1..N in one transaction.
pub async fn compact_ordering(pool: &PgPool) -> Result<RenumberPlan> {
    let mut tx = pool.begin().await.context("begin compact tx failed")?;
    lock_ordering(&mut *tx).await?;

    let plan = folio_order::reconcile_compact(&mut PgOrderStore::new(&mut *tx))
        .await
        .context("compact failed")?;

    tx.commit().await.context("commit compact tx failed")?;
    info!(
        records = plan.ordering.len(),
        writes = plan.writes.len(),
        "ordering compacted"
    );
    Ok(plan)
}

/// Current `(id, order)` snapshot, ascending by order then id.
pub async fn load_ordering(pool: &PgPool) -> Result<Vec<OrderSlot>> {
    let mut conn = pool.acquire().await.context("acquire connection failed")?;
    PgOrderStore::new(&mut conn)
        .load_ordering()
        .await
        .context("load ordering failed")
}
