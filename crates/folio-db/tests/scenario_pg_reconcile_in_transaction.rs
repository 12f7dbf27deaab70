//! Reconciliation against real Postgres, inside a transaction that is rolled
//! back at the end so the shared database is left untouched.
//!
//! DB-backed tests, skipped if FOLIO_DATABASE_URL is not set.

use folio_db::{delete_artwork, fetch_artwork, insert_artwork, lock_ordering, PgOrderStore};
use folio_order::{
    append_order, contiguity, reconcile_compact, reconcile_insert, OrderStore, OrderWrite,
    StoreErrorKind,
};
use folio_schemas::ArtworkFields;
use sqlx::PgPool;

async fn pool_or_skip() -> anyhow::Result<Option<PgPool>> {
    if std::env::var(folio_db::ENV_DB_URL).is_err() {
        eprintln!("SKIP: FOLIO_DATABASE_URL not set");
        return Ok(None);
    }
    let pool = folio_db::connect_from_env().await?;
    folio_db::migrate(&pool).await?;
    Ok(Some(pool))
}

#[tokio::test]
async fn insert_at_position_renumbers_inside_tx() -> anyhow::Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let mut tx = pool.begin().await?;
    lock_ordering(&mut *tx).await?;
    sqlx::query("delete from artworks").execute(&mut *tx).await?;

    let a = insert_artwork(&mut *tx, &ArtworkFields::titled("A"), 1).await?;
    let b = insert_artwork(&mut *tx, &ArtworkFields::titled("B"), 2).await?;
    let c = insert_artwork(&mut *tx, &ArtworkFields::titled("C"), 3).await?;
    let d = insert_artwork(&mut *tx, &ArtworkFields::titled("D"), 2).await?;

    let plan = reconcile_insert(&mut PgOrderStore::new(&mut *tx), d, Some(2)).await?;
    assert_eq!(plan.order_of(d), Some(2));

    let slots = PgOrderStore::new(&mut *tx).load_ordering().await?;
    let ids: Vec<_> = slots.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a, d, b, c]);
    assert!(contiguity(&slots).is_contiguous());

    let fetched = fetch_artwork(&mut *tx, b).await?.expect("b exists");
    assert_eq!(fetched.order, 3);
    assert_eq!(fetched.fields.title, "B");

    tx.rollback().await?;
    Ok(())
}

#[tokio::test]
async fn delete_then_compact_closes_gap() -> anyhow::Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let mut tx = pool.begin().await?;
    lock_ordering(&mut *tx).await?;
    sqlx::query("delete from artworks").execute(&mut *tx).await?;

    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        let slots = PgOrderStore::new(&mut *tx).load_ordering().await?;
        let order = append_order(&slots)?;
        ids.push(insert_artwork(&mut *tx, &ArtworkFields::titled(title), order).await?);
    }

    assert!(delete_artwork(&mut *tx, ids[0]).await?);
    assert!(!delete_artwork(&mut *tx, ids[0]).await?);

    let plan = reconcile_compact(&mut PgOrderStore::new(&mut *tx)).await?;
    assert_eq!(plan.order_of(ids[1]), Some(1));
    assert_eq!(plan.order_of(ids[2]), Some(2));

    tx.rollback().await?;
    Ok(())
}

#[tokio::test]
async fn write_to_missing_row_is_not_found() -> anyhow::Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let mut tx = pool.begin().await?;
    let err = PgOrderStore::new(&mut *tx)
        .write_order(OrderWrite::new(i32::MAX, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, StoreErrorKind::NotFound);
    tx.rollback().await?;
    Ok(())
}
