//! PgCatalog against a real database in the default transactional mode.
//!
//! DB-backed test, skipped if FOLIO_DATABASE_URL is not set. Cleans up the
//! rows it creates.

use folio_config::OrderingConfig;
use folio_daemon::catalog::{Catalog, CatalogError, PgCatalog};
use folio_schemas::{ArtworkFields, ArtworkInput};

fn input(title: &str, order: Option<i32>) -> ArtworkInput {
    ArtworkInput {
        fields: ArtworkFields::titled(title),
        order,
    }
}

#[tokio::test]
async fn insert_at_position_and_delete_stay_contiguous() -> anyhow::Result<()> {
    if std::env::var(folio_db::ENV_DB_URL).is_err() {
        eprintln!("SKIP: FOLIO_DATABASE_URL not set");
        return Ok(());
    }
    let pool = folio_db::connect_from_env().await?;
    folio_db::migrate(&pool).await?;
    let catalog = PgCatalog::new(pool.clone(), OrderingConfig::default());

    let a = catalog.create(input("pg-scenario-A", None)).await?;
    let b = catalog.create(input("pg-scenario-B", None)).await?;
    let c = catalog.create(input("pg-scenario-C", Some(a.order + 1))).await?;

    assert_eq!(c.order, a.order + 1);
    assert_eq!(catalog.get(b.id).await?.order, a.order + 2);

    // Out-of-range relocation is rejected without touching metadata.
    let err = catalog
        .replace(b.id, input("renamed", Some(i32::MAX)))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Reconcile(_)));
    assert_eq!(catalog.get(b.id).await?.fields.title, "pg-scenario-B");

    for id in [a.id, b.id, c.id] {
        catalog.delete(id).await?;
    }
    assert_eq!(catalog.get(a.id).await.unwrap_err(), CatalogError::NotFound(a.id));

    let slots = folio_db::load_ordering(&pool).await?;
    assert!(folio_order::contiguity(&slots).is_contiguous());
    Ok(())
}
