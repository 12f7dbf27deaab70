use anyhow::Result;
use folio_db::PgPool;

pub async fn status(pool: &PgPool) -> Result<()> {
    let s = folio_db::status(pool).await?;
    println!("db_ok={} has_artworks_table={}", s.ok, s.has_artworks_table);
    Ok(())
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    folio_db::migrate(pool).await?;
    println!("db_migrate=ok");
    Ok(())
}
