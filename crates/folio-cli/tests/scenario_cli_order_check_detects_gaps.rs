use assert_cmd::prelude::*;
use predicates::prelude::*;

/// `folio order check` exits non-zero on a gap; `folio order compact` repairs
/// it.
///
/// DB-backed test, skipped if FOLIO_DATABASE_URL is not set. Leaves the
/// artworks it creates deleted and the ordering compacted.
#[tokio::test]
async fn order_check_fails_on_gap_and_compact_repairs() -> anyhow::Result<()> {
    let url = match std::env::var(folio_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: FOLIO_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = folio_db::connect_from_env().await?;
    folio_db::migrate(&pool).await?;
    folio_db::compact_ordering(&pool).await?;

    // Append with a deliberate gap of one.
    let mut conn = pool.acquire().await?;
    let next = folio_order::append_order(&folio_db::load_ordering(&pool).await?)?;
    let fields = folio_schemas::ArtworkFields::titled("cli-gap-scenario");
    let id = folio_db::insert_artwork(&mut conn, &fields, next + 1).await?;

    let mut check = std::process::Command::cargo_bin("folio")?;
    check
        .env(folio_db::ENV_DB_URL, &url)
        .env_remove("FOLIO_CONFIG")
        .args(["order", "check"]);
    check
        .assert()
        .failure()
        .stdout(predicate::str::contains("contiguous=false"))
        .stderr(predicate::str::contains("ORDERING_NOT_CONTIGUOUS"));

    let mut compact = std::process::Command::cargo_bin("folio")?;
    compact
        .env(folio_db::ENV_DB_URL, &url)
        .env_remove("FOLIO_CONFIG")
        .args(["order", "compact"]);
    compact
        .assert()
        .success()
        .stdout(predicate::str::contains("contiguous=true"));

    folio_db::delete_artwork(&mut conn, id).await?;
    drop(conn);
    folio_db::compact_ordering(&pool).await?;
    Ok(())
}
