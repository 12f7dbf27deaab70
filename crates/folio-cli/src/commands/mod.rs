//! Command handler modules for the folio CLI.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod db;
pub mod order;

use anyhow::{Context, Result};
use folio_config::{secrets, LoadedConfig};
use folio_db::PgPool;

/// `--config` paths when given, otherwise FOLIO_CONFIG, otherwise defaults.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return folio_config::load_from_env();
    }
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    folio_config::load_layered_yaml(&path_refs)
}

/// Load config, resolve the database URL and connect.
pub async fn connect(paths: &[String]) -> Result<PgPool> {
    let loaded = load_config(paths).context("config load failed")?;
    let cfg = &loaded.config;
    let resolved = secrets::resolve_secrets(cfg)?;
    let url = resolved.require_database_url(cfg)?;
    folio_db::connect(&cfg.database, url).await
}
