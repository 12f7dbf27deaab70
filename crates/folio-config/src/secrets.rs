//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (`database.url_env`,
//!   `auth.admin_token_env`).
//! - Binaries call [`resolve_secrets`] once at startup and pass the result
//!   into constructors; nothing else reads those env vars.
//! - `Debug` redacts values; errors name the variable, never its value.
//!
//! # Enforcement
//! | backend  | required                |
//! |----------|-------------------------|
//! | postgres | database URL            |
//! | memory   | nothing                 |
//!
//! The admin token is always optional. Without it the daemon refuses every
//! mutating request.

use anyhow::{bail, Result};

use crate::{FolioConfig, StorageBackend};

#[derive(Clone)]
pub struct ResolvedSecrets {
    pub database_url: Option<String>,
    pub admin_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "admin_token",
                &self.admin_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl ResolvedSecrets {
    /// The database URL, or an error naming the env var that should hold it.
    pub fn require_database_url(&self, cfg: &FolioConfig) -> Result<&str> {
        match self.database_url.as_deref() {
            Some(url) => Ok(url),
            None => bail!(
                "SECRETS_MISSING: required env var '{}' (database url) is not set or empty",
                cfg.database.url_env
            ),
        }
    }
}

/// Unset and blank both count as absent.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve secrets from the process environment.
pub fn resolve_secrets(cfg: &FolioConfig) -> Result<ResolvedSecrets> {
    resolve_secrets_with(cfg, resolve_env)
}

/// Resolve secrets through `lookup` (env var name -> value).
pub fn resolve_secrets_with<F>(cfg: &FolioConfig, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let secrets = ResolvedSecrets {
        database_url: non_blank(&cfg.database.url_env),
        admin_token: non_blank(&cfg.auth.admin_token_env),
    };

    if cfg.storage.backend == StorageBackend::Postgres {
        secrets.require_database_url(cfg)?;
    }
    Ok(secrets)
}
