//! Shared runtime state for folio-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum; this module owns
//! nothing async itself.

use std::sync::Arc;

use crate::catalog::Catalog;

/// Static build metadata included in health responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Handle shared across all Axum handlers.
///
/// No `Debug`: it holds the admin token.
#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub catalog: Arc<dyn Catalog>,
    /// Shared bearer token for mutating routes. `None` = every mutating
    /// request is refused.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn Catalog>, admin_token: Option<String>) -> Self {
        Self {
            build: BuildInfo {
                service: "folio-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            catalog,
            admin_token,
        }
    }
}
