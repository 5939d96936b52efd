//! Shared application state.

use std::sync::Arc;
use surge_auth::AuthService;
use surge_core::PurchaseEngine;
use surge_core::store::{ProductCatalog, PurchaseLedger};

/// State shared across all handlers.
///
/// The engine owns the purchase path; the ledger and catalog handles exist
/// for the read and admin endpoints that bypass it.
#[derive(Clone)]
pub struct AppState {
    /// Purchase and sale-window orchestration.
    pub engine: Arc<PurchaseEngine>,
    /// Identity service.
    pub auth: AuthService,
    /// Direct ledger access for purchase listings.
    pub ledger: Arc<dyn PurchaseLedger>,
    /// Direct catalog access for product CRUD.
    pub catalog: Arc<dyn ProductCatalog>,
}

impl AppState {
    /// Bundle the collaborators into one state value.
    #[must_use]
    pub fn new(
        engine: Arc<PurchaseEngine>,
        auth: AuthService,
        ledger: Arc<dyn PurchaseLedger>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            engine,
            auth,
            ledger,
            catalog,
        }
    }
}
