//! Admin diagnostic route definitions

use crate::controller::DiagController;
use crate::handlers::{logged_out, whoami_index, whoami_source, DiagState};
use crate::source::SourceRegistry;
use crate::state::ExceptionStateStore;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Create the admin diagnostic router.
///
/// These routes sit behind the admin-access gate; mount them under the
/// gate's middleware.
pub fn admin_diag_router(state: DiagState) -> Router {
    Router::new()
        .route("/admin/test", get(whoami_index))
        .route("/admin/test/:source", get(whoami_source))
        .route("/admin/logout", get(logged_out))
        .with_state(state)
}

/// Create diagnostic handler state from injected collaborators
#[must_use]
pub fn create_diag_state(
    sources: Arc<SourceRegistry>,
    state_store: Arc<dyn ExceptionStateStore>,
    base_url: String,
) -> DiagState {
    DiagState {
        controller: Arc::new(DiagController::new(sources, state_store, base_url)),
    }
}
