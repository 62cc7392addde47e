//! Logged-out confirmation handler

use super::whoami::DiagState;
use axum::{extract::State, response::IntoResponse, Json};

/// Logged-out confirmation view
///
/// Terminal acknowledgement screen; requires no active source and consults
/// no authentication state.
#[utoipa::path(
    get,
    path = "/admin/logout",
    responses(
        (status = 200, description = "Logged-out confirmation view"),
    ),
    tag = "Admin diagnostics"
)]
pub async fn logged_out(State(state): State<DiagState>) -> impl IntoResponse {
    Json(state.controller.logout_page())
}
