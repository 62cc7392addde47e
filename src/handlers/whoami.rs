//! Diagnostic "whoami" handlers
//!
//! The admin-access gate runs as middleware before these handlers; by the
//! time a request lands here it is already authorized.

use crate::controller::{DiagController, DiagRequest};
use crate::models::Outcome;
use crate::state::{PARAM_ERROR_STATE, PARAM_LOGOUT};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

/// Application state for the diagnostic handlers
#[derive(Clone)]
pub struct DiagState {
    pub controller: Arc<DiagController>,
}

/// Reserved query parameters for the whoami page.
///
/// Any other query parameter is carried through unchanged into the
/// reconstructed return URL, so the handlers also read the raw pairs.
#[derive(Debug, Deserialize, IntoParams)]
pub struct WhoamiQuery {
    /// Presence-only logout marker
    pub logout: Option<String>,
    /// Exception reference from a failed flow
    pub error_state: Option<String>,
}

/// List the configured authentication sources
#[utoipa::path(
    get,
    path = "/admin/test",
    params(WhoamiQuery),
    responses(
        (status = 200, description = "Source selection view"),
    ),
    tag = "Admin diagnostics"
)]
pub async fn whoami_index(
    State(state): State<DiagState>,
    Query(query): Query<WhoamiQuery>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let req = build_request(None, query, params);
    match state.controller.main(&req).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => {
            tracing::error!(error = %e, "Diagnostic source list failed");
            e.into_response()
        }
    }
}

/// Exercise one authentication source
#[utoipa::path(
    get,
    path = "/admin/test/{source}",
    params(
        ("source" = String, Path, description = "Authentication source id"),
        WhoamiQuery,
    ),
    responses(
        (status = 200, description = "Resolved identity view"),
        (status = 303, description = "Redirect into the login flow or back to this page"),
        (status = 400, description = "Exception reference no longer resolves"),
        (status = 404, description = "Unknown authentication source"),
        (status = 502, description = "Login flow reported a failure"),
    ),
    tag = "Admin diagnostics"
)]
pub async fn whoami_source(
    State(state): State<DiagState>,
    Path(source_id): Path<String>,
    Query(query): Query<WhoamiQuery>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let req = build_request(Some(source_id.clone()), query, params);
    match state.controller.main(&req).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => {
            tracing::error!(error = %e, source_id = %source_id, "Diagnostic flow failed");
            e.into_response()
        }
    }
}

fn build_request(
    source_id: Option<String>,
    query: WhoamiQuery,
    params: Vec<(String, String)>,
) -> DiagRequest {
    DiagRequest {
        source_id,
        error_state: query.error_state,
        logout: query.logout.is_some(),
        extra: params
            .into_iter()
            .filter(|(name, _)| name != PARAM_LOGOUT && name != PARAM_ERROR_STATE)
            .collect(),
    }
}

fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Render(render) => Json(render).into_response(),
        Outcome::Redirect(redirect) => Redirect::to(&redirect.location).into_response(),
    }
}
