//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    protocol::{PolicyDto, RoleDto, SessionSnapshot, StatusBannerDto, UsageSampleDto},
    state::AppState,
};
use axum::{extract::State, response::Json};
use remotenet_core::ViewState;
use std::sync::Arc;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        session_snapshot_handler,
    ),
    components(
        schemas(SessionSnapshot, PolicyDto, RoleDto, StatusBannerDto, UsageSampleDto)
    ),
    tags(
        (name = "RemoteNet Share API", description = "Read-only view of the simulated data-sharing session.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Get the current state of the sharing session.
///
/// The snapshot is rendered for an observer with no role selected, so `screen`
/// is always `role_selection`; the session fields reflect the live session.
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current session snapshot", body = SessionSnapshot)
    )
)]
pub async fn session_snapshot_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<SessionSnapshot> {
    Json(app_state.hub.snapshot(&ViewState::new()).await)
}
