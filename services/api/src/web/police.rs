//! services/api/src/web/police.rs
//!
//! Routes for the `Police` role: the complaint queue, complaint resolution
//! and station details on the officer's profile.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
    Extension, Form,
};
use chrono::{DateTime, Utc};
use civica_core::domain::{AuthSession, ComplaintStatus, StationInfo};
use civica_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct PoliceComplaintView {
    pub id: Uuid,
    pub user: String,
    pub text: String,
    pub station: Option<String>,
    #[schema(value_type = String)]
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResolveForm {
    /// The complaint id, as rendered in the queue listing.
    pub id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StationForm {
    pub station_name: String,
    pub address: String,
}

#[derive(Serialize, ToSchema)]
pub struct StationView {
    pub station_name: String,
    pub address: String,
}

fn internal(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{context}: {e:?}");
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /police - The full complaint queue, oldest first.
#[utoipa::path(
    get,
    path = "/police",
    responses((status = 200, description = "All complaints", body = [PoliceComplaintView]))
)]
pub async fn police_dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let complaints = state
        .store
        .list_complaints()
        .await
        .map_err(|e| internal("Failed to load complaints", e))?;

    let views: Vec<PoliceComplaintView> = complaints
        .into_iter()
        .map(|c| PoliceComplaintView {
            id: c.id,
            user: c.user,
            text: c.text,
            station: c.station,
            status: c.status,
            created_at: c.created_at,
        })
        .collect();
    Ok(Json(views))
}

/// POST /police/resolve - Mark a complaint Resolved.
///
/// A malformed id is a client error message, not a crash; an unknown id is
/// reported as not found.
#[utoipa::path(
    post,
    path = "/police/resolve",
    request_body(content = ResolveForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Complaint resolved", body = PoliceComplaintView),
        (status = 400, description = "Malformed complaint id"),
        (status = 404, description = "No complaint with that id")
    )
)]
pub async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResolveForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let id = Uuid::parse_str(form.id.trim()).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Invalid complaint id".to_string(),
        )
    })?;

    let complaint = state.store.resolve_complaint(id).await.map_err(|e| match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        other => internal("Failed to resolve complaint", other),
    })?;

    Ok(Json(PoliceComplaintView {
        id: complaint.id,
        user: complaint.user,
        text: complaint.text,
        station: complaint.station,
        status: complaint.status,
        created_at: complaint.created_at,
    }))
}

/// GET /police/station - View the station details on the officer's profile.
#[utoipa::path(
    get,
    path = "/police/station",
    responses(
        (status = 200, description = "Stored station details", body = StationView),
        (status = 404, description = "No station details recorded yet")
    )
)]
pub async fn station_view_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .store
        .get_user(&session.username)
        .await
        .map_err(|e| internal("Failed to load user", e))?;

    let info = user
        .profile
        .and_then(|p| p.station_info)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                "No station details recorded yet".to_string(),
            )
        })?;

    Ok(Json(StationView {
        station_name: info.station_name,
        address: info.address,
    }))
}

/// POST /police/station - Record station details on the officer's profile.
#[utoipa::path(
    post,
    path = "/police/station",
    request_body(content = StationForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Station recorded; redirected to /police"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn station_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Form(form): Form<StationForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .store
        .get_user(&session.username)
        .await
        .map_err(|e| internal("Failed to load user", e))?;

    let mut profile = user.profile.unwrap_or_default();
    profile.station_info = Some(StationInfo {
        station_name: form.station_name,
        address: form.address,
    });

    state
        .store
        .update_profile(&session.username, profile)
        .await
        .map_err(|e| internal("Failed to update profile", e))?;

    Ok(Redirect::to("/police"))
}
