//! services/api/src/web/admin.rs
//!
//! Routes for the `Admin` role: the user listing and user removal.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
    Form,
};
use civica_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// One row in the admin user listing. Password hashes never leave the store.
#[derive(Serialize, ToSchema)]
pub struct UserRow {
    pub username: String,
    pub role: String,
    pub profile_complete: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoveUserForm {
    pub username: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /admin - List every registered account.
#[utoipa::path(
    get,
    path = "/admin",
    responses((status = 200, description = "All accounts", body = [UserRow]))
)]
pub async fn admin_dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let users = state.store.list_users().await.map_err(|e| {
        error!("Failed to list users: {e:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list users".to_string(),
        )
    })?;

    let rows: Vec<UserRow> = users
        .into_iter()
        .map(|(username, user)| UserRow {
            username,
            role: user.role.as_str().to_string(),
            profile_complete: user.profile.as_ref().is_some_and(|p| p.is_complete()),
        })
        .collect();
    Ok(Json(rows))
}

/// POST /admin/remove - Delete an account. Immediate and irreversible.
#[utoipa::path(
    post,
    path = "/admin/remove",
    request_body(content = RemoveUserForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account removed; redirected to /admin"),
        (status = 404, description = "No account with that username")
    )
)]
pub async fn remove_user_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RemoveUserForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .store
        .delete_user(&form.username)
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            other => {
                error!("Failed to delete user: {other:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to delete user".to_string(),
                )
            }
        })?;

    info!("Removed account '{}'", form.username);
    Ok(Redirect::to("/admin"))
}
