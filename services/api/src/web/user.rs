//! services/api/src/web/user.rs
//!
//! Routes for the citizen (`User`) role: dashboard, profile completion and
//! editing, safety complaints, the station directory and the medicine shop.
//!
//! Profile completion is enforced before the dashboard and the shop are
//! reachable; incomplete sessions are bounced to `/profile/complete`.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    Extension, Form,
};
use chrono::{DateTime, Utc};
use civica_core::domain::{AuthSession, ComplaintStatus, Medicine, Profile};
use civica_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::stations::{nearby_stations, Station};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UserDashboard {
    pub username: String,
    #[schema(value_type = Object)]
    pub profile: Profile,
    pub pending_complaints: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct ProfileForm {
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub bio: String,
    /// Comma-separated interest tags.
    #[serde(default)]
    pub interests: String,
    pub address: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ComplaintForm {
    pub text: String,
    #[serde(default)]
    pub station: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ComplaintView {
    pub id: Uuid,
    pub text: String,
    pub station: Option<String>,
    #[schema(value_type = String)]
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct ShopItem {
    pub store: String,
    pub name: String,
    pub price: String,
}

#[derive(Deserialize, ToSchema)]
pub struct OrderForm {
    pub medicine: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn internal(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{context}: {e:?}");
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

/// Loads the session's profile, or the redirect that sends an incomplete
/// account to the completion flow.
async fn complete_profile_or_redirect(
    state: &AppState,
    session: &AuthSession,
) -> Result<Profile, Result<Redirect, (StatusCode, String)>> {
    let user = match state.store.get_user(&session.username).await {
        Ok(user) => user,
        Err(e) => return Err(Err(internal("Failed to load user", e))),
    };
    match user.profile {
        Some(profile) if profile.is_complete() => Ok(profile),
        _ => Err(Ok(Redirect::to("/profile/complete"))),
    }
}

fn parse_interests(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /user - The citizen dashboard.
#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "Dashboard data", body = UserDashboard),
        (status = 303, description = "Profile incomplete; redirected to /profile/complete")
    )
)]
pub async fn user_dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response, (StatusCode, String)> {
    let profile = match complete_profile_or_redirect(&state, &session).await {
        Ok(profile) => profile,
        Err(redirect) => return redirect.map(IntoResponse::into_response),
    };

    let complaints = state
        .store
        .list_complaints_for_user(&session.username)
        .await
        .map_err(|e| internal("Failed to load complaints", e))?;

    Ok(Json(UserDashboard {
        username: session.username,
        profile,
        pending_complaints: complaints
            .iter()
            .filter(|c| c.status == ComplaintStatus::Pending)
            .count(),
    })
    .into_response())
}

/// GET /profile - View the stored profile.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The stored profile"),
        (status = 303, description = "No profile yet; redirected to /profile/complete")
    )
)]
pub async fn profile_view_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response, (StatusCode, String)> {
    let user = state
        .store
        .get_user(&session.username)
        .await
        .map_err(|e| internal("Failed to load user", e))?;

    match user.profile {
        Some(profile) => Ok(Json(profile).into_response()),
        None => Ok(Redirect::to("/profile/complete").into_response()),
    }
}

/// POST /profile - Edit the profile's text fields.
///
/// Keeps the uploaded photo and any role-specific sub-records intact.
#[utoipa::path(
    post,
    path = "/profile",
    request_body(content = ProfileForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Profile updated; redirected to /profile"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn profile_edit_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Form(form): Form<ProfileForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .store
        .get_user(&session.username)
        .await
        .map_err(|e| internal("Failed to load user", e))?;

    let mut profile = user.profile.unwrap_or_default();
    profile.email = form.email;
    profile.phone = form.phone;
    profile.national_id = form.national_id;
    profile.gender = form.gender;
    profile.date_of_birth = form.date_of_birth;
    profile.bio = form.bio;
    profile.interests = parse_interests(&form.interests);
    profile.address = form.address;

    state
        .store
        .update_profile(&session.username, profile)
        .await
        .map_err(|e| internal("Failed to update profile", e))?;

    Ok(Redirect::to("/profile"))
}

/// GET /profile/complete - The profile-completion entry point.
#[utoipa::path(
    get,
    path = "/profile/complete",
    responses((status = 200, description = "Completion prompt"))
)]
pub async fn profile_complete_page_handler() -> &'static str {
    "Complete your profile by POSTing email, phone and address (and optional details) here"
}

/// POST /profile/complete - Complete the profile, with an optional photo upload.
///
/// Accepts multipart/form-data: the `ProfileForm` fields plus an optional
/// `photo` file part. The photo is stored under the upload directory.
#[utoipa::path(
    post,
    path = "/profile/complete",
    request_body(content_type = "multipart/form-data", description = "Profile fields and an optional photo part."),
    responses(
        (status = 303, description = "Profile stored; redirected to /user"),
        (status = 400, description = "Missing required field or disallowed file type"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn profile_complete_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .store
        .get_user(&session.username)
        .await
        .map_err(|e| internal("Failed to load user", e))?;
    let mut profile = user.profile.unwrap_or_default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {e}"),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            let file_name = field.file_name().unwrap_or("photo").to_string();
            let data = field.bytes().await.map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read file bytes: {e}"),
                )
            })?;
            if data.is_empty() {
                continue;
            }
            let stored = state.uploads.save(&file_name, &data).await.map_err(|e| match e {
                PortError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg),
                other => internal("Failed to store upload", other),
            })?;
            profile.photo = Some(stored);
            continue;
        }

        let value = field.text().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read field '{name}': {e}"),
            )
        })?;
        match name.as_str() {
            "email" => profile.email = value,
            "phone" => profile.phone = value,
            "national_id" => profile.national_id = value,
            "gender" => profile.gender = value,
            "date_of_birth" => profile.date_of_birth = value,
            "bio" => profile.bio = value,
            "interests" => profile.interests = parse_interests(&value),
            "address" => profile.address = value,
            _ => {}
        }
    }

    if !profile.is_complete() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Email, phone and address are required".to_string(),
        ));
    }

    state
        .store
        .update_profile(&session.username, profile)
        .await
        .map_err(|e| internal("Failed to update profile", e))?;

    Ok(Redirect::to("/user"))
}

/// GET /safety - List the session's own complaints with their status.
#[utoipa::path(
    get,
    path = "/safety",
    responses((status = 200, description = "The session's complaints", body = [ComplaintView]))
)]
pub async fn safety_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let complaints = state
        .store
        .list_complaints_for_user(&session.username)
        .await
        .map_err(|e| internal("Failed to load complaints", e))?;

    let views: Vec<ComplaintView> = complaints
        .into_iter()
        .map(|c| ComplaintView {
            id: c.id,
            text: c.text,
            station: c.station,
            status: c.status,
            created_at: c.created_at,
        })
        .collect();
    Ok(Json(views))
}

/// POST /safety - File a new safety complaint.
#[utoipa::path(
    post,
    path = "/safety",
    request_body(content = ComplaintForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Complaint filed", body = ComplaintView),
        (status = 400, description = "Empty complaint text")
    )
)]
pub async fn safety_file_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Form(form): Form<ComplaintForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if form.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Complaint text must not be empty".to_string(),
        ));
    }

    let station = form.station.filter(|s| !s.is_empty());
    let complaint = state
        .store
        .file_complaint(&session.username, form.text.trim(), station)
        .await
        .map_err(|e| internal("Failed to file complaint", e))?;

    Ok((
        StatusCode::CREATED,
        Json(ComplaintView {
            id: complaint.id,
            text: complaint.text,
            station: complaint.station,
            status: complaint.status,
            created_at: complaint.created_at,
        }),
    ))
}

/// GET /stations - The nearby police station directory.
#[utoipa::path(
    get,
    path = "/stations",
    responses((status = 200, description = "Nearby stations", body = [Station]))
)]
pub async fn stations_handler() -> Json<Vec<Station>> {
    Json(nearby_stations())
}

/// GET /shop - List every medicine across all pharmacy stores.
///
/// Unreachable until the profile is complete.
#[utoipa::path(
    get,
    path = "/shop",
    responses(
        (status = 200, description = "Available medicines", body = [ShopItem]),
        (status = 303, description = "Profile incomplete; redirected to /profile/complete")
    )
)]
pub async fn shop_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response, (StatusCode, String)> {
    if let Err(redirect) = complete_profile_or_redirect(&state, &session).await {
        return redirect.map(IntoResponse::into_response);
    }

    let medicines = state
        .store
        .list_all_medicines()
        .await
        .map_err(|e| internal("Failed to load medicines", e))?;

    let items: Vec<ShopItem> = medicines
        .into_iter()
        .map(|(store, Medicine { name, price })| ShopItem { store, name, price })
        .collect();
    Ok(Json(items).into_response())
}

/// POST /shop - Place an order for a medicine by exact name.
#[utoipa::path(
    post,
    path = "/shop",
    request_body(content = OrderForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Order placed"),
        (status = 303, description = "Profile incomplete; redirected to /profile/complete"),
        (status = 404, description = "No store stocks that medicine")
    )
)]
pub async fn order_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Form(form): Form<OrderForm>,
) -> Result<Response, (StatusCode, String)> {
    if let Err(redirect) = complete_profile_or_redirect(&state, &session).await {
        return redirect.map(IntoResponse::into_response);
    }

    let order = state
        .store
        .place_order(&session.username, &form.medicine)
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            other => internal("Failed to place order", other),
        })?;

    Ok((StatusCode::CREATED, Json(order)).into_response())
}
