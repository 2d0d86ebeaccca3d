//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login, logout and the role dispatch
//! that sends a fresh session to its landing page.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    Extension, Form,
};
use chrono::{Duration, Utc};
use civica_core::domain::{AuthSession, Role};
use civica_core::ports::PortError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

const SESSION_DAYS: i64 = 30;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /login - The login entry point. Rendering is left to the client.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login prompt"))
)]
pub async fn login_page_handler() -> &'static str {
    "Log in by POSTing username and password to /login"
}

/// GET /signup - The signup entry point.
#[utoipa::path(
    get,
    path = "/signup",
    responses((status = 200, description = "Signup prompt"))
)]
pub async fn signup_page_handler() -> &'static str {
    "Sign up by POSTing username, password and role to /signup"
}

/// POST /signup - Create a new account, then send the user to the login page.
///
/// Every role signs up the same way; none is logged in implicitly.
#[utoipa::path(
    post,
    path = "/signup",
    request_body(content = SignupRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created; redirected to /login"),
        (status = 400, description = "Unknown role"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Form(req): Form<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let role: Role = req
        .role
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })?
        .to_string();

    // 2. Create the account; a duplicate username leaves the store unchanged
    state
        .store
        .create_user(&req.username, &password_hash, role)
        .await
        .map_err(|e| match e {
            PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            other => {
                error!("Failed to create user: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create user".to_string(),
                )
            }
        })?;

    Ok(Redirect::to("/login"))
}

/// POST /login - Log in and land on the role's dashboard.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in; redirected to the role's landing page"),
        (status = 401, description = "Unknown username or wrong password"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Form(req): Form<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Look up the account. An unknown username is reported as such,
    //    distinct from a wrong password.
    let user = state.store.get_user(&req.username).await.map_err(|e| match e {
        PortError::NotFound(_) => (
            StatusCode::UNAUTHORIZED,
            "No account with that username".to_string(),
        ),
        other => {
            error!("Failed to load user: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error".to_string(),
            )
        }
    })?;

    // 2. Verify the password
    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, "Incorrect password".to_string()));
    }

    // 3. Create the session
    let session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_DAYS);
    state
        .store
        .create_auth_session(&session_id, &req.username, user.role, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create session".to_string(),
            )
        })?;

    // 4. Set the cookie and dispatch by role
    let cookie = format!(
        "session={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        session_id,
        Duration::days(SESSION_DAYS).num_seconds()
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Redirect::to(user.role.landing_path()),
    ))
}

/// GET /dashboard - Redirect an authenticated session to its role's landing page.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 303, description = "Redirected to the role's landing page"))
)]
pub async fn dashboard_handler(Extension(session): Extension<AuthSession>) -> Redirect {
    Redirect::to(session.role.landing_path())
}

/// GET /logout - Drop the session unconditionally and return to the login page.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Session cleared; redirected to /login"))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    if let Some(session_id) = crate::web::middleware::session_id_from_headers(&headers) {
        if let Err(e) = state.store.delete_auth_session(session_id).await {
            error!("Failed to delete auth session: {:?}", e);
        }
    }

    let cookie = "session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0";
    (
        [(header::SET_COOKIE, cookie.to_string())],
        Redirect::to("/login"),
    )
}
