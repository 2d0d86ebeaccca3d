//! services/api/src/web/middleware.rs
//!
//! Session and role middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use civica_core::domain::{AuthSession, Role};
use std::sync::Arc;
use tracing::debug;

use crate::web::state::AppState;

/// Pulls the session id out of the `Cookie` header.
pub fn session_id_from_headers(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookie_header| {
            cookie_header.split(';').find_map(|c| {
                let c = c.trim();
                c.strip_prefix("session=")
            })
        })
}

/// Middleware that validates the auth session cookie.
///
/// If valid, inserts the [`AuthSession`] into request extensions for handlers
/// to use. A missing or invalid session redirects to the login entry point.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session_id_from_headers(req.headers()) else {
        return Redirect::to("/login").into_response();
    };

    match state.store.validate_auth_session(session_id).await {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(e) => {
            debug!("Rejected session cookie: {e}");
            Redirect::to("/login").into_response()
        }
    }
}

/// Rejects sessions of any other role.
///
/// Runs after [`require_auth`], which put the session into extensions. A role
/// mismatch answers with a bare-text 403, not a redirect.
async fn require_role(role: Role, req: Request, next: Next) -> Response {
    match req.extensions().get::<AuthSession>() {
        Some(session) if session.role == role => next.run(req).await,
        Some(_) => (StatusCode::FORBIDDEN, "Unauthorized").into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

pub async fn require_user(req: Request, next: Next) -> Response {
    require_role(Role::User, req, next).await
}

pub async fn require_police(req: Request, next: Next) -> Response {
    require_role(Role::Police, req, next).await
}

pub async fn require_medical(req: Request, next: Next) -> Response {
    require_role(Role::Medical, req, next).await
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    require_role(Role::Admin, req, next).await
}
