//! services/api/src/web/mod.rs
//!
//! Route handlers, session middleware and the router assembly. The router is
//! built here so the binary and the tests share one definition.

pub mod admin;
pub mod auth;
pub mod medical;
pub mod middleware;
pub mod police;
pub mod state;
pub mod user;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

use state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_page_handler,
        auth::signup_handler,
        auth::login_page_handler,
        auth::login_handler,
        auth::dashboard_handler,
        auth::logout_handler,
        user::user_dashboard_handler,
        user::profile_view_handler,
        user::profile_edit_handler,
        user::profile_complete_page_handler,
        user::profile_complete_handler,
        user::safety_list_handler,
        user::safety_file_handler,
        user::stations_handler,
        user::shop_handler,
        user::order_handler,
        police::police_dashboard_handler,
        police::resolve_handler,
        police::station_view_handler,
        police::station_record_handler,
        medical::medical_dashboard_handler,
        medical::store_view_handler,
        medical::store_register_handler,
        medical::medicine_add_handler,
        medical::medicine_update_handler,
        medical::medicine_remove_handler,
        medical::store_orders_handler,
        admin::admin_dashboard_handler,
        admin::remove_user_handler,
    ),
    components(schemas(
        auth::SignupRequest,
        auth::LoginRequest,
        user::UserDashboard,
        user::ProfileForm,
        user::ComplaintForm,
        user::ComplaintView,
        user::ShopItem,
        user::OrderForm,
        police::PoliceComplaintView,
        police::ResolveForm,
        police::StationForm,
        police::StationView,
        medical::InventoryView,
        medical::MedicineView,
        medical::StoreDetailsForm,
        medical::MedicineForm,
        admin::UserRow,
        admin::RemoveUserForm,
        crate::adapters::stations::Station,
    )),
    tags(
        (name = "Civica API", description = "Role-gated endpoints for the civic services portal.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router Assembly
//=========================================================================================

/// Builds the full application router over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/", get(|| async { Redirect::to("/login") }))
        .route(
            "/signup",
            get(auth::signup_page_handler).post(auth::signup_handler),
        )
        .route(
            "/login",
            get(auth::login_page_handler).post(auth::login_handler),
        )
        .route("/logout", get(auth::logout_handler));

    // Per-role subtrees; the role layer runs after the session layer below.
    let user_routes = Router::new()
        .route("/user", get(user::user_dashboard_handler))
        .route(
            "/profile",
            get(user::profile_view_handler).post(user::profile_edit_handler),
        )
        .route(
            "/profile/complete",
            get(user::profile_complete_page_handler).post(user::profile_complete_handler),
        )
        .route(
            "/safety",
            get(user::safety_list_handler).post(user::safety_file_handler),
        )
        .route("/stations", get(user::stations_handler))
        .route("/shop", get(user::shop_handler).post(user::order_handler))
        .layer(axum_middleware::from_fn(middleware::require_user));

    let police_routes = Router::new()
        .route("/police", get(police::police_dashboard_handler))
        .route("/police/resolve", post(police::resolve_handler))
        .route(
            "/police/station",
            get(police::station_view_handler).post(police::station_record_handler),
        )
        .layer(axum_middleware::from_fn(middleware::require_police));

    let medical_routes = Router::new()
        .route("/medical", get(medical::medical_dashboard_handler))
        .route(
            "/medical/store",
            get(medical::store_view_handler).post(medical::store_register_handler),
        )
        .route(
            "/medical/medicine",
            post(medical::medicine_add_handler)
                .put(medical::medicine_update_handler)
                .delete(medical::medicine_remove_handler),
        )
        .route("/medical/orders", get(medical::store_orders_handler))
        .layer(axum_middleware::from_fn(middleware::require_medical));

    let admin_routes = Router::new()
        .route("/admin", get(admin::admin_dashboard_handler))
        .route("/admin/remove", post(admin::remove_user_handler))
        .layer(axum_middleware::from_fn(middleware::require_admin));

    // Session-gated routes; require_auth runs before the role layers.
    let session_routes = Router::new()
        .route("/dashboard", get(auth::dashboard_handler))
        .merge(user_routes)
        .merge(police_routes)
        .merge(medical_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
        .with_state(app_state)
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{JsonStoreAdapter, UploadStore};
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_router() -> Router {
        let dir = std::env::temp_dir();
        let tag = Uuid::new_v4();
        let config = Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            data_file: dir.join(format!("civica-web-main-{tag}.json")),
            pharmacy_file: dir.join(format!("civica-web-pharmacy-{tag}.json")),
            upload_dir: dir.join(format!("civica-web-uploads-{tag}")),
            log_level: tracing::Level::INFO,
        });
        let store = Arc::new(JsonStoreAdapter::new(
            config.data_file.clone(),
            config.pharmacy_file.clone(),
        ));
        let uploads = Arc::new(UploadStore::new(config.upload_dir.clone()));
        router(Arc::new(AppState {
            store,
            uploads,
            config,
        }))
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::COOKIE, cookie.to_string())
            .body(Body::empty())
            .unwrap()
    }

    async fn signup_and_login(app: &Router, username: &str, role: &str) -> String {
        let response = app
            .clone()
            .oneshot(form_post(
                "/signup",
                &format!("username={username}&password=pw123&role={role}"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(form_post(
                "/login",
                &format!("username={username}&password=pw123"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn missing_session_redirects_to_login() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/user").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn role_mismatch_is_plain_text_forbidden() {
        let app = test_router();
        let cookie = signup_and_login(&app, "officer", "Police").await;

        let response = app
            .clone()
            .oneshot(get_with_cookie("/user", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_string(response).await, "Unauthorized");
    }

    #[tokio::test]
    async fn incomplete_profile_is_bounced_from_shop() {
        let app = test_router();
        let cookie = signup_and_login(&app, "asha", "User").await;

        let response = app
            .clone()
            .oneshot(get_with_cookie("/shop", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/profile/complete");
    }

    #[tokio::test]
    async fn completed_profile_reaches_the_shop() {
        let app = test_router();
        let cookie = signup_and_login(&app, "asha", "User").await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/profile")
                    .header(header::COOKIE, cookie.clone())
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "email=asha%40example.com&phone=555-0100&address=4+Park+Lane",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(get_with_cookie("/shop", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_signup_is_a_conflict() {
        let app = test_router();
        signup_and_login(&app, "asha", "User").await;

        let response = app
            .clone()
            .oneshot(form_post("/signup", "username=asha&password=other&role=Admin"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // The original credentials still work.
        let response = app
            .clone()
            .oneshot(form_post("/login", "username=asha&password=pw123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/user");
    }

    #[tokio::test]
    async fn login_errors_distinguish_unknown_user_from_wrong_password() {
        let app = test_router();
        signup_and_login(&app, "asha", "User").await;

        let response = app
            .clone()
            .oneshot(form_post("/login", "username=nobody&password=pw123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "No account with that username");

        let response = app
            .clone()
            .oneshot(form_post("/login", "username=asha&password=wrong"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "Incorrect password");
    }

    #[tokio::test]
    async fn dashboard_dispatches_by_role() {
        let app = test_router();
        let cookie = signup_and_login(&app, "root", "Admin").await;

        let response = app
            .clone()
            .oneshot(get_with_cookie("/dashboard", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin");
    }

    #[tokio::test]
    async fn logout_clears_the_session() {
        let app = test_router();
        let cookie = signup_and_login(&app, "root", "Admin").await;

        let response = app
            .clone()
            .oneshot(get_with_cookie("/logout", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        // The old cookie no longer opens the dashboard.
        let response = app
            .clone()
            .oneshot(get_with_cookie("/admin", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn admin_removes_exactly_the_named_user() {
        let app = test_router();
        signup_and_login(&app, "asha", "User").await;
        let cookie = signup_and_login(&app, "root", "Admin").await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/remove")
                    .header(header::COOKIE, cookie.clone())
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=asha"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(get_with_cookie("/admin", &cookie))
            .await
            .unwrap();
        let body = body_string(response).await;
        assert!(body.contains("root"));
        assert!(!body.contains("asha"));
    }

    #[tokio::test]
    async fn medical_registers_a_store_and_stocks_it() {
        let app = test_router();
        let cookie = signup_and_login(&app, "meera", "Medical").await;

        // No store yet: bounced into the details flow.
        let response = app
            .clone()
            .oneshot(get_with_cookie("/medical", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/medical/store");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/medical/store")
                    .header(header::COOKIE, cookie.clone())
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "store_name=Meera+Pharmacy&license=LIC-7&address=12+High+Street",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/medical/medicine")
                    .header(header::COOKIE, cookie.clone())
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("name=Paracetamol&price=25"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(get_with_cookie("/medical", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Paracetamol"));
    }

    #[tokio::test]
    async fn police_resolves_a_filed_complaint() {
        let app = test_router();
        let user_cookie = signup_and_login(&app, "asha", "User").await;
        let police_cookie = signup_and_login(&app, "officer", "Police").await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/safety")
                    .header(header::COOKIE, user_cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("text=streetlight+out&station=Central"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_string(response).await;
        let filed: serde_json::Value = serde_json::from_str(&body).unwrap();
        let id = filed["id"].as_str().unwrap().to_string();

        // A malformed id is a client error, not a crash.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/police/resolve")
                    .header(header::COOKIE, police_cookie.clone())
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("id=not-a-uuid"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/police/resolve")
                    .header(header::COOKIE, police_cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(format!("id={id}")))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        let resolved: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(resolved["status"], "Resolved");
    }
}
