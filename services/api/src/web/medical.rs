//! services/api/src/web/medical.rs
//!
//! Routes for the `Medical` role: store registration, inventory management
//! and the order feed for the owner's store.
//!
//! A Medical account without a registered store is bounced to the
//! "complete store details" flow before it can reach the dashboard.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    Extension, Form,
};
use civica_core::domain::{AuthSession, Medicine, Order, PharmacyStore, StoreInfo};
use civica_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct InventoryView {
    pub store: String,
    pub license: String,
    pub address: String,
    pub medicines: Vec<MedicineView>,
}

#[derive(Serialize, ToSchema)]
pub struct MedicineView {
    pub name: String,
    pub price: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StoreDetailsForm {
    pub store_name: String,
    pub license: String,
    pub address: String,
}

#[derive(Deserialize, ToSchema)]
pub struct MedicineForm {
    pub name: String,
    pub price: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoveMedicineQuery {
    pub name: String,
}

fn internal(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{context}: {e:?}");
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

/// Loads the owner's store, or the redirect into the store-details flow.
async fn store_or_redirect(
    state: &AppState,
    session: &AuthSession,
) -> Result<PharmacyStore, Result<Redirect, (StatusCode, String)>> {
    match state.store.get_store_for_owner(&session.username).await {
        Ok(store) => Ok(store),
        Err(PortError::NotFound(_)) => Err(Ok(Redirect::to("/medical/store"))),
        Err(e) => Err(Err(internal("Failed to load store", e))),
    }
}

fn inventory_view(store: PharmacyStore) -> InventoryView {
    InventoryView {
        store: store.name,
        license: store.license,
        address: store.address,
        medicines: store
            .medicines
            .into_iter()
            .map(|m| MedicineView {
                name: m.name,
                price: m.price,
            })
            .collect(),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /medical - The inventory dashboard for the owner's store.
#[utoipa::path(
    get,
    path = "/medical",
    responses(
        (status = 200, description = "The store inventory", body = InventoryView),
        (status = 303, description = "No store yet; redirected to /medical/store")
    )
)]
pub async fn medical_dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response, (StatusCode, String)> {
    let store = match store_or_redirect(&state, &session).await {
        Ok(store) => store,
        Err(redirect) => return redirect.map(IntoResponse::into_response),
    };
    Ok(Json(inventory_view(store)).into_response())
}

/// GET /medical/store - View the registered store details.
#[utoipa::path(
    get,
    path = "/medical/store",
    responses(
        (status = 200, description = "The registered store", body = InventoryView),
        (status = 404, description = "No store registered yet")
    )
)]
pub async fn store_view_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = state
        .store
        .get_store_for_owner(&session.username)
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            other => internal("Failed to load store", other),
        })?;
    Ok(Json(inventory_view(store)))
}

/// POST /medical/store - Complete the store details.
///
/// Records `store_info` on the owner's profile and creates the pharmacy
/// record. The two writes hit separate documents and are not atomic.
#[utoipa::path(
    post,
    path = "/medical/store",
    request_body(content = StoreDetailsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Store registered; redirected to /medical"),
        (status = 409, description = "This account already registered a store")
    )
)]
pub async fn store_register_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Form(form): Form<StoreDetailsForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .store
        .get_user(&session.username)
        .await
        .map_err(|e| internal("Failed to load user", e))?;

    let mut profile = user.profile.unwrap_or_default();
    profile.store_info = Some(StoreInfo {
        store_name: form.store_name.clone(),
        license: form.license.clone(),
        address: form.address.clone(),
    });
    state
        .store
        .update_profile(&session.username, profile)
        .await
        .map_err(|e| internal("Failed to update profile", e))?;

    state
        .store
        .create_store(PharmacyStore {
            name: form.store_name,
            owner: session.username.clone(),
            license: form.license,
            address: form.address,
            medicines: Vec::new(),
        })
        .await
        .map_err(|e| match e {
            PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            other => internal("Failed to create store", other),
        })?;

    Ok(Redirect::to("/medical"))
}

/// POST /medical/medicine - Stock a new medicine.
#[utoipa::path(
    post,
    path = "/medical/medicine",
    request_body(content = MedicineForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Medicine stocked"),
        (status = 303, description = "No store yet; redirected to /medical/store"),
        (status = 409, description = "A medicine with that name is already stocked")
    )
)]
pub async fn medicine_add_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Form(form): Form<MedicineForm>,
) -> Result<Response, (StatusCode, String)> {
    if let Err(redirect) = store_or_redirect(&state, &session).await {
        return redirect.map(IntoResponse::into_response);
    }

    state
        .store
        .add_medicine(
            &session.username,
            Medicine {
                name: form.name,
                price: form.price,
            },
        )
        .await
        .map_err(|e| match e {
            PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            other => internal("Failed to add medicine", other),
        })?;

    Ok(StatusCode::CREATED.into_response())
}

/// PUT /medical/medicine - Update the price of a stocked medicine.
#[utoipa::path(
    put,
    path = "/medical/medicine",
    request_body(content = MedicineForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Medicine updated"),
        (status = 404, description = "No medicine with that name")
    )
)]
pub async fn medicine_update_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Form(form): Form<MedicineForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .store
        .update_medicine(
            &session.username,
            Medicine {
                name: form.name,
                price: form.price,
            },
        )
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            other => internal("Failed to update medicine", other),
        })?;

    Ok(StatusCode::OK)
}

/// DELETE /medical/medicine?name=... - Remove a medicine from the inventory.
#[utoipa::path(
    delete,
    path = "/medical/medicine",
    params(("name" = String, Query, description = "Exact medicine name")),
    responses(
        (status = 200, description = "Medicine removed"),
        (status = 404, description = "No medicine with that name")
    )
)]
pub async fn medicine_remove_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Query(query): Query<RemoveMedicineQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .store
        .remove_medicine(&session.username, &query.name)
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            other => internal("Failed to remove medicine", other),
        })?;

    Ok(StatusCode::OK)
}

/// GET /medical/orders - Orders placed against the owner's store.
#[utoipa::path(
    get,
    path = "/medical/orders",
    responses(
        (status = 200, description = "Orders for the store"),
        (status = 303, description = "No store yet; redirected to /medical/store")
    )
)]
pub async fn store_orders_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response, (StatusCode, String)> {
    let store = match store_or_redirect(&state, &session).await {
        Ok(store) => store,
        Err(redirect) => return redirect.map(IntoResponse::into_response),
    };

    let orders: Vec<Order> = state
        .store
        .list_orders_for_store(&store.name)
        .await
        .map_err(|e| internal("Failed to load orders", e))?;

    Ok(Json(orders).into_response())
}
