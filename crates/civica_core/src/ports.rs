//! crates/civica_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete persistence backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthSession, Complaint, Medicine, Order, PharmacyStore, Profile, Role, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of the backing store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The persistence contract for the whole application state: the user map,
/// complaints, orders and the secondary pharmacy document, plus the auth
/// sessions that gate access to them.
#[async_trait]
pub trait StoreService: Send + Sync {
    // --- User Management ---
    /// Creates a new account. Fails with [`PortError::Conflict`] if the
    /// username is already taken, leaving the store unchanged.
    async fn create_user(&self, username: &str, password_hash: &str, role: Role)
        -> PortResult<()>;

    async fn get_user(&self, username: &str) -> PortResult<User>;

    /// Replaces the user's profile record.
    async fn update_profile(&self, username: &str, profile: Profile) -> PortResult<()>;

    /// All accounts, as `(username, user)` pairs.
    async fn list_users(&self) -> PortResult<Vec<(String, User)>>;

    /// Removes exactly the named account. Immediate and irreversible.
    async fn delete_user(&self, username: &str) -> PortResult<()>;

    // --- Auth ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        username: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<AuthSession>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Complaints ---
    async fn file_complaint(
        &self,
        username: &str,
        text: &str,
        station: Option<String>,
    ) -> PortResult<Complaint>;

    async fn list_complaints(&self) -> PortResult<Vec<Complaint>>;

    async fn list_complaints_for_user(&self, username: &str) -> PortResult<Vec<Complaint>>;

    /// Flips the named complaint from Pending to Resolved. Resolving an
    /// already-Resolved complaint is a no-op. Only the named complaint
    /// changes.
    async fn resolve_complaint(&self, id: Uuid) -> PortResult<Complaint>;

    // --- Pharmacy ---
    /// Records a pharmacy store for its owner. One store per owner.
    async fn create_store(&self, store: PharmacyStore) -> PortResult<()>;

    async fn get_store_for_owner(&self, owner: &str) -> PortResult<PharmacyStore>;

    async fn list_stores(&self) -> PortResult<Vec<PharmacyStore>>;

    async fn add_medicine(&self, owner: &str, medicine: Medicine) -> PortResult<()>;

    async fn update_medicine(&self, owner: &str, medicine: Medicine) -> PortResult<()>;

    async fn remove_medicine(&self, owner: &str, name: &str) -> PortResult<()>;

    /// Every medicine across every store, paired with the store name.
    async fn list_all_medicines(&self) -> PortResult<Vec<(String, Medicine)>>;

    // --- Orders ---
    async fn place_order(&self, username: &str, medicine: &str) -> PortResult<Order>;

    async fn list_orders(&self) -> PortResult<Vec<Order>>;

    async fn list_orders_for_store(&self, store: &str) -> PortResult<Vec<Order>>;
}
