//! crates/civica_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs mirror the persisted JSON layout but carry no I/O logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role a user account carries. Determines which views and mutations
/// a session may access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Police,
    Medical,
    Admin,
}

impl Role {
    /// The landing page a freshly logged-in session of this role is sent to.
    pub fn landing_path(self) -> &'static str {
        match self {
            Role::User => "/user",
            Role::Police => "/police",
            Role::Medical => "/medical",
            Role::Admin => "/admin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Police => "Police",
            Role::Medical => "Medical",
            Role::Admin => "Admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Role::User),
            "Police" => Ok(Role::Police),
            "Medical" => Ok(Role::Medical),
            "Admin" => Ok(Role::Admin),
            other => Err(format!("'{other}' is not a valid role")),
        }
    }
}

/// A registered account, keyed by username in the persisted user map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub password_hash: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

/// Per-user personal details. A `User`-role account must complete this
/// record before it can reach the dashboard or place an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub gender: String,
    pub date_of_birth: String,
    pub bio: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_info: Option<StoreInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_info: Option<StationInfo>,
}

impl Profile {
    /// A profile counts as complete once the contact fields are filled in.
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.phone.is_empty() && !self.address.is_empty()
    }
}

/// Pharmacy details recorded on a Medical user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub store_name: String,
    pub license: String,
    pub address: String,
}

/// Station details recorded on a Police user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    pub station_name: String,
    pub address: String,
}

/// Lifecycle of a safety complaint. `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Pending,
    Resolved,
}

/// A citizen safety complaint. Carries a generated id so resolution never
/// depends on the complaint's position in the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub user: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
}

/// One inventory item in a pharmacy store. The price is kept as the free-form
/// string the source persisted; lookups are by exact name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    pub price: String,
}

/// A pharmacy record in the secondary store document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacyStore {
    pub name: String,
    pub owner: String,
    pub license: String,
    pub address: String,
    #[serde(default)]
    pub medicines: Vec<Medicine>,
}

/// An order placed by a citizen. Append-only; orders are never mutated
/// or resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub user: String,
    pub medicine: String,
    pub store: String,
    pub placed_at: DateTime<Utc>,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}
