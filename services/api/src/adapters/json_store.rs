//! services/api/src/adapters/json_store.rs
//!
//! This module contains the file-backed store adapter, the concrete
//! implementation of the `StoreService` port from the `core` crate. All
//! application state lives in two flat JSON documents: the main document
//! (users, complaints, medicines, orders) and the pharmacy document (stores).
//!
//! Every mutation is a full load, in-memory edit, full save. A single async
//! mutex serializes those cycles so overlapping requests cannot lose updates,
//! and saves go through a temp file plus rename so a crash mid-write cannot
//! truncate the document.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civica_core::domain::{
    AuthSession, Complaint, ComplaintStatus, Medicine, Order, PharmacyStore, Profile, Role, User,
};
use civica_core::ports::{PortError, PortResult, StoreService};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

//=========================================================================================
// Persisted Document Shapes
//=========================================================================================

/// The main persisted document. Matches the source layout exactly: a username
/// map plus three ordered lists.
#[derive(Debug, Default, Serialize, Deserialize)]
struct MainDocument {
    #[serde(default)]
    users: BTreeMap<String, User>,
    #[serde(default)]
    complaints: Vec<Complaint>,
    #[serde(default)]
    medicines: Vec<Medicine>,
    #[serde(default)]
    orders: Vec<Order>,
}

/// The secondary pharmacy document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PharmacyDocument {
    #[serde(default)]
    stores: Vec<PharmacyStore>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed store adapter that implements the `StoreService` port.
pub struct JsonStoreAdapter {
    data_path: PathBuf,
    pharmacy_path: PathBuf,
    /// Serializes every load-edit-save cycle across both documents.
    doc_lock: Mutex<()>,
    /// Auth sessions are not part of the persisted layout; they live here.
    sessions: Mutex<HashMap<String, AuthSession>>,
}

impl JsonStoreAdapter {
    /// Creates a new `JsonStoreAdapter` over the two document paths.
    pub fn new(data_path: impl Into<PathBuf>, pharmacy_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            pharmacy_path: pharmacy_path.into(),
            doc_lock: Mutex::new(()),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn load_main(&self) -> PortResult<MainDocument> {
        load_document(&self.data_path).await
    }

    async fn save_main(&self, doc: &MainDocument) -> PortResult<()> {
        save_document(&self.data_path, doc).await
    }

    async fn load_pharmacy(&self) -> PortResult<PharmacyDocument> {
        load_document(&self.pharmacy_path).await
    }

    async fn save_pharmacy(&self, doc: &PharmacyDocument) -> PortResult<()> {
        save_document(&self.pharmacy_path, doc).await
    }
}

/// Loads a document, initializing the backing file with an empty skeleton on
/// first access. A present-but-corrupt file is an unrecoverable error.
async fn load_document<D: Default + Serialize + for<'de> Deserialize<'de>>(
    path: &Path,
) -> PortResult<D> {
    if tokio::fs::try_exists(path)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?
    {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PortError::Unexpected(format!("failed to parse {}: {e}", path.display())))
    } else {
        let skeleton = D::default();
        save_document(path, &skeleton).await?;
        Ok(skeleton)
    }
}

/// Writes the document to a sibling temp file, then renames it into place.
async fn save_document<D: Serialize>(path: &Path, doc: &D) -> PortResult<()> {
    let json = serde_json::to_vec_pretty(doc).map_err(|e| PortError::Unexpected(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| PortError::Unexpected(format!("failed to write {}: {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| PortError::Unexpected(format!("failed to replace {}: {e}", path.display())))
}

//=========================================================================================
// `StoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoreService for JsonStoreAdapter {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> PortResult<()> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_main().await?;
        if doc.users.contains_key(username) {
            return Err(PortError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }
        doc.users.insert(
            username.to_string(),
            User {
                password_hash: password_hash.to_string(),
                role,
                profile: None,
            },
        );
        self.save_main(&doc).await
    }

    async fn get_user(&self, username: &str) -> PortResult<User> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_main().await?;
        doc.users
            .get(username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User '{username}' not found")))
    }

    async fn update_profile(&self, username: &str, profile: Profile) -> PortResult<()> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_main().await?;
        let user = doc
            .users
            .get_mut(username)
            .ok_or_else(|| PortError::NotFound(format!("User '{username}' not found")))?;
        user.profile = Some(profile);
        self.save_main(&doc).await
    }

    async fn list_users(&self) -> PortResult<Vec<(String, User)>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_main().await?;
        Ok(doc.users.into_iter().collect())
    }

    async fn delete_user(&self, username: &str) -> PortResult<()> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_main().await?;
        if doc.users.remove(username).is_none() {
            return Err(PortError::NotFound(format!("User '{username}' not found")));
        }
        self.save_main(&doc).await
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        username: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                username: username.to_string(),
                role,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<AuthSession> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.clone()),
            Some(_) => {
                // Expired sessions are dropped on sight.
                sessions.remove(session_id);
                Err(PortError::Unauthorized)
            }
            None => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn file_complaint(
        &self,
        username: &str,
        text: &str,
        station: Option<String>,
    ) -> PortResult<Complaint> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_main().await?;
        let complaint = Complaint {
            id: Uuid::new_v4(),
            user: username.to_string(),
            text: text.to_string(),
            station,
            status: ComplaintStatus::Pending,
            created_at: Utc::now(),
        };
        doc.complaints.push(complaint.clone());
        self.save_main(&doc).await?;
        Ok(complaint)
    }

    async fn list_complaints(&self) -> PortResult<Vec<Complaint>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_main().await?;
        Ok(doc.complaints)
    }

    async fn list_complaints_for_user(&self, username: &str) -> PortResult<Vec<Complaint>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_main().await?;
        Ok(doc
            .complaints
            .into_iter()
            .filter(|c| c.user == username)
            .collect())
    }

    async fn resolve_complaint(&self, id: Uuid) -> PortResult<Complaint> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_main().await?;
        let complaint = doc
            .complaints
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Complaint {id} not found")))?;
        if complaint.status == ComplaintStatus::Resolved {
            // Resolved is terminal; resolving again is a no-op.
            return Ok(complaint.clone());
        }
        complaint.status = ComplaintStatus::Resolved;
        let resolved = complaint.clone();
        self.save_main(&doc).await?;
        Ok(resolved)
    }

    async fn create_store(&self, store: PharmacyStore) -> PortResult<()> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_pharmacy().await?;
        if doc.stores.iter().any(|s| s.owner == store.owner) {
            return Err(PortError::Conflict(format!(
                "'{}' already has a registered store",
                store.owner
            )));
        }
        doc.stores.push(store);
        self.save_pharmacy(&doc).await
    }

    async fn get_store_for_owner(&self, owner: &str) -> PortResult<PharmacyStore> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_pharmacy().await?;
        doc.stores
            .into_iter()
            .find(|s| s.owner == owner)
            .ok_or_else(|| PortError::NotFound(format!("No store registered for '{owner}'")))
    }

    async fn list_stores(&self) -> PortResult<Vec<PharmacyStore>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_pharmacy().await?;
        Ok(doc.stores)
    }

    async fn add_medicine(&self, owner: &str, medicine: Medicine) -> PortResult<()> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_pharmacy().await?;
        let store = store_for_owner_mut(&mut doc, owner)?;
        // Exact-name lookups mean a duplicate name would shadow the
        // original, so reject it up front.
        if store.medicines.iter().any(|m| m.name == medicine.name) {
            return Err(PortError::Conflict(format!(
                "Medicine '{}' is already stocked",
                medicine.name
            )));
        }
        store.medicines.push(medicine);
        self.save_pharmacy(&doc).await
    }

    async fn update_medicine(&self, owner: &str, medicine: Medicine) -> PortResult<()> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_pharmacy().await?;
        let store = store_for_owner_mut(&mut doc, owner)?;
        let existing = store
            .medicines
            .iter_mut()
            .find(|m| m.name == medicine.name)
            .ok_or_else(|| {
                PortError::NotFound(format!("Medicine '{}' is not stocked", medicine.name))
            })?;
        existing.price = medicine.price;
        self.save_pharmacy(&doc).await
    }

    async fn remove_medicine(&self, owner: &str, name: &str) -> PortResult<()> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.load_pharmacy().await?;
        let store = store_for_owner_mut(&mut doc, owner)?;
        let before = store.medicines.len();
        store.medicines.retain(|m| m.name != name);
        if store.medicines.len() == before {
            return Err(PortError::NotFound(format!(
                "Medicine '{name}' is not stocked"
            )));
        }
        self.save_pharmacy(&doc).await
    }

    async fn list_all_medicines(&self) -> PortResult<Vec<(String, Medicine)>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_pharmacy().await?;
        Ok(doc
            .stores
            .into_iter()
            .flat_map(|s| {
                let store_name = s.name;
                s.medicines
                    .into_iter()
                    .map(move |m| (store_name.clone(), m))
            })
            .collect())
    }

    async fn place_order(&self, username: &str, medicine: &str) -> PortResult<Order> {
        let _guard = self.doc_lock.lock().await;
        let pharmacy = self.load_pharmacy().await?;
        let store_name = pharmacy
            .stores
            .iter()
            .find(|s| s.medicines.iter().any(|m| m.name == medicine))
            .map(|s| s.name.clone())
            .ok_or_else(|| {
                PortError::NotFound(format!("Medicine '{medicine}' is not available"))
            })?;

        let mut doc = self.load_main().await?;
        let order = Order {
            user: username.to_string(),
            medicine: medicine.to_string(),
            store: store_name,
            placed_at: Utc::now(),
        };
        doc.orders.push(order.clone());
        self.save_main(&doc).await?;
        Ok(order)
    }

    async fn list_orders(&self) -> PortResult<Vec<Order>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_main().await?;
        Ok(doc.orders)
    }

    async fn list_orders_for_store(&self, store: &str) -> PortResult<Vec<Order>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.load_main().await?;
        Ok(doc
            .orders
            .into_iter()
            .filter(|o| o.store == store)
            .collect())
    }
}

fn store_for_owner_mut<'a>(
    doc: &'a mut PharmacyDocument,
    owner: &str,
) -> PortResult<&'a mut PharmacyStore> {
    doc.stores
        .iter_mut()
        .find(|s| s.owner == owner)
        .ok_or_else(|| PortError::NotFound(format!("No store registered for '{owner}'")))
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Builds an adapter over fresh, uniquely named files in the system
    /// temp directory.
    fn fresh_adapter() -> JsonStoreAdapter {
        let dir = std::env::temp_dir();
        let tag = Uuid::new_v4();
        JsonStoreAdapter::new(
            dir.join(format!("civica-main-{tag}.json")),
            dir.join(format!("civica-pharmacy-{tag}.json")),
        )
    }

    fn sample_store(owner: &str) -> PharmacyStore {
        PharmacyStore {
            name: format!("{owner} pharmacy"),
            owner: owner.to_string(),
            license: "LIC-001".to_string(),
            address: "12 High Street".to_string(),
            medicines: vec![Medicine {
                name: "Paracetamol".to_string(),
                price: "25".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn missing_file_is_initialized_to_empty_skeleton() {
        let store = fresh_adapter();
        assert!(store.list_users().await.unwrap().is_empty());
        assert!(store.list_complaints().await.unwrap().is_empty());
        assert!(store.list_orders().await.unwrap().is_empty());
        // The skeleton must now exist on disk.
        assert!(store.data_path.exists());
    }

    #[tokio::test]
    async fn duplicate_signup_leaves_store_unchanged() {
        let store = fresh_adapter();
        store.create_user("asha", "hash-1", Role::User).await.unwrap();

        let err = store
            .create_user("asha", "hash-2", Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let user = store.get_user("asha").await.unwrap();
        assert_eq!(user.password_hash, "hash-1");
        assert_eq!(user.role, Role::User);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolve_changes_only_the_named_complaint() {
        let store = fresh_adapter();
        store.create_user("asha", "h", Role::User).await.unwrap();
        let first = store.file_complaint("asha", "streetlight out", None).await.unwrap();
        let second = store
            .file_complaint("asha", "harassment near market", Some("Central".to_string()))
            .await
            .unwrap();

        let resolved = store.resolve_complaint(second.id).await.unwrap();
        assert_eq!(resolved.status, ComplaintStatus::Resolved);

        let all = store.list_complaints().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[0].status, ComplaintStatus::Pending);
        assert_eq!(all[1].status, ComplaintStatus::Resolved);
        assert_eq!(all[1].text, "harassment near market");
    }

    #[tokio::test]
    async fn resolving_twice_is_a_noop() {
        let store = fresh_adapter();
        let c = store.file_complaint("asha", "noise", None).await.unwrap();
        store.resolve_complaint(c.id).await.unwrap();
        let again = store.resolve_complaint(c.id).await.unwrap();
        assert_eq!(again.status, ComplaintStatus::Resolved);
    }

    #[tokio::test]
    async fn resolving_unknown_complaint_is_not_found() {
        let store = fresh_adapter();
        let err = store.resolve_complaint(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_user_removes_exactly_that_key() {
        let store = fresh_adapter();
        store.create_user("asha", "h1", Role::User).await.unwrap();
        store.create_user("ravi", "h2", Role::Police).await.unwrap();

        store.delete_user("asha").await.unwrap();

        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].0, "ravi");

        let err = store.delete_user("asha").await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn save_then_load_round_trips_all_fields() {
        let store = fresh_adapter();
        store.create_user("asha", "hash", Role::User).await.unwrap();
        store
            .update_profile(
                "asha",
                Profile {
                    email: "asha@example.com".to_string(),
                    phone: "555-0100".to_string(),
                    national_id: "AB-1234".to_string(),
                    gender: "female".to_string(),
                    date_of_birth: "1990-04-12".to_string(),
                    bio: "volunteer".to_string(),
                    interests: vec!["first-aid".to_string()],
                    photo: Some("asha.png".to_string()),
                    address: "4 Park Lane".to_string(),
                    store_info: None,
                    station_info: None,
                },
            )
            .await
            .unwrap();
        store.file_complaint("asha", "pothole", Some("Central".to_string())).await.unwrap();
        store.create_store(sample_store("meera")).await.unwrap();
        store.place_order("asha", "Paracetamol").await.unwrap();

        // A second adapter over the same files sees identical content.
        let reloaded = JsonStoreAdapter::new(store.data_path.clone(), store.pharmacy_path.clone());
        let user = reloaded.get_user("asha").await.unwrap();
        let profile = user.profile.unwrap();
        assert_eq!(profile.email, "asha@example.com");
        assert_eq!(profile.interests, vec!["first-aid".to_string()]);
        assert_eq!(profile.photo.as_deref(), Some("asha.png"));

        let complaints = reloaded.list_complaints().await.unwrap();
        assert_eq!(complaints[0].station.as_deref(), Some("Central"));

        let orders = reloaded.list_orders().await.unwrap();
        assert_eq!(orders[0].medicine, "Paracetamol");
        assert_eq!(orders[0].store, "meera pharmacy");

        let stores = reloaded.list_stores().await.unwrap();
        assert_eq!(stores[0].license, "LIC-001");
        assert_eq!(stores[0].medicines.len(), 1);
    }

    #[tokio::test]
    async fn medicine_lifecycle_within_one_store() {
        let store = fresh_adapter();
        store.create_store(sample_store("meera")).await.unwrap();

        let dup = store
            .add_medicine(
                "meera",
                Medicine { name: "Paracetamol".to_string(), price: "30".to_string() },
            )
            .await
            .unwrap_err();
        assert!(matches!(dup, PortError::Conflict(_)));

        store
            .add_medicine(
                "meera",
                Medicine { name: "Ibuprofen".to_string(), price: "40".to_string() },
            )
            .await
            .unwrap();
        store
            .update_medicine(
                "meera",
                Medicine { name: "Ibuprofen".to_string(), price: "45".to_string() },
            )
            .await
            .unwrap();
        store.remove_medicine("meera", "Paracetamol").await.unwrap();

        let all = store.list_all_medicines().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1.name, "Ibuprofen");
        assert_eq!(all[0].1.price, "45");
    }

    #[tokio::test]
    async fn one_store_per_owner() {
        let store = fresh_adapter();
        store.create_store(sample_store("meera")).await.unwrap();
        let err = store.create_store(sample_store("meera")).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn ordering_an_unknown_medicine_fails() {
        let store = fresh_adapter();
        let err = store.place_order("asha", "Nonexistol").await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_sessions_fail_validation() {
        let store = fresh_adapter();
        store
            .create_auth_session("sid-live", "asha", Role::User, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .create_auth_session("sid-dead", "asha", Role::User, Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        let session = store.validate_auth_session("sid-live").await.unwrap();
        assert_eq!(session.username, "asha");
        assert_eq!(session.role, Role::User);

        let err = store.validate_auth_session("sid-dead").await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized));

        store.delete_auth_session("sid-live").await.unwrap();
        assert!(store.validate_auth_session("sid-live").await.is_err());
    }
}
