pub mod domain;
pub mod ports;

pub use domain::{
    AuthSession, Complaint, ComplaintStatus, Medicine, Order, PharmacyStore, Profile, Role,
    StationInfo, StoreInfo, User,
};
pub use ports::{PortError, PortResult, StoreService};
