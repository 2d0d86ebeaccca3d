pub mod json_store;
pub mod stations;
pub mod uploads;

pub use json_store::JsonStoreAdapter;
pub use uploads::UploadStore;
