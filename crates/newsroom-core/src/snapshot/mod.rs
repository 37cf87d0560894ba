mod models;
mod store;

pub use models::CurationSnapshot;
pub use store::{load_snapshot, persist_snapshot, SnapshotStore};
