pub mod ai;
pub mod config;
pub mod curation;
pub mod error;
pub mod feed;
pub mod scheduler;
pub mod snapshot;

pub use config::AppConfig;
pub use curation::CurationPipeline;
pub use error::{Error, Result};
pub use snapshot::{CurationSnapshot, SnapshotStore};
