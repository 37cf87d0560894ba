mod service;
pub mod tasks;

pub use service::{SchedulerEvent, SchedulerService};
pub use tasks::{bootstrap_snapshot, refresh_snapshot, BootstrapOutcome};
