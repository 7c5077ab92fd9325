//! Reconciliation engine for Flink applications on the container platform.

mod controller;
mod interface;

pub use controller::{get_active_flink_job, persisted_job_id, resolve_job_id, FlinkController};
pub use flink_types::ControllerError;
pub use interface::FlinkInterface;
pub use tokio_util::sync::CancellationToken;
