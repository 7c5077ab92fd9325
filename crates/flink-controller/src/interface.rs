//! Operations the outer reconcile loop drives a Flink application with.

use async_trait::async_trait;
use flink_types::{CheckpointResponse, ControllerError, FlinkApplication, FlinkJob, SavepointResponse};
use tokio_util::sync::CancellationToken;

/// Manage a Flink application running on the container platform.
///
/// Every call takes the cancellation token of the current reconciliation; a
/// cancelled token fails the in-flight external call with
/// [`ControllerError::Cancelled`]. Nothing already applied is rolled back.
/// Calls for the same application must not run concurrently.
#[async_trait]
pub trait FlinkInterface: Send + Sync {
    /// Create job manager, task managers, and the UI service, in that order.
    async fn create_cluster(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<(), ControllerError>;

    /// Delete deployments that do not match the application's image, plus
    /// their services if `delete_front_end` is set.
    async fn delete_old_cluster(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
        delete_front_end: bool,
    ) -> Result<(), ControllerError>;

    /// Cancel the active job after taking a savepoint; returns the trigger id.
    async fn cancel_with_savepoint(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<String, ControllerError>;

    /// Submit the application's job; returns the new job id.
    async fn start_flink_job(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<String, ControllerError>;

    /// Savepoint creation is asynchronous. Polls it with the persisted trigger id.
    async fn get_savepoint_status(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<SavepointResponse, ControllerError>;

    /// All pods of the current generation are running.
    async fn is_cluster_ready(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError>;

    /// The job manager answers API requests.
    async fn is_service_ready(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError>;

    /// The desired application no longer matches the running cluster.
    async fn has_application_changed(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError>;

    /// A new cluster is needed: nothing runs the application's image yet.
    async fn is_cluster_change_needed(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError>;

    /// Scale task managers to the desired count; true if a patch was issued.
    async fn check_and_update_task_manager(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError>;

    async fn is_application_parallelism_different(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError>;

    /// Current and stale generations exist side by side.
    async fn is_multiple_cluster_present(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError>;

    async fn get_jobs_for_application(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<Vec<FlinkJob>, ControllerError>;

    /// Checkpoint counts, latest checkpoints, and history of the active job.
    async fn get_checkpoint_summary(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<CheckpointResponse, ControllerError>;
}
