//! Capability traits the reconciliation engine is built on, and their errors.

use crate::{
    CheckpointResponse, ClusterOverviewResponse, Deployment, FlinkApplication, GetJobsResponse,
    JobConfigResponse, Labels, SavepointResponse, Service, SubmitJobRequest, SubmitJobResponse,
};
use async_trait::async_trait;

/// Job-manager REST API. Every call is addressed by the job-manager service
/// name of the cluster it targets.
#[async_trait]
pub trait FlinkApi: Send + Sync {
    /// List jobs in the order the job manager returns them.
    async fn get_jobs(&self, service_name: &str) -> Result<GetJobsResponse, FlinkApiError>;

    /// Execution config of `job_id`, including its current parallelism.
    async fn get_job_config(
        &self,
        service_name: &str,
        job_id: &str,
    ) -> Result<JobConfigResponse, FlinkApiError>;

    /// Run the uploaded `jar_name`.
    async fn submit_job(
        &self,
        service_name: &str,
        jar_name: &str,
        request: &SubmitJobRequest,
    ) -> Result<SubmitJobResponse, FlinkApiError>;

    /// Cancel a job after taking a savepoint; returns the trigger id of the
    /// asynchronous savepoint operation.
    async fn cancel_job_with_savepoint(
        &self,
        service_name: &str,
        job_id: &str,
        target_directory: Option<&str>,
    ) -> Result<String, FlinkApiError>;

    /// Poll the savepoint operation identified by `trigger_id`.
    async fn check_savepoint_status(
        &self,
        service_name: &str,
        job_id: &str,
        trigger_id: &str,
    ) -> Result<SavepointResponse, FlinkApiError>;

    /// Task-manager count and free slots; any success means reachable.
    async fn get_cluster_overview(
        &self,
        service_name: &str,
    ) -> Result<ClusterOverviewResponse, FlinkApiError>;

    /// Checkpoint counts, latest checkpoints and history of `job_id`.
    async fn get_checkpoint_counts(
        &self,
        service_name: &str,
        job_id: &str,
    ) -> Result<CheckpointResponse, FlinkApiError>;
}

/// Container-platform object store (subset of a Kubernetes client).
#[async_trait]
pub trait ClusterStore: Send + Sync {
    async fn get_deployments_with_label(
        &self,
        namespace: &str,
        labels: &Labels,
    ) -> Result<Vec<Deployment>, ClusterStoreError>;

    async fn get_services_with_label(
        &self,
        namespace: &str,
        labels: &Labels,
    ) -> Result<Vec<Service>, ClusterStoreError>;

    /// Create the deployment, or fail with `Conflict` if one with the same
    /// name exists.
    async fn create_deployment(&self, deployment: &Deployment) -> Result<(), ClusterStoreError>;

    /// Create the service, or fail with `Conflict` if one with the same name
    /// exists.
    async fn create_service(&self, service: &Service) -> Result<(), ClusterStoreError>;

    /// Replace an existing deployment; `NotFound` if it does not exist.
    async fn update_deployment(&self, deployment: &Deployment) -> Result<(), ClusterStoreError>;

    /// Delete each deployment; already-missing ones are not an error.
    async fn delete_deployments(&self, deployments: &[Deployment])
        -> Result<(), ClusterStoreError>;

    /// Delete each service; already-missing ones are not an error.
    async fn delete_services(&self, services: &[Service]) -> Result<(), ClusterStoreError>;

    /// True if every pod matching `labels` is running.
    async fn is_all_pods_running(
        &self,
        namespace: &str,
        labels: &Labels,
    ) -> Result<bool, ClusterStoreError>;
}

/// Ensures the job-manager deployable units of an application exist.
#[async_trait]
pub trait JobManagerProvisioner: Send + Sync {
    async fn create_if_not_exist(&self, app: &FlinkApplication) -> Result<(), ProvisionError>;
}

/// Ensures the task-manager deployable units of an application exist.
#[async_trait]
pub trait TaskManagerProvisioner: Send + Sync {
    async fn create_if_not_exist(&self, app: &FlinkApplication) -> Result<(), ProvisionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FlinkApiError {
    #[error("http error: {0}")]
    Http(String),
    #[error("job manager returned {code}: {body}")]
    Status { code: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("flink api error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClusterStoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("object already exists: {0}")]
    Conflict(String),
    #[error("cluster store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("store: {0}")]
    Store(#[from] ClusterStoreError),
    #[error("provision error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("flink api: {0}")]
    Api(#[from] FlinkApiError),
    #[error("cluster: {0}")]
    Cluster(#[from] ClusterStoreError),
    #[error("provision: {0}")]
    Provision(#[from] ProvisionError),
    #[error("no active job found for application {application}")]
    NoActiveJob { application: String },
    #[error("unable to submit job: invalid job id")]
    InvalidJobId,
    #[error("task manager deployment {0} not found")]
    TaskManagerNotFound(String),
    #[error("reconciliation cancelled")]
    Cancelled,
}
