//! Scripted job-manager API for tests: no network, records every call.

use flink_types::{
    CheckpointResponse, ClusterOverviewResponse, FlinkApi, FlinkApiError, FlinkJob,
    GetJobsResponse, JobConfigResponse, JobExecutionConfig, SavepointResponse, SubmitJobRequest,
    SubmitJobResponse,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct MockState {
    jobs: Vec<FlinkJob>,
    parallelism: HashMap<String, i32>,
    submitted_job_id: String,
    trigger_id: String,
    savepoint: SavepointResponse,
    overview: Option<ClusterOverviewResponse>,
    checkpoints: CheckpointResponse,
    failure: Option<String>,
    hang: bool,
    calls: Vec<String>,
    submissions: Vec<SubmitJobRequest>,
}

/// Mock job manager. Responses are set up front with the `with_*` builders.
pub struct MockFlinkApi {
    state: Mutex<MockState>,
}

impl MockFlinkApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_jobs(self, jobs: Vec<FlinkJob>) -> Self {
        self.update(|s| s.jobs = jobs);
        self
    }

    pub fn with_job_parallelism(self, job_id: &str, parallelism: i32) -> Self {
        self.update(|s| {
            s.parallelism.insert(job_id.to_string(), parallelism);
        });
        self
    }

    /// Job id returned by `submit_job`; may be empty.
    pub fn with_submitted_job_id(self, job_id: &str) -> Self {
        self.update(|s| s.submitted_job_id = job_id.to_string());
        self
    }

    pub fn with_trigger_id(self, trigger_id: &str) -> Self {
        self.update(|s| s.trigger_id = trigger_id.to_string());
        self
    }

    pub fn with_savepoint(self, savepoint: SavepointResponse) -> Self {
        self.update(|s| s.savepoint = savepoint);
        self
    }

    pub fn with_overview(self, overview: ClusterOverviewResponse) -> Self {
        self.update(|s| s.overview = Some(overview));
        self
    }

    pub fn with_checkpoints(self, checkpoints: CheckpointResponse) -> Self {
        self.update(|s| s.checkpoints = checkpoints);
        self
    }

    /// Every call fails with `FlinkApiError::Other(message)`.
    pub fn failing(self, message: &str) -> Self {
        self.update(|s| s.failure = Some(message.to_string()));
        self
    }

    /// Every call stays pending forever.
    pub fn hanging(self) -> Self {
        self.update(|s| s.hang = true);
        self
    }

    /// Calls received so far, as `"<operation> <service> [args..]"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn submissions(&self) -> Vec<SubmitJobRequest> {
        self.lock().submissions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.lock());
    }

    async fn record(&self, call: String) -> Result<(), FlinkApiError> {
        let (hang, failure) = {
            let mut s = self.lock();
            s.calls.push(call);
            (s.hang, s.failure.clone())
        };
        if hang {
            std::future::pending::<()>().await;
        }
        match failure {
            Some(msg) => Err(FlinkApiError::Other(msg)),
            None => Ok(()),
        }
    }
}

impl Default for MockFlinkApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FlinkApi for MockFlinkApi {
    async fn get_jobs(&self, service_name: &str) -> Result<GetJobsResponse, FlinkApiError> {
        self.record(format!("get_jobs {}", service_name)).await?;
        Ok(GetJobsResponse {
            jobs: self.lock().jobs.clone(),
        })
    }

    async fn get_job_config(
        &self,
        service_name: &str,
        job_id: &str,
    ) -> Result<JobConfigResponse, FlinkApiError> {
        self.record(format!("get_job_config {} {}", service_name, job_id))
            .await?;
        let parallelism = self.lock().parallelism.get(job_id).copied();
        let parallelism = parallelism.ok_or_else(|| FlinkApiError::Status {
            code: 404,
            body: format!("job {} not found", job_id),
        })?;
        Ok(JobConfigResponse {
            job_id: job_id.to_string(),
            execution_config: JobExecutionConfig { parallelism },
        })
    }

    async fn submit_job(
        &self,
        service_name: &str,
        jar_name: &str,
        request: &SubmitJobRequest,
    ) -> Result<SubmitJobResponse, FlinkApiError> {
        self.record(format!("submit_job {} {}", service_name, jar_name))
            .await?;
        let mut s = self.lock();
        s.submissions.push(request.clone());
        Ok(SubmitJobResponse {
            job_id: s.submitted_job_id.clone(),
        })
    }

    async fn cancel_job_with_savepoint(
        &self,
        service_name: &str,
        job_id: &str,
        target_directory: Option<&str>,
    ) -> Result<String, FlinkApiError> {
        self.record(format!(
            "cancel_job_with_savepoint {} {} {}",
            service_name,
            job_id,
            target_directory.unwrap_or("-")
        ))
        .await?;
        Ok(self.lock().trigger_id.clone())
    }

    async fn check_savepoint_status(
        &self,
        service_name: &str,
        job_id: &str,
        trigger_id: &str,
    ) -> Result<SavepointResponse, FlinkApiError> {
        self.record(format!(
            "check_savepoint_status {} {} {}",
            service_name, job_id, trigger_id
        ))
        .await?;
        Ok(self.lock().savepoint.clone())
    }

    async fn get_cluster_overview(
        &self,
        service_name: &str,
    ) -> Result<ClusterOverviewResponse, FlinkApiError> {
        self.record(format!("get_cluster_overview {}", service_name))
            .await?;
        self.lock()
            .overview
            .clone()
            .ok_or_else(|| FlinkApiError::Http("connection refused".to_string()))
    }

    async fn get_checkpoint_counts(
        &self,
        service_name: &str,
        job_id: &str,
    ) -> Result<CheckpointResponse, FlinkApiError> {
        self.record(format!("get_checkpoint_counts {} {}", service_name, job_id))
            .await?;
        Ok(self.lock().checkpoints.clone())
    }
}
