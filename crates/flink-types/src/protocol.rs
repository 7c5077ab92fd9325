//! Request and response shapes of the Flink job-manager REST API.
//!
//! Field names follow the remote JSON exactly. Status values decode through
//! `From<String>` so an unrecognized or missing value lands on an explicit
//! unset/unknown variant instead of failing the whole response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a job as reported by the job manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Created,
    Running,
    Failing,
    Failed,
    Cancelling,
    Canceled,
    Finished,
    #[default]
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Created => "CREATED",
            JobStatus::Running => "RUNNING",
            JobStatus::Failing => "FAILING",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelling => "CANCELLING",
            JobStatus::Canceled => "CANCELED",
            JobStatus::Finished => "FINISHED",
            JobStatus::Unknown => "",
        }
    }

    /// CREATED or RUNNING.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Created | JobStatus::Running)
    }

    /// FAILED, CANCELED or FINISHED: the job will not change state again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Failed | JobStatus::Canceled | JobStatus::Finished
        )
    }

    pub fn is_transitional(self) -> bool {
        matches!(self, JobStatus::Failing | JobStatus::Cancelling)
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CREATED" => JobStatus::Created,
            "RUNNING" => JobStatus::Running,
            "FAILING" => JobStatus::Failing,
            "FAILED" => JobStatus::Failed,
            "CANCELLING" => JobStatus::Cancelling,
            "CANCELED" => JobStatus::Canceled,
            "FINISHED" => JobStatus::Finished,
            _ => JobStatus::Unknown,
        }
    }
}

impl From<JobStatus> for String {
    fn from(s: JobStatus) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an asynchronous savepoint operation.
///
/// There is no failed member: a failed savepoint shows up as a populated
/// [`FailureCause`] on the operation, next to whatever status the job manager
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SavepointStatus {
    /// No operation started, or a value this model does not know.
    #[default]
    Invalid,
    InProgress,
    Completed,
}

impl SavepointStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SavepointStatus::Invalid => "",
            SavepointStatus::InProgress => "IN_PROGRESS",
            SavepointStatus::Completed => "COMPLETED",
        }
    }
}

impl From<String> for SavepointStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "IN_PROGRESS" => SavepointStatus::InProgress,
            "COMPLETED" => SavepointStatus::Completed,
            _ => SavepointStatus::Invalid,
        }
    }
}

impl From<SavepointStatus> for String {
    fn from(s: SavepointStatus) -> Self {
        s.as_str().to_string()
    }
}

/// State of a single checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckpointStatus {
    InProgress,
    Failed,
    Completed,
    #[default]
    Unknown,
}

impl CheckpointStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointStatus::InProgress => "IN_PROGRESS",
            CheckpointStatus::Failed => "FAILED",
            CheckpointStatus::Completed => "COMPLETED",
            CheckpointStatus::Unknown => "",
        }
    }
}

impl From<String> for CheckpointStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "IN_PROGRESS" => CheckpointStatus::InProgress,
            "FAILED" => CheckpointStatus::Failed,
            "COMPLETED" => CheckpointStatus::Completed,
            _ => CheckpointStatus::Unknown,
        }
    }
}

impl From<CheckpointStatus> for String {
    fn from(s: CheckpointStatus) -> Self {
        s.as_str().to_string()
    }
}

/// Body of `POST /jobs/{jobId}/savepoints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelJobRequest {
    #[serde(rename = "cancel-job")]
    pub cancel_job: bool,
    #[serde(
        rename = "target-directory",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_directory: Option<String>,
}

/// Body of `POST /jars/{jarName}/run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    #[serde(default)]
    pub savepoint_path: String,
    pub parallelism: i32,
    #[serde(default)]
    pub program_args: String,
    #[serde(default)]
    pub entry_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavepointStatusResponse {
    #[serde(rename = "id", default)]
    pub status: SavepointStatus,
}

/// Exception recorded by the job manager when a savepoint operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FailureCause {
    #[serde(default)]
    pub class: String,
    #[serde(rename = "stack-trace", default)]
    pub stack_trace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavepointOperationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        rename = "failure-cause",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub failure_cause: Option<FailureCause>,
}

/// Response of `GET /jobs/{jobId}/savepoints/{triggerId}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavepointResponse {
    #[serde(rename = "status", default)]
    pub savepoint_status: SavepointStatusResponse,
    #[serde(default)]
    pub operation: SavepointOperationResponse,
}

impl SavepointResponse {
    pub fn status(&self) -> SavepointStatus {
        self.savepoint_status.status
    }

    pub fn is_in_progress(&self) -> bool {
        self.status() == SavepointStatus::InProgress
    }

    /// Completed with a location and no recorded failure.
    pub fn is_completed(&self) -> bool {
        self.status() == SavepointStatus::Completed && self.operation.failure_cause.is_none()
    }

    pub fn location(&self) -> Option<&str> {
        self.operation.location.as_deref()
    }

    pub fn failure_cause(&self) -> Option<&FailureCause> {
        self.operation.failure_cause.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelJobResponse {
    #[serde(rename = "request-id")]
    pub trigger_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    #[serde(rename = "jobid", default)]
    pub job_id: String,
}

/// Response of `GET /jobs`; order is the job manager's and is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetJobsResponse {
    #[serde(default)]
    pub jobs: Vec<FlinkJob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfigResponse {
    #[serde(rename = "jid")]
    pub job_id: String,
    #[serde(rename = "execution-config")]
    pub execution_config: JobExecutionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExecutionConfig {
    #[serde(rename = "job-parallelism")]
    pub parallelism: i32,
}

/// One entry of the job listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlinkJob {
    #[serde(rename = "id")]
    pub job_id: String,
    #[serde(default)]
    pub status: JobStatus,
}

/// Response of `GET /overview`. Only used as a liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterOverviewResponse {
    #[serde(rename = "taskmanagers", default)]
    pub task_manager_count: u32,
    #[serde(rename = "slots-available", default)]
    pub slots_available: u32,
}

/// Statistics for one checkpoint or savepoint. Timestamps and durations are
/// milliseconds, sizes are bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointStatistics {
    pub id: u64,
    #[serde(default)]
    pub status: CheckpointStatus,
    pub is_savepoint: bool,
    pub trigger_timestamp: i64,
    pub latest_ack_timestamp: i64,
    pub state_size: i64,
    pub end_to_end_duration: i64,
    pub alignment_buffered: i64,
    pub num_subtasks: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_path: Option<String>,
    #[serde(default)]
    pub discarded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LatestCheckpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<CheckpointStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savepoint: Option<CheckpointStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<CheckpointStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored: Option<CheckpointStatistics>,
}

/// Response of `GET /jobs/{jobId}/checkpoints`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointResponse {
    /// Status name (e.g. `completed`, `failed`) to count.
    #[serde(default)]
    pub counts: BTreeMap<String, i32>,
    #[serde(default)]
    pub latest: LatestCheckpoints,
    #[serde(default)]
    pub history: Vec<CheckpointStatistics>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_status_classification() {
        assert!(JobStatus::Created.is_active());
        assert!(JobStatus::Running.is_active());
        assert!(!JobStatus::Failing.is_active());
        assert!(JobStatus::Failing.is_transitional());
        assert!(JobStatus::Cancelling.is_transitional());
        for s in [JobStatus::Failed, JobStatus::Canceled, JobStatus::Finished] {
            assert!(s.is_terminal());
            assert!(!s.is_active());
        }
        assert!(!JobStatus::Unknown.is_active());
        assert!(!JobStatus::Unknown.is_terminal());
    }

    #[test]
    fn unrecognized_statuses_decode_to_unset_variants() {
        let job: FlinkJob = serde_json::from_value(json!({"id": "a", "status": "RESTARTING"})).unwrap();
        assert_eq!(job.status, JobStatus::Unknown);

        let job: FlinkJob = serde_json::from_value(json!({"id": "a"})).unwrap();
        assert_eq!(job.status, JobStatus::Unknown);

        let sp: SavepointResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(sp.status(), SavepointStatus::Invalid);
        assert!(sp.location().is_none());
        assert!(sp.failure_cause().is_none());

        let sp: SavepointResponse =
            serde_json::from_value(json!({"status": {"id": "SOMETHING_NEW"}})).unwrap();
        assert_eq!(sp.status(), SavepointStatus::Invalid);
    }

    #[test]
    fn cancel_request_omits_missing_target_directory() {
        let req = CancelJobRequest {
            cancel_job: true,
            target_directory: None,
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"cancel-job": true}));

        let req = CancelJobRequest {
            cancel_job: true,
            target_directory: Some("s3://bucket/savepoints".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"cancel-job": true, "target-directory": "s3://bucket/savepoints"})
        );
    }

    #[test]
    fn submit_request_uses_camel_case_names() {
        let req = SubmitJobRequest {
            savepoint_path: "s3://sp/1".to_string(),
            parallelism: 4,
            program_args: "--input x".to_string(),
            entry_class: "com.example.Main".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "savepointPath": "s3://sp/1",
                "parallelism": 4,
                "programArgs": "--input x",
                "entryClass": "com.example.Main"
            })
        );
    }

    #[test]
    fn savepoint_response_with_failure_cause() {
        let wire = json!({
            "status": {"id": "COMPLETED"},
            "operation": {
                "failure-cause": {"class": "java.io.IOException", "stack-trace": "at x"}
            }
        });
        let sp: SavepointResponse = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(sp.status(), SavepointStatus::Completed);
        assert!(!sp.is_completed());
        assert_eq!(sp.failure_cause().unwrap().class, "java.io.IOException");
        assert_eq!(serde_json::to_value(&sp).unwrap(), wire);

        let wire = json!({
            "status": {"id": "COMPLETED"},
            "operation": {"location": "s3://sp/savepoint-1"}
        });
        let sp: SavepointResponse = serde_json::from_value(wire.clone()).unwrap();
        assert!(sp.is_completed());
        assert_eq!(sp.location(), Some("s3://sp/savepoint-1"));
        assert_eq!(serde_json::to_value(&sp).unwrap(), wire);
    }

    #[test]
    fn job_listing_and_config_keep_wire_names() {
        let wire = json!({"jobs": [
            {"id": "j1", "status": "CANCELED"},
            {"id": "j2", "status": "RUNNING"}
        ]});
        let jobs: GetJobsResponse = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(jobs.jobs[0].job_id, "j1");
        assert_eq!(jobs.jobs[1].status, JobStatus::Running);
        assert_eq!(serde_json::to_value(&jobs).unwrap(), wire);

        let wire = json!({"jid": "j2", "execution-config": {"job-parallelism": 8}});
        let cfg: JobConfigResponse = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(cfg.execution_config.parallelism, 8);
        assert_eq!(serde_json::to_value(&cfg).unwrap(), wire);

        let wire = json!({"taskmanagers": 3, "slots-available": 5});
        let overview: ClusterOverviewResponse = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(overview.task_manager_count, 3);
        assert_eq!(serde_json::to_value(&overview).unwrap(), wire);
    }

    #[test]
    fn checkpoint_without_status_decodes_to_unknown() {
        let resp: CheckpointResponse = serde_json::from_value(json!({
            "counts": {"in_progress": 1},
            "latest": {},
            "history": [{
                "id": 9,
                "is_savepoint": true,
                "trigger_timestamp": 1_546_000_100_000_i64,
                "latest_ack_timestamp": 0,
                "state_size": 0,
                "end_to_end_duration": 0,
                "alignment_buffered": 0,
                "num_subtasks": 4
            }]
        }))
        .unwrap();
        assert_eq!(resp.history.len(), 1);
        assert_eq!(resp.history[0].status, CheckpointStatus::Unknown);
        assert!(resp.history[0].is_savepoint);
        assert!(!resp.history[0].discarded);
    }

    #[test]
    fn checkpoint_response_keeps_optional_slots_absent() {
        let completed = json!({
            "id": 7,
            "status": "COMPLETED",
            "is_savepoint": false,
            "trigger_timestamp": 1_546_000_000_000_i64,
            "latest_ack_timestamp": 1_546_000_000_450_i64,
            "state_size": 20480,
            "end_to_end_duration": 450,
            "alignment_buffered": 0,
            "num_subtasks": 4,
            "external_path": "s3://cp/chk-7",
            "discarded": false
        });
        let failed = json!({
            "id": 6,
            "status": "FAILED",
            "is_savepoint": false,
            "trigger_timestamp": 1_545_999_990_000_i64,
            "latest_ack_timestamp": 0,
            "state_size": 0,
            "end_to_end_duration": 10000,
            "alignment_buffered": 0,
            "num_subtasks": 4,
            "failure_timestamp": 1_546_000_000_000_i64,
            "failure_message": "Checkpoint expired before completing.",
            "discarded": true
        });
        let wire = json!({
            "counts": {"completed": 1, "failed": 1, "in_progress": 0, "restored": 0, "total": 2},
            "latest": {"completed": completed, "failed": failed},
            "history": [completed, failed]
        });
        let resp: CheckpointResponse = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(resp.counts["completed"], 1);
        assert!(resp.latest.savepoint.is_none());
        assert!(resp.latest.restored.is_none());
        let failed = resp.latest.failed.as_ref().unwrap();
        assert_eq!(failed.status, CheckpointStatus::Failed);
        assert_eq!(failed.failure_timestamp, Some(1_546_000_000_000));
        assert_eq!(resp.history[0].failure_message, None);
        assert_eq!(serde_json::to_value(&resp).unwrap(), wire);
    }
}
