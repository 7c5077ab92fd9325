//! Desired-state description of a Flink application.
//!
//! The engine only reads these values. Status fields are persisted by the
//! caller after it has acted on the engine's results.

use serde::{Deserialize, Serialize};

/// One Flink application: identity, desired spec, and persisted status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlinkApplication {
    pub name: String,
    pub namespace: String,
    pub spec: FlinkApplicationSpec,
    #[serde(default)]
    pub status: FlinkApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlinkApplicationSpec {
    /// Container image of both job and task managers.
    pub image: String,
    pub number_task_managers: i32,
    pub parallelism: i32,
    /// Name of the uploaded job artifact on the job manager.
    pub jar_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_args: Option<String>,
    /// Target directory for savepoints taken on cancel; the cluster default
    /// applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savepoint_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlinkApplicationStatus {
    /// Job id recorded after the last successful submit; empty when unknown.
    #[serde(default)]
    pub active_job_id: String,
    #[serde(default)]
    pub savepoint_info: SavepointInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavepointInfo {
    /// Trigger id of the last cancel-with-savepoint request.
    #[serde(default)]
    pub trigger_id: String,
    /// Savepoint to restore from on the next submit; empty for a fresh start.
    #[serde(default)]
    pub savepoint_location: String,
}

impl FlinkApplication {
    pub fn new(name: &str, namespace: &str, spec: FlinkApplicationSpec) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            spec,
            status: FlinkApplicationStatus::default(),
        }
    }
}
