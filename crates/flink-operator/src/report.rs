//! Point-in-time status of an application's job manager.

use flink_controller::resolve_job_id;
use flink_types::{
    job_manager_service_name, FlinkApi, FlinkApiError, FlinkApplication, FlinkJob,
    SavepointResponse,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub application: String,
    pub service: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_managers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_available: Option<u32>,
    pub jobs: Vec<FlinkJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub desired_parallelism: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savepoint: Option<SavepointResponse>,
    pub checkpoint_counts: BTreeMap<String, i32>,
}

/// Query the job manager of `app`. An unreachable job manager is reported,
/// not returned as an error; failures after the first contact are.
pub async fn build_report(
    api: &dyn FlinkApi,
    app: &FlinkApplication,
) -> Result<StatusReport, FlinkApiError> {
    let service = job_manager_service_name(app);
    let mut report = StatusReport {
        application: app.name.clone(),
        service: service.clone(),
        desired_parallelism: app.spec.parallelism,
        ..Default::default()
    };

    let overview = match api.get_cluster_overview(&service).await {
        Ok(o) => o,
        Err(e) => {
            tracing::warn!(%service, error = %e, "job manager unreachable");
            return Ok(report);
        }
    };
    report.reachable = true;
    report.task_managers = Some(overview.task_manager_count);
    report.slots_available = Some(overview.slots_available);
    report.jobs = api.get_jobs(&service).await?.jobs;

    let Some(job_id) = resolve_job_id(app, &report.jobs) else {
        return Ok(report);
    };

    let config = api.get_job_config(&service, &job_id).await?;
    report.parallelism = Some(config.execution_config.parallelism);
    report.checkpoint_counts = api.get_checkpoint_counts(&service, &job_id).await?.counts;
    let trigger_id = &app.status.savepoint_info.trigger_id;
    if !trigger_id.is_empty() {
        report.savepoint = Some(
            api.check_savepoint_status(&service, &job_id, trigger_id)
                .await?,
        );
    }
    report.job_id = Some(job_id);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flink_client::MockFlinkApi;
    use flink_types::{ClusterOverviewResponse, FlinkApplicationSpec, JobStatus};

    fn app() -> FlinkApplication {
        FlinkApplication::new(
            "wordcount",
            "flink",
            FlinkApplicationSpec {
                image: "registry/wordcount:v1".to_string(),
                number_task_managers: 2,
                parallelism: 4,
                jar_name: "wordcount.jar".to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn unreachable_job_manager_is_reported() {
        let api = MockFlinkApi::new();
        let report = build_report(&api, &app()).await.unwrap();
        assert!(!report.reachable);
        assert!(report.jobs.is_empty());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn reports_active_job_details() {
        let api = MockFlinkApi::new()
            .with_overview(ClusterOverviewResponse {
                task_manager_count: 2,
                slots_available: 1,
            })
            .with_jobs(vec![FlinkJob {
                job_id: "J1".to_string(),
                status: JobStatus::Running,
            }])
            .with_job_parallelism("J1", 3);
        let report = build_report(&api, &app()).await.unwrap();
        assert!(report.reachable);
        assert_eq!(report.task_managers, Some(2));
        assert_eq!(report.job_id.as_deref(), Some("J1"));
        assert_eq!(report.parallelism, Some(3));
        assert_eq!(report.desired_parallelism, 4);
        assert!(report.savepoint.is_none());
    }
}
