//! FlinkController: composes the object store, provisioners, and job-manager
//! API into reconciliation decisions.

use crate::FlinkInterface;
use flink_k8s::match_by_label;
use flink_types::*;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// First job whose status is CREATED or RUNNING, in listing order.
pub fn get_active_flink_job(jobs: &[FlinkJob]) -> Option<FlinkJob> {
    let index = jobs.iter().position(|job| job.status.is_active())?;
    Some(jobs[index].clone())
}

/// Job id persisted on the application status, if any.
pub fn persisted_job_id(app: &FlinkApplication) -> Option<&str> {
    Some(app.status.active_job_id.as_str()).filter(|id| !id.is_empty())
}

/// Persisted job id first; otherwise the first active job of `jobs`.
///
/// Assumes one application per Flink cluster.
pub fn resolve_job_id(app: &FlinkApplication, jobs: &[FlinkJob]) -> Option<String> {
    persisted_job_id(app)
        .map(str::to_string)
        .or_else(|| get_active_flink_job(jobs).map(|job| job.job_id))
}

/// Race `fut` against the token; the token wins ties.
async fn guarded<T, E, F>(ctx: &CancellationToken, fut: F) -> Result<T, ControllerError>
where
    F: Future<Output = Result<T, E>>,
    ControllerError: From<E>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ControllerError::Cancelled),
        res = fut => res.map_err(ControllerError::from),
    }
}

/// Reconciliation engine. Holds no state besides its collaborators.
pub struct FlinkController {
    k8s_cluster: Arc<dyn ClusterStore>,
    job_manager: Arc<dyn JobManagerProvisioner>,
    task_manager: Arc<dyn TaskManagerProvisioner>,
    flink_client: Arc<dyn FlinkApi>,
}

impl FlinkController {
    pub fn new(
        k8s_cluster: Arc<dyn ClusterStore>,
        job_manager: Arc<dyn JobManagerProvisioner>,
        task_manager: Arc<dyn TaskManagerProvisioner>,
        flink_client: Arc<dyn FlinkApi>,
    ) -> Self {
        Self {
            k8s_cluster,
            job_manager,
            task_manager,
            flink_client,
        }
    }

    async fn get_deployments_for_app(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<Vec<Deployment>, ControllerError> {
        let labels = app_labels(&app.name);
        guarded(
            ctx,
            self.k8s_cluster
                .get_deployments_with_label(&app.namespace, &labels),
        )
        .await
    }

    /// (current, old) deployments of the application, split on the image label.
    async fn get_current_and_old_deployments(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<(Vec<Deployment>, Vec<Deployment>), ControllerError> {
        let deployments = self.get_deployments_for_app(ctx, app).await?;
        let image = image_labels(&image_key(&app.spec.image));
        Ok(match_by_label(deployments, &image))
    }

    async fn get_old_services(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<Vec<Service>, ControllerError> {
        let labels = app_labels(&app.name);
        let services = guarded(
            ctx,
            self.k8s_cluster
                .get_services_with_label(&app.namespace, &labels),
        )
        .await?;
        let image = image_labels(&image_key(&app.spec.image));
        let (_, old) = match_by_label(services, &image);
        Ok(old)
    }

    /// Task managers off their desired count, or the job off its parallelism.
    async fn is_cluster_update_needed(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError> {
        let (current, _) = self.get_current_and_old_deployments(ctx, app).await?;
        let tm_name = task_manager_name(app);
        let replicas = current
            .iter()
            .find(|d| d.metadata.name == tm_name)
            .map(|d| d.replicas);
        if replicas != Some(app.spec.number_task_managers) {
            tracing::debug!(
                app = %app.name,
                actual = ?replicas,
                desired = app.spec.number_task_managers,
                "task manager count differs"
            );
            return Ok(true);
        }
        self.is_application_parallelism_different(ctx, app).await
    }

    /// [`resolve_job_id`], listing jobs only when no id is persisted.
    async fn get_job_id_for_application(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<String, ControllerError> {
        if let Some(job_id) = persisted_job_id(app) {
            return Ok(job_id.to_string());
        }
        let jobs = self.get_jobs_for_application(ctx, app).await?;
        let job_id = resolve_job_id(app, &jobs).ok_or_else(|| ControllerError::NoActiveJob {
            application: app.name.clone(),
        })?;
        tracing::warn!(
            app = %app.name,
            %job_id,
            "no persisted job id, using active job from cluster"
        );
        Ok(job_id)
    }
}

#[async_trait::async_trait]
impl FlinkInterface for FlinkController {
    async fn create_cluster(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<(), ControllerError> {
        guarded(ctx, self.job_manager.create_if_not_exist(app)).await?;
        guarded(ctx, self.task_manager.create_if_not_exist(app)).await?;
        tracing::info!(app = %app.name, image = %app.spec.image, "cluster ensured");
        Ok(())
    }

    async fn delete_old_cluster(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
        delete_front_end: bool,
    ) -> Result<(), ControllerError> {
        let (_, old_deployments) = self.get_current_and_old_deployments(ctx, app).await?;
        let old_services = if delete_front_end {
            self.get_old_services(ctx, app).await?
        } else {
            Vec::new()
        };
        if !old_deployments.is_empty() {
            tracing::info!(
                app = %app.name,
                count = old_deployments.len(),
                "deleting old deployments"
            );
            guarded(ctx, self.k8s_cluster.delete_deployments(&old_deployments)).await?;
        }
        if !old_services.is_empty() {
            tracing::info!(
                app = %app.name,
                count = old_services.len(),
                "deleting old services"
            );
            guarded(ctx, self.k8s_cluster.delete_services(&old_services)).await?;
        }
        Ok(())
    }

    async fn cancel_with_savepoint(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<String, ControllerError> {
        let service = job_manager_service_name(app);
        let job_id = self.get_job_id_for_application(ctx, app).await?;
        let trigger_id = guarded(
            ctx,
            self.flink_client.cancel_job_with_savepoint(
                &service,
                &job_id,
                app.spec.savepoint_dir.as_deref(),
            ),
        )
        .await?;
        tracing::info!(app = %app.name, %job_id, %trigger_id, "cancel with savepoint triggered");
        Ok(trigger_id)
    }

    async fn start_flink_job(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<String, ControllerError> {
        let service = job_manager_service_name(app);
        let request = SubmitJobRequest {
            savepoint_path: app.status.savepoint_info.savepoint_location.clone(),
            parallelism: app.spec.parallelism,
            program_args: app.spec.program_args.clone().unwrap_or_default(),
            entry_class: app.spec.entry_class.clone().unwrap_or_default(),
        };
        let response = guarded(
            ctx,
            self.flink_client
                .submit_job(&service, &app.spec.jar_name, &request),
        )
        .await?;
        if response.job_id.is_empty() {
            return Err(ControllerError::InvalidJobId);
        }
        tracing::info!(app = %app.name, job_id = %response.job_id, "job submitted");
        Ok(response.job_id)
    }

    async fn get_savepoint_status(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<SavepointResponse, ControllerError> {
        let service = job_manager_service_name(app);
        let job_id = self.get_job_id_for_application(ctx, app).await?;
        guarded(
            ctx,
            self.flink_client.check_savepoint_status(
                &service,
                &job_id,
                &app.status.savepoint_info.trigger_id,
            ),
        )
        .await
    }

    async fn is_cluster_ready(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError> {
        let labels = application_labels(app);
        guarded(
            ctx,
            self.k8s_cluster.is_all_pods_running(&app.namespace, &labels),
        )
        .await
    }

    async fn is_service_ready(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError> {
        let service = job_manager_service_name(app);
        guarded(ctx, self.flink_client.get_cluster_overview(&service)).await?;
        Ok(true)
    }

    async fn has_application_changed(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError> {
        if self.is_cluster_change_needed(ctx, app).await? {
            return Ok(true);
        }
        self.is_cluster_update_needed(ctx, app).await
    }

    async fn is_cluster_change_needed(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError> {
        let (current, _) = self.get_current_and_old_deployments(ctx, app).await?;
        Ok(current.is_empty())
    }

    async fn check_and_update_task_manager(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError> {
        let (current, _) = self.get_current_and_old_deployments(ctx, app).await?;
        let tm_name = task_manager_name(app);
        let mut task_manager = current
            .into_iter()
            .find(|d| d.metadata.name == tm_name)
            .ok_or(ControllerError::TaskManagerNotFound(tm_name))?;
        if task_manager.replicas == app.spec.number_task_managers {
            return Ok(false);
        }
        tracing::info!(
            app = %app.name,
            from = task_manager.replicas,
            to = app.spec.number_task_managers,
            "scaling task managers"
        );
        task_manager.replicas = app.spec.number_task_managers;
        guarded(ctx, self.k8s_cluster.update_deployment(&task_manager)).await?;
        Ok(true)
    }

    async fn is_application_parallelism_different(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError> {
        let service = job_manager_service_name(app);
        let job_id = self.get_job_id_for_application(ctx, app).await?;
        let config = guarded(ctx, self.flink_client.get_job_config(&service, &job_id)).await?;
        Ok(config.execution_config.parallelism != app.spec.parallelism)
    }

    async fn is_multiple_cluster_present(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<bool, ControllerError> {
        let (current, old) = self.get_current_and_old_deployments(ctx, app).await?;
        Ok(!current.is_empty() && !old.is_empty())
    }

    async fn get_jobs_for_application(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<Vec<FlinkJob>, ControllerError> {
        let service = job_manager_service_name(app);
        let response = guarded(ctx, self.flink_client.get_jobs(&service)).await?;
        Ok(response.jobs)
    }

    async fn get_checkpoint_summary(
        &self,
        ctx: &CancellationToken,
        app: &FlinkApplication,
    ) -> Result<CheckpointResponse, ControllerError> {
        let service = job_manager_service_name(app);
        let job_id = self.get_job_id_for_application(ctx, app).await?;
        guarded(
            ctx,
            self.flink_client.get_checkpoint_counts(&service, &job_id),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, status: JobStatus) -> FlinkJob {
        FlinkJob {
            job_id: id.to_string(),
            status,
        }
    }

    #[test]
    fn active_job_is_first_created_or_running() {
        assert_eq!(get_active_flink_job(&[]), None);
        assert_eq!(
            get_active_flink_job(&[job("1", JobStatus::Running)]),
            Some(job("1", JobStatus::Running))
        );
        assert_eq!(get_active_flink_job(&[job("1", JobStatus::Finished)]), None);

        let jobs = vec![
            job("a", JobStatus::Canceled),
            job("b", JobStatus::Failing),
            job("c", JobStatus::Created),
            job("d", JobStatus::Running),
        ];
        assert_eq!(get_active_flink_job(&jobs).unwrap().job_id, "c");
    }

    #[test]
    fn job_id_prefers_persisted_then_active() {
        let mut app = FlinkApplication::default();
        let jobs = vec![job("x", JobStatus::Canceled), job("y", JobStatus::Running)];
        assert_eq!(persisted_job_id(&app), None);
        assert_eq!(resolve_job_id(&app, &jobs).as_deref(), Some("y"));
        assert_eq!(resolve_job_id(&app, &jobs[..1]), None);

        app.status.active_job_id = "J1".to_string();
        assert_eq!(persisted_job_id(&app), Some("J1"));
        assert_eq!(resolve_job_id(&app, &jobs).as_deref(), Some("J1"));
        assert_eq!(resolve_job_id(&app, &[]).as_deref(), Some("J1"));
    }

    #[tokio::test]
    async fn guarded_reports_cancellation() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let res: Result<(), ControllerError> =
            guarded(&ctx, std::future::pending::<Result<(), FlinkApiError>>()).await;
        assert!(matches!(res, Err(ControllerError::Cancelled)));

        let live = CancellationToken::new();
        let res = guarded(&live, async { Err::<(), _>(FlinkApiError::Other("boom".into())) }).await;
        assert!(matches!(res, Err(ControllerError::Api(FlinkApiError::Other(_)))));
    }
}
