//! Job-manager and task-manager provisioners writing through a [`ClusterStore`].

use flink_types::{
    application_labels, job_manager_name, task_manager_name, ClusterStore, ClusterStoreError,
    Deployment, FlinkApplication, JobManagerProvisioner, ObjectMeta, ProvisionError, Service,
    TaskManagerProvisioner,
};
use std::sync::Arc;

const JOB_MANAGER_REPLICAS: i32 = 1;
const JOB_MANAGER_PORTS: [u16; 4] = [6123, 6124, 6125, 8081];

/// Treat `Conflict` as "already there".
fn ignore_conflict(res: Result<(), ClusterStoreError>) -> Result<bool, ClusterStoreError> {
    match res {
        Ok(()) => Ok(true),
        Err(ClusterStoreError::Conflict(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

fn object_meta(app: &FlinkApplication, name: String) -> ObjectMeta {
    ObjectMeta {
        name,
        namespace: app.namespace.clone(),
        labels: application_labels(app),
    }
}

/// Creates the job-manager deployment and its front-end service.
pub struct JobManagerDeployer<S> {
    store: Arc<S>,
}

impl<S: ClusterStore> JobManagerDeployer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S: ClusterStore> JobManagerProvisioner for JobManagerDeployer<S> {
    async fn create_if_not_exist(&self, app: &FlinkApplication) -> Result<(), ProvisionError> {
        let name = job_manager_name(app);
        let deployment = Deployment {
            metadata: object_meta(app, name.clone()),
            replicas: JOB_MANAGER_REPLICAS,
        };
        if ignore_conflict(self.store.create_deployment(&deployment).await)? {
            tracing::info!(app = %app.name, deployment = %name, "created job manager");
        }
        let service = Service {
            metadata: object_meta(app, name),
            ports: JOB_MANAGER_PORTS.to_vec(),
        };
        ignore_conflict(self.store.create_service(&service).await)?;
        Ok(())
    }
}

/// Creates the task-manager deployment with the desired replica count.
pub struct TaskManagerDeployer<S> {
    store: Arc<S>,
}

impl<S: ClusterStore> TaskManagerDeployer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S: ClusterStore> TaskManagerProvisioner for TaskManagerDeployer<S> {
    async fn create_if_not_exist(&self, app: &FlinkApplication) -> Result<(), ProvisionError> {
        if app.spec.number_task_managers < 0 {
            return Err(ProvisionError::Other(format!(
                "negative task manager count {}",
                app.spec.number_task_managers
            )));
        }
        let name = task_manager_name(app);
        let deployment = Deployment {
            metadata: object_meta(app, name.clone()),
            replicas: app.spec.number_task_managers,
        };
        if ignore_conflict(self.store.create_deployment(&deployment).await)? {
            tracing::info!(app = %app.name, deployment = %name, "created task manager");
        }
        Ok(())
    }
}
