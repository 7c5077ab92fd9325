//! In-memory cluster object store.

use flink_types::{ClusterStore, ClusterStoreError, Deployment, Labels, ObjectMeta, Service};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Key of a namespaced object.
type ObjectKey = (String, String);

fn key(meta: &ObjectMeta) -> ObjectKey {
    (meta.namespace.clone(), meta.name.clone())
}

#[derive(Debug, Clone)]
struct Pod {
    metadata: ObjectMeta,
    running: bool,
}

#[derive(Default)]
struct Objects {
    deployments: BTreeMap<ObjectKey, Deployment>,
    services: BTreeMap<ObjectKey, Service>,
    pods: BTreeMap<ObjectKey, Pod>,
    updates: Vec<Deployment>,
}

/// ClusterStore over maps keyed by (namespace, name). Listing order is by key,
/// so results are deterministic. Updates are journaled for inspection.
#[derive(Clone, Default)]
pub struct InMemoryClusterStore {
    inner: Arc<RwLock<Objects>>,
}

impl InMemoryClusterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a deployment without going through `create_deployment`.
    pub async fn insert_deployment(&self, deployment: Deployment) {
        let mut guard = self.inner.write().await;
        guard
            .deployments
            .insert(key(&deployment.metadata), deployment);
    }

    pub async fn insert_service(&self, service: Service) {
        let mut guard = self.inner.write().await;
        guard.services.insert(key(&service.metadata), service);
    }

    /// Register a pod and whether it is running.
    pub async fn set_pod(&self, metadata: ObjectMeta, running: bool) {
        let mut guard = self.inner.write().await;
        guard
            .pods
            .insert(key(&metadata), Pod { metadata, running });
    }

    pub async fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        let guard = self.inner.read().await;
        guard
            .deployments
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub async fn deployments(&self) -> Vec<Deployment> {
        self.inner.read().await.deployments.values().cloned().collect()
    }

    pub async fn services(&self) -> Vec<Service> {
        self.inner.read().await.services.values().cloned().collect()
    }

    /// Deployments passed to `update_deployment`, oldest first.
    pub async fn updates(&self) -> Vec<Deployment> {
        self.inner.read().await.updates.clone()
    }
}

#[async_trait::async_trait]
impl ClusterStore for InMemoryClusterStore {
    async fn get_deployments_with_label(
        &self,
        namespace: &str,
        labels: &Labels,
    ) -> Result<Vec<Deployment>, ClusterStoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .deployments
            .values()
            .filter(|d| d.metadata.namespace == namespace && d.metadata.matches(labels))
            .cloned()
            .collect())
    }

    async fn get_services_with_label(
        &self,
        namespace: &str,
        labels: &Labels,
    ) -> Result<Vec<Service>, ClusterStoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .services
            .values()
            .filter(|s| s.metadata.namespace == namespace && s.metadata.matches(labels))
            .cloned()
            .collect())
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<(), ClusterStoreError> {
        let mut guard = self.inner.write().await;
        let k = key(&deployment.metadata);
        if guard.deployments.contains_key(&k) {
            return Err(ClusterStoreError::Conflict(deployment.metadata.name.clone()));
        }
        guard.deployments.insert(k, deployment.clone());
        Ok(())
    }

    async fn create_service(&self, service: &Service) -> Result<(), ClusterStoreError> {
        let mut guard = self.inner.write().await;
        let k = key(&service.metadata);
        if guard.services.contains_key(&k) {
            return Err(ClusterStoreError::Conflict(service.metadata.name.clone()));
        }
        guard.services.insert(k, service.clone());
        Ok(())
    }

    async fn update_deployment(&self, deployment: &Deployment) -> Result<(), ClusterStoreError> {
        let mut guard = self.inner.write().await;
        let k = key(&deployment.metadata);
        match guard.deployments.get_mut(&k) {
            Some(existing) => *existing = deployment.clone(),
            None => {
                return Err(ClusterStoreError::NotFound(
                    deployment.metadata.name.clone(),
                ))
            }
        }
        guard.updates.push(deployment.clone());
        Ok(())
    }

    async fn delete_deployments(
        &self,
        deployments: &[Deployment],
    ) -> Result<(), ClusterStoreError> {
        let mut guard = self.inner.write().await;
        for d in deployments {
            guard.deployments.remove(&key(&d.metadata));
        }
        Ok(())
    }

    async fn delete_services(&self, services: &[Service]) -> Result<(), ClusterStoreError> {
        let mut guard = self.inner.write().await;
        for s in services {
            guard.services.remove(&key(&s.metadata));
        }
        Ok(())
    }

    async fn is_all_pods_running(
        &self,
        namespace: &str,
        labels: &Labels,
    ) -> Result<bool, ClusterStoreError> {
        let guard = self.inner.read().await;
        let mut matching = guard
            .pods
            .values()
            .filter(|p| p.metadata.namespace == namespace && p.metadata.matches(labels))
            .peekable();
        // No pods yet means the cluster is not up.
        if matching.peek().is_none() {
            return Ok(false);
        }
        Ok(matching.all(|p| p.running))
    }
}
