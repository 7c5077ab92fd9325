//! reqwest-backed client for the Flink job-manager REST API.

use flink_types::{
    CancelJobRequest, CancelJobResponse, CheckpointResponse, ClusterOverviewResponse, FlinkApi,
    FlinkApiError, GetJobsResponse, JobConfigResponse, SavepointResponse, SubmitJobRequest,
    SubmitJobResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_SCHEME: &str = "http";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where and how to reach job managers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlinkClientConfig {
    pub port: u16,
    pub scheme: String,
    pub timeout: Duration,
}

impl Default for FlinkClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl FlinkClientConfig {
    /// Reads `FLINK_JOBMANAGER_PORT`, `FLINK_JOBMANAGER_SCHEME` and
    /// `FLINK_API_TIMEOUT_SECS`; missing or unparsable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = std::env::var("FLINK_JOBMANAGER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let scheme = std::env::var("FLINK_JOBMANAGER_SCHEME").unwrap_or(defaults.scheme);
        let timeout = std::env::var("FLINK_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        Self {
            port,
            scheme,
            timeout,
        }
    }
}

/// Talks to the job manager behind `{scheme}://{service_name}:{port}`.
pub struct HttpFlinkClient {
    client: reqwest::Client,
    config: FlinkClientConfig,
}

impl HttpFlinkClient {
    pub fn new(config: FlinkClientConfig) -> Result<Self, FlinkApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FlinkApiError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, FlinkApiError> {
        Self::new(FlinkClientConfig::from_env())
    }

    fn url(&self, service_name: &str, path: &str) -> String {
        format!(
            "{}://{}:{}{}",
            self.config.scheme, service_name, self.config.port, path
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FlinkApiError> {
        tracing::debug!(url, "GET job manager");
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FlinkApiError::Http(e.to_string()))?;
        Self::decode(res).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, FlinkApiError> {
        tracing::debug!(url, "POST job manager");
        let res = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| FlinkApiError::Http(e.to_string()))?;
        Self::decode(res).await
    }

    async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, FlinkApiError> {
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FlinkApiError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(FlinkApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| FlinkApiError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl FlinkApi for HttpFlinkClient {
    async fn get_jobs(&self, service_name: &str) -> Result<GetJobsResponse, FlinkApiError> {
        self.get_json(&self.url(service_name, "/jobs")).await
    }

    async fn get_job_config(
        &self,
        service_name: &str,
        job_id: &str,
    ) -> Result<JobConfigResponse, FlinkApiError> {
        let url = self.url(service_name, &format!("/jobs/{}/config", job_id));
        self.get_json(&url).await
    }

    async fn submit_job(
        &self,
        service_name: &str,
        jar_name: &str,
        request: &SubmitJobRequest,
    ) -> Result<SubmitJobResponse, FlinkApiError> {
        let url = self.url(service_name, &format!("/jars/{}/run", jar_name));
        self.post_json(&url, request).await
    }

    async fn cancel_job_with_savepoint(
        &self,
        service_name: &str,
        job_id: &str,
        target_directory: Option<&str>,
    ) -> Result<String, FlinkApiError> {
        let url = self.url(service_name, &format!("/jobs/{}/savepoints", job_id));
        let request = CancelJobRequest {
            cancel_job: true,
            target_directory: target_directory.map(str::to_string),
        };
        let response: CancelJobResponse = self.post_json(&url, &request).await?;
        Ok(response.trigger_id)
    }

    async fn check_savepoint_status(
        &self,
        service_name: &str,
        job_id: &str,
        trigger_id: &str,
    ) -> Result<SavepointResponse, FlinkApiError> {
        let url = self.url(
            service_name,
            &format!("/jobs/{}/savepoints/{}", job_id, trigger_id),
        );
        self.get_json(&url).await
    }

    async fn get_cluster_overview(
        &self,
        service_name: &str,
    ) -> Result<ClusterOverviewResponse, FlinkApiError> {
        self.get_json(&self.url(service_name, "/overview")).await
    }

    async fn get_checkpoint_counts(
        &self,
        service_name: &str,
        job_id: &str,
    ) -> Result<CheckpointResponse, FlinkApiError> {
        let url = self.url(service_name, &format!("/jobs/{}/checkpoints", job_id));
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_use_scheme_service_and_port() {
        let client = HttpFlinkClient::new(FlinkClientConfig::default()).unwrap();
        assert_eq!(
            client.url("wordcount.flink", "/jobs"),
            "http://wordcount.flink:8081/jobs"
        );
    }
}
