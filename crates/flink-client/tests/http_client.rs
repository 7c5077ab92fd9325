//! HttpFlinkClient against a fake job manager.

use flink_client::{FlinkApi, FlinkApiError, FlinkClientConfig, HttpFlinkClient};
use flink_types::{JobStatus, SavepointStatus, SubmitJobRequest};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOST: &str = "127.0.0.1";

fn client_for(server: &MockServer) -> HttpFlinkClient {
    HttpFlinkClient::new(FlinkClientConfig {
        port: server.address().port(),
        scheme: "http".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn lists_jobs_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [
                {"id": "old", "status": "CANCELED"},
                {"id": "new", "status": "RUNNING"}
            ]
        })))
        .mount(&server)
        .await;

    let jobs = client_for(&server).get_jobs(HOST).await.unwrap();
    assert_eq!(jobs.jobs.len(), 2);
    assert_eq!(jobs.jobs[0].job_id, "old");
    assert_eq!(jobs.jobs[1].status, JobStatus::Running);
}

#[tokio::test]
async fn submits_jar_with_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jars/wordcount.jar/run"))
        .and(body_json(json!({
            "savepointPath": "s3://sp/1",
            "parallelism": 4,
            "programArgs": "",
            "entryClass": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobid": "j-42"})))
        .mount(&server)
        .await;

    let request = SubmitJobRequest {
        savepoint_path: "s3://sp/1".to_string(),
        parallelism: 4,
        program_args: String::new(),
        entry_class: String::new(),
    };
    let res = client_for(&server)
        .submit_job(HOST, "wordcount.jar", &request)
        .await
        .unwrap();
    assert_eq!(res.job_id, "j-42");
}

#[tokio::test]
async fn cancel_with_savepoint_returns_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/j-1/savepoints"))
        .and(body_json(json!({"cancel-job": true})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"request-id": "trig-9"})))
        .mount(&server)
        .await;

    let trigger = client_for(&server)
        .cancel_job_with_savepoint(HOST, "j-1", None)
        .await
        .unwrap();
    assert_eq!(trigger, "trig-9");
}

#[tokio::test]
async fn cancel_with_savepoint_forwards_target_directory() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/j-1/savepoints"))
        .and(body_json(json!({
            "cancel-job": true,
            "target-directory": "s3://bucket/savepoints"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"request-id": "trig-10"})))
        .mount(&server)
        .await;

    let trigger = client_for(&server)
        .cancel_job_with_savepoint(HOST, "j-1", Some("s3://bucket/savepoints"))
        .await
        .unwrap();
    assert_eq!(trigger, "trig-10");
}

#[tokio::test]
async fn polls_savepoint_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/j-1/savepoints/trig-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"id": "IN_PROGRESS"}
        })))
        .mount(&server)
        .await;

    let sp = client_for(&server)
        .check_savepoint_status(HOST, "j-1", "trig-9")
        .await
        .unwrap();
    assert_eq!(sp.status(), SavepointStatus::InProgress);
    assert!(sp.location().is_none());
}

#[tokio::test]
async fn non_success_status_is_surfaced_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/missing/config"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"errors\":[\"not found\"]}"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_job_config(HOST, "missing")
        .await
        .unwrap_err();
    match err {
        FlinkApiError::Status { code, body } => {
            assert_eq!(code, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/overview"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_cluster_overview(HOST)
        .await
        .unwrap_err();
    assert!(matches!(err, FlinkApiError::Decode(_)));
}

#[tokio::test]
async fn fetches_checkpoint_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/j-1/checkpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "counts": {"completed": 3, "failed": 0},
            "latest": {},
            "history": []
        })))
        .mount(&server)
        .await;

    let cp = client_for(&server)
        .get_checkpoint_counts(HOST, "j-1")
        .await
        .unwrap();
    assert_eq!(cp.counts["completed"], 3);
    assert!(cp.latest.completed.is_none());
}
