//! Prints the job-manager status of one Flink application as JSON.
//!
//! Usage: `flink-operator <application.json>` (or `FLINK_APPLICATION_FILE`).

mod report;

use flink_client::HttpFlinkClient;
use flink_types::FlinkApplication;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FLINK_APPLICATION_FILE").ok())
        .ok_or("usage: flink-operator <application.json>")?;
    let raw = tokio::fs::read_to_string(&path).await?;
    let app: FlinkApplication = serde_json::from_str(&raw)?;

    let client = HttpFlinkClient::from_env()?;
    tracing::info!(app = %app.name, namespace = %app.namespace, "probing job manager");
    let report = report::build_report(&client, &app).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
