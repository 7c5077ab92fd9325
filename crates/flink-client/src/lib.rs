//! Flink job-manager REST client.

mod http;
#[cfg(feature = "test-util")]
pub mod mock;

pub use flink_types::{FlinkApi, FlinkApiError};
pub use http::{FlinkClientConfig, HttpFlinkClient};

#[cfg(feature = "test-util")]
pub use mock::MockFlinkApi;
