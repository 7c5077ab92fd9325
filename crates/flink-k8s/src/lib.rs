//! Cluster object store, label partitioning, and manager provisioners.

mod memory;
mod partition;
mod provision;

pub use flink_types::{ClusterStore, ClusterStoreError, Deployment, Labels, Service};
pub use memory::InMemoryClusterStore;
pub use partition::match_by_label;
pub use provision::{JobManagerDeployer, TaskManagerDeployer};
