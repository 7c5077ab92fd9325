//! Container-platform objects the engine inspects, and the label and naming
//! scheme that ties them to an application.

use crate::FlinkApplication;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Labels = BTreeMap<String, String>;

/// Label carrying the application name on every object of the application.
pub const APP_LABEL_KEY: &str = "flink-app";
/// Label carrying the image key; distinguishes deployment generations.
pub const IMAGE_LABEL_KEY: &str = "flink-app-image";

const IMAGE_KEY_LEN: usize = 16;
const JOB_MANAGER_SUFFIX: &str = "jm";
const TASK_MANAGER_SUFFIX: &str = "tm";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: Labels,
}

impl ObjectMeta {
    /// True if every `selector` entry is present with the same value.
    pub fn matches(&self, selector: &Labels) -> bool {
        selector
            .iter()
            .all(|(k, v)| self.labels.get(k).is_some_and(|have| have == v))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub metadata: ObjectMeta,
    pub replicas: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub ports: Vec<u16>,
}

/// Anything carrying [`ObjectMeta`].
pub trait Labeled {
    fn metadata(&self) -> &ObjectMeta;
}

impl Labeled for Deployment {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl Labeled for Service {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

/// Short, label-safe key derived from an image reference.
pub fn image_key(image: &str) -> String {
    let hash = blake3::hash(image.as_bytes());
    hash.to_hex().as_str()[..IMAGE_KEY_LEN].to_string()
}

pub fn app_labels(app_name: &str) -> Labels {
    Labels::from([(APP_LABEL_KEY.to_string(), app_name.to_string())])
}

pub fn image_labels(image_key: &str) -> Labels {
    Labels::from([(IMAGE_LABEL_KEY.to_string(), image_key.to_string())])
}

/// Labels every object of the current generation carries.
pub fn application_labels(app: &FlinkApplication) -> Labels {
    let mut labels = app_labels(&app.name);
    labels.extend(image_labels(&image_key(&app.spec.image)));
    labels
}

pub fn job_manager_name(app: &FlinkApplication) -> String {
    format!(
        "{}-{}-{}",
        app.name,
        image_key(&app.spec.image),
        JOB_MANAGER_SUFFIX
    )
}

pub fn task_manager_name(app: &FlinkApplication) -> String {
    format!(
        "{}-{}-{}",
        app.name,
        image_key(&app.spec.image),
        TASK_MANAGER_SUFFIX
    )
}

/// Network identity of the current generation's job-manager service
/// (`{job_manager_name}.{namespace}`). The service is named after the
/// job-manager deployment, so each image generation has its own front end.
pub fn job_manager_service_name(app: &FlinkApplication) -> String {
    format!("{}.{}", job_manager_name(app), app.namespace)
}
