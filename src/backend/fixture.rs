// In-memory backend loaded from a JSON export. Drives offline runs and the test suite.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CloudBackend;
use crate::error::BackendError;
use crate::models::{
    Datapoint, DbInstance, Dimension, Instance, InstalledPatch, MetricQuery, MetricSpec,
    NOT_AVAILABLE, PatchState,
};

/// One stored counter: matched on namespace, metric name and the exact ordered dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureSeries {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub datapoints: Vec<Datapoint>,
}

impl FixtureSeries {
    pub fn for_spec(spec: &MetricSpec, datapoints: Vec<Datapoint>) -> Self {
        Self {
            namespace: spec.namespace.to_string(),
            metric_name: spec.metric_name.to_string(),
            dimensions: spec.dimensions.clone(),
            datapoints,
        }
    }

    fn matches(&self, query: &MetricQuery) -> bool {
        self.namespace == query.namespace
            && self.metric_name == query.metric_name
            && self.dimensions == query.dimensions
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureData {
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub instances: Vec<Instance>,
    /// Current state per instance id; missing ids read as "running".
    #[serde(default)]
    pub instance_states: HashMap<String, String>,
    #[serde(default)]
    pub metrics: Vec<FixtureSeries>,
    #[serde(default)]
    pub patches: HashMap<String, Vec<InstalledPatch>>,
    #[serde(default)]
    pub patch_states: HashMap<String, Vec<PatchState>>,
    #[serde(default)]
    pub databases: Vec<DbInstance>,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureBackend {
    data: FixtureData,
}

impl FixtureBackend {
    pub fn new(data: FixtureData) -> Self {
        Self { data }
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        Ok(Self::new(serde_json::from_str(s)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("fixture {}: {}", path.display(), e))?;
        Self::from_json_str(&s)
    }

    fn instance(&self, instance_id: &str) -> Option<&Instance> {
        self.data
            .instances
            .iter()
            .find(|i| i.instance_id == instance_id)
    }
}

#[async_trait]
impl CloudBackend for FixtureBackend {
    async fn metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>, BackendError> {
        Ok(self
            .data
            .metrics
            .iter()
            .filter(|s| s.matches(query))
            .flat_map(|s| s.datapoints.iter())
            .filter(|p| p.timestamp >= query.start_time && p.timestamp < query.end_time)
            .cloned()
            .collect())
    }

    async fn running_instances(&self) -> Result<Vec<Instance>, BackendError> {
        Ok(self.data.instances.clone())
    }

    async fn instance_name(&self, instance_id: &str) -> Result<String, BackendError> {
        Ok(self
            .instance(instance_id)
            .and_then(|i| i.tags.iter().find(|t| t.key == "Name"))
            .map(|t| t.value.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }

    async fn instance_state(&self, instance_id: &str) -> Result<String, BackendError> {
        if let Some(state) = self.data.instance_states.get(instance_id) {
            return Ok(state.clone());
        }
        Ok(match self.instance(instance_id) {
            Some(_) => "running".to_string(),
            None => NOT_AVAILABLE.to_string(),
        })
    }

    async fn instance_patches(&self, instance_id: &str) -> Result<Vec<InstalledPatch>, BackendError> {
        Ok(self
            .data
            .patches
            .get(instance_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn instance_patch_states(&self, instance_id: &str) -> Result<Vec<PatchState>, BackendError> {
        Ok(self
            .data
            .patch_states
            .get(instance_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn database_instances(&self) -> Result<Vec<DbInstance>, BackendError> {
        Ok(self.data.databases.clone())
    }

    async fn account_name(&self) -> Result<String, BackendError> {
        Ok(self.data.account_name.clone())
    }
}
