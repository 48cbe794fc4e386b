// JSON client for the metrics/inventory gateway. Bounded per-request timeout and a fixed
// retry count with exponential backoff on transient failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::CloudBackend;
use crate::error::BackendError;
use crate::models::{
    Datapoint, DbInstance, Instance, InstalledPatch, MetricQuery, NOT_AVAILABLE, PatchState, Tag,
};

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub token: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

pub struct HttpBackend {
    client: Client,
    config: HttpBackendConfig,
}

#[derive(Deserialize)]
struct DatapointsResponse {
    datapoints: Vec<Datapoint>,
}

#[derive(Deserialize)]
struct InstancesResponse {
    instances: Vec<Instance>,
}

#[derive(Deserialize)]
struct TagsResponse {
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct StateResponse {
    state: Option<String>,
}

#[derive(Deserialize)]
struct PatchesResponse {
    patches: Vec<InstalledPatch>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatchStatesResponse {
    patch_states: Vec<PatchState>,
}

#[derive(Deserialize)]
struct DatabasesResponse {
    databases: Vec<DbInstance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    account_id: String,
    #[serde(default)]
    aliases: Vec<String>,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(crate::version::user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Unavailable(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.url(path);
        self.request_with_retry(|| self.client.get(&url)).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &MetricQuery,
    ) -> Result<T, BackendError> {
        let url = self.url(path);
        self.request_with_retry(|| self.client.post(&url).json(body))
            .await
    }

    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<T, BackendError> {
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff_secs = std::cmp::min(1u64 << attempt, 30);
                tracing::warn!(attempt, backoff_secs, error = %last_error, "retrying gateway request after backoff");
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            }

            let response = match build().bearer_auth(&self.config.token).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(BackendError::Unavailable(last_error));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(|e| BackendError::Unavailable(format!("decode: {e}")));
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(BackendError::ExpiredCredentials);
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Unavailable(format!("{status}: {body}")));
        }

        Err(BackendError::Unavailable(format!(
            "gave up after {} attempts: {}",
            self.config.max_retries + 1,
            last_error
        )))
    }
}

#[async_trait]
impl CloudBackend for HttpBackend {
    async fn metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>, BackendError> {
        let resp: DatapointsResponse = self.post_json("/v1/metrics/statistics", query).await?;
        Ok(resp.datapoints)
    }

    async fn running_instances(&self) -> Result<Vec<Instance>, BackendError> {
        let resp: InstancesResponse = self.get_json("/v1/instances?state=running").await?;
        Ok(resp.instances)
    }

    async fn instance_name(&self, instance_id: &str) -> Result<String, BackendError> {
        let resp: TagsResponse = self
            .get_json(&format!("/v1/instances/{instance_id}/tags"))
            .await?;
        Ok(resp
            .tags
            .into_iter()
            .find(|t| t.key == "Name")
            .map(|t| t.value)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }

    async fn instance_state(&self, instance_id: &str) -> Result<String, BackendError> {
        let resp: StateResponse = self
            .get_json(&format!("/v1/instances/{instance_id}/state"))
            .await?;
        Ok(resp.state.unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }

    async fn instance_patches(&self, instance_id: &str) -> Result<Vec<InstalledPatch>, BackendError> {
        let resp: PatchesResponse = self
            .get_json(&format!("/v1/instances/{instance_id}/patches"))
            .await?;
        Ok(resp.patches)
    }

    async fn instance_patch_states(&self, instance_id: &str) -> Result<Vec<PatchState>, BackendError> {
        let resp: PatchStatesResponse = self
            .get_json(&format!("/v1/instances/{instance_id}/patch-states"))
            .await?;
        Ok(resp.patch_states)
    }

    async fn database_instances(&self) -> Result<Vec<DbInstance>, BackendError> {
        let resp: DatabasesResponse = self.get_json("/v1/databases").await?;
        Ok(resp.databases)
    }

    async fn account_name(&self) -> Result<String, BackendError> {
        let resp: AccountResponse = self.get_json("/v1/account").await?;
        Ok(resp.aliases.into_iter().next().unwrap_or(resp.account_id))
    }
}
