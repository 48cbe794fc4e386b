// Metrics / inventory / patch / database backend seam, plus session handling.

mod auth;
mod fixture;
mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::models::{Datapoint, DbInstance, Instance, InstalledPatch, MetricQuery, PatchState};

pub use auth::{FixtureAuthenticator, TokenAuthenticator};
pub use fixture::{FixtureBackend, FixtureData, FixtureSeries};
pub use http::{HttpBackend, HttpBackendConfig};

/// Everything one report pass reads. Implementations are read-only.
#[async_trait]
pub trait CloudBackend: Send + Sync {
    /// Range query; an empty vec is a valid answer (no data), not an error.
    async fn metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>, BackendError>;

    async fn running_instances(&self) -> Result<Vec<Instance>, BackendError>;

    /// `Name` tag lookup; "N/A" when the instance has none.
    async fn instance_name(&self, instance_id: &str) -> Result<String, BackendError>;

    /// Current state (e.g. "running"); "N/A" when unknown.
    async fn instance_state(&self, instance_id: &str) -> Result<String, BackendError>;

    async fn instance_patches(&self, instance_id: &str) -> Result<Vec<InstalledPatch>, BackendError>;

    async fn instance_patch_states(&self, instance_id: &str) -> Result<Vec<PatchState>, BackendError>;

    async fn database_instances(&self) -> Result<Vec<DbInstance>, BackendError>;

    /// Account alias if one exists, else the account id.
    async fn account_name(&self) -> Result<String, BackendError>;
}

/// Produces session handles for a profile and refreshes its credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn open_session(&self, profile: &str) -> Result<Arc<dyn CloudBackend>, BackendError>;

    async fn reauthenticate(&self, profile: &str) -> Result<(), BackendError>;
}
