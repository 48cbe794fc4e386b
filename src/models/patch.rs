// Patch inventory and compliance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPatch {
    pub title: String,
    pub severity: String,
    pub state: String,
    #[serde(default)]
    pub kb_id: Option<String>,
    pub installed_time: DateTime<Utc>,
}

/// Compliance summary of the last patch operation on one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchState {
    #[serde(default)]
    pub installed_count: u32,
    #[serde(default)]
    pub installed_other_count: u32,
    #[serde(default)]
    pub installed_pending_reboot_count: u32,
    #[serde(default)]
    pub installed_rejected_count: u32,
    #[serde(default)]
    pub missing_count: u32,
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default)]
    pub operation_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub operation_end_time: Option<DateTime<Utc>>,
}
