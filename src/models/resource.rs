// Inventory records (compute and database instances) and the per-run classification.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// A running compute instance as listed by the inventory backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    pub image_id: String,
    pub instance_type: String,
    /// e.g. "Windows", "Red Hat Enterprise Linux", "Linux/UNIX".
    #[serde(default)]
    pub platform_details: Option<String>,
    #[serde(default)]
    pub block_device_mapping_count: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Instance {
    /// The `Name` tag, falling back to the instance id.
    pub fn display_name(&self) -> &str {
        self.tags
            .iter()
            .find(|t| t.key == "Name")
            .map(|t| t.value.as_str())
            .unwrap_or(&self.instance_id)
    }
}

/// Platforms with a memory/disk metric mapping. Anything else is `Unsupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    Windows,
    RedHatLinux,
    Unsupported,
}

impl PlatformKind {
    pub const WINDOWS: &'static str = "Windows";
    pub const RED_HAT: &'static str = "Red Hat Enterprise Linux";

    /// Exact match on the inventory's platform string.
    pub fn from_platform_details(s: &str) -> Self {
        match s {
            Self::WINDOWS => PlatformKind::Windows,
            Self::RED_HAT => PlatformKind::RedHatLinux,
            _ => PlatformKind::Unsupported,
        }
    }
}

/// Classification of one compute instance; rebuilt every run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceProfile {
    pub resource_id: String,
    pub display_name: String,
    pub image_id: String,
    pub instance_type: String,
    /// Raw platform string as reported, for the report's platform column.
    pub platform_details: String,
    pub platform: PlatformKind,
    pub volume_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbInstance {
    pub identifier: String,
    pub engine: String,
}
