// Resource classification: platform + attached-volume count decide which memory and
// disk counters exist for an instance. Disk layouts are one lookup table keyed by
// (platform, volume count); each slot lists its candidates in probe order.

use thiserror::Error;

use crate::models::{Dimension, Instance, MetricSpec, PlatformKind, ResourceProfile, Unit};

pub const EC2_NAMESPACE: &str = "AWS/EC2";
pub const AGENT_NAMESPACE: &str = "CWAgent";
pub const RDS_NAMESPACE: &str = "AWS/RDS";

const WINDOWS_MEMORY_METRIC: &str = "Memory % Committed Bytes In Use";
const LINUX_MEMORY_METRIC: &str = "mem_used_percent";
const WINDOWS_DISK_METRIC: &str = "LogicalDisk % Free Space";
const LINUX_DISK_METRIC: &str = "disk_used_percent";
const LINUX_FSTYPE: &str = "xfs";

/// Default platform string when the inventory omits one.
const DEFAULT_PLATFORM: &str = "Linux/UNIX";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Memory,
    Disk,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Memory => f.write_str("memory"),
            MetricKind::Disk => f.write_str("disk"),
        }
    }
}

/// No metric mapping for this platform / volume layout. Logged by callers, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {kind} metric mapping for platform {platform:?} with {volume_count} volume(s)")]
pub struct Unsupported {
    pub kind: MetricKind,
    pub platform: String,
    pub volume_count: u32,
}

/// Report column a disk reading lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiskSlot {
    Root,
    SecondaryVolume,
    CDrive,
    SecondaryDrive,
}

impl DiskSlot {
    /// Chart file stem (without extension) inside the instance folder.
    pub fn chart_stem(self, name: &str, id: &str) -> String {
        match self {
            DiskSlot::Root => format!("{name}_Disk Utilization for root path"),
            DiskSlot::SecondaryVolume => format!("{name}_Disk Utilization for secondary Volume"),
            DiskSlot::CDrive => format!("{name}_{id}_C_Drive"),
            DiskSlot::SecondaryDrive => format!("{name}_{id}_D_drive"),
        }
    }
}

/// One (device, mount path or drive letter) pair to probe. Windows drives have no device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskCandidate {
    pub device: Option<&'static str>,
    pub mount: &'static str,
}

impl DiskCandidate {
    const fn drive(letter: &'static str) -> Self {
        Self {
            device: None,
            mount: letter,
        }
    }

    const fn volume(device: &'static str, path: &'static str) -> Self {
        Self {
            device: Some(device),
            mount: path,
        }
    }
}

/// A slot and its candidates, each already resolved to a concrete counter.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskProbe {
    pub slot: DiskSlot,
    pub candidates: Vec<(DiskCandidate, MetricSpec)>,
}

struct DiskLayout {
    platform: PlatformKind,
    volume_count: u32,
    slots: &'static [(DiskSlot, &'static [DiskCandidate])],
}

const WINDOWS_SYSTEM: &[DiskCandidate] = &[DiskCandidate::drive("C:")];
const WINDOWS_DATA: &[DiskCandidate] = &[DiskCandidate::drive("D:"), DiskCandidate::drive("F:")];
const LINUX_ROOT: &[DiskCandidate] = &[DiskCandidate::volume("nvme0n1p2", "/")];
// Device-major order: every path on the partition before the bare device.
const LINUX_DATA: &[DiskCandidate] = &[
    DiskCandidate::volume("nvme1n1p1", "/u01"),
    DiskCandidate::volume("nvme1n1p1", "/opt/tyk-gateway"),
    DiskCandidate::volume("nvme1n1", "/u01"),
    DiskCandidate::volume("nvme1n1", "/opt/tyk-gateway"),
];

const DISK_LAYOUTS: &[DiskLayout] = &[
    DiskLayout {
        platform: PlatformKind::Windows,
        volume_count: 1,
        slots: &[(DiskSlot::CDrive, WINDOWS_SYSTEM)],
    },
    DiskLayout {
        platform: PlatformKind::Windows,
        volume_count: 2,
        slots: &[
            (DiskSlot::CDrive, WINDOWS_SYSTEM),
            (DiskSlot::SecondaryDrive, WINDOWS_DATA),
        ],
    },
    DiskLayout {
        platform: PlatformKind::RedHatLinux,
        volume_count: 1,
        slots: &[(DiskSlot::Root, LINUX_ROOT)],
    },
    DiskLayout {
        platform: PlatformKind::RedHatLinux,
        volume_count: 2,
        slots: &[
            (DiskSlot::Root, LINUX_ROOT),
            (DiskSlot::SecondaryVolume, LINUX_DATA),
        ],
    },
];

pub fn classify(instance: &Instance) -> ResourceProfile {
    let platform_details = instance
        .platform_details
        .clone()
        .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
    ResourceProfile {
        resource_id: instance.instance_id.clone(),
        display_name: instance.display_name().to_string(),
        image_id: instance.image_id.clone(),
        instance_type: instance.instance_type.clone(),
        platform: PlatformKind::from_platform_details(&platform_details),
        platform_details,
        volume_count: instance.block_device_mapping_count,
    }
}

pub fn cpu_metric(profile: &ResourceProfile) -> MetricSpec {
    MetricSpec {
        namespace: EC2_NAMESPACE,
        metric_name: "CPUUtilization",
        dimensions: vec![Dimension::new("InstanceId", &profile.resource_id)],
        unit: Some(Unit::Percent),
    }
}

/// Inbound and outbound byte counters, in that order.
pub fn network_metrics(profile: &ResourceProfile) -> [MetricSpec; 2] {
    ["NetworkIn", "NetworkOut"].map(|metric_name| MetricSpec {
        namespace: EC2_NAMESPACE,
        metric_name,
        dimensions: vec![Dimension::new("InstanceId", &profile.resource_id)],
        unit: Some(Unit::Bytes),
    })
}

pub fn select_memory_metric(profile: &ResourceProfile) -> Result<MetricSpec, Unsupported> {
    match profile.platform {
        PlatformKind::Windows => Ok(MetricSpec {
            namespace: AGENT_NAMESPACE,
            metric_name: WINDOWS_MEMORY_METRIC,
            dimensions: vec![
                Dimension::new("ImageId", &profile.image_id),
                Dimension::new("InstanceId", &profile.resource_id),
                Dimension::new("InstanceType", &profile.instance_type),
                Dimension::new("objectname", "Memory"),
            ],
            unit: None,
        }),
        PlatformKind::RedHatLinux => Ok(MetricSpec {
            namespace: AGENT_NAMESPACE,
            metric_name: LINUX_MEMORY_METRIC,
            dimensions: vec![
                Dimension::new("InstanceId", &profile.resource_id),
                Dimension::new("ImageId", &profile.image_id),
                Dimension::new("InstanceType", &profile.instance_type),
            ],
            unit: Some(Unit::Percent),
        }),
        PlatformKind::Unsupported => Err(unsupported(MetricKind::Memory, profile)),
    }
}

pub fn select_disk_metrics(profile: &ResourceProfile) -> Result<Vec<DiskProbe>, Unsupported> {
    let layout = DISK_LAYOUTS
        .iter()
        .find(|l| l.platform == profile.platform && l.volume_count == profile.volume_count)
        .ok_or_else(|| unsupported(MetricKind::Disk, profile))?;

    Ok(layout
        .slots
        .iter()
        .map(|(slot, candidates)| DiskProbe {
            slot: *slot,
            candidates: candidates
                .iter()
                .map(|c| (*c, disk_metric(profile, c)))
                .collect(),
        })
        .collect())
}

fn disk_metric(profile: &ResourceProfile, candidate: &DiskCandidate) -> MetricSpec {
    match candidate.device {
        None => MetricSpec {
            namespace: AGENT_NAMESPACE,
            metric_name: WINDOWS_DISK_METRIC,
            dimensions: vec![
                Dimension::new("instance", candidate.mount),
                Dimension::new("InstanceId", &profile.resource_id),
                Dimension::new("ImageId", &profile.image_id),
                Dimension::new("objectname", "LogicalDisk"),
                Dimension::new("InstanceType", &profile.instance_type),
            ],
            unit: None,
        },
        Some(device) => MetricSpec {
            namespace: AGENT_NAMESPACE,
            metric_name: LINUX_DISK_METRIC,
            dimensions: vec![
                Dimension::new("InstanceId", &profile.resource_id),
                Dimension::new("ImageId", &profile.image_id),
                Dimension::new("InstanceType", &profile.instance_type),
                Dimension::new("device", device),
                Dimension::new("fstype", LINUX_FSTYPE),
                Dimension::new("path", candidate.mount),
            ],
            unit: Some(Unit::Percent),
        },
    }
}

pub fn database_cpu_metric(identifier: &str) -> MetricSpec {
    MetricSpec {
        namespace: RDS_NAMESPACE,
        metric_name: "CPUUtilization",
        dimensions: vec![Dimension::new("DBInstanceIdentifier", identifier)],
        unit: Some(Unit::Percent),
    }
}

pub fn database_read_iops_metric(identifier: &str) -> MetricSpec {
    MetricSpec {
        namespace: RDS_NAMESPACE,
        metric_name: "ReadIOPS",
        dimensions: vec![Dimension::new("DBInstanceIdentifier", identifier)],
        unit: None,
    }
}

fn unsupported(kind: MetricKind, profile: &ResourceProfile) -> Unsupported {
    Unsupported {
        kind,
        platform: profile.platform_details.clone(),
        volume_count: profile.volume_count,
    }
}
