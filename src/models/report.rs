// Report sections, their fixed column schemas, and the typed rows flattened into them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use super::SummaryStats;

/// Rendered for every value that was not computed.
pub const NOT_AVAILABLE: &str = "N/A";

/// A metric value or the reason it is missing. Missing is never folded into zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    /// The backend returned an empty series.
    NoData,
    /// No metric mapping exists for the platform / volume layout.
    Unsupported,
    /// The backend call failed; the metric was skipped.
    Unavailable,
}

impl Reading {
    /// Picks one aggregate out of a summary; an absent summary reads as `NoData`.
    pub fn from_summary(summary: Option<&SummaryStats>, pick: impl Fn(&SummaryStats) -> f64) -> Self {
        summary.map_or(Reading::NoData, |s| Reading::Value(pick(s)))
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{v}"),
            _ => f.write_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Integer(i64),
    Date(NaiveDate),
    Missing,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Missing => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl From<Reading> for Cell {
    fn from(r: Reading) -> Self {
        match r {
            Reading::Value(v) => Cell::Number(v),
            _ => Cell::Missing,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<u32> for Cell {
    fn from(v: u32) -> Self {
        Cell::Integer(v as i64)
    }
}

impl From<Option<DateTime<Utc>>> for Cell {
    fn from(t: Option<DateTime<Utc>>) -> Self {
        t.map_or(Cell::Missing, |t| Cell::Date(t.date_naive()))
    }
}

/// One logical sheet of the report. Order of `ALL` is the sheet order in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    ServerUtilization,
    NetworkUtilization,
    PatchInstallation,
    PatchCompliance,
    Database,
}

const SERVER_COLUMNS: &[&str] = &[
    "InstanceId",
    "InstanceName",
    "InstancePlatform",
    "AverageCPUUtilization (%)",
    "AverageMemoryUtilization (%)",
    "AverageDiskUtilization root (%)",
    "AverageDiskUtilization (%) for Secondary volume",
    "AverageDiskUtilization (%) C Drive",
    "AverageDiskUtilization (%) for Secondary Drive",
];

const NETWORK_COLUMNS: &[&str] = &[
    "InstanceName",
    "InstanceId",
    "Average Inbound Bandwidth (Mbps)",
    "Average Outbound Bandwidth (Mbps)",
    "Min Inbound Bandwidth (Mbps)",
    "Min Outbound Bandwidth (Mbps)",
    "Max Inbound Bandwidth (Mbps)",
    "Max Outbound Bandwidth (Mbps)",
    "P95 Inbound Bandwidth (Mbps)",
    "P95 Outbound Bandwidth (Mbps)",
    "VM Network capacity (Mbps)",
];

const PATCH_COLUMNS: &[&str] = &[
    "Instance Name",
    "Instance ID",
    "Instance State",
    "Patch Name",
    "Severity",
    "Compliance State",
    "KB ID",
    "Installed Time",
];

const COMPLIANCE_COLUMNS: &[&str] = &[
    "Instance ID",
    "Instance Name",
    "Installed",
    "InstalledOther",
    "Installed Pending Reboot",
    "Installed Rejected",
    "Missing",
    "Failed",
    "OperationStart",
    "OperationEnd",
];

const DATABASE_COLUMNS: &[&str] = &[
    "Database name",
    "db_type",
    "Account Name",
    "CPU Utilization Avg",
    "Read IOPS Avg",
];

impl Section {
    pub const ALL: [Section; 5] = [
        Section::ServerUtilization,
        Section::NetworkUtilization,
        Section::PatchInstallation,
        Section::PatchCompliance,
        Section::Database,
    ];

    pub fn sheet_name(self) -> &'static str {
        match self {
            Section::ServerUtilization => "Server Utilization",
            Section::NetworkUtilization => "Network Utilization",
            Section::PatchInstallation => "Patch Installation",
            Section::PatchCompliance => "Patch Compliance Report",
            Section::Database => "RDS Report",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Section::ServerUtilization => SERVER_COLUMNS,
            Section::NetworkUtilization => NETWORK_COLUMNS,
            Section::PatchInstallation => PATCH_COLUMNS,
            Section::PatchCompliance => COMPLIANCE_COLUMNS,
            Section::Database => DATABASE_COLUMNS,
        }
    }
}

/// Flattened record destined for one sheet; cells line up with `Section::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    cells: Vec<Cell>,
}

impl ReportRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell under the named column of `section`, if both exist.
    pub fn get(&self, section: Section, column: &str) -> Option<&Cell> {
        let idx = section.columns().iter().position(|c| *c == column)?;
        self.cells.get(idx)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerRow {
    pub instance_id: String,
    pub instance_name: String,
    pub platform: String,
    pub cpu_average: Reading,
    pub memory_average: Reading,
    pub root_disk_average: Reading,
    pub secondary_volume_average: Reading,
    pub c_drive_average: Reading,
    pub secondary_drive_average: Reading,
}

impl From<ServerRow> for ReportRow {
    fn from(r: ServerRow) -> Self {
        ReportRow::new(vec![
            r.instance_id.into(),
            r.instance_name.into(),
            r.platform.into(),
            r.cpu_average.into(),
            r.memory_average.into(),
            r.root_disk_average.into(),
            r.secondary_volume_average.into(),
            r.c_drive_average.into(),
            r.secondary_drive_average.into(),
        ])
    }
}

/// Bandwidth aggregates for one direction, in Mbps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bandwidth {
    pub average: Reading,
    pub minimum: Reading,
    pub maximum: Reading,
    pub p95: Reading,
}

impl Bandwidth {
    pub fn missing(reason: Reading) -> Self {
        Self {
            average: reason,
            minimum: reason,
            maximum: reason,
            p95: reason,
        }
    }

    pub fn from_summary(summary: &SummaryStats) -> Self {
        Self {
            average: Reading::Value(summary.average),
            minimum: Reading::Value(summary.minimum),
            maximum: Reading::Value(summary.maximum),
            p95: Reading::Value(summary.p95),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRow {
    pub instance_name: String,
    pub instance_id: String,
    pub inbound: Bandwidth,
    pub outbound: Bandwidth,
    pub capacity_mbps: Reading,
}

impl From<NetworkRow> for ReportRow {
    fn from(r: NetworkRow) -> Self {
        ReportRow::new(vec![
            r.instance_name.into(),
            r.instance_id.into(),
            r.inbound.average.into(),
            r.outbound.average.into(),
            r.inbound.minimum.into(),
            r.outbound.minimum.into(),
            r.inbound.maximum.into(),
            r.outbound.maximum.into(),
            r.inbound.p95.into(),
            r.outbound.p95.into(),
            r.capacity_mbps.into(),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchRow {
    pub instance_name: String,
    pub instance_id: String,
    pub instance_state: String,
    pub patch_name: String,
    pub severity: String,
    pub compliance_state: String,
    pub kb_id: Option<String>,
    pub installed_time: DateTime<Utc>,
}

impl From<PatchRow> for ReportRow {
    fn from(r: PatchRow) -> Self {
        ReportRow::new(vec![
            r.instance_name.into(),
            r.instance_id.into(),
            r.instance_state.into(),
            r.patch_name.into(),
            r.severity.into(),
            r.compliance_state.into(),
            r.kb_id.map_or(Cell::Missing, Cell::Text),
            Cell::Date(r.installed_time.date_naive()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceRow {
    pub instance_id: String,
    pub instance_name: String,
    pub installed: u32,
    pub installed_other: u32,
    pub installed_pending_reboot: u32,
    pub installed_rejected: u32,
    pub missing: u32,
    pub failed: u32,
    pub operation_start: Option<DateTime<Utc>>,
    pub operation_end: Option<DateTime<Utc>>,
}

impl From<ComplianceRow> for ReportRow {
    fn from(r: ComplianceRow) -> Self {
        ReportRow::new(vec![
            r.instance_id.into(),
            r.instance_name.into(),
            r.installed.into(),
            r.installed_other.into(),
            r.installed_pending_reboot.into(),
            r.installed_rejected.into(),
            r.missing.into(),
            r.failed.into(),
            r.operation_start.into(),
            r.operation_end.into(),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseRow {
    pub name: String,
    pub engine: String,
    pub account_name: String,
    pub cpu_average: Reading,
    pub read_iops_average: Reading,
}

impl From<DatabaseRow> for ReportRow {
    fn from(r: DatabaseRow) -> Self {
        ReportRow::new(vec![
            r.name.into(),
            r.engine.into(),
            r.account_name.into(),
            r.cpu_average.into(),
            r.read_iops_average.into(),
        ])
    }
}
