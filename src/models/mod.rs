// Domain models: backend samples and queries, inventory records, report rows.

mod patch;
mod query;
mod report;
mod resource;
mod sample;

pub use patch::{InstalledPatch, PatchState};
pub use query::{Dimension, MetricQuery, MetricSpec, ReportMonth, Statistic, Unit, Window};
pub use report::{
    Bandwidth, Cell, ComplianceRow, DatabaseRow, NOT_AVAILABLE, NetworkRow, PatchRow, Reading,
    ReportRow, Section, ServerRow,
};
pub use resource::{DbInstance, Instance, PlatformKind, ResourceProfile, Tag};
pub use sample::{Datapoint, DailySeries, RawSeries, Sample, SummaryStats};
