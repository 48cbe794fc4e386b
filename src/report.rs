// Per-profile report pass: every running instance, then every database. Resources are
// processed one at a time; only expired credentials abort the pass early.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::assembler::ReportAssembler;
use crate::backend::CloudBackend;
use crate::classifier::{self, DiskSlot};
use crate::error::{BackendError, OutputError};
use crate::fetcher::{Fetched, MetricFetcher};
use crate::models::{
    Bandwidth, ComplianceRow, DatabaseRow, DbInstance, Instance, NOT_AVAILABLE, NetworkRow,
    PatchRow, Reading, ReportMonth, ResourceProfile, Section, ServerRow, SummaryStats, Window,
};
use crate::output::{Bar, BarChart, ChartColor, ChartRenderer, LineChart};
use crate::series;

/// Database charts live under this folder of the profile output directory.
pub const DATABASE_CHART_DIR: &str = "rds_utilization_graphs";

const UTILIZATION_AXIS: &str = "Utilization (%)";

/// Disk columns of one server row. Every slot starts out unsupported and is only
/// overwritten when the instance's layout actually has that slot.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DiskReadings {
    root: Reading,
    secondary_volume: Reading,
    c_drive: Reading,
    secondary_drive: Reading,
}

impl DiskReadings {
    fn unsupported() -> Self {
        Self {
            root: Reading::Unsupported,
            secondary_volume: Reading::Unsupported,
            c_drive: Reading::Unsupported,
            secondary_drive: Reading::Unsupported,
        }
    }

    fn slot_mut(&mut self, slot: DiskSlot) -> &mut Reading {
        match slot {
            DiskSlot::Root => &mut self.root,
            DiskSlot::SecondaryVolume => &mut self.secondary_volume,
            DiskSlot::CDrive => &mut self.c_drive,
            DiskSlot::SecondaryDrive => &mut self.secondary_drive,
        }
    }
}

pub struct ReportBuilder<'a> {
    backend: &'a dyn CloudBackend,
    renderer: &'a dyn ChartRenderer,
    fetcher: MetricFetcher<'a>,
    out_dir: PathBuf,
    network_capacity_mbps: f64,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(
        backend: &'a dyn CloudBackend,
        renderer: &'a dyn ChartRenderer,
        month: &ReportMonth,
        period_seconds: u32,
        network_capacity_mbps: f64,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            renderer,
            fetcher: MetricFetcher::new(backend, month.window(), period_seconds),
            out_dir: out_dir.into(),
            network_capacity_mbps,
        }
    }

    fn window(&self) -> Window {
        self.fetcher.window()
    }

    /// Runs the whole pass and returns the filled assembler.
    #[instrument(skip_all, fields(out_dir = %self.out_dir.display()))]
    pub async fn build(&self) -> Result<ReportAssembler, BackendError> {
        let mut report = ReportAssembler::new();

        let instances = self.backend.running_instances().await?;
        info!(count = instances.len(), "running instances");
        for instance in &instances {
            self.process_instance(instance, &mut report).await?;
        }

        let databases = self.backend.database_instances().await?;
        info!(count = databases.len(), "database instances");
        self.process_databases(&databases, &mut report).await?;

        Ok(report)
    }

    #[instrument(skip_all, fields(instance_id = %instance.instance_id))]
    async fn process_instance(
        &self,
        instance: &Instance,
        report: &mut ReportAssembler,
    ) -> Result<(), BackendError> {
        let profile = classifier::classify(instance);
        let id = profile.resource_id.as_str();
        let name = profile.display_name.as_str();
        let label = path_safe(name);
        let dir = self.out_dir.join(&label);
        info!(
            instance_name = name,
            platform = %profile.platform_details,
            volumes = profile.volume_count,
            "processing instance"
        );

        let cpu = self
            .fetcher
            .fetch_or_skip(id, &classifier::cpu_metric(&profile))
            .await?;
        self.daily_chart(
            &dir,
            &format!("{label}_{id}_cpu"),
            &format!("CPU Utilization - {name} ({id})"),
            "CPU Utilization (%)",
            ChartColor::Blue,
            &cpu,
        );

        let memory = match classifier::select_memory_metric(&profile) {
            Ok(spec) => {
                let fetched = self.fetcher.fetch_or_skip(id, &spec).await?;
                self.daily_chart(
                    &dir,
                    &format!("{label}_{id}_memory"),
                    &format!("Memory Utilization - {name} ({id})"),
                    "Memory Utilization (%)",
                    ChartColor::Green,
                    &fetched,
                );
                fetched.average()
            }
            Err(e) => {
                warn!(instance_id = id, error = %e, "memory metric skipped");
                Reading::Unsupported
            }
        };

        let disks = self.disk_readings(&profile, &dir).await?;

        report.add_row(
            Section::ServerUtilization,
            ServerRow {
                instance_id: id.to_string(),
                instance_name: name.to_string(),
                platform: profile.platform_details.clone(),
                cpu_average: cpu.average(),
                memory_average: memory,
                root_disk_average: disks.root,
                secondary_volume_average: disks.secondary_volume,
                c_drive_average: disks.c_drive,
                secondary_drive_average: disks.secondary_drive,
            },
        );

        self.compliance_rows(&profile, report).await?;
        self.network_row(&profile, &dir, report).await?;
        self.patch_rows(&profile, report).await?;
        Ok(())
    }

    /// Probes each disk slot of the instance's layout, first match wins per slot.
    async fn disk_readings(
        &self,
        profile: &ResourceProfile,
        dir: &Path,
    ) -> Result<DiskReadings, BackendError> {
        let id = profile.resource_id.as_str();
        let name = profile.display_name.as_str();
        let label = path_safe(name);
        let mut readings = DiskReadings::unsupported();

        let probes = match classifier::select_disk_metrics(profile) {
            Ok(probes) => probes,
            Err(e) => {
                warn!(instance_id = id, error = %e, "disk metrics skipped");
                return Ok(readings);
            }
        };

        for probe in &probes {
            let (hit, fetched) = self
                .fetcher
                .probe_first(id, probe.candidates.iter().map(|(_, spec)| spec))
                .await?;
            if let Some((candidate, _)) = hit.and_then(|i| probe.candidates.get(i)) {
                debug!(
                    instance_id = id,
                    slot = ?probe.slot,
                    device = candidate.device.unwrap_or("-"),
                    mount = candidate.mount,
                    "disk candidate selected"
                );
            }
            self.daily_chart(
                dir,
                &probe.slot.chart_stem(&label, id),
                &format!("Disk Utilization - {name} ({id})"),
                "Disk Utilization (%)",
                ChartColor::Red,
                &fetched,
            );
            *readings.slot_mut(probe.slot) = fetched.average();
        }
        Ok(readings)
    }

    /// One row per patch-state record. A failing query yields no rows.
    async fn compliance_rows(
        &self,
        profile: &ResourceProfile,
        report: &mut ReportAssembler,
    ) -> Result<(), BackendError> {
        let id = profile.resource_id.as_str();
        let states = or_skip(
            self.backend.instance_patch_states(id).await,
            Vec::new(),
            id,
            "patch compliance",
        )?;
        for state in states {
            report.add_row(
                Section::PatchCompliance,
                ComplianceRow {
                    instance_id: id.to_string(),
                    instance_name: profile.display_name.clone(),
                    installed: state.installed_count,
                    installed_other: state.installed_other_count,
                    installed_pending_reboot: state.installed_pending_reboot_count,
                    installed_rejected: state.installed_rejected_count,
                    missing: state.missing_count,
                    failed: state.failed_count,
                    operation_start: state.operation_start_time,
                    operation_end: state.operation_end_time,
                },
            );
        }
        Ok(())
    }

    async fn network_row(
        &self,
        profile: &ResourceProfile,
        dir: &Path,
        report: &mut ReportAssembler,
    ) -> Result<(), BackendError> {
        let id = profile.resource_id.as_str();
        let name = profile.display_name.as_str();
        let label = path_safe(name);
        let [inbound_spec, outbound_spec] = classifier::network_metrics(profile);

        let inbound = self
            .fetcher
            .fetch_or_skip(id, &inbound_spec)
            .await?
            .map_values(series::bytes_to_mbps);
        let outbound = self
            .fetcher
            .fetch_or_skip(id, &outbound_spec)
            .await?
            .map_values(series::bytes_to_mbps);
        let inbound_stats = inbound.summary();
        let outbound_stats = outbound.summary();

        let capacity = outbound_stats
            .as_ref()
            .or(inbound_stats.as_ref())
            .map_or(self.network_capacity_mbps, |s| s.maximum);

        let bars: Vec<Bar> = [
            ("Average Inbound", inbound_stats.as_ref(), ChartColor::Blue),
            ("Average Outbound", outbound_stats.as_ref(), ChartColor::Green),
        ]
        .into_iter()
        .filter_map(|(caption, stats, color)| {
            stats.map(|s| Bar {
                label: caption.to_string(),
                value: s.average,
                color,
            })
        })
        .collect();
        if !bars.is_empty() {
            let chart = BarChart {
                title: format!("Network Utilization - {name} ({id})"),
                x_label: "Network Utilization".to_string(),
                y_label: "Bandwidth (Mbps)".to_string(),
                bars,
            };
            log_chart(self.renderer.bar_chart(dir, &format!("{label}_{id}_network"), &chart));
        }

        report.add_row(
            Section::NetworkUtilization,
            NetworkRow {
                instance_name: name.to_string(),
                instance_id: id.to_string(),
                inbound: bandwidth(&inbound, inbound_stats.as_ref()),
                outbound: bandwidth(&outbound, outbound_stats.as_ref()),
                capacity_mbps: Reading::Value(capacity),
            },
        );
        Ok(())
    }

    /// Patches installed inside the report window, with tag-based name and current state.
    async fn patch_rows(
        &self,
        profile: &ResourceProfile,
        report: &mut ReportAssembler,
    ) -> Result<(), BackendError> {
        let id = profile.resource_id.as_str();
        let window = self.window();
        let patches = or_skip(
            self.backend.instance_patches(id).await,
            Vec::new(),
            id,
            "installed patches",
        )?;
        let patches: Vec<_> = patches
            .into_iter()
            .filter(|p| window.contains(p.installed_time))
            .collect();
        if patches.is_empty() {
            return Ok(());
        }

        let tagged_name = or_skip(
            self.backend.instance_name(id).await,
            NOT_AVAILABLE.to_string(),
            id,
            "instance name",
        )?;
        let instance_name = if tagged_name == NOT_AVAILABLE {
            profile.display_name.clone()
        } else {
            tagged_name
        };
        let state = or_skip(
            self.backend.instance_state(id).await,
            NOT_AVAILABLE.to_string(),
            id,
            "instance state",
        )?;

        for patch in patches {
            report.add_row(
                Section::PatchInstallation,
                PatchRow {
                    instance_name: instance_name.clone(),
                    instance_id: id.to_string(),
                    instance_state: state.clone(),
                    patch_name: patch.title,
                    severity: patch.severity,
                    compliance_state: patch.state,
                    kb_id: patch.kb_id,
                    installed_time: patch.installed_time,
                },
            );
        }
        Ok(())
    }

    #[instrument(skip_all)]
    async fn process_databases(
        &self,
        databases: &[DbInstance],
        report: &mut ReportAssembler,
    ) -> Result<(), BackendError> {
        if databases.is_empty() {
            return Ok(());
        }
        let account_name = or_skip(
            self.backend.account_name().await,
            NOT_AVAILABLE.to_string(),
            "-",
            "account name",
        )?;
        let base = self.out_dir.join(DATABASE_CHART_DIR);

        for db in databases {
            let id = db.identifier.as_str();
            let dir = base.join(path_safe(id));
            let cpu = self
                .fetcher
                .fetch_or_skip(id, &classifier::database_cpu_metric(id))
                .await?;
            let read_iops = self
                .fetcher
                .fetch_or_skip(id, &classifier::database_read_iops_metric(id))
                .await?;

            if let Some(raw) = cpu.series() {
                let chart = LineChart::raw(
                    format!("{id} - CPU Utilization"),
                    "CPU Utilization (%)",
                    "CPU Utilization (%)",
                    ChartColor::Blue,
                    raw,
                );
                log_chart(self.renderer.line_chart(&dir, "cpu_utilization", &chart));
            }
            if let Some(raw) = read_iops.series() {
                let chart = LineChart::raw(
                    format!("{id} - Read IOPS"),
                    "Read IOPS",
                    "Read IOPS",
                    ChartColor::Green,
                    raw,
                );
                log_chart(self.renderer.line_chart(&dir, "read_iops", &chart));
            }

            report.add_row(
                Section::Database,
                DatabaseRow {
                    name: db.identifier.clone(),
                    engine: db.engine.clone(),
                    account_name: account_name.clone(),
                    cpu_average: cpu.average(),
                    read_iops_average: read_iops.average(),
                },
            );
        }
        Ok(())
    }

    /// Daily-resampled line chart; skipped when fewer than two days remain.
    fn daily_chart(
        &self,
        dir: &Path,
        stem: &str,
        title: &str,
        legend: &str,
        color: ChartColor,
        fetched: &Fetched,
    ) {
        let Some(raw) = fetched.series() else {
            return;
        };
        let daily = series::resample(raw);
        if daily.is_empty() {
            debug!(stem, "fewer than two daily points, chart skipped");
            return;
        }
        let chart = LineChart::daily(title, UTILIZATION_AXIS, legend, color, &daily);
        log_chart(self.renderer.line_chart(dir, stem, &chart));
    }
}

fn bandwidth(fetched: &Fetched, stats: Option<&SummaryStats>) -> Bandwidth {
    match stats {
        Some(s) => Bandwidth::from_summary(s),
        None => Bandwidth::missing(fetched.average()),
    }
}

/// A chart that fails to render is logged; the row it belongs to is still reported.
fn log_chart(result: Result<PathBuf, OutputError>) {
    match result {
        Ok(path) => debug!(path = %path.display(), "chart written"),
        Err(e) => warn!(error = %e, "chart not written"),
    }
}

/// Non-metric lookups: expired credentials propagate, anything else falls back.
fn or_skip<T>(
    result: Result<T, BackendError>,
    fallback: T,
    resource_id: &str,
    what: &'static str,
) -> Result<T, BackendError> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if e.is_expired_credentials() => Err(e),
        Err(e) => {
            warn!(resource_id, lookup = what, error = %e, "lookup failed");
            Ok(fallback)
        }
    }
}

/// Resource names become folder and file names. Path separators are replaced, and
/// names that would resolve to the parent or current folder become `_`.
fn path_safe(name: &str) -> String {
    match name.trim() {
        "" | "." | ".." => "_".to_string(),
        _ => name.replace(['/', '\\'], "_"),
    }
}
