// Shared test helpers

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use utilization_report::backend::{
    Authenticator, CloudBackend, FixtureBackend, FixtureData, FixtureSeries,
};
use utilization_report::error::{BackendError, OutputError};
use utilization_report::models::*;
use utilization_report::output::{BarChart, ChartRenderer, LineChart, SheetWriter};

pub fn may_2024() -> ReportMonth {
    ReportMonth::parse("05-2024").unwrap()
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

pub fn instance(id: &str, name: Option<&str>, platform: Option<&str>, volumes: u32) -> Instance {
    Instance {
        instance_id: id.to_string(),
        image_id: "ami-123".to_string(),
        instance_type: "t3.large".to_string(),
        platform_details: platform.map(String::from),
        block_device_mapping_count: volumes,
        tags: name
            .map(|n| {
                vec![Tag {
                    key: "Name".to_string(),
                    value: n.to_string(),
                }]
            })
            .unwrap_or_default(),
    }
}

/// `days` days of hourly averages starting at `start`, all equal to `value`.
pub fn hourly(start: DateTime<Utc>, days: i64, value: f64) -> Vec<Datapoint> {
    (0..days * 24)
        .map(|h| Datapoint::average(start + Duration::hours(h), value))
        .collect()
}

pub fn series(spec: &MetricSpec, points: Vec<Datapoint>) -> FixtureSeries {
    FixtureSeries::for_spec(spec, points)
}

/// Fixture backend that records every metric query and can fail chosen metrics.
pub struct RecordingBackend {
    inner: FixtureBackend,
    queries: Mutex<Vec<MetricQuery>>,
    failing_metrics: Vec<&'static str>,
    failing_compliance: bool,
}

impl RecordingBackend {
    pub fn new(data: FixtureData) -> Self {
        Self {
            inner: FixtureBackend::new(data),
            queries: Mutex::new(Vec::new()),
            failing_metrics: Vec::new(),
            failing_compliance: false,
        }
    }

    pub fn failing(mut self, metric_name: &'static str) -> Self {
        self.failing_metrics.push(metric_name);
        self
    }

    pub fn failing_compliance(mut self) -> Self {
        self.failing_compliance = true;
        self
    }

    pub fn queries(&self) -> Vec<MetricQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Queries whose dimensions contain `name = value`.
    pub fn queries_with(&self, name: &str, value: &str) -> Vec<MetricQuery> {
        self.queries()
            .into_iter()
            .filter(|q| q.dimensions.iter().any(|d| d.name == name && d.value == value))
            .collect()
    }
}

#[async_trait]
impl CloudBackend for RecordingBackend {
    async fn metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>, BackendError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.failing_metrics.contains(&query.metric_name.as_str()) {
            return Err(BackendError::Unavailable("injected".into()));
        }
        self.inner.metric_statistics(query).await
    }

    async fn running_instances(&self) -> Result<Vec<Instance>, BackendError> {
        self.inner.running_instances().await
    }

    async fn instance_name(&self, instance_id: &str) -> Result<String, BackendError> {
        self.inner.instance_name(instance_id).await
    }

    async fn instance_state(&self, instance_id: &str) -> Result<String, BackendError> {
        self.inner.instance_state(instance_id).await
    }

    async fn instance_patches(&self, instance_id: &str) -> Result<Vec<InstalledPatch>, BackendError> {
        self.inner.instance_patches(instance_id).await
    }

    async fn instance_patch_states(&self, instance_id: &str) -> Result<Vec<PatchState>, BackendError> {
        if self.failing_compliance {
            return Err(BackendError::Unavailable("injected".into()));
        }
        self.inner.instance_patch_states(instance_id).await
    }

    async fn database_instances(&self) -> Result<Vec<DbInstance>, BackendError> {
        self.inner.database_instances().await
    }

    async fn account_name(&self) -> Result<String, BackendError> {
        self.inner.account_name().await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub path: PathBuf,
    pub points: usize,
}

/// Records chart requests instead of drawing them.
#[derive(Default)]
pub struct RecordingRenderer {
    charts: Mutex<Vec<RenderedChart>>,
}

impl RecordingRenderer {
    pub fn charts(&self) -> Vec<RenderedChart> {
        self.charts.lock().unwrap().clone()
    }

    pub fn find(&self, file_name: &str) -> Option<RenderedChart> {
        self.charts()
            .into_iter()
            .find(|c| c.path.file_name().is_some_and(|n| n == file_name))
    }
}

impl ChartRenderer for RecordingRenderer {
    fn line_chart(&self, dir: &Path, stem: &str, chart: &LineChart) -> Result<PathBuf, OutputError> {
        let path = dir.join(format!("{stem}.svg"));
        self.charts.lock().unwrap().push(RenderedChart {
            path: path.clone(),
            points: chart.points.len(),
        });
        Ok(path)
    }

    fn bar_chart(&self, dir: &Path, stem: &str, chart: &BarChart) -> Result<PathBuf, OutputError> {
        let path = dir.join(format!("{stem}.svg"));
        self.charts.lock().unwrap().push(RenderedChart {
            path: path.clone(),
            points: chart.bars.len(),
        });
        Ok(path)
    }
}

/// Keeps written sections in memory.
#[derive(Default, Clone)]
pub struct MemoryWriter {
    pub written: Arc<Mutex<Vec<(PathBuf, String, Vec<(Section, Vec<ReportRow>)>)>>>,
}

impl SheetWriter for MemoryWriter {
    fn write(
        &self,
        dir: &Path,
        stem: &str,
        sections: &[(Section, Vec<ReportRow>)],
    ) -> Result<Vec<PathBuf>, OutputError> {
        self.written
            .lock()
            .unwrap()
            .push((dir.to_path_buf(), stem.to_string(), sections.to_vec()));
        Ok(vec![dir.join(format!("{stem}.mem"))])
    }
}

/// Session whose metric queries fail with expired credentials until the shared flag is set.
struct ExpiringSession {
    inner: FixtureBackend,
    valid: Arc<AtomicBool>,
}

#[async_trait]
impl CloudBackend for ExpiringSession {
    async fn metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>, BackendError> {
        if !self.valid.load(Ordering::SeqCst) {
            return Err(BackendError::ExpiredCredentials);
        }
        self.inner.metric_statistics(query).await
    }

    async fn running_instances(&self) -> Result<Vec<Instance>, BackendError> {
        self.inner.running_instances().await
    }

    async fn instance_name(&self, instance_id: &str) -> Result<String, BackendError> {
        self.inner.instance_name(instance_id).await
    }

    async fn instance_state(&self, instance_id: &str) -> Result<String, BackendError> {
        self.inner.instance_state(instance_id).await
    }

    async fn instance_patches(&self, instance_id: &str) -> Result<Vec<InstalledPatch>, BackendError> {
        self.inner.instance_patches(instance_id).await
    }

    async fn instance_patch_states(&self, instance_id: &str) -> Result<Vec<PatchState>, BackendError> {
        self.inner.instance_patch_states(instance_id).await
    }

    async fn database_instances(&self) -> Result<Vec<DbInstance>, BackendError> {
        self.inner.database_instances().await
    }

    async fn account_name(&self) -> Result<String, BackendError> {
        self.inner.account_name().await
    }
}

/// Authenticator whose sessions start expired. `reauthenticate` fixes them only when
/// `login_works` is set.
pub struct ScriptedAuthenticator {
    backend: FixtureBackend,
    valid: Arc<AtomicBool>,
    login_works: bool,
    pub sessions_opened: AtomicU32,
    pub reauth_calls: AtomicU32,
}

impl ScriptedAuthenticator {
    pub fn new(data: FixtureData, initially_valid: bool, login_works: bool) -> Self {
        Self {
            backend: FixtureBackend::new(data),
            valid: Arc::new(AtomicBool::new(initially_valid)),
            login_works,
            sessions_opened: AtomicU32::new(0),
            reauth_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Authenticator for ScriptedAuthenticator {
    async fn open_session(&self, _profile: &str) -> Result<Arc<dyn CloudBackend>, BackendError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ExpiringSession {
            inner: self.backend.clone(),
            valid: self.valid.clone(),
        }))
    }

    async fn reauthenticate(&self, _profile: &str) -> Result<(), BackendError> {
        self.reauth_calls.fetch_add(1, Ordering::SeqCst);
        if self.login_works {
            self.valid.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}
