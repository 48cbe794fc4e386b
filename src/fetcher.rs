// Metric fetching: one range query per counter, sorted into a RawSeries. Empty results
// and failed calls become explicit outcomes; only expired credentials propagate.

use tracing::{info, instrument, warn};

use crate::backend::CloudBackend;
use crate::error::BackendError;
use crate::models::{MetricQuery, MetricSpec, RawSeries, Reading, SummaryStats, Window};
use crate::series;

/// Result of fetching one counter.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Data(RawSeries),
    NoData,
    Unavailable,
}

impl Fetched {
    pub fn series(&self) -> Option<&RawSeries> {
        match self {
            Fetched::Data(s) => Some(s),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<SummaryStats> {
        self.series().and_then(series::summarize)
    }

    /// One aggregate of the series, or the reason it is missing.
    pub fn reading(&self, pick: impl Fn(&SummaryStats) -> f64) -> Reading {
        match self {
            Fetched::Data(s) => Reading::from_summary(series::summarize(s).as_ref(), pick),
            Fetched::NoData => Reading::NoData,
            Fetched::Unavailable => Reading::Unavailable,
        }
    }

    pub fn average(&self) -> Reading {
        self.reading(|s| s.average)
    }

    /// Applies `f` to every sample value (unit conversion).
    pub fn map_values(self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Fetched::Data(s) => Fetched::Data(s.map_values(f)),
            other => other,
        }
    }
}

pub struct MetricFetcher<'a> {
    backend: &'a dyn CloudBackend,
    window: Window,
    period_seconds: u32,
}

impl<'a> MetricFetcher<'a> {
    pub fn new(backend: &'a dyn CloudBackend, window: Window, period_seconds: u32) -> Self {
        Self {
            backend,
            window,
            period_seconds,
        }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Raw range query. An empty series is a valid answer.
    pub async fn fetch(&self, spec: &MetricSpec) -> Result<RawSeries, BackendError> {
        let query = MetricQuery::average(spec, &self.window, self.period_seconds);
        let points = self.backend.metric_statistics(&query).await?;
        Ok(RawSeries::from_datapoints(&points))
    }

    /// Like `fetch`, but logs and folds NoData / BackendUnavailable into the outcome.
    #[instrument(skip(self, spec), fields(metric = spec.metric_name))]
    pub async fn fetch_or_skip(
        &self,
        resource_id: &str,
        spec: &MetricSpec,
    ) -> Result<Fetched, BackendError> {
        match self.fetch(spec).await {
            Ok(series) if series.is_empty() => {
                info!(resource_id, metric = spec.metric_name, "no data");
                Ok(Fetched::NoData)
            }
            Ok(series) => Ok(Fetched::Data(series)),
            Err(BackendError::ExpiredCredentials) => Err(BackendError::ExpiredCredentials),
            Err(e) => {
                warn!(resource_id, metric = spec.metric_name, error = %e, "metric skipped");
                Ok(Fetched::Unavailable)
            }
        }
    }

    /// Tries `candidates` in order and stops at the first non-empty series; later
    /// candidates are never queried. Without a hit the outcome is Unavailable if any
    /// candidate failed, else NoData.
    pub async fn probe_first<'s>(
        &self,
        resource_id: &str,
        candidates: impl IntoIterator<Item = &'s MetricSpec>,
    ) -> Result<(Option<usize>, Fetched), BackendError> {
        let mut any_unavailable = false;
        for (index, spec) in candidates.into_iter().enumerate() {
            match self.fetch_or_skip(resource_id, spec).await? {
                Fetched::Data(series) => {
                    return Ok((Some(index), Fetched::Data(series)));
                }
                Fetched::Unavailable => any_unavailable = true,
                Fetched::NoData => {}
            }
        }
        let outcome = if any_unavailable {
            Fetched::Unavailable
        } else {
            Fetched::NoData
        };
        Ok((None, outcome))
    }
}
