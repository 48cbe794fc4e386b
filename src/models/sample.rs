// Time series as returned by the metrics backend, and the shapes derived from it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One backend datapoint: the per-period average at `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub average: Option<f64>,
}

impl Datapoint {
    pub fn average(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            average: Some(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Samples sorted ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    samples: Vec<Sample>,
}

impl RawSeries {
    pub fn from_samples(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    /// Builds a series from the per-period averages. Datapoints without an average are dropped.
    pub fn from_datapoints(points: &[Datapoint]) -> Self {
        Self::from_samples(
            points
                .iter()
                .filter_map(|p| {
                    p.average.map(|value| Sample {
                        timestamp: p.timestamp,
                        value,
                    })
                })
                .collect(),
        )
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Applies `f` to every value, keeping timestamps (e.g. bytes -> Mbps).
    pub fn map_values(mut self, f: impl Fn(f64) -> f64) -> Self {
        for s in &mut self.samples {
            s.value = f(s.value);
        }
        self
    }
}

/// Aggregates over one raw series. Absent (not zero) when the series is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub p95: f64,
}

/// One value per calendar day, no gaps between the first and last day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DailySeries {
    pub(crate) fn from_points(points: Vec<(NaiveDate, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }
}
