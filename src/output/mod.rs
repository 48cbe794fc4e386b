// Report artifacts: spreadsheet writers and chart rendering.

mod chart;
mod csv;
mod xlsx;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveTime, Utc};

use crate::error::OutputError;
use crate::models::{DailySeries, RawSeries, ReportRow, Section};

pub use chart::{NullChartRenderer, SvgChartRenderer};
pub use csv::CsvSheetWriter;
pub use xlsx::XlsxSheetWriter;

/// Writes the assembled sections; returns the files it created.
pub trait SheetWriter: Send + Sync {
    fn write(
        &self,
        dir: &Path,
        stem: &str,
        sections: &[(Section, Vec<ReportRow>)],
    ) -> Result<Vec<PathBuf>, OutputError>;
}

/// Renders one chart into `dir/<stem>.<ext>`; returns the written path.
pub trait ChartRenderer: Send + Sync {
    fn line_chart(&self, dir: &Path, stem: &str, chart: &LineChart) -> Result<PathBuf, OutputError>;

    fn bar_chart(&self, dir: &Path, stem: &str, chart: &BarChart) -> Result<PathBuf, OutputError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartColor {
    Blue,
    Green,
    Red,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub y_label: String,
    pub legend: String,
    pub color: ChartColor,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

impl LineChart {
    /// One point per day at midnight.
    pub fn daily(
        title: impl Into<String>,
        y_label: impl Into<String>,
        legend: impl Into<String>,
        color: ChartColor,
        series: &DailySeries,
    ) -> Self {
        Self {
            title: title.into(),
            y_label: y_label.into(),
            legend: legend.into(),
            color,
            points: series
                .points()
                .iter()
                .map(|(d, v)| (d.and_time(NaiveTime::MIN).and_utc(), *v))
                .collect(),
        }
    }

    /// The raw samples as returned by the backend.
    pub fn raw(
        title: impl Into<String>,
        y_label: impl Into<String>,
        legend: impl Into<String>,
        color: ChartColor,
        series: &RawSeries,
    ) -> Self {
        Self {
            title: title.into(),
            y_label: y_label.into(),
            legend: legend.into(),
            color,
            points: series
                .samples()
                .iter()
                .map(|s| (s.timestamp, s.value))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: ChartColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}
