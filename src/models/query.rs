// Range queries against the metrics backend and the reporting window.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Percent,
    Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Identifies one counter on one resource: namespace, metric name and the ordered dimension set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub namespace: &'static str,
    pub metric_name: &'static str,
    pub dimensions: Vec<Dimension>,
    /// `None` omits the unit filter (Windows agent counters).
    pub unit: Option<Unit>,
}

/// Wire form of a range query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub period_seconds: u32,
    pub statistics: Vec<Statistic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl MetricQuery {
    pub fn average(spec: &MetricSpec, window: &Window, period_seconds: u32) -> Self {
        Self {
            namespace: spec.namespace.to_string(),
            metric_name: spec.metric_name.to_string(),
            dimensions: spec.dimensions.clone(),
            start_time: window.start,
            end_time: window.end,
            period_seconds,
            statistics: vec![Statistic::Average],
            unit: spec.unit,
        }
    }
}

/// Report window: start inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }
}

/// A calendar month given on the command line as `MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportMonth {
    month: u32,
    year: i32,
}

impl ReportMonth {
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let invalid = || InputError::InvalidMonth(s.to_string());
        let (month, year) = s.trim().split_once('-').ok_or_else(invalid)?;
        let month: u32 = month.trim().parse().map_err(|_| invalid())?;
        let year: i32 = year.trim().parse().map_err(|_| invalid())?;
        // Validates month range and year bounds in one go.
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self { month, year })
    }

    /// First instant of the month up to the first instant of the next month.
    pub fn window(&self) -> Window {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        Window {
            start: first_instant(self.year, self.month),
            end: first_instant(next_year, next_month),
        }
    }

    /// `MM-YYYY`, as used in folder names.
    pub fn label(&self) -> String {
        format!("{:02}-{}", self.month, self.year)
    }

    /// `YYYY_MM`, as used in the spreadsheet file name.
    pub fn file_stamp(&self) -> String {
        format!("{}_{:02}", self.year, self.month)
    }
}

fn first_instant(year: i32, month: u32) -> DateTime<Utc> {
    // parse() already rejected out-of-range months, and month + 1 wraps at 12.
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_month_and_builds_half_open_window() {
        let m = ReportMonth::parse("02-2024").unwrap();
        let w = m.window();
        assert_eq!(w.start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert!(w.contains(w.start));
        assert!(!w.contains(w.end));
        assert_eq!(m.label(), "02-2024");
        assert_eq!(m.file_stamp(), "2024_02");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let w = ReportMonth::parse("12-2023").unwrap().window();
        assert_eq!(w.end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_malformed_months() {
        for bad in ["2024-02", "13-2024", "00-2024", "ab-2024", "02/2024", ""] {
            assert!(ReportMonth::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
