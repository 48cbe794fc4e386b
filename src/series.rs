// Series normalization: summary aggregates over a raw series and the daily, gap-filled
// resampling used for charts. Pure functions; the fetcher hands in sorted series.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DailySeries, RawSeries, SummaryStats};

pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Mean, extrema and 95th percentile of the series values. `None` for an empty series.
pub fn summarize(series: &RawSeries) -> Option<SummaryStats> {
    if series.is_empty() {
        return None;
    }

    let values: Vec<f64> = series.values().collect();
    let average = mean_f64(&values);
    let minimum = values.iter().copied().fold(f64::INFINITY, f64::min);
    let maximum = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut sorted = values;
    sorted.sort_by(f64::total_cmp);
    let p95 = percentile(&sorted, 95.0);

    Some(SummaryStats {
        average,
        minimum,
        maximum,
        p95,
    })
}

/// Linear-interpolation percentile over ascending `sorted` values (rank = q/100 * (n - 1)).
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Daily means over `[first day, last day]`, with days lacking samples linearly
/// interpolated from the nearest known days on either side.
///
/// Fewer than two distinct days yields an empty series, so two samples on the same
/// day produce nothing to chart.
pub fn resample(series: &RawSeries) -> DailySeries {
    let mut buckets: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for s in series.samples() {
        let entry = buckets.entry(s.timestamp.date_naive()).or_insert((0.0, 0));
        entry.0 += s.value;
        entry.1 += 1;
    }
    if buckets.len() < 2 {
        return DailySeries::default();
    }

    let known: Vec<(NaiveDate, f64)> = buckets
        .into_iter()
        .map(|(day, (sum, count))| (day, sum / count as f64))
        .collect();

    let mut points = Vec::new();
    for pair in known.windows(2) {
        let (start_day, start_value) = pair[0];
        let (end_day, end_value) = pair[1];
        let span = (end_day - start_day).num_days() as f64;
        for (offset, day) in start_day.iter_days().take_while(|d| *d < end_day).enumerate() {
            let value = if offset == 0 {
                start_value
            } else {
                start_value + (end_value - start_value) * (offset as f64 / span)
            };
            points.push((day, value));
        }
    }
    if let Some(last) = known.last() {
        points.push(*last);
    }

    DailySeries::from_points(points)
}

pub fn bytes_to_mbps(bytes: f64) -> f64 {
    bytes / BYTES_PER_MEGABYTE
}

fn mean_f64(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / (v.len() as f64)
}
