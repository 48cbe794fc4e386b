// SVG charts via plotters. Dates run along an f64 axis of days since the first point.

use std::path::{Path, PathBuf};

use chrono::Duration;
use plotters::prelude::*;

use super::{BarChart, ChartColor, ChartRenderer, LineChart, ensure_dir};
use crate::error::OutputError;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const SECONDS_PER_DAY: f64 = 86_400.0;

impl ChartColor {
    fn rgb(self) -> RGBColor {
        match self {
            ChartColor::Blue => RGBColor(31, 119, 180),
            ChartColor::Green => RGBColor(44, 160, 44),
            ChartColor::Red => RGBColor(214, 39, 40),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChartRenderer;

impl SvgChartRenderer {
    fn target(dir: &Path, stem: &str) -> Result<PathBuf, OutputError> {
        ensure_dir(dir)?;
        Ok(dir.join(format!("{stem}.svg")))
    }
}

fn chart_error(path: &Path) -> impl Fn(&dyn std::fmt::Display) -> OutputError + '_ {
    move |e| OutputError::Chart {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Value range with some headroom; a flat series still gets a visible band.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.1).max(1.0);
    let low = if lo >= 0.0 { (lo - pad).max(0.0) } else { lo - pad };
    (low, hi + pad)
}

fn draw_line(path: &Path, chart: &LineChart) -> Result<(), OutputError> {
    let err = chart_error(path);

    let Some(&(start, _)) = chart.points.first() else {
        return Err(err(&"no points to plot"));
    };
    let points: Vec<(f64, f64)> = chart
        .points
        .iter()
        .map(|(t, v)| ((*t - start).num_seconds() as f64 / SECONDS_PER_DAY, *v))
        .collect();
    let x_max = points.last().map_or(1.0, |p| p.0).max(1.0);
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));
    let color = chart.color.rgb();

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| err(&e))?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 22).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)
        .map_err(|e| err(&e))?;

    let date_label = |x: &f64| {
        (start + Duration::seconds((*x * SECONDS_PER_DAY) as i64))
            .format("%Y-%m-%d")
            .to_string()
    };
    ctx.configure_mesh()
        .x_desc("Date")
        .y_desc(chart.y_label.clone())
        .x_label_formatter(&date_label)
        .draw()
        .map_err(|e| err(&e))?;

    ctx.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
        .map_err(|e| err(&e))?
        .label(chart.legend.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    ctx.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))
        .map_err(|e| err(&e))?;

    ctx.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| err(&e))?;
    root.present().map_err(|e| err(&e))?;
    Ok(())
}

fn draw_bars(path: &Path, chart: &BarChart) -> Result<(), OutputError> {
    let err = chart_error(path);

    if chart.bars.is_empty() {
        return Err(err(&"no bars to plot"));
    }
    let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
    let (_, y_max) = padded_range(chart.bars.iter().map(|b| b.value).chain([0.0]));

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| err(&e))?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 22).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..labels.len() as i32).into_segmented(), 0f64..y_max)
        .map_err(|e| err(&e))?;

    let bar_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .map(|s| s.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(chart.x_label.clone())
        .y_desc(chart.y_label.clone())
        .x_label_formatter(&bar_label)
        .draw()
        .map_err(|e| err(&e))?;

    ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
        let i = i as i32;
        Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), bar.value),
            ],
            bar.color.rgb().filled(),
        )
    }))
    .map_err(|e| err(&e))?;

    root.present().map_err(|e| err(&e))?;
    Ok(())
}

impl ChartRenderer for SvgChartRenderer {
    fn line_chart(&self, dir: &Path, stem: &str, chart: &LineChart) -> Result<PathBuf, OutputError> {
        let path = Self::target(dir, stem)?;
        draw_line(&path, chart)?;
        Ok(path)
    }

    fn bar_chart(&self, dir: &Path, stem: &str, chart: &BarChart) -> Result<PathBuf, OutputError> {
        let path = Self::target(dir, stem)?;
        draw_bars(&path, chart)?;
        Ok(path)
    }
}

/// Used when charts are disabled. Writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChartRenderer;

impl ChartRenderer for NullChartRenderer {
    fn line_chart(&self, dir: &Path, stem: &str, _chart: &LineChart) -> Result<PathBuf, OutputError> {
        Ok(dir.join(stem))
    }

    fn bar_chart(&self, dir: &Path, stem: &str, _chart: &BarChart) -> Result<PathBuf, OutputError> {
        Ok(dir.join(stem))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::output::Bar;

    #[test]
    fn renders_line_chart_to_svg() {
        let dir = tempfile::TempDir::new().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let chart = LineChart {
            title: "CPU Utilization".into(),
            y_label: "Percent".into(),
            legend: "CPU".into(),
            color: ChartColor::Blue,
            points: (0..5)
                .map(|d| (start + Duration::days(d), 40.0 + d as f64))
                .collect(),
        };
        let path = SvgChartRenderer.line_chart(dir.path(), "web_i-1_cpu", &chart).unwrap();
        assert!(path.ends_with("web_i-1_cpu.svg"));
        let svg = std::fs::read_to_string(path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn renders_bar_chart_to_svg() {
        let dir = tempfile::TempDir::new().unwrap();
        let chart = BarChart {
            title: "Network".into(),
            x_label: "Direction".into(),
            y_label: "Mbps".into(),
            bars: vec![
                Bar { label: "In".into(), value: 3.5, color: ChartColor::Blue },
                Bar { label: "Out".into(), value: 1.2, color: ChartColor::Green },
            ],
        };
        let path = SvgChartRenderer.bar_chart(dir.path(), "web_i-1_network", &chart).unwrap();
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }

    #[test]
    fn empty_line_chart_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let chart = LineChart {
            title: "t".into(),
            y_label: "y".into(),
            legend: "l".into(),
            color: ChartColor::Red,
            points: vec![],
        };
        let err = SvgChartRenderer.line_chart(dir.path(), "x", &chart).unwrap_err();
        assert!(matches!(err, OutputError::Chart { .. }));
    }
}
