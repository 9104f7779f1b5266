//! Bar and timeline chart models rendered to standalone SVG.

use serde::Serialize;

use std::collections::HashMap;

use crate::{Metric, Record};

/// Lower bound of the log scale domain; values at or below zero clamp here.
pub const LOG_FLOOR: f64 = 1e-6;

const WIDTH: f64 = 500.0;
const HEIGHT: f64 = 500.0;
const PLOT_HEIGHT: f64 = 400.0;

/// d3 `schemeSet3`.
const SET3: [&str; 12] = [
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];

/// d3 `schemeCategory10`.
const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const TEXT_FILL: &str = "#f5f5f5";
const AXIS_STROKE: &str = "#9ca3af";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueScale {
    Linear { max: f64 },
    Log { min: f64, max: f64 },
}

impl ValueScale {
    fn for_values(values: impl Iterator<Item = f64>, log: bool) -> Self {
        let max = values.filter(|v| v.is_finite()).fold(f64::NAN, f64::max);
        if log {
            let max = if max.is_nan() || max <= LOG_FLOOR { 1.0 } else { max };
            Self::Log { min: LOG_FLOOR, max }
        } else {
            let max = if max.is_nan() || max <= 0.0 { 1.0 } else { max };
            Self::Linear { max }
        }
    }

    /// Map `value` to a fraction of the axis height in `[0, 1]`.
    pub fn position(&self, value: f64) -> f64 {
        let frac = match *self {
            Self::Linear { max } => value / max,
            Self::Log { min, max } => {
                let v = value.max(min);
                (v.log10() - min.log10()) / (max.log10() - min.log10())
            }
        };
        if frac.is_nan() { 0.0 } else { frac.clamp(0.0, 1.0) }
    }

    pub fn max(&self) -> f64 {
        match *self {
            Self::Linear { max } | Self::Log { max, .. } => max,
        }
    }

    fn ticks(&self) -> Vec<f64> {
        match *self {
            Self::Linear { max } => (0..=5_i32).map(|i| max * f64::from(i) / 5.0).collect(),
            Self::Log { min, max } => {
                let lo = min.log10().floor() as i32;
                let hi = max.log10().ceil() as i32;
                (lo..=hi)
                    .map(|e| 10f64.powi(e))
                    .filter(|v| *v >= min && *v <= max * 1.000_001)
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub metric: Metric,
    pub label: &'static str,
    pub scale: ValueScale,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn build(records: &[&Record], metric: Metric, log_scale: bool) -> Self {
        let bars = records
            .iter()
            .enumerate()
            .map(|(i, r)| Bar {
                label: r.section_name.clone(),
                value: r.value(metric),
                color: SET3[i % SET3.len()],
            })
            .collect::<Vec<_>>();
        let scale = ValueScale::for_values(bars.iter().map(|b| b.value), log_scale);
        Self {
            metric,
            label: metric.label(),
            scale,
            bars,
        }
    }

    pub fn to_svg(&self) -> String {
        let (left, top, bottom, right) = (70.0, 40.0, 80.0, 30.0);
        let width = WIDTH - left - right;
        let height = PLOT_HEIGHT - top - bottom;
        let band = if self.bars.is_empty() {
            width
        } else {
            width / self.bars.len() as f64
        };
        let pad = band * 0.1;

        let mut out = svg_open();
        out.push_str(&format!(r#"<g transform="translate({left},{top})">"#));
        for (i, bar) in self.bars.iter().enumerate() {
            let h = self.scale.position(bar.value) * height;
            let x = i as f64 * band + pad / 2.0;
            out.push_str(&format!(
                r#"<rect class="bar" x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}"><title>{title}</title></rect>"#,
                y = height - h,
                w = band - pad,
                fill = bar.color,
                title = escape_xml(&format!("{}: {}", bar.label, format_value(bar.value))),
            ));
            out.push_str(&format!(
                r#"<text x="{tx:.2}" y="{ty:.2}" fill="{TEXT_FILL}" font-size="10" text-anchor="end" transform="rotate(-45 {tx:.2} {ty:.2})">{label}</text>"#,
                tx = x + (band - pad) / 2.0,
                ty = height + 12.0,
                label = escape_xml(&bar.label),
            ));
        }
        push_y_axis(&mut out, &self.scale, height);
        push_x_axis(&mut out, width, height);
        out.push_str("</g>");
        out.push_str(&format!(
            r#"<text text-anchor="middle" x="{x}" y="{y}" fill="{TEXT_FILL}" transform="rotate(-90 {x} {y})">{label}</text>"#,
            x = left / 2.0 - 10.0,
            y = top + height / 2.0,
            label = escape_xml(self.label),
        ));
        out.push_str("</svg>");
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum SeriesShape {
    /// Two or more points joined by a line.
    Line(Vec<(usize, f64)>),
    /// A single point drawn as a marker.
    Marker((usize, f64)),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSeries {
    pub name: String,
    pub color: &'static str,
    pub shape: SeriesShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineChart {
    pub max_call: usize,
    pub max_time: f64,
    pub series: Vec<TimelineSeries>,
}

impl TimelineChart {
    /// Records with an empty timeline are left out.
    pub fn build(records: &[&Record]) -> Self {
        let mut palette: HashMap<&str, &'static str> = HashMap::new();
        let mut series = Vec::new();
        for record in records {
            let next = CATEGORY10[palette.len() % CATEGORY10.len()];
            let color = *palette.entry(record.section_name.as_str()).or_insert(next);
            let mut points = record.timeline_points();
            let shape = match points.len() {
                0 => continue,
                1 => SeriesShape::Marker(points.remove(0)),
                _ => SeriesShape::Line(points),
            };
            series.push(TimelineSeries {
                name: record.section_name.clone(),
                color,
                shape,
            });
        }

        let points = || {
            series.iter().flat_map(|s| match &s.shape {
                SeriesShape::Line(points) => points.clone(),
                SeriesShape::Marker(p) => vec![*p],
            })
        };
        let max_call = points().map(|(call, _)| call).max().unwrap_or(0).max(2);
        let max_time = points().map(|(_, t)| t).filter(|t| t.is_finite()).fold(0.0, f64::max);
        let max_time = if max_time > 0.0 { max_time } else { 1.0 };

        Self {
            max_call,
            max_time,
            series,
        }
    }

    pub fn to_svg(&self) -> String {
        let (left, top, bottom, right) = (80.0, 40.0, 80.0, 30.0);
        let width = WIDTH - left - right;
        let height = PLOT_HEIGHT - top - bottom;
        let x = |call: usize| (call as f64 - 1.0) / (self.max_call as f64 - 1.0) * width;
        let y = |time: f64| height - (time / self.max_time).clamp(0.0, 1.0) * height;

        let mut out = svg_open();
        out.push_str(&format!(r#"<g transform="translate({left},{top})">"#));
        for s in &self.series {
            match &s.shape {
                SeriesShape::Line(points) => {
                    let d = points
                        .iter()
                        .enumerate()
                        .map(|(i, (call, time))| {
                            let cmd = if i == 0 { 'M' } else { 'L' };
                            format!("{cmd}{:.2},{:.2}", x(*call), y(*time))
                        })
                        .collect::<String>();
                    out.push_str(&format!(
                        r#"<path class="line" d="{d}" fill="none" stroke="{}" stroke-width="2"/>"#,
                        s.color
                    ));
                }
                SeriesShape::Marker((call, time)) => {
                    out.push_str(&format!(
                        r#"<circle cx="{:.2}" cy="{:.2}" r="4" fill="{}"/>"#,
                        x(*call),
                        y(*time),
                        s.color
                    ));
                }
            }
        }
        for (i, s) in self.series.iter().enumerate() {
            let ly = i as f64 * 20.0;
            out.push_str(&format!(
                r#"<g class="legend" transform="translate(10,{ly})"><rect x="{rx}" width="18" height="18" fill="{color}"/><text x="{tx}" y="9" dy=".35em" text-anchor="end" fill="{TEXT_FILL}">{name}</text></g>"#,
                rx = width - 18.0,
                tx = width - 24.0,
                color = s.color,
                name = escape_xml(&s.name),
            ));
        }
        push_y_axis(&mut out, &ValueScale::Linear { max: self.max_time }, height);
        push_x_axis(&mut out, width, height);
        for i in 0..=4_i32 {
            let call = 1.0 + (self.max_call as f64 - 1.0) * f64::from(i) / 4.0;
            out.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" fill="{TEXT_FILL}" font-size="10" text-anchor="middle">{}</text>"#,
                (call - 1.0) / (self.max_call as f64 - 1.0) * width,
                height + 16.0,
                format_value(call),
            ));
        }
        out.push_str("</g>");
        out.push_str(&format!(
            r#"<text text-anchor="middle" x="{}" y="{}" fill="{TEXT_FILL}">Number of Executions</text>"#,
            width / 2.0 + left,
            height + top + 50.0,
        ));
        out.push_str(&format!(
            r#"<text text-anchor="middle" x="{x}" y="{y}" fill="{TEXT_FILL}" transform="rotate(-90 {x} {y})">Total Time</text>"#,
            x = left / 3.0,
            y = top + height / 2.0,
        ));
        out.push_str("</svg>");
        out
    }
}

fn svg_open() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    )
}

fn push_y_axis(out: &mut String, scale: &ValueScale, height: f64) {
    out.push_str(&format!(
        r#"<line x1="0" y1="0" x2="0" y2="{height}" stroke="{AXIS_STROKE}"/>"#
    ));
    for tick in scale.ticks() {
        let ty = height - scale.position(tick) * height;
        out.push_str(&format!(
            r#"<text x="-6" y="{ty:.2}" fill="{TEXT_FILL}" font-size="10" text-anchor="end" dy=".32em">{}</text>"#,
            format_value(tick)
        ));
    }
}

fn push_x_axis(out: &mut String, width: f64, height: f64) {
    out.push_str(&format!(
        r#"<line x1="0" y1="{height}" x2="{width}" y2="{height}" stroke="{AXIS_STROKE}"/>"#
    ));
}

pub(crate) fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value != 0.0 && (value.abs() < 1e-3 || value.abs() >= 1e6) {
        return format!("{value:.2e}");
    }
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
