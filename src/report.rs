//! Standalone HTML report for a session.

use serde::Serialize;

use crate::chart::{escape_xml, format_value};
use crate::{BarChart, Metric, Session, SortOrder, TimelineChart, ViewOutput};

pub const NO_DATASET_MESSAGE: &str = "No dataset loaded.";
pub const NO_MATCHES_MESSAGE: &str = "No records match the current selection and threshold.";

/// Machine-readable summary of what a report contains.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub title: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub fingerprint: Option<String>,
    pub records: usize,
    pub shown: usize,
    pub sections: Vec<String>,
    pub metric: Metric,
    pub order: SortOrder,
    pub threshold: f64,
    #[serde(rename = "logScale")]
    pub log_scale: bool,
    pub error: Option<String>,
}

impl ReportSummary {
    pub fn of(session: &Session, title: &str) -> Self {
        let shown = match session.view() {
            ViewOutput::Records(rows) => rows.len(),
            ViewOutput::NoDataset | ViewOutput::NoMatches => 0,
        };
        Self {
            title: title.to_string(),
            generated_at: now_rfc3339(),
            fingerprint: session.dataset.as_ref().map(|d| d.fingerprint.clone()),
            records: session.dataset.as_ref().map_or(0, |d| d.len()),
            shown,
            sections: session.selection.iter().map(str::to_string).collect(),
            metric: session.params.metric,
            order: session.params.order,
            threshold: session.params.threshold,
            log_scale: session.params.log_scale,
            error: session.error().map(str::to_string),
        }
    }
}

pub fn render_report(session: &Session, title: &str) -> String {
    let summary = ReportSummary::of(session, title);
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>", escape_xml(title)));
    body.push_str(&format!(
        "<p class=\"meta\">generated {} &middot; metric {} &middot; order {} &middot; threshold {} &middot; log scale {}</p>",
        escape_xml(&summary.generated_at),
        summary.metric.label(),
        summary.order.label(),
        format_value(summary.threshold),
        if summary.log_scale { "on" } else { "off" },
    ));
    if let Some(fp) = &summary.fingerprint {
        body.push_str(&format!(
            "<p class=\"meta\">dataset {} &middot; {} records &middot; {} shown</p>",
            escape_xml(fp),
            summary.records,
            summary.shown
        ));
    }
    if let Some(err) = &summary.error {
        body.push_str(&format!(
            "<div class=\"error\">Could not load profiler file: {}</div>",
            escape_xml(err)
        ));
    }

    match session.view() {
        ViewOutput::NoDataset => {
            body.push_str(&format!("<p class=\"empty\">{NO_DATASET_MESSAGE}</p>"));
        }
        ViewOutput::NoMatches => {
            body.push_str(&format!("<p class=\"empty\">{NO_MATCHES_MESSAGE}</p>"));
        }
        ViewOutput::Records(rows) => {
            body.push_str("<div class=\"chart-container\">");
            for metric in Metric::ALL {
                let chart = BarChart::build(&rows, metric, session.params.log_scale);
                body.push_str(&format!(
                    "<figure><figcaption>{}</figcaption>{}</figure>",
                    metric.label(),
                    chart.to_svg()
                ));
            }
            let timeline = TimelineChart::build(&rows);
            body.push_str(&format!(
                "<figure><figcaption>Timeline</figcaption>{}</figure>",
                timeline.to_svg()
            ));
            body.push_str("</div>");
        }
    }

    tracing::debug!(shown = summary.shown, "rendered html report");
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title><style>body{{font-family:ui-sans-serif,system-ui,sans-serif;background:#1f2937;color:#f5f5f5;padding:20px}}.meta{{color:#9ca3af;font-size:13px}}.error{{background:#7f1d1d;padding:10px 14px;border-radius:4px;margin:12px 0}}.empty{{font-style:italic}}.chart-container{{display:flex;flex-wrap:wrap;gap:16px}}figure{{margin:0}}figcaption{{color:#9ca3af;font-size:13px}}</style></head><body>{body}</body></html>",
        escape_xml(title)
    )
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}
