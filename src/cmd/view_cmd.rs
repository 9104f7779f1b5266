//! Dataset view commands (`profview render|chart|show|sections ...`).

use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::{
    BarChart, Config, LoadToken, Metric, ProfviewError, ProfviewResult, ReportSummary, Session,
    SessionEvent, SortOrder, TimelineChart, ViewOutput, render_report,
};

const FILE_HELP: &str = "Profiler JSON file with a top-level `profiler` array.";

#[derive(Debug, Clone, Default, Args)]
pub struct ViewArgs {
    /// Only include this section (repeatable; default is every section).
    #[arg(long = "section", value_name = "NAME")]
    pub sections: Vec<String>,
    /// Metric to filter and sort by.
    #[arg(long)]
    pub metric: Option<Metric>,
    #[arg(long)]
    pub order: Option<SortOrder>,
    /// Inclusive lower bound on the metric value.
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,
    /// Use a logarithmic scale for the metric bar charts.
    #[arg(long)]
    pub log_scale: bool,
}

impl ViewArgs {
    /// Control events equivalent to these flags, applied after loading.
    pub fn events(&self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.sections.is_empty() {
            events.push(SessionEvent::ClearSelection);
            let unique: BTreeSet<&String> = self.sections.iter().collect();
            events.extend(
                unique
                    .into_iter()
                    .map(|name| SessionEvent::ToggleSection(name.clone())),
            );
        }
        if let Some(metric) = self.metric {
            events.push(SessionEvent::SetMetric(metric));
        }
        if let Some(order) = self.order {
            events.push(SessionEvent::SetOrder(order));
        }
        if let Some(threshold) = self.threshold {
            events.push(SessionEvent::SetThreshold(threshold));
        }
        if self.log_scale {
            events.push(SessionEvent::SetLogScale(true));
        }
        events
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Timeline,
}

impl clap::ValueEnum for ChartKind {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Bar, Self::Timeline]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Bar => clap::builder::PossibleValue::new("bar"),
            Self::Timeline => clap::builder::PossibleValue::new("timeline"),
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum ViewCommand {
    /// Write an HTML report with the metric bar charts and the timeline.
    Render {
        #[arg(value_name = "FILE", help = FILE_HELP)]
        file: PathBuf,
        #[arg(long, default_value = "profview-report.html")]
        out: PathBuf,
        #[arg(long, default_value = "Profiler Output Visualization")]
        title: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Render a single chart as SVG.
    Chart {
        #[arg(value_name = "FILE", help = FILE_HELP)]
        file: PathBuf,
        #[arg(long, default_value = "bar")]
        kind: ChartKind,
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the filtered and sorted records.
    Show {
        #[arg(value_name = "FILE", help = FILE_HELP)]
        file: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List distinct section names with their record counts.
    Sections {
        #[arg(value_name = "FILE", help = FILE_HELP)]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowRow {
    pub section: String,
    pub value: f64,
    pub calls: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowOutput {
    pub file: String,
    pub metric: Metric,
    pub order: SortOrder,
    pub threshold: f64,
    pub total: usize,
    pub matched: usize,
    pub rows: Vec<ShowRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionCount {
    pub name: String,
    pub records: usize,
}

pub fn view_command(config: &Config, command: &ViewCommand) -> ProfviewResult<serde_json::Value> {
    match command {
        ViewCommand::Render {
            file,
            out,
            title,
            view,
        } => {
            let session = open_session(config, file, view)?;
            let out_path = config.resolve_out(out);
            write_text(&out_path, &render_report(&session, title))?;
            tracing::info!(path = %out_path.display(), "wrote report");
            Ok(serde_json::json!({
                "out": out_path.to_string_lossy(),
                "report": ReportSummary::of(&session, title),
            }))
        }
        ViewCommand::Chart {
            file,
            kind,
            out,
            view,
        } => {
            let session = open_session(config, file, view)?;
            let rows = match session.view() {
                ViewOutput::Records(rows) => rows,
                ViewOutput::NoDataset | ViewOutput::NoMatches => Vec::new(),
            };
            let svg = match kind {
                ChartKind::Bar => {
                    BarChart::build(&rows, session.params.metric, session.params.log_scale).to_svg()
                }
                ChartKind::Timeline => TimelineChart::build(&rows).to_svg(),
            };
            match out {
                Some(out) => {
                    let out_path = config.resolve_out(out);
                    write_text(&out_path, &svg)?;
                    Ok(serde_json::json!({
                        "kind": kind,
                        "out": out_path.to_string_lossy(),
                        "records": rows.len(),
                    }))
                }
                None => Ok(serde_json::json!({
                    "kind": kind,
                    "records": rows.len(),
                    "svg": svg,
                })),
            }
        }
        ViewCommand::Show { file, limit, view } => {
            Ok(serde_json::to_value(show_command(config, file, *limit, view)?)?)
        }
        ViewCommand::Sections { file } => {
            let session = open_session(config, file, &ViewArgs::default())?;
            let counts = session
                .dataset
                .as_ref()
                .map(|ds| ds.section_counts())
                .unwrap_or_default()
                .into_iter()
                .map(|(name, records)| SectionCount { name, records })
                .collect::<Vec<_>>();
            Ok(serde_json::to_value(counts)?)
        }
    }
}

/// Load `file` into a fresh session and apply the view flags.
pub fn open_session(config: &Config, file: &Path, view: &ViewArgs) -> ProfviewResult<Session> {
    let token = LoadToken::new();
    let session = Session::new(config.view_params()).reduce(SessionEvent::LoadStarted(token));
    let text = std::fs::read_to_string(file)?;
    let session = session.reduce(SessionEvent::LoadFinished { token, text });
    if let Some(err) = session.error() {
        return Err(ProfviewError::Parse(format!("{}: {err}", file.display())));
    }

    if let Some(ds) = &session.dataset {
        if let Some(unknown) = view.sections.iter().find(|s| !ds.sections.contains(*s)) {
            return Err(ProfviewError::InvalidArgument(format!(
                "unknown section {unknown:?} (known: {})",
                ds.sections.join(", ")
            )));
        }
    }

    Ok(view
        .events()
        .into_iter()
        .fold(session, |session, event| session.reduce(event)))
}

/// Projected rows of `file`, truncated to `limit`.
pub fn show_command(
    config: &Config,
    file: &Path,
    limit: Option<usize>,
    view: &ViewArgs,
) -> ProfviewResult<ShowOutput> {
    let session = open_session(config, file, view)?;
    Ok(show_output(&session, file, limit))
}

fn show_output(session: &Session, file: &Path, limit: Option<usize>) -> ShowOutput {
    let metric = session.params.metric;
    let rows = match session.view() {
        ViewOutput::Records(rows) => rows,
        ViewOutput::NoDataset | ViewOutput::NoMatches => Vec::new(),
    };
    let matched = rows.len();
    ShowOutput {
        file: file.to_string_lossy().to_string(),
        metric,
        order: session.params.order,
        threshold: session.params.threshold,
        total: session.dataset.as_ref().map_or(0, |ds| ds.len()),
        matched,
        rows: rows
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|r| ShowRow {
                section: r.section_name.clone(),
                value: r.value(metric),
                calls: r.timeline.len(),
            })
            .collect(),
    }
}

fn write_text(path: &Path, value: &str) -> ProfviewResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, value)?;
    Ok(())
}
