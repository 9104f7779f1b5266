//! Instrumenting profiler that produces files in the format `profview` reads.
//!
//! Sections nest: [`Profiler::enter_section`] pushes onto a stack and
//! [`Profiler::exit_section`] pops it, recording the elapsed time as one call
//! of that section. [`Profiler::scope`] returns a guard that exits on drop.
//! Every recorded call keeps the source location that closed it.

use serde::{Deserialize, Serialize};

use std::io::Write;
use std::panic::Location;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::{ProfviewError, ProfviewResult, Record};

#[derive(Debug)]
struct OpenSection {
    name: String,
    started: Instant,
}

#[derive(Debug)]
struct Sample {
    name: String,
    elapsed: Duration,
    site: CallSite,
}

#[derive(Debug, Default)]
struct RecorderState {
    open: Vec<OpenSection>,
    samples: Vec<Sample>,
}

/// Source location that closed a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl CallSite {
    fn from_location(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Header row of [`Profiler::write_stats_csv`].
pub const STATS_CSV_HEADER: [&str; 9] = [
    "Section Name",
    "Count",
    "Total Time",
    "Min Time",
    "Max Time",
    "Avg Time",
    "File",
    "Line",
    "Column",
];

#[derive(Debug, Default)]
pub struct Profiler {
    state: Mutex<RecorderState>,
}

/// Aggregated timings of one section, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionStats {
    pub name: String,
    pub count: usize,
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub timeline: Vec<f64>,
    /// Where the most recent call was closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<CallSite>,
}

impl SectionStats {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            count: 0,
            total: 0.0,
            min: f64::MAX,
            max: 0.0,
            avg: 0.0,
            timeline: Vec::new(),
            site: None,
        }
    }

    fn push(&mut self, seconds: f64, site: &CallSite) {
        self.site = Some(site.clone());
        self.count += 1;
        self.total += seconds;
        self.min = self.min.min(seconds);
        self.max = self.max.max(seconds);
        self.avg = self.total / self.count as f64;
        self.timeline.push(seconds);
    }

    pub fn to_record(&self) -> Record {
        Record {
            section_name: self.name.clone(),
            avg_time: serde_json::json!(self.avg),
            max_time: serde_json::json!(self.max),
            min_time: serde_json::json!(self.min),
            total_time: serde_json::json!(self.total),
            timeline: self.timeline.iter().map(|t| serde_json::json!(t)).collect(),
        }
    }
}

/// Serialized form of a profiler run: `{"profiler": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilerReport {
    #[serde(rename = "profiler")]
    pub records: Vec<Record>,
}

impl ProfilerReport {
    pub fn to_json_pretty(&self) -> ProfviewResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> ProfviewResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        tracing::info!(path = %path.display(), sections = self.records.len(), "wrote profiler report");
        Ok(())
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn enter_section(&self, name: &str) {
        self.lock().open.push(OpenSection {
            name: name.to_string(),
            started: Instant::now(),
        });
    }

    /// Close the innermost open section, which must be `name`.
    #[track_caller]
    pub fn exit_section(&self, name: &str) -> ProfviewResult<Duration> {
        self.exit_at(name, Location::caller())
    }

    fn exit_at(&self, name: &str, location: &Location<'_>) -> ProfviewResult<Duration> {
        let stopped = Instant::now();
        let mut state = self.lock();
        let Some(top) = state.open.last() else {
            return Err(ProfviewError::Recorder(format!(
                "exit_section({name:?}) with no open section"
            )));
        };
        if top.name != name {
            return Err(ProfviewError::Recorder(format!(
                "exit_section({name:?}) but innermost open section is {:?}",
                top.name
            )));
        }
        let elapsed = stopped.saturating_duration_since(top.started);
        state.open.pop();
        state.samples.push(Sample {
            name: name.to_string(),
            elapsed,
            site: CallSite::from_location(location),
        });
        Ok(elapsed)
    }

    /// Record an externally measured call of `name`.
    #[track_caller]
    pub fn record(&self, name: &str, elapsed: Duration) {
        let site = CallSite::from_location(Location::caller());
        self.lock().samples.push(Sample {
            name: name.to_string(),
            elapsed,
            site,
        });
    }

    /// Enter `name` until the guard drops. The guard's exit is attributed to
    /// this call site.
    #[track_caller]
    pub fn scope(&self, name: &str) -> SectionGuard<'_> {
        self.enter_section(name);
        SectionGuard {
            profiler: self,
            name: name.to_string(),
            location: Location::caller(),
        }
    }

    /// Names of sections entered but not yet exited, outermost first.
    pub fn open_sections(&self) -> Vec<String> {
        self.lock().open.iter().map(|s| s.name.clone()).collect()
    }

    /// Per-section statistics in first-recorded order.
    pub fn stats(&self) -> Vec<SectionStats> {
        let state = self.lock();
        let mut out: Vec<SectionStats> = Vec::new();
        for sample in &state.samples {
            let idx = match out.iter().position(|s| s.name == sample.name) {
                Some(idx) => idx,
                None => {
                    out.push(SectionStats::new(&sample.name));
                    out.len() - 1
                }
            };
            out[idx].push(sample.elapsed.as_secs_f64(), &sample.site);
        }
        out
    }

    /// Per-section statistics as CSV, one row per section.
    pub fn stats_csv(&self) -> ProfviewResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_stats_rows(&self.stats(), &mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|err| ProfviewError::Recorder(format!("flush stats csv: {err}")))?;
        String::from_utf8(bytes)
            .map_err(|err| ProfviewError::Recorder(format!("stats csv is not utf-8: {err}")))
    }

    pub fn write_stats_csv(&self, path: &Path) -> ProfviewResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stats = self.stats();
        let mut writer = csv::Writer::from_writer(std::fs::File::create(path)?);
        write_stats_rows(&stats, &mut writer)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), sections = stats.len(), "wrote profiler stats csv");
        Ok(())
    }

    pub fn report(&self) -> ProfilerReport {
        let open = self.open_sections();
        if !open.is_empty() {
            tracing::warn!(?open, "building report with sections still open");
        }
        ProfilerReport {
            records: self.stats().iter().map(SectionStats::to_record).collect(),
        }
    }
}

fn write_stats_rows<W: Write>(
    stats: &[SectionStats],
    writer: &mut csv::Writer<W>,
) -> ProfviewResult<()> {
    writer.write_record(STATS_CSV_HEADER)?;
    for s in stats {
        let (file, line, column) = match &s.site {
            Some(site) => (site.file.clone(), site.line.to_string(), site.column.to_string()),
            None => (String::new(), String::new(), String::new()),
        };
        writer.write_record([
            s.name.clone(),
            s.count.to_string(),
            s.total.to_string(),
            s.min.to_string(),
            s.max.to_string(),
            s.avg.to_string(),
            file,
            line,
            column,
        ])?;
    }
    Ok(())
}

/// Exits its section when dropped.
#[derive(Debug)]
pub struct SectionGuard<'a> {
    profiler: &'a Profiler,
    name: String,
    location: &'static Location<'static>,
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.profiler.exit_at(&self.name, self.location) {
            tracing::warn!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dataset, Metric, PROFILER_KEY};

    #[test]
    fn stats_aggregate_recorded_calls() {
        let p = Profiler::new();
        p.record("work", Duration::from_millis(100));
        p.record("io", Duration::from_millis(50));
        p.record("work", Duration::from_millis(300));

        let stats = p.stats();
        assert_eq!(stats.len(), 2);
        let work = &stats[0];
        assert_eq!(work.name, "work");
        assert_eq!(work.count, 2);
        assert!((work.total - 0.4).abs() < 1e-9);
        assert!((work.min - 0.1).abs() < 1e-9);
        assert!((work.max - 0.3).abs() < 1e-9);
        assert!((work.avg - 0.2).abs() < 1e-9);
        assert_eq!(work.timeline.len(), 2);
        assert_eq!(stats[1].name, "io");
    }

    #[test]
    fn nested_sections_and_guards_balance() {
        let p = Profiler::new();
        {
            let _outer = p.scope("outer");
            p.enter_section("inner");
            assert_eq!(p.open_sections(), vec!["outer".to_string(), "inner".to_string()]);
            p.exit_section("inner").expect("exit inner");
        }
        assert!(p.open_sections().is_empty());
        let names: Vec<_> = p.stats().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["inner".to_string(), "outer".to_string()]);
    }

    #[test]
    fn unbalanced_exit_is_an_error() {
        let p = Profiler::new();
        assert!(matches!(p.exit_section("x"), Err(ProfviewError::Recorder(_))));
        p.enter_section("a");
        match p.exit_section("b") {
            Err(ProfviewError::Recorder(msg)) => assert!(msg.contains("\"a\""), "{msg}"),
            other => panic!("expected recorder error, got {other:?}"),
        }
        assert_eq!(p.open_sections(), vec!["a".to_string()]);
    }

    #[test]
    fn exits_record_their_call_site() {
        let p = Profiler::new();
        p.enter_section("manual");
        let exit_line = line!() + 1;
        p.exit_section("manual").expect("exit");
        let scope_line = line!() + 2;
        {
            let _guard = p.scope("guarded");
        }

        let stats = p.stats();
        let manual = stats[0].site.as_ref().expect("manual site");
        assert_eq!(manual.line, exit_line);
        assert!(manual.file.ends_with("recorder.rs"), "{manual}");
        let guarded = stats[1].site.as_ref().expect("guarded site");
        assert_eq!(guarded.line, scope_line);
    }

    #[test]
    fn stats_csv_has_one_row_per_section() {
        let p = Profiler::new();
        p.record("work", Duration::from_millis(100));
        p.record("io", Duration::from_millis(50));
        p.record("work", Duration::from_millis(300));
        let record_line = line!() - 1;

        let text = p.stats_csv().expect("csv");
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let header = reader.headers().expect("header").clone();
        assert_eq!(header.iter().collect::<Vec<_>>(), STATS_CSV_HEADER.to_vec());

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "work");
        assert_eq!(&rows[0][1], "2");
        assert!((rows[0][2].parse::<f64>().expect("total") - 0.4).abs() < 1e-9);
        assert!((rows[0][5].parse::<f64>().expect("avg") - 0.2).abs() < 1e-9);
        assert!(rows[0][6].ends_with("recorder.rs"));
        assert_eq!(rows[0][7].parse::<u32>().expect("line"), record_line);
        assert_eq!(&rows[1][0], "io");
    }

    #[test]
    fn write_stats_csv_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("profview-csv-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("stats.csv");
        let p = Profiler::new();
        p.record("solo", Duration::from_millis(1));
        p.write_stats_csv(&path).expect("write csv");
        let text = std::fs::read_to_string(&path).expect("read csv");
        assert!(text.starts_with("Section Name,Count,"));
        assert!(text.contains("\nsolo,1,"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn report_round_trips_through_ingestion() {
        let p = Profiler::new();
        p.record("solo", Duration::from_millis(7));
        p.record("pair", Duration::from_millis(1));
        p.record("pair", Duration::from_millis(3));

        let text = p.report().to_json_pretty().expect("json");
        assert!(text.contains(&format!("\"{PROFILER_KEY}\"")));
        let ds = Dataset::parse(&text).expect("dataset");
        assert_eq!(ds.sections, vec!["solo".to_string(), "pair".to_string()]);
        assert!((ds.records[1].value(Metric::Avg) - 0.002).abs() < 1e-9);
        assert_eq!(ds.records[0].timeline_points().len(), 1);
    }
}
