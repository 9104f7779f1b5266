//! Instrumented sample workload (`profview demo`).

use clap::Args;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use std::path::PathBuf;

use crate::{Config, Profiler, ProfviewResult};

#[derive(Debug, Clone, Args)]
pub struct DemoArgs {
    /// Where to write the profiler JSON.
    #[arg(long, default_value = "profiler.json")]
    pub out: PathBuf,
    /// Number of random angles to evaluate.
    #[arg(long, default_value_t = 1000)]
    pub entries: usize,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Also write per-section statistics as CSV.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoSection {
    pub name: String,
    pub calls: usize,
    #[serde(rename = "totalSecs")]
    pub total_secs: f64,
    #[serde(rename = "avgSecs")]
    pub avg_secs: f64,
    /// `file:line:column` of the exit that closed the last call.
    pub site: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoOutput {
    pub out: String,
    pub entries: usize,
    pub seed: u64,
    #[serde(rename = "biggestCosPlusSin")]
    pub biggest: f32,
    pub sections: Vec<DemoSection>,
    pub csv: Option<String>,
}

pub fn demo_command(config: &Config, args: &DemoArgs) -> ProfviewResult<serde_json::Value> {
    let profiler = Profiler::new();
    let biggest = trig_workload(&profiler, args.entries, args.seed)?;

    let out_path = config.resolve_out(&args.out);
    profiler.report().write_json(&out_path)?;
    let csv_path = args.csv.as_deref().map(|p| config.resolve_out(p));
    if let Some(path) = &csv_path {
        profiler.write_stats_csv(path)?;
    }

    let sections = profiler
        .stats()
        .into_iter()
        .map(|s| DemoSection {
            name: s.name,
            calls: s.count,
            total_secs: s.total,
            avg_secs: s.avg,
            site: s.site.map(|site| site.to_string()),
        })
        .collect();
    Ok(serde_json::to_value(DemoOutput {
        out: out_path.to_string_lossy().to_string(),
        entries: args.entries,
        seed: args.seed,
        biggest,
        sections,
        csv: csv_path.map(|p| p.to_string_lossy().to_string()),
    })?)
}

/// Time random-angle generation and a per-angle `cos + sin` maximum search.
pub fn trig_workload(profiler: &Profiler, entries: usize, seed: u64) -> ProfviewResult<f32> {
    let _whole = profiler.scope("Test 2 Speed Test");
    profiler.enter_section("Trig Speed Test");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    profiler.enter_section("Random Angle Generation");
    let yaw_degrees = (0..entries)
        .map(|_| 360.0 * (rng.next_u32() as f32 / u32::MAX as f32))
        .collect::<Vec<_>>();
    profiler.exit_section("Random Angle Generation")?;

    let mut biggest = 0.0_f32;
    profiler.enter_section("Total Cos and Sin Compute");
    for yaw in &yaw_degrees {
        let (sin, cos) = yaw.to_radians().sin_cos();
        profiler.enter_section("Cos and Sin Compute");
        if cos + sin > biggest {
            biggest = cos + sin;
        }
        profiler.exit_section("Cos and Sin Compute")?;
    }
    profiler.exit_section("Total Cos and Sin Compute")?;
    profiler.exit_section("Trig Speed Test")?;

    tracing::debug!(entries, biggest, "trig workload finished");
    Ok(biggest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dataset, Metric};

    #[test]
    fn workload_records_every_section() {
        let profiler = Profiler::new();
        let biggest = trig_workload(&profiler, 50, 7).expect("workload");
        assert!(biggest > 0.0 && biggest <= std::f32::consts::SQRT_2 + 1e-4);

        let stats = profiler.stats();
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Random Angle Generation",
                "Cos and Sin Compute",
                "Total Cos and Sin Compute",
                "Trig Speed Test",
                "Test 2 Speed Test",
            ]
        );
        assert_eq!(stats[1].count, 50);
        assert!(profiler.open_sections().is_empty());
    }

    #[test]
    fn same_seed_gives_same_result() {
        let a = trig_workload(&Profiler::new(), 200, 42).expect("a");
        let b = trig_workload(&Profiler::new(), 200, 42).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn demo_writes_a_loadable_file() {
        let dir = std::env::temp_dir().join(format!("profview-demo-{}", uuid::Uuid::new_v4()));
        let cfg = Config {
            out_dir: dir.clone(),
            ..Config::default()
        };
        let args = DemoArgs {
            out: PathBuf::from("profiler.json"),
            entries: 10,
            seed: 1,
            csv: Some(PathBuf::from("stats.csv")),
        };
        let out = demo_command(&cfg, &args).expect("demo");
        assert_eq!(out["entries"], 10);
        assert!(out["sections"][0]["site"]
            .as_str()
            .is_some_and(|site| site.contains("demo_cmd.rs")));

        let ds = Dataset::load(&dir.join("profiler.json")).expect("dataset");
        assert_eq!(ds.sections.len(), 5);
        let per_call = ds
            .records
            .iter()
            .find(|r| r.section_name == "Cos and Sin Compute")
            .expect("per-call section");
        assert_eq!(per_call.timeline.len(), 10);
        assert!(per_call.value(Metric::Total) >= 0.0);

        let csv_text = std::fs::read_to_string(dir.join("stats.csv")).expect("stats csv");
        assert!(csv_text.starts_with("Section Name,Count,Total Time"));
        assert_eq!(csv_text.lines().count(), 6);
        assert!(csv_text.contains("\nCos and Sin Compute,10,"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
