//! `profview.toml` config loading.

use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};

use crate::{Metric, ProfviewResult, SortOrder, ViewParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Directory that relative output paths are resolved against.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Initial view parameters, before any CLI overrides.
    #[serde(default)]
    pub view: ViewDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ViewDefaults {
    #[serde(default = "default_metric")]
    pub metric: Metric,
    #[serde(default = "default_order")]
    pub order: SortOrder,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub log_scale: bool,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_metric() -> Metric {
    Metric::Avg
}

fn default_order() -> SortOrder {
    SortOrder::Desc
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            metric: default_metric(),
            order: default_order(),
            threshold: 0.0,
            log_scale: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            view: ViewDefaults::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> ProfviewResult<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::parse(&s)
    }

    /// Parse config text. A non-finite `view.threshold` falls back to the
    /// default with a warning.
    pub fn parse(text: &str) -> ProfviewResult<Self> {
        let mut cfg = toml::from_str::<Config>(text)?;
        if !cfg.view.threshold.is_finite() {
            tracing::warn!(
                threshold = cfg.view.threshold,
                "ignoring non-finite view.threshold in config"
            );
            cfg.view.threshold = ViewDefaults::default().threshold;
        }
        Ok(cfg)
    }

    pub fn load_optional(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(crate::ProfviewError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(err) => {
                tracing::warn!("failed to load config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn view_params(&self) -> ViewParams {
        ViewParams {
            metric: self.view.metric,
            order: self.view.order,
            threshold: self.view.threshold,
            log_scale: self.view.log_scale,
        }
    }

    pub fn resolve_out(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.out_dir.join(path)
        }
    }
}
