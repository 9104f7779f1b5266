//! Immutable view state and the reducer that drives it.
//!
//! A [`Session`] is replaced, never mutated: every control change or file load
//! is a [`SessionEvent`] passed to [`Session::reduce`], which returns the next
//! session. The projection is recomputed from the immutable dataset each time
//! [`Session::view`] is called.

use serde::{Deserialize, Serialize};

use std::sync::Arc;

use crate::{Dataset, Metric, Record, Selection, SortOrder, ViewParams, project_view};

/// Identifies one file load so a late result from a superseded load can be
/// recognised and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadToken(uuid::Uuid);

impl LoadToken {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for LoadToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LoadToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    Empty,
    Loading { token: LoadToken },
    Ready,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoadStarted(LoadToken),
    LoadFinished { token: LoadToken, text: String },
    ToggleSection(String),
    SelectOnly(String),
    SelectAll,
    ClearSelection,
    SetMetric(Metric),
    SetOrder(SortOrder),
    SetThreshold(f64),
    SetLogScale(bool),
}

impl SessionEvent {
    fn is_control(&self) -> bool {
        !matches!(self, Self::LoadStarted(_) | Self::LoadFinished { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub status: LoadStatus,
    pub dataset: Option<Arc<Dataset>>,
    pub selection: Selection,
    pub params: ViewParams,
}

/// What the presentation layer should show for the current session.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutput<'a> {
    /// Nothing has been loaded yet.
    NoDataset,
    /// A dataset is loaded but no record passes the selection and threshold.
    NoMatches,
    Records(Vec<&'a Record>),
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ViewParams::default())
    }
}

impl Session {
    /// A NaN threshold in `params` is replaced by the default.
    pub fn new(mut params: ViewParams) -> Self {
        if params.threshold.is_nan() {
            tracing::warn!("ignoring NaN threshold");
            params.threshold = ViewParams::default().threshold;
        }
        Self {
            status: LoadStatus::Empty,
            dataset: None,
            selection: Selection::default(),
            params,
        }
    }

    /// Controls are disabled while a load is pending.
    pub fn controls_enabled(&self) -> bool {
        !matches!(self.status, LoadStatus::Loading { .. })
    }

    /// Message from the most recent failed load, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed { message } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn reduce(&self, event: SessionEvent) -> Session {
        if event.is_control() && !self.controls_enabled() {
            tracing::debug!(?event, "ignoring control event while a load is pending");
            return self.clone();
        }

        let mut next = self.clone();
        match event {
            SessionEvent::LoadStarted(token) => {
                next.status = LoadStatus::Loading { token };
            }
            SessionEvent::LoadFinished { token, text } => {
                let pending = match &self.status {
                    LoadStatus::Loading { token: pending } => Some(*pending),
                    _ => None,
                };
                if pending != Some(token) {
                    tracing::debug!(%token, "discarding result of superseded load");
                    return next;
                }
                match Dataset::parse(&text) {
                    Ok(dataset) => {
                        tracing::info!(
                            records = dataset.len(),
                            sections = dataset.sections.len(),
                            "dataset loaded"
                        );
                        next.selection = Selection::all(dataset.sections.iter().cloned());
                        next.dataset = Some(Arc::new(dataset));
                        next.status = LoadStatus::Ready;
                    }
                    Err(err) => {
                        tracing::warn!("load failed: {err}");
                        next.status = LoadStatus::Failed {
                            message: err.to_string(),
                        };
                    }
                }
            }
            SessionEvent::ToggleSection(name) => {
                if self.knows_section(&name) {
                    next.selection = self.selection.toggled(&name);
                } else {
                    tracing::warn!("unknown section {name:?}");
                }
            }
            SessionEvent::SelectOnly(name) => {
                if self.knows_section(&name) {
                    next.selection = Selection::only(name);
                } else {
                    tracing::warn!("unknown section {name:?}");
                }
            }
            SessionEvent::SelectAll => {
                if let Some(ds) = &self.dataset {
                    next.selection = Selection::all(ds.sections.iter().cloned());
                }
            }
            SessionEvent::ClearSelection => {
                next.selection = Selection::default();
            }
            SessionEvent::SetMetric(metric) => next.params.metric = metric,
            SessionEvent::SetOrder(order) => next.params.order = order,
            SessionEvent::SetThreshold(threshold) => {
                if threshold.is_nan() {
                    tracing::warn!("ignoring NaN threshold");
                } else {
                    next.params.threshold = threshold;
                }
            }
            SessionEvent::SetLogScale(on) => next.params.log_scale = on,
        }
        next
    }

    pub fn view(&self) -> ViewOutput<'_> {
        let Some(ds) = &self.dataset else {
            return ViewOutput::NoDataset;
        };
        let rows = project_view(&ds.records, &self.selection, &self.params);
        if rows.is_empty() {
            ViewOutput::NoMatches
        } else {
            ViewOutput::Records(rows)
        }
    }

    fn knows_section(&self, name: &str) -> bool {
        self.dataset
            .as_ref()
            .is_some_and(|ds| ds.sections.iter().any(|s| s == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: &str = r#"{"profiler": [
        {"Section Name": "A", "Avg Time": 1, "Max Time": 9, "Min Time": 1, "Total Time": 1, "Timeline": [1]},
        {"Section Name": "B", "Avg Time": 5, "Max Time": 2, "Min Time": 5, "Total Time": 5, "Timeline": [5]},
        {"Section Name": "C", "Avg Time": 3, "Max Time": 1, "Min Time": 3, "Total Time": 3, "Timeline": []}
    ]}"#;

    fn loaded(text: &str) -> Session {
        let token = LoadToken::new();
        Session::default()
            .reduce(SessionEvent::LoadStarted(token))
            .reduce(SessionEvent::LoadFinished {
                token,
                text: text.to_string(),
            })
    }

    fn shown(session: &Session) -> Vec<String> {
        match session.view() {
            ViewOutput::Records(rows) => rows.iter().map(|r| r.section_name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn empty_session_has_no_dataset() {
        assert_eq!(Session::default().view(), ViewOutput::NoDataset);
    }

    #[test]
    fn load_selects_every_section() {
        let s = loaded(ABC);
        assert_eq!(s.status, LoadStatus::Ready);
        assert_eq!(s.selection.len(), 3);
        assert_eq!(shown(&s), vec!["B", "C", "A"]);
    }

    #[test]
    fn toggle_recomputes_from_the_full_dataset() {
        let s = loaded(ABC)
            .reduce(SessionEvent::ToggleSection("B".to_string()))
            .reduce(SessionEvent::SetOrder(SortOrder::Asc));
        assert_eq!(shown(&s), vec!["A", "C"]);
        let s = s.reduce(SessionEvent::ToggleSection("B".to_string()));
        assert_eq!(shown(&s), vec!["A", "C", "B"]);
    }

    #[test]
    fn metric_change_reapplies_current_threshold() {
        let s = loaded(ABC).reduce(SessionEvent::SetThreshold(2.0));
        assert_eq!(shown(&s), vec!["B", "C"]);
        let s = s.reduce(SessionEvent::SetMetric(Metric::Max));
        assert_eq!(s.params.threshold, 2.0);
        assert_eq!(shown(&s), vec!["A", "B"]);
    }

    #[test]
    fn no_matches_is_distinct_from_no_dataset() {
        let s = loaded(ABC).reduce(SessionEvent::SetThreshold(100.0));
        assert_eq!(s.view(), ViewOutput::NoMatches);
        let s = loaded(ABC).reduce(SessionEvent::ClearSelection);
        assert_eq!(s.view(), ViewOutput::NoMatches);
    }

    #[test]
    fn select_only_and_select_all() {
        let s = loaded(ABC).reduce(SessionEvent::SelectOnly("C".to_string()));
        assert_eq!(shown(&s), vec!["C"]);
        let s = s.reduce(SessionEvent::SelectAll);
        assert_eq!(shown(&s).len(), 3);
    }

    #[test]
    fn unknown_section_is_ignored() {
        let s = loaded(ABC);
        let t = s.reduce(SessionEvent::ToggleSection("Z".to_string()));
        assert_eq!(s.selection, t.selection);
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let s = loaded(ABC).reduce(SessionEvent::ToggleSection("A".to_string()));
        let token = LoadToken::new();
        let s = s
            .reduce(SessionEvent::LoadStarted(token))
            .reduce(SessionEvent::LoadFinished {
                token,
                text: "{ not json".to_string(),
            });
        assert!(s.error().is_some_and(|m| m.contains("parse error")));
        assert_eq!(s.dataset.as_ref().map(|d| d.len()), Some(3));
        assert!(!s.selection.contains("A"));
        assert_eq!(shown(&s), vec!["B", "C"]);
    }

    #[test]
    fn new_upload_resets_selection() {
        let s = loaded(ABC).reduce(SessionEvent::SelectOnly("A".to_string()));
        let token = LoadToken::new();
        let s = s
            .reduce(SessionEvent::LoadStarted(token))
            .reduce(SessionEvent::LoadFinished {
                token,
                text: r#"{"profiler": [{"Section Name": "X", "Avg Time": 2}]}"#.to_string(),
            });
        assert_eq!(s.selection, Selection::only("X"));
        assert_eq!(shown(&s), vec!["X"]);
    }

    #[test]
    fn controls_are_disabled_while_loading() {
        let token = LoadToken::new();
        let s = loaded(ABC).reduce(SessionEvent::LoadStarted(token));
        assert!(!s.controls_enabled());
        let t = s.reduce(SessionEvent::SetMetric(Metric::Total));
        assert_eq!(t.params.metric, Metric::Avg);
    }

    #[test]
    fn superseded_load_result_is_discarded() {
        let first = LoadToken::new();
        let second = LoadToken::new();
        let s = Session::default()
            .reduce(SessionEvent::LoadStarted(first))
            .reduce(SessionEvent::LoadStarted(second))
            .reduce(SessionEvent::LoadFinished {
                token: first,
                text: ABC.to_string(),
            });
        assert!(s.dataset.is_none());
        assert_eq!(s.status, LoadStatus::Loading { token: second });

        let s = s.reduce(SessionEvent::LoadFinished {
            token: second,
            text: r#"{"profiler": []}"#.to_string(),
        });
        assert_eq!(s.status, LoadStatus::Ready);
        assert_eq!(s.view(), ViewOutput::NoMatches);
    }

    #[test]
    fn nan_threshold_in_initial_params_is_replaced() {
        let params = ViewParams {
            threshold: f64::NAN,
            ..ViewParams::default()
        };
        let s = Session::new(params);
        assert_eq!(s.params.threshold, 0.0);
    }

    #[test]
    fn nan_threshold_is_ignored_and_log_scale_does_not_change_rows() {
        let s = loaded(ABC).reduce(SessionEvent::SetThreshold(f64::NAN));
        assert_eq!(s.params.threshold, 0.0);
        let before = shown(&s);
        let s = s.reduce(SessionEvent::SetLogScale(true));
        assert!(s.params.log_scale);
        assert_eq!(shown(&s), before);
    }
}
