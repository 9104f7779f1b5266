//! Filter-then-sort projection of a dataset into the displayed sequence.

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

use crate::{Metric, Record, Selection, SortOrder};

/// Parameters that shape the projection and its presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    pub metric: Metric,
    pub order: SortOrder,
    /// Inclusive lower bound on the metric value.
    pub threshold: f64,
    /// Presentation only; never affects [`project`].
    pub log_scale: bool,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            metric: Metric::Avg,
            order: SortOrder::Desc,
            threshold: 0.0,
            log_scale: false,
        }
    }
}

/// Keep records in `selection` whose `metric` value is `>= threshold`, then
/// stable-sort them by that value.
///
/// Non-numeric values coerce to NaN and fail the threshold comparison, so
/// they never reach the sort. Equal keys keep dataset order.
pub fn project<'a>(
    records: &'a [Record],
    selection: &Selection,
    metric: Metric,
    order: SortOrder,
    threshold: f64,
) -> Vec<&'a Record> {
    let mut rows: Vec<(f64, &Record)> = records
        .iter()
        .filter(|r| selection.contains(&r.section_name))
        .map(|r| (r.value(metric), r))
        .filter(|(value, _)| *value >= threshold)
        .collect();

    rows.sort_by(|(a, _), (b, _)| {
        let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    rows.into_iter().map(|(_, r)| r).collect()
}

pub fn project_view<'a>(
    records: &'a [Record],
    selection: &Selection,
    params: &ViewParams,
) -> Vec<&'a Record> {
    project(
        records,
        selection,
        params.metric,
        params.order,
        params.threshold,
    )
}
