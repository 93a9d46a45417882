//! Pivot scaffolding shared by the category calculators.
//!
//! Facts are grouped by (entity, CIK, period end); each group accumulates
//! per-metric sums and observation counts so categories can choose between
//! summed monetary totals and per-share means.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use polars::prelude::Column;

use filings_core::frame::date_column;
use filings_core::{Cik, Result, quarter_label};
use filings_normalize::NormalizedFacts;

/// Scale divisor from base currency units to millions.
pub(crate) const MILLION: f64 = 1_000_000.0;

/// One output row's identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct GroupKey {
    pub(crate) entity: String,
    pub(crate) cik: Cik,
    pub(crate) end: NaiveDate,
}

/// Per-metric accumulator within one group.
#[derive(Debug, Default)]
pub(crate) struct MetricAccum {
    observations: HashMap<String, (f64, u32)>,
}

impl MetricAccum {
    fn add(&mut self, metric: &str, value: f64) {
        let entry = self
            .observations
            .entry(metric.to_string())
            .or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    /// Sum of observations; 0.0 when the metric is absent from the group.
    pub(crate) fn total(&self, metric: &str) -> f64 {
        self.observations.get(metric).map_or(0.0, |(sum, _)| *sum)
    }

    /// Sum scaled to millions.
    pub(crate) fn total_millions(&self, metric: &str) -> f64 {
        self.total(metric) / MILLION
    }

    /// Mean of observations; `None` when the metric is absent.
    pub(crate) fn mean(&self, metric: &str) -> Option<f64> {
        self.observations
            .get(metric)
            .map(|(sum, count)| sum / f64::from(*count))
    }
}

/// Groups a normalized view by (entity, CIK, period end), keeping only the
/// listed metrics. The BTreeMap ordering makes output rows ascend by
/// entity, CIK and period end.
pub(crate) fn pivot(view: &NormalizedFacts, metrics: &[&str]) -> BTreeMap<GroupKey, MetricAccum> {
    let mut groups: BTreeMap<GroupKey, MetricAccum> = BTreeMap::new();
    for row in view.rows() {
        let fact = &row.fact;
        if !metrics.contains(&fact.metric.as_str()) {
            continue;
        }
        let key = GroupKey {
            entity: fact.entity_name.clone(),
            cik: fact.cik.clone(),
            end: fact.end,
        };
        groups.entry(key).or_default().add(&fact.metric, fact.value);
    }
    groups
}

/// Rounds to 2 decimal places, applied only when output columns are built.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Optional variant of [`round2`].
pub(crate) fn round2_opt(value: Option<f64>) -> Option<f64> {
    value.map(round2)
}

/// Ratio guarded against non-positive denominators.
pub(crate) fn ratio_if_positive(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

/// The identity columns every category output starts and ends with.
pub(crate) struct KeyColumns {
    entities: Vec<String>,
    ciks: Vec<String>,
    ends: Vec<NaiveDate>,
    quarters: Vec<String>,
}

impl KeyColumns {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            ciks: Vec::with_capacity(capacity),
            ends: Vec::with_capacity(capacity),
            quarters: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, key: &GroupKey) {
        self.entities.push(key.entity.clone());
        self.ciks.push(key.cik.as_str().to_string());
        self.ends.push(key.end);
        self.quarters.push(quarter_label(key.end));
    }

    /// `EntityName`, `CIK` and `End` columns, in output order.
    pub(crate) fn prefix_columns(&self) -> Result<Vec<Column>> {
        Ok(vec![
            Column::new("EntityName".into(), &self.entities),
            Column::new("CIK".into(), &self.ciks),
            date_column("End", &self.ends)?,
        ])
    }

    /// The trailing `Quarter` label column.
    pub(crate) fn quarter_column(&self) -> Column {
        Column::new("Quarter".into(), &self.quarters)
    }
}
