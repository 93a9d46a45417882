#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filingsworks/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Fact normalization into ordered annual and quarterly views.
//!
//! One capability, two strategies: [`PeriodNormalizer`] turns a set of facts
//! for one entity into an ordered, period-classified dataset, with
//! [`AnnualNormalizer`] and [`QuarterlyNormalizer`] as the concrete
//! strategies selected by configuration via [`normalizer_for`].
//!
//! The two views deliberately disagree on unparsable period identifiers:
//! the annual view buckets them as full-year rows, the quarterly view drops
//! them. Both behaviors are preserved as-is.

use std::fmt::Debug;

use tracing::debug;

use filings_core::frame::date_column;
use filings_core::{Fact, PeriodType, ReportingPeriod, Result};
use polars::prelude::{Column, DataFrame};

/// Form type that marks an annual report.
pub const ANNUAL_REPORT_FORM: &str = "10-K";

/// A metric filter: one name or a set of names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetricSelection {
    /// Keep a single metric.
    One(String),
    /// Keep any of a set of metrics.
    Many(Vec<String>),
}

impl MetricSelection {
    /// Returns true if `metric` passes the filter.
    #[must_use]
    pub fn contains(&self, metric: &str) -> bool {
        match self {
            Self::One(name) => name == metric,
            Self::Many(names) => names.iter().any(|name| name == metric),
        }
    }
}

impl From<&str> for MetricSelection {
    fn from(metric: &str) -> Self {
        Self::One(metric.to_string())
    }
}

impl From<String> for MetricSelection {
    fn from(metric: String) -> Self {
        Self::One(metric)
    }
}

impl From<&[&str]> for MetricSelection {
    fn from(metrics: &[&str]) -> Self {
        Self::Many(metrics.iter().map(|m| (*m).to_string()).collect())
    }
}

impl From<Vec<String>> for MetricSelection {
    fn from(metrics: Vec<String>) -> Self {
        Self::Many(metrics)
    }
}

/// A fact together with its classified reporting period.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodFact {
    /// The underlying fact.
    pub fact: Fact,
    /// The period the fact was classified into.
    pub period: ReportingPeriod,
}

/// An ordered, period-classified view of an entity's facts.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedFacts {
    basis: PeriodType,
    rows: Vec<PeriodFact>,
}

impl NormalizedFacts {
    /// The basis (annual or quarterly) this view was built with.
    #[must_use]
    pub const fn basis(&self) -> PeriodType {
        self.basis
    }

    /// The classified rows, in (year, quarter) order.
    #[must_use]
    pub fn rows(&self) -> &[PeriodFact] {
        &self.rows
    }

    /// Number of rows in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Materializes the view as a DataFrame.
    ///
    /// Columns are identical for both bases: `EntityName, CIK, Metric, End,
    /// Value, Year, Quarter`. Filing-metadata columns are dropped here.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let entities: Vec<&str> = self
            .rows
            .iter()
            .map(|r| r.fact.entity_name.as_str())
            .collect();
        let ciks: Vec<&str> = self.rows.iter().map(|r| r.fact.cik.as_str()).collect();
        let metrics: Vec<&str> = self.rows.iter().map(|r| r.fact.metric.as_str()).collect();
        let ends: Vec<chrono::NaiveDate> = self.rows.iter().map(|r| r.fact.end).collect();
        let values: Vec<f64> = self.rows.iter().map(|r| r.fact.value).collect();
        let years: Vec<i32> = self.rows.iter().map(|r| r.period.year).collect();
        let quarters: Vec<&str> = self.rows.iter().map(|r| r.period.quarter.as_str()).collect();

        let df = DataFrame::new(vec![
            Column::new("EntityName".into(), entities),
            Column::new("CIK".into(), ciks),
            Column::new("Metric".into(), metrics),
            date_column("End", &ends)?,
            Column::new("Value".into(), values),
            Column::new("Year".into(), years),
            Column::new("Quarter".into(), quarters),
        ])?;
        Ok(df)
    }
}

/// The normalization capability: facts in, ordered classified view out.
pub trait PeriodNormalizer: Send + Sync + Debug {
    /// Name of this strategy, for logging.
    fn name(&self) -> &str;

    /// The basis this strategy classifies into.
    fn basis(&self) -> PeriodType;

    /// Builds the ordered view for the selected metrics.
    fn normalize(&self, facts: &[Fact], metrics: &MetricSelection) -> Result<NormalizedFacts>;
}

/// Annual-report view: 10-K facts only, lenient FY bucketing.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnnualNormalizer;

impl PeriodNormalizer for AnnualNormalizer {
    fn name(&self) -> &str {
        "annual"
    }

    fn basis(&self) -> PeriodType {
        PeriodType::Annual
    }

    /// Keeps facts filed on the annual-report form with a present period
    /// identifier. Identifiers not literally encoding Q1..Q4 are bucketed as
    /// FY rather than dropped, including identifiers too short to carry a
    /// year.
    fn normalize(&self, facts: &[Fact], metrics: &MetricSelection) -> Result<NormalizedFacts> {
        let mut rows: Vec<PeriodFact> = facts
            .iter()
            .filter(|fact| metrics.contains(&fact.metric))
            .filter(|fact| fact.form.as_deref() == Some(ANNUAL_REPORT_FORM))
            .filter_map(|fact| {
                let frame = fact.frame.as_deref().filter(|frame| !frame.is_empty())?;
                Some(PeriodFact {
                    period: ReportingPeriod::parse_lenient(frame),
                    fact: fact.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.period.cmp(&b.period));

        debug!(rows = rows.len(), "built annual view");
        Ok(NormalizedFacts {
            basis: PeriodType::Annual,
            rows,
        })
    }
}

/// Quarterly view: facts with an explicit quarter marker only.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuarterlyNormalizer;

impl PeriodNormalizer for QuarterlyNormalizer {
    fn name(&self) -> &str {
        "quarterly"
    }

    fn basis(&self) -> PeriodType {
        PeriodType::Quarterly
    }

    /// Keeps only facts whose period identifier encodes a literal Q1..Q4
    /// with a readable year; everything else is dropped, never coerced to
    /// FY.
    fn normalize(&self, facts: &[Fact], metrics: &MetricSelection) -> Result<NormalizedFacts> {
        let mut rows: Vec<PeriodFact> = facts
            .iter()
            .filter(|fact| metrics.contains(&fact.metric))
            .filter_map(|fact| {
                let period = fact
                    .frame
                    .as_deref()
                    .and_then(ReportingPeriod::parse_quarterly)?;
                Some(PeriodFact {
                    period,
                    fact: fact.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.period.cmp(&b.period));

        debug!(rows = rows.len(), "built quarterly view");
        Ok(NormalizedFacts {
            basis: PeriodType::Quarterly,
            rows,
        })
    }
}

/// Selects the strategy for a configured period basis.
#[must_use]
pub fn normalizer_for(period_type: PeriodType) -> Box<dyn PeriodNormalizer> {
    match period_type {
        PeriodType::Annual => Box::new(AnnualNormalizer),
        PeriodType::Quarterly => Box::new(QuarterlyNormalizer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filings_core::{Cik, QuarterMark};

    fn fact(metric: &str, year: i32, form: &str, frame: &str) -> Fact {
        let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap();
        let fact = Fact::new(
            "Caterpillar Inc.",
            Cik::new("12927").unwrap(),
            metric,
            end,
            1_000_000.0,
        )
        .with_form(form);
        if frame.is_empty() {
            fact
        } else {
            fact.with_frame(frame)
        }
    }

    #[test]
    fn quarterly_extracts_explicit_quarters() {
        let facts = vec![
            fact("Revenues", 2021, "10-Q", "CY2021Q3"),
            fact("Revenues", 2020, "10-Q", "CY2020Q1"),
            fact("Revenues", 2021, "10-K", "CY2021"),
        ];

        let view = QuarterlyNormalizer
            .normalize(&facts, &MetricSelection::from("Revenues"))
            .unwrap();

        assert_eq!(view.len(), 2);
        assert_eq!(view.rows()[0].period, ReportingPeriod::new(2020, QuarterMark::Q1));
        assert_eq!(view.rows()[1].period, ReportingPeriod::new(2021, QuarterMark::Q3));
    }

    #[test]
    fn quarterly_drops_unparsable_frames_entirely() {
        let facts = vec![
            fact("Revenues", 2021, "10-Q", "CY"),
            fact("Revenues", 2021, "10-Q", ""),
            fact("Revenues", 2021, "10-Q", "CY2021"),
        ];
        let view = QuarterlyNormalizer
            .normalize(&facts, &MetricSelection::from("Revenues"))
            .unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn annual_keeps_only_annual_report_facts_with_frames() {
        let facts = vec![
            fact("Revenues", 2020, "10-K", "CY2020"),
            fact("Revenues", 2021, "10-Q", "CY2021Q1"),
            fact("Revenues", 2021, "10-K", ""),
        ];
        let view = AnnualNormalizer
            .normalize(&facts, &MetricSelection::from("Revenues"))
            .unwrap();

        assert_eq!(view.len(), 1);
        assert_eq!(view.rows()[0].period, ReportingPeriod::new(2020, QuarterMark::Fy));
    }

    #[test]
    fn annual_buckets_non_quarter_frames_as_fy() {
        let facts = vec![
            fact("Revenues", 2020, "10-K", "CY2020Q2"),
            fact("Revenues", 2020, "10-K", "CY2020"),
            fact("Revenues", 2020, "10-K", "CY"),
        ];
        let view = AnnualNormalizer
            .normalize(&facts, &MetricSelection::from("Revenues"))
            .unwrap();

        assert_eq!(view.len(), 3);
        // Short frame sorts first with year 0.
        assert_eq!(view.rows()[0].period, ReportingPeriod::new(0, QuarterMark::Fy));
        assert_eq!(view.rows()[1].period, ReportingPeriod::new(2020, QuarterMark::Q2));
        assert_eq!(view.rows()[2].period, ReportingPeriod::new(2020, QuarterMark::Fy));
    }

    #[test]
    fn sorting_is_idempotent() {
        let facts = vec![
            fact("Revenues", 2021, "10-K", "CY2021"),
            fact("Revenues", 2019, "10-K", "CY2019Q4"),
            fact("Revenues", 2019, "10-K", "CY2019"),
            fact("Revenues", 2020, "10-K", "CY2020Q1"),
        ];
        let selection = MetricSelection::from("Revenues");

        let once = AnnualNormalizer.normalize(&facts, &selection).unwrap();
        let again_input: Vec<Fact> = once.rows().iter().map(|r| r.fact.clone()).collect();
        let twice = AnnualNormalizer.normalize(&again_input, &selection).unwrap();

        let order = |view: &NormalizedFacts| -> Vec<ReportingPeriod> {
            view.rows().iter().map(|r| r.period).collect()
        };
        assert_eq!(order(&once), order(&twice));
    }

    #[test]
    fn metric_selection_filters_one_or_many() {
        let facts = vec![
            fact("Revenues", 2020, "10-K", "CY2020"),
            fact("Assets", 2020, "10-K", "CY2020"),
            fact("NetIncomeLoss", 2020, "10-K", "CY2020"),
        ];

        let one = AnnualNormalizer
            .normalize(&facts, &MetricSelection::from("Assets"))
            .unwrap();
        assert_eq!(one.len(), 1);

        let many = AnnualNormalizer
            .normalize(
                &facts,
                &MetricSelection::from(&["Revenues", "NetIncomeLoss"][..]),
            )
            .unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn both_views_share_one_schema() {
        let facts = vec![
            fact("Revenues", 2020, "10-K", "CY2020"),
            fact("Revenues", 2020, "10-Q", "CY2020Q2"),
        ];
        let selection = MetricSelection::from("Revenues");

        let annual = AnnualNormalizer.normalize(&facts, &selection).unwrap();
        let quarterly = QuarterlyNormalizer.normalize(&facts, &selection).unwrap();

        let annual_df = annual.to_dataframe().unwrap();
        let quarterly_df = quarterly.to_dataframe().unwrap();
        assert_eq!(annual_df.get_column_names(), quarterly_df.get_column_names());

        let names: Vec<&str> = annual_df
            .get_column_names()
            .iter()
            .map(|n| n.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["EntityName", "CIK", "Metric", "End", "Value", "Year", "Quarter"]
        );
    }

    #[test]
    fn strategy_selection_follows_configuration() {
        assert_eq!(normalizer_for(PeriodType::Annual).basis(), PeriodType::Annual);
        assert_eq!(
            normalizer_for(PeriodType::Quarterly).basis(),
            PeriodType::Quarterly
        );
    }
}
