//! Core data types for the filings pipeline.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Cik`] - validated, zero-padded entity identifier
//! - [`Fact`] - one reported value for one metric, entity and period end
//! - [`FactTable`] - all facts fetched for one entity, with provenance
//! - [`StockPrices`] - optional externally-sourced price observations

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};
use crate::frame::{date_column, optional_date_column};

/// A Central Index Key: the canonical numeric filer identifier.
///
/// Always stored zero-padded to 10 digits. Construction rejects anything
/// that is not 1..=10 ASCII digits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cik(String);

impl Cik {
    /// Creates a CIK from a digit string, zero-padding to 10 digits.
    ///
    /// # Errors
    /// Returns [`PipelineError::Configuration`] for empty, non-numeric or
    /// over-long input.
    pub fn new(input: impl AsRef<str>) -> Result<Self> {
        let digits = input.as_ref().trim();
        if digits.is_empty()
            || digits.len() > 10
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PipelineError::Configuration(format!(
                "invalid CIK {digits:?}: expected 1..=10 digits"
            )));
        }
        Ok(Self(format!("{digits:0>10}")))
    }

    /// The zero-padded identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cik {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Cik {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// One reported observation: a value for one metric, one entity, one
/// period-end date, in the reporting currency's base unit.
///
/// Facts carry the full filing metadata the API provides; the normalizer
/// classifies on `form` and `frame` and drops the metadata downstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Display name of the filer.
    pub entity_name: String,
    /// Filer identifier.
    pub cik: Cik,
    /// Taxonomy metric name (e.g. "Assets", "Revenues").
    pub metric: String,
    /// End date of the reporting period.
    pub end: NaiveDate,
    /// Reported value in base currency units.
    pub value: f64,
    /// Accession number of the originating filing.
    pub accession: Option<String>,
    /// Fiscal year of the filing.
    pub fiscal_year: Option<i32>,
    /// Fiscal period code of the filing (e.g. "Q3", "FY").
    pub fiscal_period: Option<String>,
    /// Form type of the filing (e.g. "10-K", "10-Q").
    pub form: Option<String>,
    /// Date the filing was submitted.
    pub filed: Option<NaiveDate>,
    /// Period identifier (e.g. "CY2023Q1").
    pub frame: Option<String>,
}

impl Fact {
    /// Creates a fact with required fields and no filing metadata.
    #[must_use]
    pub fn new(
        entity_name: impl Into<String>,
        cik: Cik,
        metric: impl Into<String>,
        end: NaiveDate,
        value: f64,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            cik,
            metric: metric.into(),
            end,
            value,
            accession: None,
            fiscal_year: None,
            fiscal_period: None,
            form: None,
            filed: None,
            frame: None,
        }
    }

    /// Sets the originating form type.
    #[must_use]
    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Sets the period identifier.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = Some(frame.into());
        self
    }

    /// Sets the accession number.
    #[must_use]
    pub fn with_accession(mut self, accession: impl Into<String>) -> Self {
        self.accession = Some(accession.into());
        self
    }

    /// Sets the fiscal year and period code.
    #[must_use]
    pub fn with_fiscal(mut self, year: i32, period: impl Into<String>) -> Self {
        self.fiscal_year = Some(year);
        self.fiscal_period = Some(period.into());
        self
    }

    /// Sets the filing date.
    #[must_use]
    pub const fn with_filed(mut self, filed: NaiveDate) -> Self {
        self.filed = Some(filed);
        self
    }
}

/// All facts fetched for one entity, plus fetch provenance.
///
/// `fetched_at` is the timestamp of the raw API response that produced the
/// table; every artifact derived from these facts is stamped with it, which
/// both enables cache invalidation and makes re-processing reproducible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactTable {
    /// Display name of the filer.
    pub entity_name: String,
    /// Filer identifier.
    pub cik: Cik,
    /// When the underlying API response was fetched.
    pub fetched_at: DateTime<Utc>,
    /// The flattened facts.
    pub facts: Vec<Fact>,
}

impl FactTable {
    /// Creates a fact table stamped with the current time.
    #[must_use]
    pub fn new(entity_name: impl Into<String>, cik: Cik, facts: Vec<Fact>) -> Self {
        Self {
            entity_name: entity_name.into(),
            cik,
            fetched_at: Utc::now(),
            facts,
        }
    }

    /// Number of facts in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if the table holds no facts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Flattens the table into a DataFrame.
    ///
    /// Columns: `EntityName, CIK, Metric, End, Value, accn, fy, fp, form,
    /// filed, frame` with `End`/`filed` as date columns.
    pub fn to_dataframe(&self) -> Result<polars::prelude::DataFrame> {
        use polars::prelude::*;

        let entities: Vec<&str> = self.facts.iter().map(|f| f.entity_name.as_str()).collect();
        let ciks: Vec<&str> = self.facts.iter().map(|f| f.cik.as_str()).collect();
        let metrics: Vec<&str> = self.facts.iter().map(|f| f.metric.as_str()).collect();
        let ends: Vec<NaiveDate> = self.facts.iter().map(|f| f.end).collect();
        let values: Vec<f64> = self.facts.iter().map(|f| f.value).collect();
        let accns: Vec<Option<&str>> = self.facts.iter().map(|f| f.accession.as_deref()).collect();
        let fys: Vec<Option<i32>> = self.facts.iter().map(|f| f.fiscal_year).collect();
        let fps: Vec<Option<&str>> = self
            .facts
            .iter()
            .map(|f| f.fiscal_period.as_deref())
            .collect();
        let forms: Vec<Option<&str>> = self.facts.iter().map(|f| f.form.as_deref()).collect();
        let fileds: Vec<Option<NaiveDate>> = self.facts.iter().map(|f| f.filed).collect();
        let frames: Vec<Option<&str>> = self.facts.iter().map(|f| f.frame.as_deref()).collect();

        let df = DataFrame::new(vec![
            Column::new("EntityName".into(), entities),
            Column::new("CIK".into(), ciks),
            Column::new("Metric".into(), metrics),
            date_column("End", &ends)?,
            Column::new("Value".into(), values),
            Column::new("accn".into(), accns),
            Column::new("fy".into(), fys),
            Column::new("fp".into(), fps),
            Column::new("form".into(), forms),
            optional_date_column("filed", &fileds)?,
            Column::new("frame".into(), frames),
        ])?;

        Ok(df)
    }
}

/// Externally-sourced stock price observations, keyed by (CIK, date).
///
/// Price data is an optional collaborator: the pipeline never invents a
/// price source, and an absent price propagates as a null ratio downstream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StockPrices {
    prices: HashMap<(Cik, NaiveDate), f64>,
}

impl StockPrices {
    /// Creates an empty price table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a price observation.
    pub fn insert(&mut self, cik: Cik, date: NaiveDate, price: f64) {
        self.prices.insert((cik, date), price);
    }

    /// Looks up a price observation.
    #[must_use]
    pub fn get(&self, cik: &Cik, date: NaiveDate) -> Option<f64> {
        self.prices.get(&(cik.clone(), date)).copied()
    }

    /// Number of recorded observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Returns true if no observations are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cik_pads_to_ten_digits() {
        let cik = Cik::new("320193").unwrap();
        assert_eq!(cik.as_str(), "0000320193");
        assert_eq!(cik.as_str().len(), 10);
    }

    #[test]
    fn cik_rejects_bad_input() {
        assert!(Cik::new("").is_err());
        assert!(Cik::new("AAPL").is_err());
        assert!(Cik::new("123456789012").is_err());
        assert!(Cik::new("12 34").is_err());
    }

    #[test]
    fn fact_table_flattens_to_expected_columns() {
        let cik = Cik::new("12927").unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();
        let facts = vec![
            Fact::new("Caterpillar Inc.", cik.clone(), "Assets", end, 82_793_000_000.0)
                .with_form("10-K")
                .with_frame("CY2022Q4I"),
        ];
        let table = FactTable::new("Caterpillar Inc.", cik, facts);

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "EntityName",
                "CIK",
                "Metric",
                "End",
                "Value",
                "accn",
                "fy",
                "fp",
                "form",
                "filed",
                "frame"
            ]
        );
    }

    #[test]
    fn stock_prices_have_explicit_absence() {
        let cik = Cik::new("12927").unwrap();
        let date = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();

        let mut prices = StockPrices::new();
        assert!(prices.get(&cik, date).is_none());

        prices.insert(cik.clone(), date, 239.56);
        assert_eq!(prices.get(&cik, date), Some(239.56));
    }
}
