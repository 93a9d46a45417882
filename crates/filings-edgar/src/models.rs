//! EDGAR API response models and flattening.
//!
//! Wire shapes are private; the public types here are what the client hands
//! to callers (and what the cache stores).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::warn;

use filings_core::{Cik, Fact, FactTable, PipelineError, Result};

/// One row of the company-tickers listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickerRecord {
    /// Filer identifier.
    pub cik: Cik,
    /// Ticker symbol.
    pub ticker: String,
    /// Company title as listed.
    pub title: String,
}

/// Summary of an entity's submission history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionHistory {
    /// Company name.
    pub entity_name: String,
    /// SIC industry description, when present.
    pub sic_description: Option<String>,
    /// Exchanges the entity lists on.
    pub exchanges: Vec<String>,
    /// Ticker symbols the entity trades under.
    pub tickers: Vec<String>,
}

/// A parsed API response, as stored in the client cache.
#[derive(Clone, Debug)]
pub enum ParsedResponse {
    /// The global ticker listing.
    Tickers(Vec<TickerRecord>),
    /// One entity's submission history.
    Submissions(SubmissionHistory),
    /// One entity's flattened company facts.
    CompanyFacts(FactTable),
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    cik_str: u64,
    ticker: String,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyFactsResponse {
    cik: u64,
    entity_name: String,
    // BTreeMaps keep flattening order deterministic across runs.
    facts: BTreeMap<String, BTreeMap<String, TagFacts>>,
}

#[derive(Debug, Deserialize)]
struct TagFacts {
    #[serde(default)]
    #[allow(dead_code)]
    label: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    description: Option<String>,
    #[serde(default)]
    units: Option<BTreeMap<String, Vec<FactObservation>>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FactObservation {
    end: String,
    val: f64,
    #[serde(default)]
    accn: Option<String>,
    #[serde(default)]
    fy: Option<i32>,
    #[serde(default)]
    fp: Option<String>,
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    filed: Option<String>,
    #[serde(default)]
    frame: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionsResponse {
    name: String,
    #[serde(default)]
    sic_description: Option<String>,
    #[serde(default)]
    exchanges: Vec<String>,
    #[serde(default)]
    tickers: Vec<String>,
}

// =============================================================================
// Conversions
// =============================================================================

/// Accounting taxonomy whose series the pipeline flattens.
const GAAP_TAXONOMY: &str = "us-gaap";

/// Unit the pipeline keeps; series in other currencies or units are skipped.
const USD_UNIT: &str = "USD";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn tickers_from(value: serde_json::Value) -> Result<Vec<TickerRecord>> {
    let raw: BTreeMap<String, CompanyTickerInfo> = serde_json::from_value(value)
        .map_err(|e| PipelineError::parse("company_tickers", e.to_string()))?;

    let mut records = raw
        .into_values()
        .map(|info| {
            Ok(TickerRecord {
                cik: Cik::new(info.cik_str.to_string())?,
                ticker: info.ticker,
                title: info.title,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    records.sort_by(|a, b| a.cik.as_str().cmp(b.cik.as_str()));
    Ok(records)
}

pub(crate) fn submissions_from(value: serde_json::Value) -> Result<SubmissionHistory> {
    let raw: SubmissionsResponse = serde_json::from_value(value)
        .map_err(|e| PipelineError::parse("submissions", e.to_string()))?;
    Ok(SubmissionHistory {
        entity_name: raw.name,
        sic_description: raw.sic_description,
        exchanges: raw.exchanges,
        tickers: raw.tickers,
    })
}

/// Flattens a company-facts payload into a [`FactTable`].
///
/// Every metric under the entity's GAAP facts contributes its USD series;
/// each observation becomes one [`Fact`] with the entity name and CIK
/// attached and the filing metadata carried through.
pub(crate) fn company_facts_from(
    value: serde_json::Value,
    fetched_at: DateTime<Utc>,
) -> Result<FactTable> {
    let response: CompanyFactsResponse = serde_json::from_value(value)
        .map_err(|e| PipelineError::parse("company_facts", e.to_string()))?;

    let cik = Cik::new(response.cik.to_string())?;
    let gaap = response.facts.get(GAAP_TAXONOMY).ok_or_else(|| {
        PipelineError::parse(
            "company_facts",
            format!("payload has no {GAAP_TAXONOMY} facts"),
        )
    })?;

    let mut facts = Vec::new();
    for (metric, tag) in gaap {
        let Some(units) = &tag.units else { continue };
        let Some(observations) = units.get(USD_UNIT) else {
            continue;
        };
        for obs in observations {
            let Ok(end) = NaiveDate::parse_from_str(&obs.end, DATE_FORMAT) else {
                warn!(metric = %metric, end = %obs.end, "skipping observation with unparsable end date");
                continue;
            };
            let filed = obs
                .filed
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok());
            facts.push(Fact {
                entity_name: response.entity_name.clone(),
                cik: cik.clone(),
                metric: metric.clone(),
                end,
                value: obs.val,
                accession: obs.accn.clone(),
                fiscal_year: obs.fy,
                fiscal_period: obs.fp.clone(),
                form: obs.form.clone(),
                filed,
                frame: obs.frame.clone(),
            });
        }
    }

    Ok(FactTable {
        entity_name: response.entity_name,
        cik,
        fetched_at,
        facts,
    })
}
