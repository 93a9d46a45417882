#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filingsworks/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Category-based ratio computation over normalized facts.
//!
//! Seven independent calculators, one per [`Category`], each pivoting the
//! normalized view and deriving named ratios with explicit
//! zero-denominator policies. [`RatioEngine`] runs them individually or as
//! a batch where one category's failure never aborts the rest.

/// The seven category calculators.
pub mod categories;
mod group;

use polars::prelude::DataFrame;
use tracing::warn;

use filings_core::{Category, Result, StockPrices};
use filings_normalize::NormalizedFacts;

pub use categories::{
    assets_liabilities, cash_flow, debt_management, liquidity, market_valuation,
    operational_efficiency, profitability,
};

/// Outcome of one category's computation within a batch.
#[derive(Debug)]
pub struct CategoryResult {
    /// The category that was computed.
    pub category: Category,
    /// The computed dataset, or the error that stopped this category.
    pub outcome: Result<DataFrame>,
}

/// Dispatches normalized facts to the category calculators.
#[derive(Debug, Default)]
pub struct RatioEngine {
    prices: Option<StockPrices>,
}

impl RatioEngine {
    /// Creates an engine without price data; `PE_Ratio` stays null.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects externally-sourced stock prices for the market-valuation
    /// category.
    #[must_use]
    pub fn with_prices(mut self, prices: StockPrices) -> Self {
        self.prices = Some(prices);
        self
    }

    /// Computes one category's dataset.
    pub fn compute(&self, category: Category, view: &NormalizedFacts) -> Result<DataFrame> {
        match category {
            Category::Liquidity => liquidity(view),
            Category::Profitability => profitability(view),
            Category::AssetsLiabilities => assets_liabilities(view),
            Category::CashFlow => cash_flow(view),
            Category::DebtManagement => debt_management(view),
            Category::OperationalEfficiency => operational_efficiency(view),
            Category::MarketValuation => market_valuation(view, self.prices.as_ref()),
        }
    }

    /// Computes every category independently, collecting per-category
    /// outcomes. Failures are logged and never abort the other categories.
    pub fn compute_all(&self, view: &NormalizedFacts) -> Vec<CategoryResult> {
        Category::ALL
            .into_iter()
            .map(|category| {
                let outcome = self.compute(category, view);
                if let Err(err) = &outcome {
                    warn!(category = %category, error = %err, "category computation failed");
                }
                CategoryResult { category, outcome }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filings_core::{Cik, Fact};
    use filings_normalize::{AnnualNormalizer, MetricSelection, PeriodNormalizer};

    fn view() -> NormalizedFacts {
        let end = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();
        let cik = Cik::new("12927").unwrap();
        let facts = vec![
            Fact::new("Caterpillar Inc.", cik.clone(), "AssetsCurrent", end, 500_000_000.0)
                .with_form("10-K")
                .with_frame("CY2022Q4I"),
            Fact::new(
                "Caterpillar Inc.",
                cik,
                "LiabilitiesCurrent",
                end,
                250_000_000.0,
            )
            .with_form("10-K")
            .with_frame("CY2022Q4I"),
        ];
        let metrics: Vec<String> = facts.iter().map(|f| f.metric.clone()).collect();
        AnnualNormalizer
            .normalize(&facts, &MetricSelection::from(metrics))
            .unwrap()
    }

    #[test]
    fn compute_all_covers_every_category() {
        let engine = RatioEngine::new();
        let results = engine.compute_all(&view());

        assert_eq!(results.len(), Category::ALL.len());
        for result in &results {
            // Categories without matching facts still produce (empty) frames.
            assert!(result.outcome.is_ok(), "{} failed", result.category);
        }
    }

    #[test]
    fn compute_dispatches_by_category() {
        let engine = RatioEngine::new();
        let df = engine.compute(Category::Liquidity, &view()).unwrap();
        assert_eq!(df.height(), 1);

        let df = engine.compute(Category::DebtManagement, &view()).unwrap();
        assert_eq!(df.height(), 0);
    }
}
