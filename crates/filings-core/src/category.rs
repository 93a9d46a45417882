//! Ratio categories and storage kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pseudo-category under which the raw flattened fact table is stored, so
/// every artifact fits the single (entity, kind, category, timestamp) scheme.
pub const RAW_FACTS_CATEGORY: &str = "Company Facts";

/// A named group of related metrics with one or more derived ratios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Current assets vs current liabilities.
    Liquidity,
    /// Income, revenue and margins.
    Profitability,
    /// Total assets, liabilities and equity.
    AssetsLiabilities,
    /// Operating, investing and financing cash flows.
    CashFlow,
    /// Short-term vs long-term debt structure.
    DebtManagement,
    /// Cost structure relative to revenue.
    OperationalEfficiency,
    /// Market capitalization and earnings multiples.
    MarketValuation,
}

impl Category {
    /// All categories, in processing order.
    pub const ALL: [Self; 7] = [
        Self::Liquidity,
        Self::Profitability,
        Self::AssetsLiabilities,
        Self::CashFlow,
        Self::DebtManagement,
        Self::OperationalEfficiency,
        Self::MarketValuation,
    ];

    /// Display name, as used in index sections and artifact names.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Liquidity => "Liquidity",
            Self::Profitability => "Profitability",
            Self::AssetsLiabilities => "Assets Liabilities",
            Self::CashFlow => "Cash Flow",
            Self::DebtManagement => "Debt Management",
            Self::OperationalEfficiency => "Operational Efficiency",
            Self::MarketValuation => "Market Valuation",
        }
    }

    /// Directory form of the name: spaces replaced by underscores.
    #[must_use]
    pub fn dir_name(&self) -> String {
        self.name().replace(' ', "_")
    }

    /// The taxonomy metrics this category pivots on.
    #[must_use]
    pub const fn required_metrics(&self) -> &'static [&'static str] {
        match self {
            Self::Liquidity => &["AssetsCurrent", "LiabilitiesCurrent"],
            Self::Profitability => &["NetIncomeLoss", "Revenues", "OperatingIncomeLoss"],
            Self::AssetsLiabilities => &["Assets", "Liabilities", "StockholdersEquity"],
            Self::CashFlow => &[
                "NetCashProvidedByUsedInOperatingActivities",
                "NetCashProvidedByUsedInInvestingActivities",
                "NetCashProvidedByUsedInFinancingActivities",
            ],
            Self::DebtManagement => &["ShortTermDebt", "LongTermDebt"],
            Self::OperationalEfficiency => &["CostOfGoodsSold", "OperatingExpenses", "Revenues"],
            Self::MarketValuation => &[
                "MarketCapitalization",
                "EarningsPerShareBasic",
                "EarningsPerShareDiluted",
            ],
        }
    }

    /// Resolves a category from its display name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Kind of persisted dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// The flattened fact table as fetched.
    Raw,
    /// Normalized per-category views.
    Preprocessed,
    /// Category outputs with derived ratios.
    Processed,
}

impl StorageKind {
    /// Path segment for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Preprocessed => "preprocessed",
            Self::Processed => "processed",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_names_replace_spaces() {
        assert_eq!(Category::CashFlow.dir_name(), "Cash_Flow");
        assert_eq!(Category::Liquidity.dir_name(), "Liquidity");
        assert_eq!(
            Category::OperationalEfficiency.dir_name(),
            "Operational_Efficiency"
        );
    }

    #[test]
    fn names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.name()), Some(category));
        }
        assert_eq!(Category::from_name("Volatility"), None);
    }

    #[test]
    fn every_category_requires_metrics() {
        for category in Category::ALL {
            assert!(!category.required_metrics().is_empty());
        }
    }
}
