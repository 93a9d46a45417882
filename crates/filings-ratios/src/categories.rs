//! The seven category calculators.
//!
//! Each calculator pivots the normalized view so its required metrics become
//! columns keyed by (entity, CIK, period end), scales monetary totals to
//! millions, and derives the category's named ratios. Monetary values are
//! rounded to 2 decimals only while output columns are built; ratios are
//! computed from the unrounded figures.

use polars::prelude::{Column, DataFrame};

use filings_core::{Category, Result, StockPrices};
use filings_normalize::NormalizedFacts;

use crate::group::{KeyColumns, pivot, ratio_if_positive, round2, round2_opt};

/// Liquidity: current assets against current liabilities.
///
/// Fill policy: a group with either metric present yields a row; a missing
/// metric totals 0.0. `CurrentRatio` is null when current liabilities are
/// not positive.
pub fn liquidity(view: &NormalizedFacts) -> Result<DataFrame> {
    let groups = pivot(view, Category::Liquidity.required_metrics());

    let mut keys = KeyColumns::with_capacity(groups.len());
    let mut assets = Vec::with_capacity(groups.len());
    let mut liabilities = Vec::with_capacity(groups.len());
    let mut ratios = Vec::with_capacity(groups.len());

    for (key, accum) in &groups {
        let current_assets = accum.total_millions("AssetsCurrent");
        let current_liabilities = accum.total_millions("LiabilitiesCurrent");
        ratios.push(round2_opt(ratio_if_positive(
            current_assets,
            current_liabilities,
        )));
        assets.push(round2(current_assets));
        liabilities.push(round2(current_liabilities));
        keys.push(key);
    }

    let mut columns = keys.prefix_columns()?;
    columns.push(Column::new("CurrentAssets".into(), assets));
    columns.push(Column::new("CurrentLiabilities".into(), liabilities));
    columns.push(Column::new("CurrentRatio".into(), ratios));
    columns.push(keys.quarter_column());
    Ok(DataFrame::new(columns)?)
}

/// Profitability: income and revenue with a margin percentage.
///
/// Fill policy: missing metrics total 0.0 within a present group.
/// `ProfitMarginPercent` is null when revenue is exactly zero; negative
/// revenue still computes.
pub fn profitability(view: &NormalizedFacts) -> Result<DataFrame> {
    let groups = pivot(view, Category::Profitability.required_metrics());

    let mut keys = KeyColumns::with_capacity(groups.len());
    let mut net_income = Vec::with_capacity(groups.len());
    let mut revenues = Vec::with_capacity(groups.len());
    let mut operating_income = Vec::with_capacity(groups.len());
    let mut margins = Vec::with_capacity(groups.len());

    for (key, accum) in &groups {
        let income = accum.total_millions("NetIncomeLoss");
        let revenue = accum.total_millions("Revenues");
        let operating = accum.total_millions("OperatingIncomeLoss");
        let margin = (revenue != 0.0).then(|| (income / revenue) * 100.0);
        margins.push(round2_opt(margin));
        net_income.push(round2(income));
        revenues.push(round2(revenue));
        operating_income.push(round2(operating));
        keys.push(key);
    }

    let mut columns = keys.prefix_columns()?;
    columns.push(Column::new("NetIncomeLoss".into(), net_income));
    columns.push(Column::new("Revenues".into(), revenues));
    columns.push(Column::new("OperatingIncomeLoss".into(), operating_income));
    columns.push(Column::new("ProfitMarginPercent".into(), margins));
    columns.push(keys.quarter_column());
    Ok(DataFrame::new(columns)?)
}

/// Assets and liabilities with coverage and leverage ratios.
///
/// Fill policy: missing metrics total 0.0 within a present group. Each
/// ratio is null when its own denominator is not positive.
pub fn assets_liabilities(view: &NormalizedFacts) -> Result<DataFrame> {
    let groups = pivot(view, Category::AssetsLiabilities.required_metrics());

    let mut keys = KeyColumns::with_capacity(groups.len());
    let mut assets = Vec::with_capacity(groups.len());
    let mut liabilities = Vec::with_capacity(groups.len());
    let mut equity = Vec::with_capacity(groups.len());
    let mut coverage = Vec::with_capacity(groups.len());
    let mut leverage = Vec::with_capacity(groups.len());

    for (key, accum) in &groups {
        let total_assets = accum.total_millions("Assets");
        let total_liabilities = accum.total_millions("Liabilities");
        let stockholders_equity = accum.total_millions("StockholdersEquity");
        coverage.push(round2_opt(ratio_if_positive(
            total_assets,
            total_liabilities,
        )));
        leverage.push(round2_opt(ratio_if_positive(
            total_liabilities,
            stockholders_equity,
        )));
        assets.push(round2(total_assets));
        liabilities.push(round2(total_liabilities));
        equity.push(round2(stockholders_equity));
        keys.push(key);
    }

    let mut columns = keys.prefix_columns()?;
    columns.push(Column::new("Assets".into(), assets));
    columns.push(Column::new("TotalLiabilities".into(), liabilities));
    columns.push(Column::new("Equity".into(), equity));
    columns.push(Column::new("AssetToLiabilityRatio".into(), coverage));
    columns.push(Column::new("DebtToEquityRatio".into(), leverage));
    columns.push(keys.quarter_column());
    Ok(DataFrame::new(columns)?)
}

/// Cash flow: the three net cash flows scaled to millions. No derived
/// ratio.
///
/// Fill policy: missing metrics total 0.0 within a present group.
pub fn cash_flow(view: &NormalizedFacts) -> Result<DataFrame> {
    let groups = pivot(view, Category::CashFlow.required_metrics());

    let mut keys = KeyColumns::with_capacity(groups.len());
    let mut operating = Vec::with_capacity(groups.len());
    let mut investing = Vec::with_capacity(groups.len());
    let mut financing = Vec::with_capacity(groups.len());

    for (key, accum) in &groups {
        operating.push(round2(
            accum.total_millions("NetCashProvidedByUsedInOperatingActivities"),
        ));
        investing.push(round2(
            accum.total_millions("NetCashProvidedByUsedInInvestingActivities"),
        ));
        financing.push(round2(
            accum.total_millions("NetCashProvidedByUsedInFinancingActivities"),
        ));
        keys.push(key);
    }

    let mut columns = keys.prefix_columns()?;
    columns.push(Column::new("CashFlow_Operating".into(), operating));
    columns.push(Column::new("CashFlow_Investing".into(), investing));
    columns.push(Column::new("CashFlow_Financing".into(), financing));
    columns.push(keys.quarter_column());
    Ok(DataFrame::new(columns)?)
}

/// Debt management: short-term against long-term debt.
///
/// Fill policy: missing metrics total 0.0 within a present group.
/// `DebtStructureRatio` is null when long-term debt is not positive.
pub fn debt_management(view: &NormalizedFacts) -> Result<DataFrame> {
    let groups = pivot(view, Category::DebtManagement.required_metrics());

    let mut keys = KeyColumns::with_capacity(groups.len());
    let mut short_term = Vec::with_capacity(groups.len());
    let mut long_term = Vec::with_capacity(groups.len());
    let mut structure = Vec::with_capacity(groups.len());

    for (key, accum) in &groups {
        let short = accum.total_millions("ShortTermDebt");
        let long = accum.total_millions("LongTermDebt");
        structure.push(round2_opt(ratio_if_positive(short, long)));
        short_term.push(round2(short));
        long_term.push(round2(long));
        keys.push(key);
    }

    let mut columns = keys.prefix_columns()?;
    columns.push(Column::new("ShortTermDebt".into(), short_term));
    columns.push(Column::new("LongTermDebt".into(), long_term));
    columns.push(Column::new("DebtStructureRatio".into(), structure));
    columns.push(keys.quarter_column());
    Ok(DataFrame::new(columns)?)
}

/// Operational efficiency: cost structure relative to revenue.
///
/// Fill policy: missing metrics total 0.0 within a present group.
/// `OperationalEfficiencyRatio` is null when revenue is not positive.
pub fn operational_efficiency(view: &NormalizedFacts) -> Result<DataFrame> {
    let groups = pivot(view, Category::OperationalEfficiency.required_metrics());

    let mut keys = KeyColumns::with_capacity(groups.len());
    let mut cogs = Vec::with_capacity(groups.len());
    let mut opex = Vec::with_capacity(groups.len());
    let mut revenues = Vec::with_capacity(groups.len());
    let mut efficiency = Vec::with_capacity(groups.len());

    for (key, accum) in &groups {
        let cost_of_goods = accum.total_millions("CostOfGoodsSold");
        let operating_expenses = accum.total_millions("OperatingExpenses");
        let revenue = accum.total_millions("Revenues");
        efficiency.push(round2_opt(ratio_if_positive(
            operating_expenses + cost_of_goods,
            revenue,
        )));
        cogs.push(round2(cost_of_goods));
        opex.push(round2(operating_expenses));
        revenues.push(round2(revenue));
        keys.push(key);
    }

    let mut columns = keys.prefix_columns()?;
    columns.push(Column::new("COGS".into(), cogs));
    columns.push(Column::new("OperatingExpenses".into(), opex));
    columns.push(Column::new("Revenues".into(), revenues));
    columns.push(Column::new("OperationalEfficiencyRatio".into(), efficiency));
    columns.push(keys.quarter_column());
    Ok(DataFrame::new(columns)?)
}

/// Market valuation: capitalization, per-share earnings and an optional
/// price-based earnings multiple.
///
/// Fill policy: market capitalization totals 0.0 when absent; the EPS
/// columns are per-group means and stay null when absent. The stock-price
/// join is optional; without a price observation `StockPrice` and
/// `PE_Ratio` are null. `PE_Ratio` is also null when diluted EPS is not
/// positive.
pub fn market_valuation(
    view: &NormalizedFacts,
    prices: Option<&StockPrices>,
) -> Result<DataFrame> {
    let groups = pivot(view, Category::MarketValuation.required_metrics());

    let mut keys = KeyColumns::with_capacity(groups.len());
    let mut market_cap = Vec::with_capacity(groups.len());
    let mut eps_basic = Vec::with_capacity(groups.len());
    let mut eps_diluted = Vec::with_capacity(groups.len());
    let mut stock_price = Vec::with_capacity(groups.len());
    let mut pe_ratio = Vec::with_capacity(groups.len());

    for (key, accum) in &groups {
        let cap = accum.total_millions("MarketCapitalization");
        let basic = accum.mean("EarningsPerShareBasic");
        let diluted = accum.mean("EarningsPerShareDiluted");
        let price = prices.and_then(|table| table.get(&key.cik, key.end));

        let multiple = match (price, diluted) {
            (Some(price), Some(diluted)) if diluted > 0.0 => Some(round2(price / diluted)),
            _ => None,
        };

        market_cap.push(round2(cap));
        eps_basic.push(basic);
        eps_diluted.push(diluted);
        stock_price.push(price);
        pe_ratio.push(multiple);
        keys.push(key);
    }

    let mut columns = keys.prefix_columns()?;
    columns.push(Column::new("MarketCap".into(), market_cap));
    columns.push(Column::new("EPS_Basic".into(), eps_basic));
    columns.push(Column::new("EPS_Diluted".into(), eps_diluted));
    columns.push(Column::new("StockPrice".into(), stock_price));
    columns.push(Column::new("PE_Ratio".into(), pe_ratio));
    columns.push(keys.quarter_column());
    Ok(DataFrame::new(columns)?)
}
