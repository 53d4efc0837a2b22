//! Financial ratio computation over an aggregated report.
//!
//! Every division is guarded: a non-positive denominator yields 0 rather
//! than NaN/infinity, so a half-empty statement (new company, partial
//! import) still produces a renderable ratio set. All ratios are fractions,
//! not percentages: a 5% net margin is `0.05`.

use crate::statements::FinancialReport;
use serde::{Deserialize, Serialize};

fn guarded(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityRatios {
    /// current assets / current liabilities
    pub current: f64,
    /// (current assets − inventory) / current liabilities
    pub quick: f64,
    /// cash / current liabilities
    pub cash: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvencyRatios {
    /// total liabilities / total assets
    pub debt_ratio: f64,
    /// total assets / total liabilities
    pub coverage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilityRatios {
    /// net income / revenue
    pub net_margin: f64,
    /// (revenue − cost of sales) / revenue
    pub gross_margin: f64,
    /// net income / total assets
    pub roa: f64,
    /// net income / total equity
    pub roe: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalRatios {
    /// cost of sales / inventory
    pub inventory_turnover: f64,
    /// revenue / receivables
    pub receivables_turnover: f64,
    /// revenue / total assets
    pub asset_turnover: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRatios {
    pub liquidity: LiquidityRatios,
    pub solvency: SolvencyRatios,
    pub profitability: ProfitabilityRatios,
    pub operational: OperationalRatios,
}

impl FinancialRatios {
    pub fn compute(report: &FinancialReport) -> Self {
        let bs = &report.balance_sheet;
        let is = &report.income_statement;

        FinancialRatios {
            liquidity: LiquidityRatios {
                current: guarded(bs.total_current_assets, bs.total_current_liabilities),
                quick: guarded(
                    bs.total_current_assets - bs.inventory,
                    bs.total_current_liabilities,
                ),
                cash: guarded(bs.cash, bs.total_current_liabilities),
            },
            solvency: SolvencyRatios {
                debt_ratio: guarded(bs.total_liabilities, bs.total_assets),
                coverage: guarded(bs.total_assets, bs.total_liabilities),
            },
            profitability: ProfitabilityRatios {
                net_margin: guarded(is.net_income, is.revenue),
                gross_margin: guarded(is.revenue - is.cost_of_sales, is.revenue),
                roa: guarded(is.net_income, bs.total_assets),
                roe: guarded(is.net_income, bs.total_equity),
            },
            operational: OperationalRatios {
                inventory_turnover: guarded(is.cost_of_sales, bs.inventory),
                receivables_turnover: guarded(is.revenue, bs.receivables),
                asset_turnover: guarded(is.revenue, bs.total_assets),
            },
        }
    }
}
