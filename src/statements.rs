//! Aggregates classified entries into balance-sheet and income-statement
//! structures for one (company, period).
//!
//! Statements are recomputed wholesale on every import and never mutated
//! incrementally. The accounting identity Assets = Liabilities + Equity is
//! checked and reported, never enforced: an imbalance points at the chart
//! mapping upstream, not at this pipeline, and must stay visible to the
//! user.

use crate::classifier::{ClassifiedEntry, StatementBucket};
use crate::rates::RateStore;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance for the patrimonial identity, in local currency units.
pub const PATRIMONIAL_EPSILON: f64 = 0.01;

/// Identifies the (company, period) a report belongs to. Reports for
/// different contexts are independent and may be computed concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContext {
    pub company_name: String,
    /// Local currency the trial balance is denominated in.
    pub currency: String,
    pub period_end: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub cash: f64,
    pub receivables: f64,
    pub inventory: f64,
    pub other_current_assets: f64,
    pub fixed_assets: f64,
    pub intangible_assets: f64,
    pub other_non_current_assets: f64,
    pub payables: f64,
    pub short_term_debt: f64,
    pub other_current_liabilities: f64,
    pub long_term_debt: f64,
    pub technical_reserves: f64,
    pub other_non_current_liabilities: f64,
    pub equity: f64,
    pub retained_earnings: f64,
    pub total_current_assets: f64,
    pub total_non_current_assets: f64,
    pub total_assets: f64,
    pub total_current_liabilities: f64,
    pub total_non_current_liabilities: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub revenue: f64,
    pub cost_of_sales: f64,
    pub operating_expense: f64,
    pub gross_profit: f64,
    pub total_expenses: f64,
    pub net_income: f64,
}

/// Outcome of the Assets = Liabilities + Equity check.
///
/// `difference` uses the plain identity; `result_adjusted_difference` also
/// credits the period's net income to the right-hand side, which is the
/// form a mid-year trial balance actually satisfies (retained earnings do
/// not yet carry the current result).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrimonialValidation {
    pub assets: f64,
    pub liabilities: f64,
    pub equity: f64,
    pub net_income: f64,
    pub difference: f64,
    pub result_adjusted_difference: f64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    pub context: ReportContext,
    pub balance_sheet: BalanceSheet,
    pub income_statement: IncomeStatement,
    /// Sum of amounts no rule could place. Reported as a total so the user
    /// can fix the chart mapping; never silently dropped.
    pub unclassified_total: f64,
    pub validation: PatrimonialValidation,
}

/// A report re-expressed in a display currency, with the conversion
/// metadata callers need to render "conversion unavailable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedReport {
    pub report: FinancialReport,
    pub target_currency: String,
    pub rate_used: Option<f64>,
    pub rate_date: Option<NaiveDate>,
}

/// Sums classified entries into statements with derived subtotals and the
/// patrimonial validation.
pub fn aggregate(entries: &[ClassifiedEntry], context: ReportContext) -> FinancialReport {
    info!(
        "aggregating {} classified entries for {} ({})",
        entries.len(),
        context.company_name,
        context.period_end
    );

    let mut totals: BTreeMap<StatementBucket, f64> = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.bucket).or_insert(0.0) += entry.amount;
    }

    let total = |bucket: StatementBucket| totals.get(&bucket).copied().unwrap_or(0.0);

    let mut balance_sheet = BalanceSheet {
        cash: total(StatementBucket::Cash),
        receivables: total(StatementBucket::Receivables),
        inventory: total(StatementBucket::Inventory),
        other_current_assets: total(StatementBucket::OtherCurrentAssets),
        fixed_assets: total(StatementBucket::FixedAssets),
        intangible_assets: total(StatementBucket::IntangibleAssets),
        other_non_current_assets: total(StatementBucket::OtherNonCurrentAssets),
        payables: total(StatementBucket::Payables),
        short_term_debt: total(StatementBucket::ShortTermDebt),
        other_current_liabilities: total(StatementBucket::OtherCurrentLiabilities),
        long_term_debt: total(StatementBucket::LongTermDebt),
        technical_reserves: total(StatementBucket::TechnicalReserves),
        other_non_current_liabilities: total(StatementBucket::OtherNonCurrentLiabilities),
        equity: total(StatementBucket::Equity),
        retained_earnings: total(StatementBucket::RetainedEarnings),
        ..BalanceSheet::default()
    };

    balance_sheet.total_current_assets = balance_sheet.cash
        + balance_sheet.receivables
        + balance_sheet.inventory
        + balance_sheet.other_current_assets;
    balance_sheet.total_non_current_assets = balance_sheet.fixed_assets
        + balance_sheet.intangible_assets
        + balance_sheet.other_non_current_assets;
    balance_sheet.total_assets =
        balance_sheet.total_current_assets + balance_sheet.total_non_current_assets;
    balance_sheet.total_current_liabilities = balance_sheet.payables
        + balance_sheet.short_term_debt
        + balance_sheet.other_current_liabilities;
    balance_sheet.total_non_current_liabilities = balance_sheet.long_term_debt
        + balance_sheet.technical_reserves
        + balance_sheet.other_non_current_liabilities;
    balance_sheet.total_liabilities =
        balance_sheet.total_current_liabilities + balance_sheet.total_non_current_liabilities;
    balance_sheet.total_equity = balance_sheet.equity + balance_sheet.retained_earnings;

    let revenue = total(StatementBucket::Revenue);
    let cost_of_sales = total(StatementBucket::CostOfSales);
    let operating_expense = total(StatementBucket::OperatingExpense);
    let income_statement = IncomeStatement {
        revenue,
        cost_of_sales,
        operating_expense,
        gross_profit: revenue - cost_of_sales,
        total_expenses: cost_of_sales + operating_expense,
        net_income: revenue - cost_of_sales - operating_expense,
    };

    let validation = validate_patrimonial_equation(&balance_sheet, &income_statement);
    if !validation.is_valid {
        debug!(
            "patrimonial imbalance for {}: difference {:.2}",
            context.company_name, validation.difference
        );
    }

    FinancialReport {
        context,
        balance_sheet,
        income_statement,
        unclassified_total: total(StatementBucket::Unclassified),
        validation,
    }
}

fn validate_patrimonial_equation(
    balance_sheet: &BalanceSheet,
    income_statement: &IncomeStatement,
) -> PatrimonialValidation {
    let assets = balance_sheet.total_assets;
    let liabilities = balance_sheet.total_liabilities;
    let equity = balance_sheet.total_equity;
    let net_income = income_statement.net_income;

    let difference = assets - (liabilities + equity);

    PatrimonialValidation {
        assets,
        liabilities,
        equity,
        net_income,
        difference,
        result_adjusted_difference: assets - (liabilities + equity + net_income),
        is_valid: difference.abs() < PATRIMONIAL_EPSILON,
    }
}

impl BalanceSheet {
    fn scaled(&self, factor: f64) -> Self {
        BalanceSheet {
            cash: self.cash * factor,
            receivables: self.receivables * factor,
            inventory: self.inventory * factor,
            other_current_assets: self.other_current_assets * factor,
            fixed_assets: self.fixed_assets * factor,
            intangible_assets: self.intangible_assets * factor,
            other_non_current_assets: self.other_non_current_assets * factor,
            payables: self.payables * factor,
            short_term_debt: self.short_term_debt * factor,
            other_current_liabilities: self.other_current_liabilities * factor,
            long_term_debt: self.long_term_debt * factor,
            technical_reserves: self.technical_reserves * factor,
            other_non_current_liabilities: self.other_non_current_liabilities * factor,
            equity: self.equity * factor,
            retained_earnings: self.retained_earnings * factor,
            total_current_assets: self.total_current_assets * factor,
            total_non_current_assets: self.total_non_current_assets * factor,
            total_assets: self.total_assets * factor,
            total_current_liabilities: self.total_current_liabilities * factor,
            total_non_current_liabilities: self.total_non_current_liabilities * factor,
            total_liabilities: self.total_liabilities * factor,
            total_equity: self.total_equity * factor,
        }
    }
}

impl IncomeStatement {
    fn scaled(&self, factor: f64) -> Self {
        IncomeStatement {
            revenue: self.revenue * factor,
            cost_of_sales: self.cost_of_sales * factor,
            operating_expense: self.operating_expense * factor,
            gross_profit: self.gross_profit * factor,
            total_expenses: self.total_expenses * factor,
            net_income: self.net_income * factor,
        }
    }
}

impl FinancialReport {
    /// Re-expresses the whole report in a display currency using the
    /// store's rate for the report's period end (nearest-date fallback
    /// applies). When no rate resolves, the amounts are returned
    /// unconverted with `rate_used = None`.
    pub fn convert(&self, store: &RateStore, target_currency: &str) -> ConvertedReport {
        let conversion = store.convert(
            1.0,
            &self.context.currency,
            target_currency,
            self.context.period_end,
        );

        let Some(factor) = conversion.rate_used else {
            debug!(
                "no rate available for {} -> {} on {}; returning unconverted report",
                self.context.currency, target_currency, self.context.period_end
            );
            return ConvertedReport {
                report: self.clone(),
                target_currency: target_currency.to_string(),
                rate_used: None,
                rate_date: None,
            };
        };

        let mut report = self.clone();
        report.balance_sheet = self.balance_sheet.scaled(factor);
        report.income_statement = self.income_statement.scaled(factor);
        report.unclassified_total *= factor;
        report.validation =
            validate_patrimonial_equation(&report.balance_sheet, &report.income_statement);

        ConvertedReport {
            report,
            target_currency: target_currency.to_string(),
            rate_used: conversion.rate_used,
            rate_date: conversion.rate_date,
        }
    }
}
