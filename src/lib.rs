//! # Trial Balance Analyzer
//!
//! A library for turning raw trial-balance exports (CSV/spreadsheet/OCR
//! rows) into classified financial statements, currency-converted views,
//! and threshold-driven risk alerts.
//!
//! ## Core Concepts
//!
//! - **Raw rows**: column-keyed string maps as produced by whatever
//!   extractor read the export; column names and number formats vary freely
//! - **Statement buckets**: canonical balance-sheet and income-statement
//!   categories that account codes and descriptions map onto
//! - **Patrimonial validation**: the Assets = Liabilities + Equity check,
//!   reported as a warning rather than enforced
//! - **Nearest-date rates**: historical currency conversion that substitutes
//!   the closest available observation when an exact-date rate is missing
//!
//! ## Example
//!
//! ```rust,ignore
//! use trial_balance_analyzer::*;
//! use chrono::NaiveDate;
//! use std::collections::HashMap;
//!
//! let rows: Vec<RawRow> = vec![HashMap::from([
//!     ("Codigo".to_string(), "201-01".to_string()),
//!     ("Descripcion".to_string(), "CAJA CHICA".to_string()),
//!     ("SaldoActual".to_string(), "1.500,00".to_string()),
//! ])];
//!
//! let context = ReportContext {
//!     company_name: "ACME Seguros".to_string(),
//!     currency: "VES".to_string(),
//!     period_end: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
//! };
//!
//! let report = classify_and_aggregate(&rows, context);
//! let alerts = compute_ratios_and_alerts(&report, &AlertThresholds::default());
//! ```

pub mod alerts;
pub mod classifier;
pub mod error;
pub mod ingestion;
pub mod numeric;
pub mod rates;
pub mod ratios;
pub mod statements;
pub mod utils;

pub use alerts::{
    evaluate_alerts, AlertCategory, AlertSeverity, AlertStatus, AlertThresholds, RiskAlert,
    ThresholdPair,
};
pub use classifier::{classify, classify_rows, ClassifiedEntry, StatementBucket, StatementSection};
pub use error::{AnalyzerError, Result};
pub use ingestion::{keep_row, normalize_row, normalize_rows, NormalizedRow, RawRow};
pub use numeric::{is_significant, normalize_amount};
pub use rates::{Conversion, QuoteOrientation, RateQuote, RateSource, RateStore, ResolvedRate};
pub use ratios::FinancialRatios;
pub use statements::{
    aggregate, BalanceSheet, ConvertedReport, FinancialReport, IncomeStatement,
    PatrimonialValidation, ReportContext, PATRIMONIAL_EPSILON,
};
pub use utils::{fold_text, last_day_of_month, parse_flexible_date, period_end};

use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything one recomputation produces for a (company, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub report: FinancialReport,
    pub ratios: FinancialRatios,
    pub alerts: Vec<RiskAlert>,
}

/// Runs ingestion, classification and aggregation for one (company,
/// period). Never fails: unparseable cells default to zero and
/// unclassifiable lines land in the unclassified bucket.
pub fn classify_and_aggregate(rows: &[RawRow], context: ReportContext) -> FinancialReport {
    info!(
        "processing {} raw rows for {} ({})",
        rows.len(),
        context.company_name,
        context.period_end
    );

    let normalized = ingestion::normalize_rows(rows);
    let entries = classifier::classify_rows(&normalized);
    statements::aggregate(&entries, context)
}

/// Computes the ratio set for a report and evaluates it against the
/// configured thresholds.
pub fn compute_ratios_and_alerts(
    report: &FinancialReport,
    thresholds: &AlertThresholds,
) -> Vec<RiskAlert> {
    let ratios = FinancialRatios::compute(report);
    alerts::evaluate_alerts(&ratios, thresholds)
}

pub struct TrialBalanceProcessor;

impl TrialBalanceProcessor {
    /// Full pipeline: validate the threshold configuration, then run
    /// ingestion through alert generation in one sequential pass.
    pub fn process(
        rows: &[RawRow],
        context: ReportContext,
        thresholds: &AlertThresholds,
    ) -> Result<AnalysisOutcome> {
        thresholds.validate()?;

        let report = classify_and_aggregate(rows, context);
        if report.unclassified_total != 0.0 {
            debug!(
                "unclassified total for {}: {:.2}",
                report.context.company_name, report.unclassified_total
            );
        }

        let ratios = FinancialRatios::compute(&report);
        let alerts = alerts::evaluate_alerts(&ratios, thresholds);

        info!(
            "analysis complete for {}: {} alerts, patrimonial validation {}",
            report.context.company_name,
            alerts.len(),
            if report.validation.is_valid {
                "passed"
            } else {
                "failed"
            }
        );

        Ok(AnalysisOutcome {
            report,
            ratios,
            alerts,
        })
    }
}
