//! Threshold configuration and risk-alert generation.
//!
//! Each configured ratio carries a `{critical, warning}` pair. A breach of
//! the critical bound emits one `Critical` alert; otherwise a breach of the
//! warning bound emits one `High` alert; a ratio never produces both.
//! Alerts are regenerated wholesale on every recomputation — deduplication
//! against previous runs and the acknowledged/resolved lifecycle belong to
//! the caller, which only ever mutates an alert's `status`.

use crate::error::{AnalyzerError, Result};
use crate::ratios::FinancialRatios;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A critical/warning bound pair for one ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdPair {
    #[schemars(description = "Bound whose breach raises a critical alert")]
    pub critical: f64,

    #[schemars(
        description = "Bound whose breach raises a high-priority warning alert. Must be laxer than the critical bound."
    )]
    pub warning: f64,
}

impl ThresholdPair {
    pub const fn new(critical: f64, warning: f64) -> Self {
        Self { critical, warning }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LiquidityThresholds {
    #[schemars(description = "Current ratio: current assets / current liabilities. Lower is worse.")]
    pub current: Option<ThresholdPair>,

    #[schemars(
        description = "Quick ratio: (current assets - inventory) / current liabilities. Lower is worse."
    )]
    pub quick: Option<ThresholdPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SolvencyThresholds {
    #[schemars(
        description = "Debt ratio: total liabilities / total assets. HIGHER is worse; the critical bound sits above the warning bound."
    )]
    pub debt_ratio: Option<ThresholdPair>,

    #[schemars(description = "Coverage: total assets / total liabilities. Lower is worse.")]
    pub coverage: Option<ThresholdPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProfitabilityThresholds {
    #[schemars(description = "Net margin as a fraction (0.05 = 5%). Lower is worse.")]
    pub net_margin: Option<ThresholdPair>,

    #[schemars(description = "Return on assets as a fraction. Lower is worse.")]
    pub roa: Option<ThresholdPair>,

    #[schemars(description = "Return on equity as a fraction. Lower is worse.")]
    pub roe: Option<ThresholdPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OperationalThresholds {
    #[schemars(description = "Inventory turnover: cost of sales / inventory. Lower is worse.")]
    pub inventory_turnover: Option<ThresholdPair>,

    #[schemars(description = "Receivables turnover: revenue / receivables. Lower is worse.")]
    pub receivables_turnover: Option<ThresholdPair>,
}

/// Alert thresholds per ratio. A ratio configured as `None` never alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AlertThresholds {
    pub liquidity: LiquidityThresholds,
    pub solvency: SolvencyThresholds,
    pub profitability: ProfitabilityThresholds,
    pub operational: OperationalThresholds,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertThresholds {
            liquidity: LiquidityThresholds {
                current: Some(ThresholdPair::new(1.0, 1.5)),
                quick: Some(ThresholdPair::new(0.8, 1.2)),
            },
            solvency: SolvencyThresholds {
                debt_ratio: Some(ThresholdPair::new(0.8, 0.6)),
                coverage: Some(ThresholdPair::new(1.5, 2.0)),
            },
            profitability: ProfitabilityThresholds {
                net_margin: Some(ThresholdPair::new(0.02, 0.05)),
                roa: Some(ThresholdPair::new(0.03, 0.06)),
                roe: Some(ThresholdPair::new(0.05, 0.10)),
            },
            operational: OperationalThresholds {
                inventory_turnover: Some(ThresholdPair::new(2.0, 4.0)),
                receivables_turnover: Some(ThresholdPair::new(4.0, 6.0)),
            },
        }
    }
}

impl AlertThresholds {
    /// Rejects pairs whose warning bound is not strictly laxer than the
    /// critical bound, in the direction the ratio breaches.
    pub fn validate(&self) -> Result<()> {
        for (name, pair, direction) in self.configured_pairs() {
            let ordered = match direction {
                BreachDirection::Below => pair.critical < pair.warning,
                BreachDirection::Above => pair.critical > pair.warning,
            };
            if !ordered {
                return Err(AnalyzerError::InvalidThreshold {
                    ratio: name.to_string(),
                    details: format!(
                        "warning bound {} must be laxer than critical bound {}",
                        pair.warning, pair.critical
                    ),
                });
            }
        }
        Ok(())
    }

    fn configured_pairs(&self) -> Vec<(&'static str, ThresholdPair, BreachDirection)> {
        let mut pairs = Vec::new();
        let mut push = |name, pair: Option<ThresholdPair>, direction| {
            if let Some(pair) = pair {
                pairs.push((name, pair, direction));
            }
        };
        push("liquidity.current", self.liquidity.current, BreachDirection::Below);
        push("liquidity.quick", self.liquidity.quick, BreachDirection::Below);
        push("solvency.debtRatio", self.solvency.debt_ratio, BreachDirection::Above);
        push("solvency.coverage", self.solvency.coverage, BreachDirection::Below);
        push(
            "profitability.netMargin",
            self.profitability.net_margin,
            BreachDirection::Below,
        );
        push("profitability.roa", self.profitability.roa, BreachDirection::Below);
        push("profitability.roe", self.profitability.roe, BreachDirection::Below);
        push(
            "operational.inventoryTurnover",
            self.operational.inventory_turnover,
            BreachDirection::Below,
        );
        push(
            "operational.receivablesTurnover",
            self.operational.receivables_turnover,
            BreachDirection::Below,
        );
        pairs
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AlertThresholds)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertCategory {
    Liquidity,
    Solvency,
    Profitability,
    Operational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlert {
    pub id: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
    pub status: AlertStatus,
}

impl RiskAlert {
    pub fn acknowledge(&mut self) {
        self.status = AlertStatus::Acknowledged;
    }

    pub fn resolve(&mut self) {
        self.status = AlertStatus::Resolved;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreachDirection {
    /// The ratio is unhealthy when it falls below a bound.
    Below,
    /// The ratio is unhealthy when it rises above a bound (debt ratio).
    Above,
}

struct RatioCheck {
    key: &'static str,
    title: &'static str,
    category: AlertCategory,
    direction: BreachDirection,
    value: f64,
    pair: Option<ThresholdPair>,
    recommendation: &'static str,
}

fn checks(ratios: &FinancialRatios, thresholds: &AlertThresholds) -> Vec<RatioCheck> {
    vec![
        RatioCheck {
            key: "liquidity-current",
            title: "Low current liquidity",
            category: AlertCategory::Liquidity,
            direction: BreachDirection::Below,
            value: ratios.liquidity.current,
            pair: thresholds.liquidity.current,
            recommendation:
                "Review cash flow and consider refinancing short-term debt",
        },
        RatioCheck {
            key: "liquidity-quick",
            title: "Low quick liquidity",
            category: AlertCategory::Liquidity,
            direction: BreachDirection::Below,
            value: ratios.liquidity.quick,
            pair: thresholds.liquidity.quick,
            recommendation:
                "Reduce inventory levels and accelerate collection of receivables",
        },
        RatioCheck {
            key: "solvency-debt",
            title: "High indebtedness",
            category: AlertCategory::Solvency,
            direction: BreachDirection::Above,
            value: ratios.solvency.debt_ratio,
            pair: thresholds.solvency.debt_ratio,
            recommendation:
                "Implement a debt reduction plan and evaluate financial restructuring",
        },
        RatioCheck {
            key: "solvency-coverage",
            title: "Low debt coverage",
            category: AlertCategory::Solvency,
            direction: BreachDirection::Below,
            value: ratios.solvency.coverage,
            pair: thresholds.solvency.coverage,
            recommendation:
                "Improve coverage by growing assets or reducing liabilities",
        },
        RatioCheck {
            key: "profitability-net-margin",
            title: "Low net margin",
            category: AlertCategory::Profitability,
            direction: BreachDirection::Below,
            value: ratios.profitability.net_margin,
            pair: thresholds.profitability.net_margin,
            recommendation: "Review cost structure and pricing strategy",
        },
        RatioCheck {
            key: "profitability-roa",
            title: "Low return on assets",
            category: AlertCategory::Profitability,
            direction: BreachDirection::Below,
            value: ratios.profitability.roa,
            pair: thresholds.profitability.roa,
            recommendation:
                "Review operating efficiency and revenue generation strategies",
        },
        RatioCheck {
            key: "profitability-roe",
            title: "Low return on equity",
            category: AlertCategory::Profitability,
            direction: BreachDirection::Below,
            value: ratios.profitability.roe,
            pair: thresholds.profitability.roe,
            recommendation: "Evaluate strategies to improve equity returns",
        },
        RatioCheck {
            key: "operational-inventory-turnover",
            title: "Slow inventory turnover",
            category: AlertCategory::Operational,
            direction: BreachDirection::Below,
            value: ratios.operational.inventory_turnover,
            pair: thresholds.operational.inventory_turnover,
            recommendation:
                "Optimize inventory management and accelerate stock rotation",
        },
        RatioCheck {
            key: "operational-receivables-turnover",
            title: "Slow receivables turnover",
            category: AlertCategory::Operational,
            direction: BreachDirection::Below,
            value: ratios.operational.receivables_turnover,
            pair: thresholds.operational.receivables_turnover,
            recommendation: "Tighten collection policies and reduce days outstanding",
        },
    ]
}

fn breaches(direction: BreachDirection, value: f64, bound: f64) -> bool {
    match direction {
        BreachDirection::Below => value < bound,
        BreachDirection::Above => value > bound,
    }
}

/// Evaluates every configured ratio and returns the triggered alerts,
/// critical first. Ids are deterministic slugs; the caller owns persistence
/// and the acknowledge/resolve lifecycle.
pub fn evaluate_alerts(ratios: &FinancialRatios, thresholds: &AlertThresholds) -> Vec<RiskAlert> {
    let now = Utc::now();
    let mut alerts = Vec::new();

    for check in checks(ratios, thresholds) {
        let Some(pair) = check.pair else { continue };

        let (severity, bound, label) = if breaches(check.direction, check.value, pair.critical) {
            (AlertSeverity::Critical, pair.critical, "critical")
        } else if breaches(check.direction, check.value, pair.warning) {
            (AlertSeverity::High, pair.warning, "warning")
        } else {
            continue;
        };

        let comparison = match check.direction {
            BreachDirection::Below => "below",
            BreachDirection::Above => "above",
        };

        alerts.push(RiskAlert {
            id: format!("{}-{}", check.key, label),
            severity,
            category: check.category,
            title: check.title.to_string(),
            description: format!(
                "{} is {:.2}, {} the {} threshold of {:.2}",
                check.title, check.value, comparison, label, bound
            ),
            recommendation: check.recommendation.to_string(),
            value: check.value,
            threshold: bound,
            timestamp: now,
            status: AlertStatus::Active,
        });
    }

    alerts.sort_by_key(|alert| alert.severity);
    alerts
}
