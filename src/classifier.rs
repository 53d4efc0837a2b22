//! Maps normalized account lines onto canonical statement buckets.
//!
//! Two chart-of-accounts families are recognized: the regional insurance
//! chart (`201-01-…` asset codes, `301/302` liabilities, `304` technical
//! reserves, `401` equity) and the traditional chart (`1101` cash, `21xx`
//! liabilities, `4xxx` revenue, `5xxx` expenses). Classification runs as an
//! ordered cascade with "first match wins" semantics:
//!
//! 1. code-prefix rules, most specific prefix first;
//! 2. description-keyword rules over the accent-folded description, with an
//!    exclusion guard that keeps equity/reserve code families out of the
//!    cash bucket even when their description reads like cash;
//! 3. a top-level code-family fallback;
//! 4. the unclassified bucket, so no line is ever dropped.
//!
//! The classifier also settles the sign convention: debit-natural buckets
//! (assets, expenses) accumulate the debit-signed balance as-is, while
//! credit-natural buckets (liabilities, equity, revenue) accumulate its
//! negation. The aggregator can therefore sum entries without per-bucket
//! sign logic.

use crate::ingestion::NormalizedRow;
use crate::utils::fold_text;
use log::debug;
use serde::{Deserialize, Serialize};

/// Canonical financial-statement line categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementBucket {
    Cash,
    Receivables,
    Inventory,
    OtherCurrentAssets,
    FixedAssets,
    IntangibleAssets,
    OtherNonCurrentAssets,
    Payables,
    ShortTermDebt,
    OtherCurrentLiabilities,
    LongTermDebt,
    TechnicalReserves,
    OtherNonCurrentLiabilities,
    Equity,
    RetainedEarnings,
    Revenue,
    CostOfSales,
    OperatingExpense,
    Unclassified,
}

/// Statement section a bucket rolls up into when computing subtotals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementSection {
    CurrentAssets,
    NonCurrentAssets,
    CurrentLiabilities,
    NonCurrentLiabilities,
    Equity,
    Revenue,
    Expenses,
    Unclassified,
}

impl StatementBucket {
    pub const ALL: [StatementBucket; 19] = [
        StatementBucket::Cash,
        StatementBucket::Receivables,
        StatementBucket::Inventory,
        StatementBucket::OtherCurrentAssets,
        StatementBucket::FixedAssets,
        StatementBucket::IntangibleAssets,
        StatementBucket::OtherNonCurrentAssets,
        StatementBucket::Payables,
        StatementBucket::ShortTermDebt,
        StatementBucket::OtherCurrentLiabilities,
        StatementBucket::LongTermDebt,
        StatementBucket::TechnicalReserves,
        StatementBucket::OtherNonCurrentLiabilities,
        StatementBucket::Equity,
        StatementBucket::RetainedEarnings,
        StatementBucket::Revenue,
        StatementBucket::CostOfSales,
        StatementBucket::OperatingExpense,
        StatementBucket::Unclassified,
    ];

    pub fn section(self) -> StatementSection {
        use StatementBucket::*;
        match self {
            Cash | Receivables | Inventory | OtherCurrentAssets => StatementSection::CurrentAssets,
            FixedAssets | IntangibleAssets | OtherNonCurrentAssets => {
                StatementSection::NonCurrentAssets
            }
            Payables | ShortTermDebt | OtherCurrentLiabilities => {
                StatementSection::CurrentLiabilities
            }
            LongTermDebt | TechnicalReserves | OtherNonCurrentLiabilities => {
                StatementSection::NonCurrentLiabilities
            }
            Equity | RetainedEarnings => StatementSection::Equity,
            Revenue => StatementSection::Revenue,
            CostOfSales | OperatingExpense => StatementSection::Expenses,
            Unclassified => StatementSection::Unclassified,
        }
    }

    /// Buckets whose accounts normally carry a credit balance. Their
    /// amounts are negated once here so that every bucket accumulates
    /// positive under normal postings.
    pub fn is_credit_natural(self) -> bool {
        matches!(
            self.section(),
            StatementSection::CurrentLiabilities
                | StatementSection::NonCurrentLiabilities
                | StatementSection::Equity
                | StatementSection::Revenue
        )
    }
}

/// One classified account line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    pub bucket: StatementBucket,
    pub amount: f64,
    pub source_code: String,
    pub source_description: String,
}

/// Code-prefix rules, evaluated in order; the first matching prefix wins,
/// so more specific prefixes must precede their parents. The
/// `prefix_rules_are_shadow_free` test enforces that ordering.
const CODE_RULES: &[(&str, StatementBucket)] = &[
    // insurance chart: assets
    ("2.201.01", StatementBucket::Cash),
    ("201-01", StatementBucket::Cash),
    ("201-02", StatementBucket::Receivables),
    ("201-03", StatementBucket::Inventory),
    ("202-01", StatementBucket::Cash),
    ("203-06", StatementBucket::Cash),
    ("203-11", StatementBucket::Cash),
    ("205", StatementBucket::Receivables),
    ("201", StatementBucket::OtherCurrentAssets),
    ("202", StatementBucket::FixedAssets),
    ("203", StatementBucket::IntangibleAssets),
    // insurance chart: liabilities and equity
    ("301-01", StatementBucket::Payables),
    ("301-02", StatementBucket::ShortTermDebt),
    ("301", StatementBucket::OtherCurrentLiabilities),
    ("302", StatementBucket::OtherCurrentLiabilities),
    ("304", StatementBucket::TechnicalReserves),
    ("402", StatementBucket::TechnicalReserves),
    ("401-02", StatementBucket::RetainedEarnings),
    ("401", StatementBucket::Equity),
    ("4.401", StatementBucket::TechnicalReserves),
    ("4.402.01", StatementBucket::OtherCurrentLiabilities),
    ("4.402", StatementBucket::OtherNonCurrentLiabilities),
    ("4.409", StatementBucket::Equity),
    ("4.410", StatementBucket::Equity),
    // traditional chart: assets
    ("1101", StatementBucket::Cash),
    ("1.101", StatementBucket::Cash),
    ("1.0.1", StatementBucket::Cash),
    ("1102", StatementBucket::Receivables),
    ("1.102", StatementBucket::Receivables),
    ("1.0.2", StatementBucket::Receivables),
    ("1103", StatementBucket::Inventory),
    ("1.103", StatementBucket::Inventory),
    ("1.0.3", StatementBucket::Inventory),
    ("1.0", StatementBucket::OtherCurrentAssets),
    ("11", StatementBucket::OtherCurrentAssets),
    ("1.1", StatementBucket::OtherCurrentAssets),
    ("12", StatementBucket::FixedAssets),
    ("1.2", StatementBucket::FixedAssets),
    ("13", StatementBucket::IntangibleAssets),
    ("1.3", StatementBucket::IntangibleAssets),
    ("14", StatementBucket::FixedAssets),
    ("1.4", StatementBucket::FixedAssets),
    // traditional chart: liabilities and equity
    ("2101", StatementBucket::Payables),
    ("2102", StatementBucket::ShortTermDebt),
    ("2.0", StatementBucket::OtherCurrentLiabilities),
    ("21", StatementBucket::OtherCurrentLiabilities),
    ("2.1", StatementBucket::OtherCurrentLiabilities),
    ("22", StatementBucket::LongTermDebt),
    ("2.2", StatementBucket::LongTermDebt),
    ("24", StatementBucket::LongTermDebt),
    ("3101", StatementBucket::Equity),
    ("3201", StatementBucket::RetainedEarnings),
    ("3202", StatementBucket::RetainedEarnings),
    ("3.0", StatementBucket::Equity),
    // income statement
    ("501", StatementBucket::CostOfSales),
    ("51", StatementBucket::CostOfSales),
    ("5.0", StatementBucket::CostOfSales),
    ("53", StatementBucket::OperatingExpense),
    ("5.1", StatementBucket::OperatingExpense),
    ("5.2", StatementBucket::OperatingExpense),
    ("5.3", StatementBucket::OperatingExpense),
    ("5.4", StatementBucket::OperatingExpense),
    ("5.5", StatementBucket::OperatingExpense),
];

/// Equity/reserve code families whose descriptions often read like cash
/// ("RESERVA DISPONIBLE", "RESERVAS PARA BANCOS"). Rows in these families
/// never classify into the cash bucket by keyword. The 317 family has no
/// prefix rule of its own and relies entirely on this guard plus the
/// keyword/family steps.
const EQUITY_GUARD_PREFIXES: &[&str] = &["317", "304", "401", "4.409", "4.410"];

/// A keyword rule matches when every token occurs in the folded
/// description. Evaluated in order, first match wins.
struct KeywordRule {
    tokens: &'static [&'static str],
    bucket: StatementBucket,
}

const fn kw(tokens: &'static [&'static str], bucket: StatementBucket) -> KeywordRule {
    KeywordRule { tokens, bucket }
}

const KEYWORD_RULES: &[KeywordRule] = &[
    // non-current liabilities before the generic "reserva" equity rule
    kw(&["reserva", "tecnica"], StatementBucket::TechnicalReserves),
    kw(&["reserva", "prima"], StatementBucket::TechnicalReserves),
    kw(&["reserva", "riesgo"], StatementBucket::TechnicalReserves),
    kw(&["provision"], StatementBucket::OtherNonCurrentLiabilities),
    kw(
        &["obligaciones", "laborales"],
        StatementBucket::OtherNonCurrentLiabilities,
    ),
    // debt before the cash rules so "PRESTAMOS BANCARIOS" is not "banco"
    kw(&["prestamo", "largo"], StatementBucket::LongTermDebt),
    kw(&["credito", "largo"], StatementBucket::LongTermDebt),
    kw(&["deuda", "largo"], StatementBucket::LongTermDebt),
    kw(&["hipoteca"], StatementBucket::LongTermDebt),
    kw(&["prestamo", "corto"], StatementBucket::ShortTermDebt),
    kw(&["credito", "corto"], StatementBucket::ShortTermDebt),
    kw(&["prestamo"], StatementBucket::ShortTermDebt),
    kw(&["cuenta", "pagar"], StatementBucket::Payables),
    kw(&["proveedor"], StatementBucket::Payables),
    kw(&["acreedor"], StatementBucket::Payables),
    kw(&["nomina"], StatementBucket::OtherCurrentLiabilities),
    kw(&["cuenta", "cobrar"], StatementBucket::Receivables),
    kw(&["prima", "cobrar"], StatementBucket::Receivables),
    kw(&["cliente"], StatementBucket::Receivables),
    kw(&["deudor"], StatementBucket::Receivables),
    kw(&["reaseguro"], StatementBucket::Receivables),
    kw(&["intermediario"], StatementBucket::Receivables),
    kw(&["retrocesionario"], StatementBucket::Receivables),
    kw(&["inventario"], StatementBucket::Inventory),
    kw(&["mercancia"], StatementBucket::Inventory),
    kw(&["existencia"], StatementBucket::Inventory),
    // cash-like rules, suppressed for guarded code families
    kw(&["caja"], StatementBucket::Cash),
    kw(&["banco"], StatementBucket::Cash),
    kw(&["efectivo"], StatementBucket::Cash),
    kw(&["disponible"], StatementBucket::Cash),
    kw(&["deposito"], StatementBucket::Cash),
    kw(&["moneda", "nacional"], StatementBucket::Cash),
    kw(&["moneda", "extranjera"], StatementBucket::Cash),
    kw(&["propiedad"], StatementBucket::FixedAssets),
    kw(&["planta"], StatementBucket::FixedAssets),
    kw(&["equipo"], StatementBucket::FixedAssets),
    kw(&["inmueble"], StatementBucket::FixedAssets),
    kw(&["maquinaria"], StatementBucket::FixedAssets),
    kw(&["vehiculo"], StatementBucket::FixedAssets),
    kw(&["mobiliario"], StatementBucket::FixedAssets),
    kw(&["edificio"], StatementBucket::FixedAssets),
    kw(&["terreno"], StatementBucket::FixedAssets),
    kw(&["intangible"], StatementBucket::IntangibleAssets),
    kw(&["patente"], StatementBucket::IntangibleAssets),
    kw(&["marca"], StatementBucket::IntangibleAssets),
    kw(&["software"], StatementBucket::IntangibleAssets),
    kw(&["licencia"], StatementBucket::IntangibleAssets),
    kw(&["utilidad", "retenida"], StatementBucket::RetainedEarnings),
    kw(&["utilidad", "acumulada"], StatementBucket::RetainedEarnings),
    kw(
        &["resultado", "ejercicio"],
        StatementBucket::RetainedEarnings,
    ),
    kw(&["capital"], StatementBucket::Equity),
    kw(&["patrimonio"], StatementBucket::Equity),
    kw(&["reserva"], StatementBucket::Equity),
    kw(&["superavit"], StatementBucket::Equity),
    kw(&["costo", "venta"], StatementBucket::CostOfSales),
    kw(&["siniestro"], StatementBucket::CostOfSales),
    kw(&["ingreso", "financiero"], StatementBucket::Revenue),
    kw(&["gasto"], StatementBucket::OperatingExpense),
    kw(&["financiero"], StatementBucket::OperatingExpense),
    kw(&["interes"], StatementBucket::OperatingExpense),
    kw(&["operativo"], StatementBucket::OperatingExpense),
    kw(&["venta"], StatementBucket::Revenue),
    kw(&["ingreso"], StatementBucket::Revenue),
];

fn match_code(code: &str) -> Option<StatementBucket> {
    CODE_RULES
        .iter()
        .find(|(prefix, _)| code.starts_with(prefix))
        .map(|&(_, bucket)| bucket)
}

fn match_keywords(description: &str, guard_cash: bool) -> Option<StatementBucket> {
    KEYWORD_RULES
        .iter()
        .filter(|rule| !(guard_cash && rule.bucket == StatementBucket::Cash))
        .find(|rule| rule.tokens.iter().all(|token| description.contains(token)))
        .map(|rule| rule.bucket)
}

/// Top-level code-family fallback for rows no explicit rule recognized.
fn match_family(code: &str) -> Option<StatementBucket> {
    match code.chars().next()? {
        '1' => Some(StatementBucket::OtherCurrentAssets),
        '2' => Some(StatementBucket::OtherCurrentLiabilities),
        '3' => Some(StatementBucket::Equity),
        '4' => Some(StatementBucket::Revenue),
        '5' => Some(StatementBucket::OperatingExpense),
        _ => None,
    }
}

fn resolve_bucket(code: &str, folded_description: &str) -> StatementBucket {
    if let Some(bucket) = match_code(code) {
        return bucket;
    }

    let guard_cash = EQUITY_GUARD_PREFIXES
        .iter()
        .any(|prefix| code.starts_with(prefix));

    if let Some(bucket) = match_keywords(folded_description, guard_cash) {
        return bucket;
    }

    match_family(code).unwrap_or(StatementBucket::Unclassified)
}

/// Classifies one normalized row. Pure and deterministic: the same
/// `(code, description)` pair always yields the same bucket.
pub fn classify(row: &NormalizedRow) -> ClassifiedEntry {
    let folded_description = fold_text(&row.description);
    let bucket = resolve_bucket(row.code.trim(), &folded_description);

    let amount = if bucket.is_credit_natural() {
        -row.balance
    } else {
        row.balance
    };

    debug!(
        "classified code={:?} description={:?} -> {:?} amount={}",
        row.code, row.description, bucket, amount
    );

    ClassifiedEntry {
        bucket,
        amount,
        source_code: row.code.clone(),
        source_description: row.description.clone(),
    }
}

pub fn classify_rows(rows: &[NormalizedRow]) -> Vec<ClassifiedEntry> {
    rows.iter().map(classify).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, description: &str, balance: f64) -> NormalizedRow {
        NormalizedRow {
            code: code.to_string(),
            description: description.to_string(),
            debit: 0.0,
            credit: 0.0,
            balance,
            initial_balance: 0.0,
        }
    }

    #[test]
    fn prefix_rules_are_shadow_free() {
        for (i, (earlier, _)) in CODE_RULES.iter().enumerate() {
            for (later, _) in &CODE_RULES[i + 1..] {
                assert!(
                    !later.starts_with(earlier),
                    "rule '{}' is unreachable: shadowed by earlier rule '{}'",
                    later,
                    earlier
                );
            }
        }
    }

    #[test]
    fn test_petty_cash_by_code() {
        let entry = classify(&row("201-01", "CAJA CHICA", 1500.00));
        assert_eq!(entry.bucket, StatementBucket::Cash);
        assert_eq!(entry.amount, 1500.00);
    }

    #[test]
    fn test_premium_reserves_are_liabilities_not_equity() {
        // numerically adjacent to the equity code family, but the code rule
        // pins it to technical reserves before any "reserva" keyword runs
        let entry = classify(&row("304-01", "RESERVAS DE PRIMAS", -50_000.00));
        assert_eq!(entry.bucket, StatementBucket::TechnicalReserves);
        assert_eq!(entry.amount, 50_000.00);
    }

    #[test]
    fn test_equity_guard_blocks_cash_keywords() {
        // unlisted code in the guarded 317 family with a cash-like word:
        // skips the cash rules and lands on the reserve keyword instead
        let entry = classify(&row("3171", "RESERVA DISPONIBLE", -800.0));
        assert_eq!(entry.bucket, StatementBucket::Equity);
    }

    #[test]
    fn test_keyword_fallback_without_code() {
        assert_eq!(
            classify(&row("", "Banco Mercantil Cta Cte", 900.0)).bucket,
            StatementBucket::Cash
        );
        assert_eq!(
            classify(&row("", "CUENTAS POR COBRAR CLIENTES", 100.0)).bucket,
            StatementBucket::Receivables
        );
        assert_eq!(
            classify(&row("", "PRÉSTAMO HIPOTECARIO", -100.0)).bucket,
            StatementBucket::LongTermDebt
        );
    }

    #[test]
    fn test_multi_token_keyword_rules() {
        assert_eq!(
            classify(&row("", "PRESTAMO BANCARIO LARGO PLAZO", -1.0)).bucket,
            StatementBucket::LongTermDebt
        );
        assert_eq!(
            classify(&row("", "PRESTAMO BANCARIO CORTO PLAZO", -1.0)).bucket,
            StatementBucket::ShortTermDebt
        );
        // "venta" must not capture expense lines
        assert_eq!(
            classify(&row("", "GASTOS DE VENTAS", 10.0)).bucket,
            StatementBucket::OperatingExpense
        );
        assert_eq!(
            classify(&row("", "COSTO DE VENTAS", 10.0)).bucket,
            StatementBucket::CostOfSales
        );
        assert_eq!(
            classify(&row("", "INGRESOS FINANCIEROS", -10.0)).bucket,
            StatementBucket::Revenue
        );
    }

    #[test]
    fn test_income_statement_codes() {
        assert_eq!(
            classify(&row("4101", "VENTAS NACIONALES", -500.0)).bucket,
            StatementBucket::Revenue
        );
        assert_eq!(
            classify(&row("501-01", "COSTO MERCANCIA VENDIDA", 200.0)).bucket,
            StatementBucket::CostOfSales
        );
        assert_eq!(
            classify(&row("5301", "INTERESES PAGADOS", 30.0)).bucket,
            StatementBucket::OperatingExpense
        );
    }

    #[test]
    fn test_family_fallback() {
        assert_eq!(
            classify(&row("105-99", "AJUSTES VARIOS", 5.0)).bucket,
            StatementBucket::OtherCurrentAssets
        );
        assert_eq!(
            classify(&row("4999", "OTROS CONCEPTOS", -5.0)).bucket,
            StatementBucket::Revenue
        );
    }

    #[test]
    fn test_unclassifiable_routes_to_unclassified() {
        let entry = classify(&row("ABC", "???", 42.0));
        assert_eq!(entry.bucket, StatementBucket::Unclassified);
        assert_eq!(entry.amount, 42.0);
    }

    #[test]
    fn test_sign_normalization() {
        // credit-natural buckets flip the debit-signed balance
        assert_eq!(classify(&row("301-01", "PROVEEDORES", -250.0)).amount, 250.0);
        assert_eq!(classify(&row("4101", "VENTAS", -900.0)).amount, 900.0);
        // debit-natural buckets keep it
        assert_eq!(classify(&row("1101", "CAJA", 900.0)).amount, 900.0);
        assert_eq!(classify(&row("5.2.1", "SUELDOS", 300.0)).amount, 300.0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let sample = row("201-02-03", "CUENTAS DEUDORAS REASEGUROS", 77.0);
        let first = classify(&sample);
        for _ in 0..10 {
            assert_eq!(classify(&sample), first);
        }
    }

    #[test]
    fn test_insurance_cash_subfamilies() {
        for code in ["202-01-01", "203-06-02", "203-11-01", "2.201.01.001"] {
            assert_eq!(
                classify(&row(code, "EFECTIVOS DEPOSITADOS", 1.0)).bucket,
                StatementBucket::Cash,
                "code {} should classify as cash",
                code
            );
        }
    }
}
