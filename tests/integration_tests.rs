use chrono::NaiveDate;
use std::collections::HashMap;
use trial_balance_analyzer::*;

/// Parses CSV text into the column-keyed maps the pipeline ingests,
/// the way an upload handler would.
fn rows_from_csv(text: &str) -> Vec<RawRow> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .expect("fixture has headers")
        .iter()
        .map(|h| h.to_string())
        .collect();

    reader
        .records()
        .filter_map(|record| record.ok())
        .map(|record| {
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect::<HashMap<_, _>>()
        })
        .collect()
}

fn context() -> ReportContext {
    ReportContext {
        company_name: "Seguros Horizonte C.A.".to_string(),
        currency: "VES".to_string(),
        period_end: NaiveDate::from_ymd_opt(2025, 7, 29).unwrap(),
    }
}

const TRIAL_BALANCE_CSV: &str = "\
Codigo,Descripcion,SaldoInicial,Debitos,Creditos,SaldoActual
,Profit Plus Contabilidad - Usuario: ADMIN,,,,
,BALANCE DE COMPROBACIÓN AL 29/07/2025,,,,
201-01-01,CAJA CHICA,\"1.000,00\",\"700,00\",\"200,00\",\"1.500,00\"
203-11-02,DISPONIBLE EN BANCOS MONEDA NACIONAL,\"10.000,00\",\"5.000,00\",\"2.500,00\",\"12.500,00\"
201-02-01,PRIMAS POR COBRAR,\"4.000,00\",\"2.000,00\",\"0,00\",\"6.000,00\"
201-03-01,INVENTARIO DE SUMINISTROS,\"2.500,00\",\"500,00\",\"0,00\",\"3.000,00\"
202-02-01,EDIFICIO SEDE PRINCIPAL,\"20.000,00\",\"0,00\",\"0,00\",\"20.000,00\"
301-01-01,CUENTAS POR PAGAR PROVEEDORES,\"(3.000,00)\",\"500,00\",\"1.500,00\",\"(4.000,00)\"
301-02-01,PRESTAMOS BANCARIOS CORTO PLAZO,\"(2.000,00)\",\"0,00\",\"0,00\",\"(2.000,00)\"
304-01-01,RESERVAS DE PRIMAS,\"(9.000,00)\",\"0,00\",\"1.000,00\",\"(10.000,00)\"
401-01-01,CAPITAL SOCIAL PAGADO,\"(20.000,00)\",\"0,00\",\"0,00\",\"(20.000,00)\"
401-02-01,RESULTADOS ACUMULADOS,\"(4.600,00)\",\"0,00\",\"0,00\",\"(4.600,00)\"
4101,PRIMAS EMITIDAS NETAS,\"0,00\",\"0,00\",\"8.000,00\",\"(8.000,00)\"
501-01,SINIESTROS PAGADOS,\"0,00\",\"3.500,00\",\"0,00\",\"3.500,00\"
5.2.1,GASTOS DE ADMINISTRACION,\"0,00\",\"2.100,00\",\"0,00\",\"2.100,00\"
ZZ-99,PARTIDA SIN PLAN DE CUENTAS,\"0,00\",\"0,00\",\"0,00\",\"(400,00)\"
";

fn rate_store() -> RateStore {
    let mut store = RateStore::new("VES");
    store
        .load(&[
            RateQuote {
                target_currency: "USD".to_string(),
                rate: 120.00,
                rate_date: NaiveDate::from_ymd_opt(2025, 7, 25).unwrap(),
                source: RateSource::Bcv,
                orientation: QuoteOrientation::infer(120.00),
            },
            RateQuote {
                target_currency: "USD".to_string(),
                rate: 124.50,
                rate_date: NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
                source: RateSource::Bcv,
                orientation: QuoteOrientation::infer(124.50),
            },
        ])
        .unwrap();
    store
}

#[test]
fn test_full_pipeline_from_csv_export() {
    let rows = rows_from_csv(TRIAL_BALANCE_CSV);
    let outcome =
        TrialBalanceProcessor::process(&rows, context(), &AlertThresholds::default()).unwrap();

    let bs = &outcome.report.balance_sheet;
    assert_eq!(bs.cash, 14_000.0);
    assert_eq!(bs.receivables, 6_000.0);
    assert_eq!(bs.inventory, 3_000.0);
    assert_eq!(bs.fixed_assets, 20_000.0);
    assert_eq!(bs.total_current_assets, 23_000.0);
    assert_eq!(bs.total_assets, 43_000.0);

    assert_eq!(bs.payables, 4_000.0);
    assert_eq!(bs.short_term_debt, 2_000.0);
    assert_eq!(bs.technical_reserves, 10_000.0);
    assert_eq!(bs.total_liabilities, 16_000.0);
    assert_eq!(bs.equity, 20_000.0);
    assert_eq!(bs.retained_earnings, 4_600.0);
    assert_eq!(bs.total_equity, 24_600.0);

    let is = &outcome.report.income_statement;
    assert_eq!(is.revenue, 8_000.0);
    assert_eq!(is.cost_of_sales, 3_500.0);
    assert_eq!(is.operating_expense, 2_100.0);
    assert_eq!(is.net_income, 2_400.0);

    // the unplanned account survives as unclassified, not dropped
    assert_eq!(outcome.report.unclassified_total, -400.0);

    // 43,000 != 16,000 + 24,600 by the plain identity...
    let validation = &outcome.report.validation;
    assert!(!validation.is_valid);
    assert_eq!(validation.difference, 2_400.0);
    // ...but the period result closes the gap exactly
    assert!(validation.result_adjusted_difference.abs() < PATRIMONIAL_EPSILON);
}

#[test]
fn test_ratios_and_alerts_from_csv_export() {
    let rows = rows_from_csv(TRIAL_BALANCE_CSV);
    let outcome =
        TrialBalanceProcessor::process(&rows, context(), &AlertThresholds::default()).unwrap();

    let ratios = &outcome.ratios;
    assert!((ratios.liquidity.current - 23_000.0 / 6_000.0).abs() < 1e-9);
    assert!((ratios.solvency.debt_ratio - 16_000.0 / 43_000.0).abs() < 1e-9);
    assert!((ratios.profitability.net_margin - 0.3).abs() < 1e-9);

    // liquidity and solvency are comfortable here; no alerts for them
    assert!(outcome
        .alerts
        .iter()
        .all(|a| a.category != AlertCategory::Liquidity));
    assert!(outcome
        .alerts
        .iter()
        .all(|a| a.category != AlertCategory::Solvency));

    // inventory turnover 3,500/3,000 = 1.17 is below the critical bound of 2
    let inventory_alert = outcome
        .alerts
        .iter()
        .find(|a| a.id.starts_with("operational-inventory-turnover"))
        .expect("slow inventory turnover must alert");
    assert_eq!(inventory_alert.severity, AlertSeverity::Critical);
}

#[test]
fn test_report_converts_with_nearest_prior_rate() {
    let rows = rows_from_csv(TRIAL_BALANCE_CSV);
    let report = classify_and_aggregate(&rows, context());
    let store = rate_store();

    // period end 2025-07-29 sits between the 07-25 and 08-02 observations;
    // the prior one must win
    let converted = report.convert(&store, "USD");
    assert_eq!(
        converted.rate_date,
        Some(NaiveDate::from_ymd_opt(2025, 7, 25).unwrap())
    );
    let rate = converted.rate_used.unwrap();
    assert!((rate - 1.0 / 120.0).abs() < 1e-12);

    assert!(
        (converted.report.balance_sheet.total_assets - 43_000.0 / 120.0).abs() < 1e-9
    );
    // validation is recomputed on converted figures and scales with them
    assert!(
        (converted.report.validation.difference - 2_400.0 / 120.0).abs() < 1e-9
    );
}

#[test]
fn test_missing_rate_flags_report_unconverted() {
    let rows = rows_from_csv(TRIAL_BALANCE_CSV);
    let report = classify_and_aggregate(&rows, context());
    let store = rate_store();

    let converted = report.convert(&store, "EUR");
    assert_eq!(converted.rate_used, None);
    assert_eq!(
        converted.report.balance_sheet.total_assets,
        report.balance_sheet.total_assets
    );
}

#[test]
fn test_recomputation_is_deterministic() {
    let rows = rows_from_csv(TRIAL_BALANCE_CSV);
    let first = classify_and_aggregate(&rows, context());
    let second = classify_and_aggregate(&rows, context());
    assert_eq!(first, second);
}

#[test]
fn test_independent_periods_share_nothing() {
    let rows = rows_from_csv(TRIAL_BALANCE_CSV);
    let june = ReportContext {
        period_end: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        ..context()
    };

    let july_report = classify_and_aggregate(&rows, context());
    let june_report = classify_and_aggregate(&rows, june);

    assert_eq!(
        july_report.balance_sheet.total_assets,
        june_report.balance_sheet.total_assets
    );
    assert_ne!(july_report.context.period_end, june_report.context.period_end);
}
