use chrono::NaiveDate;
use std::collections::HashMap;
use trial_balance_analyzer::{
    classify_and_aggregate, AlertThresholds, QuoteOrientation, RateQuote, RateSource, RateStore,
    RawRow, ReportContext, TrialBalanceProcessor,
};

fn row(pairs: &[(&str, &str)]) -> RawRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>()
}

fn main() {
    let rows = vec![
        row(&[
            ("Codigo", "201-01-01"),
            ("Descripcion", "CAJA CHICA"),
            ("SaldoActual", "1.500,00"),
        ]),
        row(&[
            ("Codigo", "203-11-01"),
            ("Descripcion", "BANCOS MONEDA NACIONAL"),
            ("SaldoActual", "8.500,00"),
        ]),
        row(&[
            ("Codigo", "201-02-01"),
            ("Descripcion", "PRIMAS POR COBRAR"),
            ("SaldoActual", "4.000,00"),
        ]),
        row(&[
            ("Codigo", "301-01-01"),
            ("Descripcion", "CUENTAS POR PAGAR"),
            ("SaldoActual", "(6.000,00)"),
        ]),
        row(&[
            ("Codigo", "401-01-01"),
            ("Descripcion", "CAPITAL SOCIAL"),
            ("SaldoActual", "(8.000,00)"),
        ]),
        row(&[
            ("Codigo", "4101"),
            ("Descripcion", "PRIMAS EMITIDAS"),
            ("SaldoActual", "(2.000,00)"),
        ]),
        row(&[
            ("Codigo", "5.2.1"),
            ("Descripcion", "GASTOS DE ADMINISTRACION"),
            ("SaldoActual", "1.500,00"),
        ]),
        // page banner the row filter must discard
        row(&[("Descripcion", "Profit Plus Contabilidad - Usuario: ADMIN")]),
    ];

    let context = ReportContext {
        company_name: "Seguros Demo C.A.".to_string(),
        currency: "VES".to_string(),
        period_end: NaiveDate::from_ymd_opt(2025, 7, 29).unwrap(),
    };

    let outcome =
        TrialBalanceProcessor::process(&rows, context.clone(), &AlertThresholds::default())
            .expect("thresholds are valid");

    let report = &outcome.report;
    println!("=== {} ===", report.context.company_name);
    println!("Total assets:       {:>12.2}", report.balance_sheet.total_assets);
    println!("Total liabilities:  {:>12.2}", report.balance_sheet.total_liabilities);
    println!("Total equity:       {:>12.2}", report.balance_sheet.total_equity);
    println!("Net income:         {:>12.2}", report.income_statement.net_income);
    println!(
        "Patrimonial check:  {} (difference {:.2})",
        if report.validation.is_valid { "OK" } else { "IMBALANCE" },
        report.validation.difference
    );

    println!("\nCurrent ratio: {:.2}", outcome.ratios.liquidity.current);
    println!("Debt ratio:    {:.2}", outcome.ratios.solvency.debt_ratio);

    for alert in &outcome.alerts {
        println!("[{:?}] {} — {}", alert.severity, alert.title, alert.recommendation);
    }

    // re-express the report in USD using a historical BCV observation
    let mut store = RateStore::new("VES");
    store
        .load(&[RateQuote {
            target_currency: "USD".to_string(),
            rate: 124.50,
            rate_date: NaiveDate::from_ymd_opt(2025, 7, 25).unwrap(),
            source: RateSource::Bcv,
            orientation: QuoteOrientation::infer(124.50),
        }])
        .expect("valid quote");

    let report = classify_and_aggregate(&rows, context);
    let converted = report.convert(&store, "USD");
    match converted.rate_used {
        Some(rate) => println!(
            "\nIn USD (rate {:.6} of {}): total assets {:.2}",
            rate,
            converted.rate_date.unwrap(),
            converted.report.balance_sheet.total_assets
        ),
        None => println!("\nUSD conversion unavailable"),
    }
}
