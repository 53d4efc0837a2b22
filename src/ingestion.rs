//! Turns raw column-keyed export rows into [`NormalizedRow`]s.
//!
//! Trial-balance exports disagree on almost everything: column names come in
//! Spanish or English, with or without accents; balances live in a single
//! net column or in debit/credit pairs; and export tools interleave account
//! lines with page banners ("Usuario:", "Página:", report titles). This
//! module resolves column synonyms, drops banner noise, and produces one
//! normalized record per real account line. Ingestion favors over-inclusion:
//! a row with only a code or only a description is kept, because the
//! classifier routes anything unrecognizable to the unclassified bucket
//! instead of silently losing it.

use crate::numeric::{is_significant, normalize_amount};
use crate::utils::fold_text;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One raw export row: column name to cell text, as produced by whatever
/// CSV/spreadsheet/PDF extractor feeds the pipeline.
pub type RawRow = HashMap<String, String>;

const CODE_COLUMNS: &[&str] = &["codigo", "code", "cod"];

const DESCRIPTION_COLUMNS: &[&str] = &[
    "descripcion",
    "description",
    "cuenta",
    "account",
    "concepto",
    "item",
];

const BALANCE_COLUMNS: &[&str] = &[
    "saldoactual",
    "saldo actual",
    "saldo",
    "valor",
    "value",
    "monto",
    "amount",
    "importe",
    "total",
];

const DEBIT_COLUMNS: &[&str] = &[
    "debitos",
    "debito",
    "debe",
    "saldodeudor",
    "saldo deudor",
    "debit",
];

const CREDIT_COLUMNS: &[&str] = &[
    "creditos",
    "credito",
    "haber",
    "saldoacreedor",
    "saldo acreedor",
    "credit",
];

const INITIAL_COLUMNS: &[&str] = &["saldoinicial", "saldo inicial", "initial balance"];

/// Banner fragments printed by accounting packages on every page of an
/// export. Matched against the accent-folded description.
const BANNER_MARKERS: &[&str] = &[
    "profit plus",
    "usuario:",
    "user:",
    "pagina:",
    "page:",
    "fecha:",
    "date:",
    "hora:",
    "time:",
    "r.i.f",
    "balance de comprobacion",
];

/// A cleaned account line. Numeric fields default to 0 when the source
/// column is absent or unparseable.
///
/// `balance` is debit-signed: a credit balance shows up negative. Exports
/// that only print positive magnitudes should supply debit/credit column
/// pairs, which are resolved by subtraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub code: String,
    pub description: String,
    pub debit: f64,
    pub credit: f64,
    pub balance: f64,
    pub initial_balance: f64,
}

fn field<'a>(row: &'a RawRow, names: &[&str]) -> Option<&'a str> {
    for name in names {
        let hit = row.iter().find_map(|(key, value)| {
            let trimmed = value.trim();
            (fold_text(key).trim() == *name && !trimmed.is_empty()).then_some(trimmed)
        });
        if hit.is_some() {
            return hit;
        }
    }
    None
}

fn numeric_field(row: &RawRow, names: &[&str]) -> f64 {
    field(row, names).map(normalize_amount).unwrap_or(0.0)
}

fn has_significant_value(row: &RawRow) -> bool {
    [BALANCE_COLUMNS, DEBIT_COLUMNS, CREDIT_COLUMNS, INITIAL_COLUMNS]
        .into_iter()
        .any(|columns| field(row, columns).map(is_significant).unwrap_or(false))
}

/// Decides whether a raw row is a real account line.
///
/// A row is dropped when it carries no code, no usable description AND no
/// significant amount, or when its description matches a known export
/// banner. Everything else is kept.
pub fn keep_row(row: &RawRow) -> bool {
    let code = field(row, CODE_COLUMNS).unwrap_or("");
    let description = field(row, DESCRIPTION_COLUMNS).unwrap_or("");
    let folded_description = fold_text(description);

    if BANNER_MARKERS
        .iter()
        .any(|marker| folded_description.contains(marker))
    {
        return false;
    }

    !code.is_empty() || description.len() > 2 || has_significant_value(row)
}

/// Applies the row filter and resolves the row's fields. Returns `None` for
/// filtered rows.
///
/// Balance resolution, in priority order:
/// 1. an explicit balance column (`SaldoActual`, `Saldo`, `Valor`, ...);
/// 2. `initial + debit − credit` when any debit/credit-family column is
///    present (`Débitos/Créditos`, `Debe/Haber`, `SaldoDeudor/SaldoAcreedor`).
pub fn normalize_row(row: &RawRow) -> Option<NormalizedRow> {
    if !keep_row(row) {
        debug!("row filtered as noise: {:?}", row);
        return None;
    }

    let code = field(row, CODE_COLUMNS).unwrap_or("").to_string();
    let description = field(row, DESCRIPTION_COLUMNS).unwrap_or("").to_string();

    let debit = numeric_field(row, DEBIT_COLUMNS);
    let credit = numeric_field(row, CREDIT_COLUMNS);
    let initial_balance = numeric_field(row, INITIAL_COLUMNS);

    let balance = match field(row, BALANCE_COLUMNS) {
        Some(raw) => normalize_amount(raw),
        None => initial_balance + debit - credit,
    };

    Some(NormalizedRow {
        code,
        description,
        debit,
        credit,
        balance,
        initial_balance,
    })
}

/// Filters and normalizes a whole export.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<NormalizedRow> {
    let normalized: Vec<NormalizedRow> = rows.iter().filter_map(normalize_row).collect();
    debug!(
        "ingestion kept {} of {} raw rows",
        normalized.len(),
        rows.len()
    );
    normalized
}
