use crate::error::{AnalyzerError, Result};
use chrono::{Datelike, Days, NaiveDate};

/// Parses a date in either `DD/MM/YYYY` (rate-table exports) or
/// `YYYY-MM-DD` (ISO) format.
pub fn parse_flexible_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();

    if trimmed.contains('/') {
        return NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
            .map_err(|_| AnalyzerError::InvalidDate(raw.to_string()));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| AnalyzerError::InvalidDate(raw.to_string()))
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

pub fn period_end(year: i32, month: u32) -> NaiveDate {
    last_day_of_month(year, month.clamp(1, 12))
}

/// Lowercases and strips Spanish diacritics so that column synonyms and
/// description keywords match regardless of how the export was encoded
/// ("Descripción" vs "descripcion", "PRÉSTAMO" vs "prestamo").
pub fn fold_text(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            _ => c,
        })
        .collect()
}
