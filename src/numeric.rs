//! Normalization of numeric text as it appears in trial-balance exports.
//!
//! Accounting software emits amounts in whatever locale the workstation was
//! configured with: `1.234,56`, `1,234.56`, `Bs. 1.500,00`, `(2.000,00)` for
//! negatives. The normalizer maps all of these onto a plain `f64` and
//! defaults to `0.0` rather than failing, because a single malformed cell
//! must never abort an import.

/// Parses a raw amount string of unknown locale into a signed float.
///
/// Disambiguation rules:
/// - parentheses wrap negatives (accounting convention);
/// - when both `.` and `,` are present, whichever occurs last is the
///   decimal separator and the other is stripped as a thousands separator;
/// - a lone `,` is decimal only if it appears once with at most 3 digits
///   after it, otherwise it is a thousands separator.
pub fn normalize_amount(raw: &str) -> f64 {
    let mut cleaned = raw.trim().to_string();
    if cleaned.is_empty() {
        return 0.0;
    }

    let mut negative = false;
    if cleaned.starts_with('(') && cleaned.ends_with(')') {
        negative = true;
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }

    cleaned.retain(|c| c.is_ascii_digit() || c == '.' || c == ',' || c == '-');

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let candidate = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            if dot > comma {
                // `1,234.56` style: comma groups thousands
                cleaned.replace(',', "")
            } else {
                // `1.234,56` style: dot groups thousands, comma is decimal
                cleaned.replace('.', "").replace(',', ".")
            }
        }
        (None, Some(_)) => {
            let parts: Vec<&str> = cleaned.split(',').collect();
            if parts.len() == 2 && parts[1].len() <= 3 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        _ => cleaned,
    };

    let value = candidate.parse::<f64>().unwrap_or(0.0);
    let value = if value.is_finite() { value } else { 0.0 };
    if negative {
        -value
    } else {
        value
    }
}

/// Whether a raw cell holds a meaningful amount. Export tools pad unused
/// columns with `0,00` or blanks; those do not count as values when the
/// row filter decides whether a row carries data.
pub fn is_significant(raw: &str) -> bool {
    normalize_amount(raw).abs() > 0.001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_european_format() {
        assert_eq!(normalize_amount("1.234,56"), 1234.56);
        assert_eq!(normalize_amount("1.500,00"), 1500.00);
        assert_eq!(normalize_amount("12.345.678,90"), 12_345_678.90);
    }

    #[test]
    fn test_anglo_format() {
        assert_eq!(normalize_amount("1,234.56"), 1234.56);
        assert_eq!(normalize_amount("12,345,678.90"), 12_345_678.90);
    }

    #[test]
    fn test_lone_comma_heuristic() {
        // one comma, <= 3 trailing digits: decimal
        assert_eq!(normalize_amount("1500,5"), 1500.5);
        assert_eq!(normalize_amount("0,75"), 0.75);
        // one comma, 4 trailing digits: thousands
        assert_eq!(normalize_amount("1,5000"), 15000.0);
        // several commas: thousands
        assert_eq!(normalize_amount("1,234,567"), 1_234_567.0);
    }

    #[test]
    fn test_currency_symbols_stripped() {
        assert_eq!(normalize_amount("Bs. 1.500,00"), 1500.00);
        assert_eq!(normalize_amount("$ 2,000.00"), 2000.00);
        assert_eq!(normalize_amount("USD 99"), 99.0);
    }

    #[test]
    fn test_parenthesis_negative() {
        assert_eq!(normalize_amount("(2.000,00)"), -2000.00);
        assert_eq!(normalize_amount("(150)"), -150.0);
    }

    #[test]
    fn test_explicit_minus() {
        assert_eq!(normalize_amount("-1.234,56"), -1234.56);
        assert_eq!(normalize_amount("-99"), -99.0);
    }

    #[test]
    fn test_unparseable_defaults_to_zero() {
        assert_eq!(normalize_amount(""), 0.0);
        assert_eq!(normalize_amount("   "), 0.0);
        assert_eq!(normalize_amount("N/A"), 0.0);
        assert_eq!(normalize_amount("--"), 0.0);
        assert_eq!(normalize_amount("()"), 0.0);
    }

    #[test]
    fn test_idempotent_on_canonical_output() {
        for raw in ["1.234,56", "1,234.56", "(500)", "42"] {
            let once = normalize_amount(raw);
            let twice = normalize_amount(&once.to_string());
            assert_eq!(once, twice, "re-normalizing {:?} changed the value", raw);
        }
    }

    #[test]
    fn test_is_significant() {
        assert!(is_significant("309979.43"));
        assert!(is_significant("-0,50"));
        assert!(!is_significant("0,00"));
        assert!(!is_significant("0"));
        assert!(!is_significant(""));
        assert!(!is_significant("0.0001"));
    }
}
