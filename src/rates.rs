//! Historical exchange-rate store and currency converter.
//!
//! The store assumes one fixed local currency (the currency trial balances
//! are denominated in) and indexes rates by `(target currency, date)`.
//! Every quote is normalized at ingestion to a single orientation — units
//! of target currency per 1 unit of local currency — so the converter is a
//! pure multiply/divide and never branches on rate magnitude. Feeds quote
//! both ways in the wild (a BCV line reads "124.50 VES per USD", an ECB
//! line "1.08 USD per EUR"); the orientation is settled once, per quote,
//! when it enters the store.
//!
//! Lookups fall back to the nearest date on or before the requested one,
//! then to the nearest date after; pairs not involving the local currency
//! bridge through it. A missing rate is never an error: conversions flag
//! `rate_used = None` and hand the amount back unchanged, which is also
//! how a timed-out feed must be treated by callers.
//!
//! `reload` replaces the whole table in one assignment, so a store shared
//! behind a lock never exposes a partially updated table. Staleness policy
//! is the caller's: the store refreshes only when told to.

use crate::error::{AnalyzerError, Result};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RateSource {
    Bcv,
    Ecb,
    Manual,
}

/// How a raw quote is oriented relative to the local currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuoteOrientation {
    /// Units of local currency per 1 unit of target currency
    /// (e.g. "124.50 VES per USD").
    LocalPerTarget,
    /// Units of target currency per 1 unit of local currency
    /// (e.g. "0.008 USD per VES").
    TargetPerLocal,
}

impl QuoteOrientation {
    /// Heuristic for feeds that do not state orientation: a quote >= 1 is
    /// assumed local-per-target. This matches central-bank publications for
    /// weak local currencies, which is the only place the heuristic is
    /// needed; explicit orientation always wins when the feed provides it.
    pub fn infer(rate: f64) -> Self {
        if rate >= 1.0 {
            QuoteOrientation::LocalPerTarget
        } else {
            QuoteOrientation::TargetPerLocal
        }
    }
}

/// One raw rate observation as delivered by a feed loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub target_currency: String,
    pub rate: f64,
    pub rate_date: NaiveDate,
    pub source: RateSource,
    pub orientation: QuoteOrientation,
}

/// A rate resolved by the store: units of target per 1 unit of base, plus
/// the date the underlying observation was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub rate: f64,
    pub rate_date: NaiveDate,
}

/// Result of a conversion request. `rate_used` is `None` when no direct or
/// bridged rate could be resolved; the amount is then passed through
/// unconverted so callers can render "conversion unavailable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub original_amount: f64,
    pub converted_amount: f64,
    pub from_currency: String,
    pub to_currency: String,
    pub rate_used: Option<f64>,
    pub rate_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct RateStore {
    local_currency: String,
    /// currency -> date -> units of target currency per 1 unit of local.
    table: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl RateStore {
    pub fn new(local_currency: impl Into<String>) -> Self {
        Self {
            local_currency: local_currency.into(),
            table: BTreeMap::new(),
        }
    }

    pub fn local_currency(&self) -> &str {
        &self.local_currency
    }

    pub fn is_empty(&self) -> bool {
        self.table.values().all(|dates| dates.is_empty())
    }

    /// Number of stored observations across all currencies.
    pub fn len(&self) -> usize {
        self.table.values().map(BTreeMap::len).sum()
    }

    /// Appends quotes to the table, normalizing each to target-per-local.
    /// Quotes for the local currency itself are ignored (the identity rate
    /// needs no storage). Rates are append-only; the core never deletes.
    pub fn load(&mut self, quotes: &[RateQuote]) -> Result<()> {
        for quote in quotes {
            if !(quote.rate.is_finite() && quote.rate > 0.0) {
                return Err(AnalyzerError::InvalidRate {
                    currency: quote.target_currency.clone(),
                    date: quote.rate_date.to_string(),
                    rate: quote.rate,
                });
            }

            if quote.target_currency == self.local_currency {
                debug!(
                    "ignoring quote for the local currency {} on {}",
                    quote.target_currency, quote.rate_date
                );
                continue;
            }

            let normalized = match quote.orientation {
                QuoteOrientation::TargetPerLocal => quote.rate,
                QuoteOrientation::LocalPerTarget => 1.0 / quote.rate,
            };

            debug!(
                "loaded {} rate {} for {} from {:?}",
                quote.target_currency, normalized, quote.rate_date, quote.source
            );

            self.table
                .entry(quote.target_currency.clone())
                .or_default()
                .insert(quote.rate_date, normalized);
        }
        Ok(())
    }

    /// Replaces the entire table with a freshly built one. The swap is a
    /// single assignment: a store behind a lock never exposes a partially
    /// updated table to concurrent readers.
    pub fn reload(&mut self, quotes: &[RateQuote]) -> Result<()> {
        let mut fresh = RateStore::new(self.local_currency.clone());
        fresh.load(quotes)?;
        self.table = fresh.table;
        Ok(())
    }

    /// Nearest-date lookup for one currency: exact date, else closest on or
    /// before, else closest after.
    fn lookup(&self, currency: &str, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        let dates = self.table.get(currency)?;

        if let Some((&found, &rate)) = dates.range(..=date).next_back() {
            return Some((found, rate));
        }
        dates.range(date..).next().map(|(&found, &rate)| (found, rate))
    }

    /// Resolves the rate for converting `base` into `target` on `date`.
    ///
    /// Identity pairs resolve to 1. Pairs involving the local currency use
    /// one stored observation; other pairs bridge through the local
    /// currency and report the target leg's observation date. Returns
    /// `None` when any required leg is missing.
    pub fn rate(&self, base: &str, target: &str, date: NaiveDate) -> Option<ResolvedRate> {
        if base == target {
            return Some(ResolvedRate {
                rate: 1.0,
                rate_date: date,
            });
        }

        if base == self.local_currency {
            let (rate_date, rate) = self.lookup(target, date)?;
            return Some(ResolvedRate { rate, rate_date });
        }

        if target == self.local_currency {
            let (rate_date, rate) = self.lookup(base, date)?;
            return Some(ResolvedRate {
                rate: 1.0 / rate,
                rate_date,
            });
        }

        // bridge: 1 base = (1 / base_leg) local = target_leg / base_leg target
        let (_, base_leg) = self.lookup(base, date)?;
        let (rate_date, target_leg) = self.lookup(target, date)?;
        Some(ResolvedRate {
            rate: target_leg / base_leg,
            rate_date,
        })
    }

    /// Converts an amount between two currencies for a value date. Pure
    /// multiplication by the resolved rate; a missing rate passes the
    /// amount through with `rate_used = None`.
    pub fn convert(&self, amount: f64, from: &str, to: &str, date: NaiveDate) -> Conversion {
        match self.rate(from, to, date) {
            Some(resolved) => {
                debug!(
                    "convert {} {} -> {}: x {} ({})",
                    amount, from, to, resolved.rate, resolved.rate_date
                );
                Conversion {
                    original_amount: amount,
                    converted_amount: amount * resolved.rate,
                    from_currency: from.to_string(),
                    to_currency: to.to_string(),
                    rate_used: Some(resolved.rate),
                    rate_date: Some(resolved.rate_date),
                }
            }
            None => {
                debug!("no rate path for {} -> {} on {}", from, to, date);
                Conversion {
                    original_amount: amount,
                    converted_amount: amount,
                    from_currency: from.to_string(),
                    to_currency: to.to_string(),
                    rate_used: None,
                    rate_date: None,
                }
            }
        }
    }
}
