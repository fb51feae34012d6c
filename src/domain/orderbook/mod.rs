//! Order book snapshots.
//!
//! [`OrderBook`] is the canonical snapshot returned by `fetch_order_book`.
//! It is always built through [`OrderBook::from_levels`], which sums amounts
//! at equal prices and sorts bids descending and asks ascending.
//! [`OrderBookState`] keeps a book up to date from snapshots and deltas.

pub mod state;

pub use state::OrderBookState;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::shared::safe::{self, Key};
use crate::shared::time;

/// One `[price, amount]` level.
pub type Level = (Decimal, Decimal);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    /// Highest price first.
    pub bids: Vec<Level>,
    /// Lowest price first.
    pub asks: Vec<Level>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    /// Upstream sequence number, when reported.
    pub nonce: Option<i64>,
}

impl OrderBook {
    pub fn from_levels(
        symbol: &str,
        bids: impl IntoIterator<Item = Level>,
        asks: impl IntoIterator<Item = Level>,
        timestamp: Option<i64>,
        nonce: Option<i64>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            bids: aggregate(bids).into_iter().rev().collect(),
            asks: aggregate(asks).into_iter().collect(),
            timestamp,
            datetime: timestamp.and_then(time::iso8601),
            nonce,
        }
    }

    /// Keep at most `limit` levels per side.
    pub fn truncate(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.bids.truncate(limit);
            self.asks.truncate(limit);
        }
        self
    }

    pub fn best_bid(&self) -> Option<Level> {
        self.bids.first().copied()
    }

    pub fn best_ask(&self) -> Option<Level> {
        self.asks.first().copied()
    }
}

fn aggregate(levels: impl IntoIterator<Item = Level>) -> BTreeMap<Decimal, Decimal> {
    let mut book = BTreeMap::new();
    for (price, amount) in levels {
        *book.entry(price.normalize()).or_insert(Decimal::ZERO) += amount;
    }
    book.values_mut().for_each(|amount| *amount = amount.normalize());
    book
}

/// Read levels out of a raw side list.
///
/// Entries that lack a parseable price or amount are skipped.
pub fn parse_levels<K: Key>(raw: Option<&Vec<Value>>, price_key: K, amount_key: K) -> Vec<Level> {
    raw.map(|entries| {
        entries
            .iter()
            .filter_map(|entry| {
                Some((
                    safe::safe_number(entry, price_key)?,
                    safe::safe_number(entry, amount_key)?,
                ))
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Like [`parse_levels`], for feeds mixing `[price, amount]` arrays with
/// `{price_key, amount_key}` objects.
pub fn parse_mixed_levels(raw: Option<&Vec<Value>>, price_key: &str, amount_key: &str) -> Vec<Level> {
    raw.map(|entries| {
        entries
            .iter()
            .filter_map(|entry| {
                if entry.is_array() {
                    Some((safe::safe_number(entry, 0)?, safe::safe_number(entry, 1)?))
                } else {
                    Some((
                        safe::safe_number(entry, price_key)?,
                        safe::safe_number(entry, amount_key)?,
                    ))
                }
            })
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_duplicate_levels_are_summed() {
        let raw = json!({"bids": [["100", "1"], ["100", "2"], ["99", "5"]], "asks": [["101", "1"]]});
        let bids = parse_levels(safe::safe_list(&raw, "bids"), 0, 1);
        let asks = parse_levels(safe::safe_list(&raw, "asks"), 0, 1);
        let book = OrderBook::from_levels("BTC/USDT", bids, asks, None, None);
        assert_eq!(book.bids, vec![(dec("100"), dec("3")), (dec("99"), dec("5"))]);
        assert_eq!(book.asks, vec![(dec("101"), dec("1"))]);
    }

    #[test]
    fn test_equal_prices_with_different_scale_merge() {
        let book = OrderBook::from_levels(
            "X/Y",
            vec![(dec("1.50"), dec("1")), (dec("1.5"), dec("2"))],
            vec![],
            None,
            None,
        );
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.bids[0].1, dec("3"));
    }

    #[test]
    fn test_sides_are_sorted() {
        let book = OrderBook::from_levels(
            "X/Y",
            vec![(dec("98"), dec("1")), (dec("100"), dec("1")), (dec("99"), dec("1"))],
            vec![(dec("103"), dec("1")), (dec("101"), dec("1")), (dec("102"), dec("1"))],
            Some(1_700_000_000_000),
            Some(7),
        );
        let bid_prices: Vec<_> = book.bids.iter().map(|l| l.0).collect();
        let ask_prices: Vec<_> = book.asks.iter().map(|l| l.0).collect();
        assert_eq!(bid_prices, vec![dec("100"), dec("99"), dec("98")]);
        assert_eq!(ask_prices, vec![dec("101"), dec("102"), dec("103")]);
        assert_eq!(book.datetime.as_deref(), Some("2023-11-14T22:13:20.000Z"));
        assert_eq!(book.best_bid(), Some((dec("100"), dec("1"))));
        assert_eq!(book.truncate(Some(1)).asks.len(), 1);
    }

    #[test]
    fn test_object_and_array_entries() {
        let raw = json!([{"price": "10", "quantity": "1"}, ["9", "2"], {"price": "x"}]);
        let levels = parse_mixed_levels(raw.as_array(), "price", "quantity");
        assert_eq!(levels, vec![(dec("10"), dec("1")), (dec("9"), dec("2"))]);
    }

    #[test]
    fn test_serializes_levels_as_string_pairs() {
        let book = OrderBook::from_levels("X/Y", vec![(dec("100"), dec("3"))], vec![], None, None);
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["bids"], json!([["100", "3"]]));
    }
}
