//! Order book state container that applies snapshots and deltas.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{Level, OrderBook};

/// Live order book that can apply snapshots and deltas.
///
/// A zero amount in a delta removes the level. Levels are kept in price
/// maps, so the sorted, duplicate-free invariant of [`OrderBook`] holds for
/// every book produced by [`OrderBookState::to_order_book`].
#[derive(Debug, Clone, Default)]
pub struct OrderBookState {
    pub symbol: String,
    pub nonce: Option<i64>,
    pub timestamp: Option<i64>,
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
}

impl OrderBookState {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }

    /// Replace the state with a snapshot.
    pub fn apply_snapshot(&mut self, book: &OrderBook) {
        self.bids.clear();
        self.asks.clear();
        self.nonce = book.nonce;
        self.timestamp = book.timestamp;
        for (price, amount) in &book.bids {
            self.bids.insert(price.normalize(), *amount);
        }
        for (price, amount) in &book.asks {
            self.asks.insert(price.normalize(), *amount);
        }
    }

    /// Merge level updates. Returns `false` and changes nothing when `nonce`
    /// is older than the last applied one.
    pub fn apply_delta(&mut self, bids: &[Level], asks: &[Level], nonce: Option<i64>) -> bool {
        if let (Some(current), Some(incoming)) = (self.nonce, nonce) {
            if incoming < current {
                return false;
            }
        }
        if nonce.is_some() {
            self.nonce = nonce;
        }
        apply_side(&mut self.bids, bids);
        apply_side(&mut self.asks, asks);
        true
    }

    pub fn bids(&self) -> &BTreeMap<Decimal, Decimal> {
        &self.bids
    }

    pub fn asks(&self) -> &BTreeMap<Decimal, Decimal> {
        &self.asks
    }

    /// Highest bid price.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.nonce = None;
    }

    /// Snapshot of the current state, at most `limit` levels per side.
    pub fn to_order_book(&self, limit: Option<usize>) -> OrderBook {
        OrderBook::from_levels(
            &self.symbol,
            self.bids.iter().map(|(p, a)| (*p, *a)),
            self.asks.iter().map(|(p, a)| (*p, *a)),
            self.timestamp,
            self.nonce,
        )
        .truncate(limit)
    }
}

fn apply_side(side: &mut BTreeMap<Decimal, Decimal>, levels: &[Level]) {
    for (price, amount) in levels {
        if amount.is_zero() {
            side.remove(&price.normalize());
        } else {
            side.insert(price.normalize(), *amount);
        }
    }
}
