//! Canonical entities, one vertical slice per entity.
//!
//! Every entity is a plain serde struct with decimal fields (rendered as
//! strings) and an `info` field holding the raw upstream payload. The
//! `complete()` methods are the shared normalizer steps every adapter runs
//! after mapping its native fields: deriving missing quantities, normalizing
//! fee signs and filling `datetime`.

pub mod address;
pub mod balance;
pub mod currency;
pub mod fee;
pub mod ledger;
pub mod market;
pub mod ohlcv;
pub mod order;
pub mod orderbook;
pub mod position;
pub mod ticker;
pub mod trade;
pub mod transaction;

/// Entities that carry an optional timestamp, for `since`/`limit` filtering.
pub trait Timestamped {
    fn timestamp(&self) -> Option<i64>;
}

macro_rules! timestamped {
    ($($ty:ty),*) => {
        $(impl Timestamped for $ty {
            fn timestamp(&self) -> Option<i64> {
                self.timestamp
            }
        })*
    };
}

timestamped!(
    trade::Trade,
    order::Order,
    transaction::Transaction,
    ledger::LedgerEntry
);

impl Timestamped for ohlcv::Ohlcv {
    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

/// Sort ascending by timestamp, drop entries older than `since` and keep the
/// first `limit`.
pub fn filter_by_since_limit<T: Timestamped>(
    mut items: Vec<T>,
    since: Option<i64>,
    limit: Option<usize>,
) -> Vec<T> {
    items.sort_by_key(|item| item.timestamp().unwrap_or(i64::MIN));
    if let Some(since) = since {
        items.retain(|item| item.timestamp().is_some_and(|ts| ts >= since));
    }
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}
