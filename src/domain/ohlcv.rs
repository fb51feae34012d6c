//! Candles.

use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

use super::trade::Trade;
use crate::shared::safe::{self, Key};
use crate::shared::Timeframe;

/// One candle. Serializes as `[timestamp, open, high, low, close, volume]`.
///
/// `volume` is always in base-asset units, never a contract count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ohlcv {
    pub timestamp: i64,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
}

impl Ohlcv {
    /// Read a candle from a positional array. `volume_index` selects which
    /// column holds the base-asset volume.
    pub fn from_array(raw: &Value, volume_index: usize) -> Option<Self> {
        Self::from_keys(raw, [0usize, 1, 2, 3, 4, volume_index])
    }

    /// Read a candle through six keys in tuple order. The timestamp column
    /// may be seconds, milliseconds or ISO-8601.
    pub fn from_keys<K: Key>(raw: &Value, keys: [K; 6]) -> Option<Self> {
        let timestamp = crate::shared::time::timestamp_from_value(safe::safe_value(raw, keys[0])?)?;
        Some(Self {
            timestamp,
            open: safe::safe_number(raw, keys[1]),
            high: safe::safe_number(raw, keys[2]),
            low: safe::safe_number(raw, keys[3]),
            close: safe::safe_number(raw, keys[4]),
            volume: safe::safe_number(raw, keys[5]),
        })
    }

    /// Bucket trades into `timeframe` candles, oldest first.
    ///
    /// Used where the exchange has no candle endpoint. Trades missing a
    /// timestamp, price or amount are skipped; empty buckets produce no candle.
    pub fn build_from_trades(trades: &[Trade], timeframe: Timeframe) -> Vec<Self> {
        let width = timeframe.millis();
        let mut fills: Vec<(i64, Decimal, Decimal)> = trades
            .iter()
            .filter_map(|t| Some((t.timestamp?, t.price?, t.amount?)))
            .collect();
        fills.sort_by_key(|(ts, _, _)| *ts);

        let mut candles: Vec<Ohlcv> = Vec::new();
        for (ts, price, amount) in fills {
            let open_time = ts - ts.rem_euclid(width);
            match candles.last_mut() {
                Some(candle) if candle.timestamp == open_time => {
                    candle.high = candle.high.map(|h| h.max(price));
                    candle.low = candle.low.map(|l| l.min(price));
                    candle.close = Some(price);
                    candle.volume = candle.volume.map(|v| v + amount);
                }
                _ => candles.push(Ohlcv {
                    timestamp: open_time,
                    open: Some(price),
                    high: Some(price),
                    low: Some(price),
                    close: Some(price),
                    volume: Some(amount),
                }),
            }
        }
        candles
    }
}

impl Serialize for Ohlcv {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(6))?;
        seq.serialize_element(&self.timestamp)?;
        seq.serialize_element(&self.open)?;
        seq.serialize_element(&self.high)?;
        seq.serialize_element(&self.low)?;
        seq.serialize_element(&self.close)?;
        seq.serialize_element(&self.volume)?;
        seq.end()
    }
}
