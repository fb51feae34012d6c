use rust_decimal::Decimal;
use serde_json::Value;

use crate::describe::Descriptor;
use crate::domain::currency::{Currency, CurrencyLimits};
use crate::domain::market::{Market, MarketLimits, MarketPrecision, MinMax};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ticker::Ticker;
use crate::domain::trade::Trade;
use crate::exchange::MarketScope;
use crate::shared::precise::opt;
use crate::shared::precision::parse_precision;
use crate::shared::{safe, time, MarketType, Side, TakerOrMaker};

const MAKER_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 4);
const TAKER_FEE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

fn date(raw: &Value, key: &str) -> Option<i64> {
    safe::safe_string(raw, key).as_deref().and_then(time::parse8601)
}

pub(super) fn market(descriptor: &Descriptor, raw: &Value) -> Market {
    let base_id = safe::safe_string(raw, "base").unwrap_or_default();
    let quote_id = safe::safe_string(raw, "quote").unwrap_or_default();
    Market {
        id: safe::safe_string(raw, "symbol").unwrap_or_default(),
        base: descriptor.safe_currency_code(Some(base_id.as_str())).unwrap_or_default(),
        quote: descriptor.safe_currency_code(Some(quote_id.as_str())).unwrap_or_default(),
        base_id,
        quote_id,
        market_type: MarketType::Spot,
        active: safe::safe_bool(raw, "enabled").unwrap_or(true),
        maker: Some(MAKER_FEE),
        taker: Some(TAKER_FEE),
        precision: MarketPrecision {
            amount: safe::safe_number(raw, "amount_tick"),
            price: safe::safe_number(raw, "price_tick"),
        },
        limits: MarketLimits {
            amount: MinMax::new(safe::safe_number(raw, "min_amount"), None),
            cost: MinMax::new(safe::safe_number(raw, "min_value"), None),
            ..Default::default()
        },
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// `precision` is a digit count.
pub(super) fn currency(descriptor: &Descriptor, raw: &Value) -> Currency {
    let id = safe::safe_string(raw, "code").unwrap_or_default();
    let digits = safe::safe_string(raw, "precision");
    Currency {
        code: descriptor.safe_currency_code(Some(id.as_str())).unwrap_or_default(),
        id,
        name: safe::safe_string(raw, "name"),
        active: Some(safe::safe_bool(raw, "active").unwrap_or(true)),
        deposit: Some(safe::safe_bool(raw, "can_deposit").unwrap_or(true)),
        withdraw: Some(safe::safe_bool(raw, "can_withdraw").unwrap_or(true)),
        precision: opt::decimal(digits.as_deref().and_then(parse_precision).as_deref()),
        limits: CurrencyLimits {
            withdraw: MinMax::new(safe::safe_number(raw, "min_withdraw_amount"), None),
            ..Default::default()
        },
        info: raw.clone(),
        ..Default::default()
    }
}

/// Quote volume is raised to at least `baseVolume × low`. A flat range
/// (`low == high`) pins it to exactly that product.
fn reconcile_quote_volume(
    base: Option<Decimal>,
    quote: Option<Decimal>,
    low: Option<Decimal>,
    high: Option<Decimal>,
) -> Option<Decimal> {
    let (Some(base), Some(reported), Some(low)) = (base, quote, low) else {
        return quote;
    };
    if base.is_zero() || reported.is_zero() {
        return quote;
    }
    let floor = base.checked_mul(low)?.normalize();
    if high == Some(low) || reported < floor {
        tracing::trace!(%reported, %floor, "ripio quote volume reconciled");
        return Some(floor);
    }
    quote
}

pub(super) fn ticker(raw: &Value, scope: MarketScope<'_>) -> Ticker {
    let id = safe::safe_string(raw, "pair");
    let low = safe::safe_number(raw, "low");
    let high = safe::safe_number(raw, "high");
    let base_volume = safe::safe_number(raw, "volume");
    Ticker {
        symbol: scope.symbol(id.as_deref(), Some("_")),
        timestamp: date(raw, "date"),
        high,
        low,
        bid: safe::safe_number(raw, "bid"),
        ask: safe::safe_number(raw, "ask"),
        last: safe::safe_number(raw, "last"),
        percentage: safe::safe_number(raw, "price_change_percent_24h"),
        base_volume,
        quote_volume: reconcile_quote_volume(base_volume, safe::safe_number(raw, "quote_volume"), low, high),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// Public trades name the aggressor through `taker_side`/`taker_type`;
/// private fills carry `side`, `type` and `taker_or_maker`.
pub(super) fn trade(raw: &Value, scope: MarketScope<'_>) -> Trade {
    let id = safe::safe_string2(raw, "pair", "pair_code");
    let side = safe::safe_string_lower(raw, "side")
        .or_else(|| safe::safe_string_lower(raw, "taker_side"))
        .as_deref()
        .and_then(Side::parse);
    Trade {
        id: safe::safe_string(raw, "id"),
        order: safe::safe_string(raw, "taker_order_id"),
        timestamp: date(raw, "date"),
        symbol: scope.symbol(id.as_deref(), Some("_")),
        order_type: safe::safe_string2(raw, "type", "taker_type"),
        side,
        taker_or_maker: Some(
            safe::safe_string(raw, "taker_or_maker")
                .as_deref()
                .and_then(TakerOrMaker::parse)
                .unwrap_or(TakerOrMaker::Taker),
        ),
        price: safe::safe_number(raw, "price"),
        amount: safe::safe_number(raw, "amount"),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// `cost` is `price × executed_amount`; no average is reported.
pub(super) fn order(raw: &Value, scope: MarketScope<'_>, status: Option<OrderStatus>) -> Order {
    let id = safe::safe_string(raw, "pair");
    let filled = safe::safe_number(raw, "executed_amount");
    let last_trade_timestamp = match filled {
        Some(filled) if filled > Decimal::ZERO => date(raw, "update_date"),
        _ => None,
    };
    Order {
        id: safe::safe_string(raw, "id").unwrap_or_default(),
        client_order_id: safe::safe_string(raw, "external_id"),
        timestamp: date(raw, "create_date"),
        last_trade_timestamp,
        status,
        symbol: scope.symbol(id.as_deref(), Some("_")),
        order_type: safe::safe_string_lower(raw, "type"),
        side: safe::safe_string_lower(raw, "side").as_deref().and_then(Side::parse),
        price: safe::safe_number(raw, "price"),
        amount: safe::safe_number(raw, "requested_amount"),
        filled,
        remaining: safe::safe_number(raw, "remaining_amount"),
        cost: opt::decimal(
            opt::mul(
                safe::safe_string(raw, "price").as_deref(),
                safe::safe_string(raw, "executed_amount").as_deref(),
            )
            .as_deref(),
        ),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::MarketIndex;
    use crate::exchange::ripio::Ripio;
    use crate::exchange::ExchangeAdapter;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_market_uses_ticks_and_static_fees() {
        let ripio = Ripio::new();
        let m = market(
            ripio.descriptor(),
            &json!({
                "base": "BTC",
                "quote": "BRL",
                "symbol": "BTC_BRL",
                "amount_tick": 0.0001,
                "price_tick": 1,
                "min_amount": 0.0005,
                "min_value": 10,
                "enabled": false
            }),
        );
        assert_eq!(m.symbol, "BTC/BRL");
        assert!(!m.active);
        assert_eq!(m.precision.amount, Some(dec("0.0001")));
        assert_eq!(m.limits.cost.min, Some(dec("10")));
        assert_eq!(m.taker, Some(dec("0.005")));
        assert_eq!(m.maker, Some(dec("0.0025")));
    }

    #[test]
    fn test_currency_precision_from_digits() {
        let ripio = Ripio::new();
        let c = currency(
            ripio.descriptor(),
            &json!({"code": "BTC", "name": "Bitcoin", "precision": 8, "min_withdraw_amount": 0.0001, "can_deposit": false}),
        );
        assert_eq!(c.precision, Some(dec("0.00000001")));
        assert_eq!(c.deposit, Some(false));
        assert_eq!(c.withdraw, Some(true));
        assert_eq!(c.limits.withdraw.min, Some(dec("0.0001")));
    }

    #[test]
    fn test_flat_range_pins_quote_volume() {
        let index = MarketIndex::default();
        let raw = json!({
            "pair": "BTC_BRL",
            "date": "2022-11-11T01:31:35.820Z",
            "high": "100",
            "low": "100",
            "last": "100",
            "volume": "2",
            "quote_volume": "150.1"
        });
        let t = ticker(&raw, MarketScope::new(&index));
        assert_eq!(t.symbol, "BTC/BRL");
        assert_eq!(t.quote_volume, Some(dec("200")));
        assert_eq!(t.close, Some(dec("100")));
        assert_eq!(t.timestamp, Some(1668130295820));
    }

    #[test]
    fn test_quote_volume_below_floor_is_raised() {
        assert_eq!(
            reconcile_quote_volume(Some(dec("2")), Some(dec("10")), Some(dec("90")), Some(dec("110"))),
            Some(dec("180"))
        );
        assert_eq!(
            reconcile_quote_volume(Some(dec("2")), Some(dec("200")), Some(dec("90")), Some(dec("110"))),
            Some(dec("200"))
        );
        assert_eq!(
            reconcile_quote_volume(Some(dec("0")), Some(dec("5")), Some(dec("90")), Some(dec("90"))),
            Some(dec("5"))
        );
    }

    #[test]
    fn test_public_trade_defaults_to_taker() {
        let index = MarketIndex::default();
        let raw = json!({
            "id": "19A0A0E2-A6A3-4F5E-8B1F-D6D5E7A9E1F1",
            "pair": "BTC_BRL",
            "date": "2022-11-11T01:31:35.820Z",
            "price": "100000",
            "amount": "0.5",
            "taker_side": "sell",
            "taker_type": "limit",
            "taker_order_id": "A1"
        });
        let t = trade(&raw, MarketScope::new(&index));
        assert_eq!(t.side, Some(Side::Sell));
        assert_eq!(t.taker_or_maker, Some(TakerOrMaker::Taker));
        assert_eq!(t.order_type.as_deref(), Some("limit"));
        assert_eq!(t.order.as_deref(), Some("A1"));
        assert_eq!(t.cost, Some(dec("50000")));
    }

    #[test]
    fn test_order_cost_and_last_trade() {
        let index = MarketIndex::default();
        let raw = json!({
            "id": "554F2D2C-F7C7-4BCD-9A55-0D5B77C5A3C6",
            "pair": "BTC_BRL",
            "side": "Buy",
            "type": "Limit",
            "price": "100",
            "requested_amount": "3",
            "executed_amount": "1",
            "remaining_amount": "2",
            "create_date": "2022-11-11T01:31:35.820Z",
            "update_date": "2022-11-11T01:32:35.820Z"
        });
        let o = order(&raw, MarketScope::new(&index), Some(OrderStatus::Open));
        assert_eq!(o.symbol, "BTC/BRL");
        assert_eq!(o.side, Some(Side::Buy));
        assert_eq!(o.order_type.as_deref(), Some("limit"));
        assert_eq!(o.cost, Some(dec("100")));
        assert_eq!(o.last_trade_timestamp, Some(1668130355820));
    }
}
