use rust_decimal::Decimal;
use serde_json::Value;

use crate::describe::Descriptor;
use crate::domain::currency::Currency;
use crate::domain::fee::Fee;
use crate::domain::ledger::{LedgerDirection, LedgerEntry};
use crate::domain::market::{Market, MarketLimits, MarketPrecision, MinMax};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::position::{Position, PositionSide};
use crate::domain::ticker::Ticker;
use crate::domain::trade::{resolve_side, Trade};
use crate::domain::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::exchange::MarketScope;
use crate::shared::precise::div_truncated;
use crate::shared::{safe, MarginMode, MarketType};

const TRANSACTION_STATUSES: [(&str, TransactionStatus); 4] = [
    ("0", TransactionStatus::Pending),
    ("1", TransactionStatus::Ok),
    ("2", TransactionStatus::Failed),
    ("3", TransactionStatus::Pending),
];

const LEDGER_TYPES: [(&str, &str); 11] = [
    ("1", "transfer"),
    ("2", "trade"),
    ("3", "trade"),
    ("4", "rebate"),
    ("5", "trade"),
    ("6", "transfer"),
    ("7", "trade"),
    ("8", "fee"),
    ("9", "trade"),
    ("10", "trade"),
    ("11", "trade"),
];

pub(super) fn market(descriptor: &Descriptor, raw: &Value) -> Market {
    let market_type = safe::safe_string(raw, "instType")
        .as_deref()
        .and_then(MarketType::parse)
        .unwrap_or(MarketType::Swap);
    let base_id = safe::safe_string(raw, "baseCurrency").unwrap_or_default();
    let quote_id = safe::safe_string(raw, "quoteCurrency").unwrap_or_default();
    let settle_id = safe::safe_string2(raw, "settleCurrency", "quoteCurrency");
    let max_leverage = safe::safe_number(raw, "maxLeverage")
        .unwrap_or(Decimal::ONE_HUNDRED)
        .max(Decimal::ONE);
    let fees = descriptor.fees.for_type(market_type);
    Market {
        id: safe::safe_string(raw, "instId").unwrap_or_default(),
        base: descriptor.safe_currency_code(Some(base_id.as_str())).unwrap_or_default(),
        quote: descriptor.safe_currency_code(Some(quote_id.as_str())).unwrap_or_default(),
        settle: descriptor.safe_currency_code(settle_id.as_deref()),
        base_id,
        quote_id,
        settle_id,
        market_type,
        margin: market_type == MarketType::Spot && max_leverage > Decimal::ONE,
        active: safe::safe_string(raw, "state").as_deref() == Some("live"),
        contract_size: safe::safe_number(raw, "contractValue"),
        taker: Some(fees.taker),
        maker: Some(fees.maker),
        precision: MarketPrecision {
            amount: safe::safe_number(raw, "lotSize"),
            price: safe::safe_number(raw, "tickSize"),
        },
        limits: MarketLimits {
            amount: MinMax::new(safe::safe_number(raw, "minSize"), None),
            leverage: MinMax::new(Some(Decimal::ONE), Some(max_leverage)),
            ..Default::default()
        },
        created: safe::safe_integer(raw, "listTime"),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// Quote volume is only meaningful for spot; `vol24h` counts contracts on swaps.
pub(super) fn ticker(raw: &Value, scope: MarketScope<'_>) -> Ticker {
    let id = safe::safe_string(raw, "instId");
    let spot = scope.resolve(id.as_deref()).is_some_and(|m| m.spot);
    Ticker {
        symbol: scope.symbol(id.as_deref(), Some("-")),
        timestamp: safe::safe_integer(raw, "ts"),
        high: safe::safe_number(raw, "high24h"),
        low: safe::safe_number(raw, "low24h"),
        bid: safe::safe_number(raw, "bidPrice"),
        bid_volume: safe::safe_number(raw, "bidSize"),
        ask: safe::safe_number(raw, "askPrice"),
        ask_volume: safe::safe_number(raw, "askSize"),
        open: safe::safe_number(raw, "open24h"),
        last: safe::safe_number(raw, "last"),
        base_volume: safe::safe_number(raw, "vol24h"),
        quote_volume: if spot { safe::safe_number(raw, "volCurrency24h") } else { None },
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// Public trades and private fills. Fees are charged in the settle currency.
pub(super) fn trade(raw: &Value, scope: MarketScope<'_>) -> Trade {
    let id = safe::safe_string(raw, "instId");
    let settle = scope.resolve(id.as_deref()).and_then(|m| m.settle.clone());
    Trade {
        id: safe::safe_string(raw, "tradeId"),
        order: safe::safe_string(raw, "orderId"),
        timestamp: safe::safe_integer(raw, "ts"),
        symbol: scope.symbol(id.as_deref(), Some("-")),
        side: resolve_side(safe::safe_string(raw, "side").as_deref(), None),
        price: safe::safe_number2(raw, "price", "fillPrice"),
        amount: safe::safe_number2(raw, "size", "fillSize"),
        fee: safe::safe_number(raw, "fee").and_then(|cost| Fee::from_parts(Some(cost), settle, None)),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// `orderType` folds time-in-force and post-only into the type; they are
/// split back out here.
pub(super) fn order(descriptor: &Descriptor, raw: &Value, scope: MarketScope<'_>, status: Option<OrderStatus>) -> Order {
    let id = safe::safe_string(raw, "instId");
    let market = scope.resolve(id.as_deref());
    let native_type = safe::safe_string(raw, "orderType");
    let (order_type, time_in_force, post_only) = match native_type.as_deref() {
        Some("post_only") => (Some("limit".to_string()), None, Some(true)),
        Some("fok") => (Some("limit".to_string()), Some("FOK".to_string()), None),
        Some("ioc") => (Some("limit".to_string()), Some("IOC".to_string()), None),
        other => (other.map(str::to_string), None, None),
    };
    let filled = safe::safe_number(raw, "filledSize");
    let average = safe::safe_number(raw, "averagePrice").filter(|a| !a.is_zero());
    let contract_size = market.and_then(|m| m.contract_size).unwrap_or(Decimal::ONE);
    let cost = match (average, filled) {
        (Some(average), Some(filled)) => average
            .checked_mul(filled)
            .and_then(|c| c.checked_mul(contract_size))
            .map(|c| c.normalize()),
        _ => None,
    };
    let fee_currency = safe::safe_string(raw, "feeCurrency").unwrap_or_else(|| "USDT".to_string());
    Order {
        id: safe::safe_string2(raw, "tpslId", "orderId").unwrap_or_default(),
        client_order_id: safe::safe_string(raw, "clientOrderId").filter(|c| !c.is_empty()),
        timestamp: safe::safe_integer(raw, "createTime"),
        last_trade_timestamp: safe::safe_integer(raw, "fillTime"),
        last_update_timestamp: safe::safe_integer(raw, "updateTime"),
        status,
        symbol: scope.symbol(id.as_deref(), Some("-")),
        order_type,
        time_in_force,
        post_only,
        side: resolve_side(safe::safe_string(raw, "side").as_deref(), None),
        price: safe::safe_number2(raw, "px", "price"),
        stop_loss_price: safe::safe_number(raw, "slTriggerPrice"),
        take_profit_price: safe::safe_number(raw, "tpTriggerPrice"),
        amount: safe::safe_number(raw, "size"),
        filled,
        average,
        cost,
        fee: Fee::from_parts(
            safe::safe_number(raw, "fee"),
            descriptor.safe_currency_code(Some(fee_currency.as_str())),
            None,
        ),
        reduce_only: Some(safe::safe_bool(raw, "reduceOnly").unwrap_or(false)),
        leverage: safe::safe_number(raw, "leverage"),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// `positionSide` is `long`/`short` in hedge mode and `net` in one-way mode,
/// where the sign of `positions` gives the direction.
pub(super) fn position(raw: &Value, scope: MarketScope<'_>) -> Position {
    let id = safe::safe_string(raw, "instId");
    let market = scope.resolve(id.as_deref());
    let native_side = safe::safe_string(raw, "positionSide");
    let signed = safe::safe_number(raw, "positions");
    let margin_mode = safe::safe_string(raw, "marginMode").as_deref().and_then(MarginMode::parse);
    let notional = safe::safe_number(raw, "notionalUsd");
    let (initial_margin, collateral) = match margin_mode {
        Some(MarginMode::Cross) => (safe::safe_number(raw, "initialMargin"), None),
        _ => (None, safe::safe_number(raw, "margin")),
    };
    let initial_margin_percentage = match (initial_margin, notional) {
        (Some(initial), Some(notional)) => div_truncated(initial, notional, 4).ok().map(|p| p.normalize()),
        _ => None,
    };
    Position {
        symbol: scope.symbol(id.as_deref(), Some("-")),
        side: native_side.as_deref().and_then(PositionSide::parse),
        contract_size: market.and_then(|m| m.contract_size),
        entry_price: safe::safe_number(raw, "averagePrice"),
        mark_price: safe::safe_number(raw, "markPrice"),
        notional,
        leverage: safe::safe_number(raw, "leverage"),
        collateral,
        initial_margin,
        initial_margin_percentage,
        maintenance_margin: safe::safe_number(raw, "maintenanceMargin"),
        unrealized_pnl: safe::safe_number(raw, "unrealizedPnl"),
        liquidation_price: safe::safe_number(raw, "liquidationPrice"),
        margin_mode,
        percentage: safe::safe_number(raw, "unrealizedPnlRatio")
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map(|p| p.normalize()),
        hedged: native_side.as_deref().map(|s| s != "net"),
        timestamp: safe::safe_integer(raw, "updateTime"),
        info: raw.clone(),
        ..Default::default()
    }
    .complete(signed)
}

/// Deposits carry `depositId`, withdrawals `withdrawId`.
pub(super) fn transaction(descriptor: &Descriptor, raw: &Value, currency: Option<&Currency>) -> Transaction {
    let (id, transaction_type) = match safe::safe_string(raw, "withdrawId") {
        Some(id) => (Some(id), TransactionType::Withdrawal),
        None => (safe::safe_string(raw, "depositId"), TransactionType::Deposit),
    };
    let code = descriptor
        .safe_currency_code(safe::safe_string(raw, "currency").as_deref())
        .or_else(|| currency.map(|c| c.code.clone()));
    let address = safe::safe_string(raw, "address");
    let tag = safe::safe_string(raw, "tag");
    Transaction {
        id,
        txid: safe::safe_string(raw, "txId"),
        timestamp: safe::safe_integer(raw, "ts"),
        network: safe::safe_string(raw, "chain").map(|chain| descriptor.options.network_id_to_code(&chain)),
        address: address.clone(),
        address_to: address,
        tag: tag.clone(),
        tag_to: tag,
        transaction_type: Some(transaction_type),
        amount: safe::safe_number(raw, "amount"),
        currency: code,
        status: safe::safe_string(raw, "state").map(|s| TransactionStatus::from_table(&s, &TRANSACTION_STATUSES)),
        fee: Fee::from_parts(
            safe::safe_number(raw, "fee"),
            descriptor.safe_currency_code(safe::safe_string(raw, "feeCurrency").as_deref()),
            None,
        ),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

pub(super) fn ledger_entry(descriptor: &Descriptor, raw: &Value, currency: Option<&Currency>) -> LedgerEntry {
    let amount = safe::safe_number(raw, "amount");
    let entry_type = safe::safe_string(raw, "type").map(|native| {
        LEDGER_TYPES
            .iter()
            .find(|(id, _)| *id == native)
            .map(|(_, unified)| unified.to_string())
            .unwrap_or(native)
    });
    LedgerEntry {
        id: safe::safe_string(raw, "transferId"),
        direction: amount.map(LedgerDirection::from_signed),
        account: safe::safe_string(raw, "fromAccount"),
        reference_id: safe::safe_string(raw, "clientId"),
        reference_account: safe::safe_string(raw, "toAccount"),
        entry_type,
        currency: descriptor
            .safe_currency_code(safe::safe_string(raw, "currency").as_deref())
            .or_else(|| currency.map(|c| c.code.clone())),
        amount,
        timestamp: safe::safe_integer(raw, "ts"),
        status: Some(TransactionStatus::Ok),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::MarketIndex;
    use crate::exchange::blofin::Blofin;
    use crate::exchange::ExchangeAdapter;
    use crate::shared::Side;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn eth_swap() -> Market {
        market(
            Blofin::new().descriptor(),
            &json!({
                "instId": "ETH-USDT",
                "instType": "SWAP",
                "baseCurrency": "ETH",
                "quoteCurrency": "USDT",
                "contractValue": "0.1",
                "listTime": "1646580000000",
                "maxLeverage": "100",
                "minSize": "1",
                "lotSize": "1",
                "tickSize": "0.01",
                "state": "live"
            }),
        )
    }

    #[test]
    fn test_swap_market_symbol_and_limits() {
        let market = eth_swap();
        assert_eq!(market.symbol, "ETH/USDT:USDT");
        assert!(market.swap && market.contract && market.active);
        assert_eq!(market.linear, Some(true));
        assert_eq!(market.inverse, Some(false));
        assert_eq!(market.contract_size, Some(dec("0.1")));
        assert_eq!(market.precision.price, Some(dec("0.01")));
        assert_eq!(market.limits.leverage.max, Some(dec("100")));
        assert_eq!(market.taker, Some(dec("0.0006")));
        assert_eq!(market.created, Some(1646580000000));
    }

    #[test]
    fn test_order_splits_time_in_force_and_uses_contract_size() {
        let index = MarketIndex::new(vec![eth_swap()]);
        let raw = json!({
            "orderId": "28150801",
            "clientOrderId": "",
            "instId": "ETH-USDT",
            "orderType": "ioc",
            "side": "buy",
            "price": "2000",
            "size": "10",
            "filledSize": "4",
            "averagePrice": "1990",
            "fee": "-0.5",
            "state": "partially_filled",
            "createTime": "1697016700775",
            "reduceOnly": "false"
        });
        let order = order(Blofin::new().descriptor(), &raw, MarketScope::new(&index), None);
        assert_eq!(order.symbol, "ETH/USDT:USDT");
        assert_eq!(order.order_type.as_deref(), Some("limit"));
        assert_eq!(order.time_in_force.as_deref(), Some("IOC"));
        assert_eq!(order.client_order_id, None);
        assert_eq!(order.side, Some(Side::Buy));
        assert_eq!(order.remaining, Some(dec("6")));
        assert_eq!(order.cost, Some(dec("796")));
        let fee = order.fee.unwrap();
        assert_eq!(fee.cost, Some(dec("0.5")));
        assert_eq!(fee.currency.as_deref(), Some("USDT"));
        assert_eq!(order.reduce_only, Some(false));
    }

    #[test]
    fn test_net_position_side_from_sign() {
        let index = MarketIndex::new(vec![eth_swap()]);
        let raw = json!({
            "instId": "ETH-USDT",
            "marginMode": "cross",
            "positionSide": "net",
            "positions": "-3",
            "averagePrice": "2000",
            "markPrice": "2010",
            "notionalUsd": "603",
            "initialMargin": "60.3",
            "maintenanceMargin": "3",
            "unrealizedPnl": "-3",
            "unrealizedPnlRatio": "-0.0497",
            "leverage": "10",
            "updateTime": "1702005380000"
        });
        let position = position(&raw, MarketScope::new(&index));
        assert_eq!(position.side, Some(PositionSide::Short));
        assert_eq!(position.contracts, Some(dec("3")));
        assert_eq!(position.hedged, Some(false));
        assert_eq!(position.initial_margin_percentage, Some(dec("0.1")));
        assert_eq!(position.collateral, Some(dec("57.3")));
        assert_eq!(position.percentage, Some(dec("-4.97")));
        assert_eq!(position.contract_size, Some(dec("0.1")));
    }

    #[test]
    fn test_isolated_position_reports_margin_as_collateral() {
        let index = MarketIndex::default();
        let raw = json!({
            "instId": "BTC-USDT",
            "marginMode": "isolated",
            "positionSide": "long",
            "positions": "2",
            "margin": "25",
            "leverage": "4"
        });
        let position = position(&raw, MarketScope::new(&index));
        assert_eq!(position.side, Some(PositionSide::Long));
        assert_eq!(position.hedged, Some(true));
        assert_eq!(position.collateral, Some(dec("25")));
        assert_eq!(position.initial_margin_percentage, Some(dec("0.25")));
        assert_eq!(position.symbol, "BTC/USDT");
    }

    #[test]
    fn test_withdrawal_from_id_field() {
        let raw = json!({
            "currency": "USDT",
            "chain": "TRC20",
            "address": "TYgB3sVXHPEDQUu288EG1uMFh9Pk2swLgW",
            "txId": "1fd5ac52",
            "amount": "9",
            "fee": "1",
            "feeCurrency": "USDT",
            "state": "3",
            "ts": "1707217439351",
            "withdrawId": "e0768698"
        });
        let tx = transaction(Blofin::new().descriptor(), &raw, None);
        assert_eq!(tx.transaction_type, Some(TransactionType::Withdrawal));
        assert_eq!(tx.id.as_deref(), Some("e0768698"));
        assert_eq!(tx.status, Some(TransactionStatus::Pending));
        assert_eq!(tx.network.as_deref(), Some("TRC20"));
        assert_eq!(tx.fee.unwrap().cost, Some(dec("1")));
    }

    #[test]
    fn test_ledger_type_table_and_direction() {
        let raw = json!({
            "transferId": "591",
            "currency": "USDT",
            "fromAccount": "funding",
            "toAccount": "futures",
            "amount": "-12.5",
            "type": "8",
            "ts": "1702345678000"
        });
        let entry = ledger_entry(Blofin::new().descriptor(), &raw, None);
        assert_eq!(entry.entry_type.as_deref(), Some("fee"));
        assert_eq!(entry.direction, Some(LedgerDirection::Out));
        assert_eq!(entry.amount, Some(dec("12.5")));
        assert_eq!(entry.status, Some(TransactionStatus::Ok));
    }
}
