use serde_json::Value;

use crate::describe::Descriptor;
use crate::domain::currency::Currency;
use crate::domain::fee::Fee;
use crate::domain::market::{Market, MarketPrecision};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ticker::Ticker;
use crate::domain::trade::{resolve_side, Trade};
use crate::domain::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::exchange::MarketScope;
use crate::shared::precise::opt;
use crate::shared::precision::parse_precision;
use crate::shared::{safe, time, MarketType, TakerOrMaker};

const TRANSACTION_STATUSES: [(&str, TransactionStatus); 8] = [
    ("Created", TransactionStatus::Pending),
    ("PartiallyProcessed", TransactionStatus::Pending),
    ("Processing", TransactionStatus::Pending),
    ("WaitForConfirmation", TransactionStatus::Pending),
    ("Pending", TransactionStatus::Pending),
    ("AmlChecking", TransactionStatus::Pending),
    ("Canceled", TransactionStatus::Canceled),
    ("Processed", TransactionStatus::Ok),
];

/// Decimal-digit count to tick size.
fn tick(raw: Option<String>) -> Option<rust_decimal::Decimal> {
    opt::decimal(raw.as_deref().and_then(parse_precision).as_deref())
}

fn iso_ms(raw: &Value, key: &str) -> Option<i64> {
    safe::safe_string(raw, key).as_deref().and_then(time::parse8601)
}

pub(super) fn market(descriptor: &Descriptor, raw: &Value) -> Market {
    let base_asset = safe::safe_value(raw, "baseAsset").unwrap_or(&Value::Null);
    let quote_asset = safe::safe_value(raw, "quoteAsset").unwrap_or(&Value::Null);
    let base_id = safe::safe_string(base_asset, "code").unwrap_or_default();
    let quote_id = safe::safe_string(quote_asset, "code").unwrap_or_default();
    Market {
        id: safe::safe_string(raw, "pair").unwrap_or_default(),
        base: descriptor.safe_currency_code(Some(base_id.as_str())).unwrap_or_default(),
        quote: descriptor.safe_currency_code(Some(quote_id.as_str())).unwrap_or_default(),
        base_id,
        quote_id,
        market_type: MarketType::Spot,
        active: true,
        precision: MarketPrecision {
            amount: tick(safe::safe_string(base_asset, "precision")),
            price: tick(safe::safe_string(quote_asset, "precision")),
        },
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// The currency precision is the tighter of the custody and trading digits.
pub(super) fn currency(descriptor: &Descriptor, raw: &Value) -> Currency {
    let id = safe::safe_string(raw, "code").unwrap_or_default();
    let digits = opt::min(
        safe::safe_string(raw, "precision").as_deref(),
        safe::safe_string(raw, "tradePrecision").as_deref(),
    );
    Currency {
        code: descriptor.safe_currency_code(Some(id.as_str())).unwrap_or_default(),
        id,
        name: safe::safe_string(raw, "name"),
        precision: tick(digits),
        info: raw.clone(),
        ..Default::default()
    }
}

/// Two shapes: `bestBidPrice`/`bestAskPrice` scalars, or `bids`/`asks`
/// lists whose first entry is the top of book.
pub(super) fn ticker(raw: &Value, scope: MarketScope<'_>) -> Ticker {
    let id = safe::safe_string(raw, "pair");
    let top = |key: &str| {
        safe::safe_value(raw, key)
            .and_then(|levels| safe::safe_value(levels, 0usize))
            .and_then(|level| safe::safe_number(level, 0usize))
    };
    Ticker {
        symbol: scope.symbol(id.as_deref(), Some("_")),
        high: safe::safe_number(raw, "high"),
        low: safe::safe_number(raw, "low"),
        bid: safe::safe_number(raw, "bestBidPrice").or_else(|| top("bids")),
        ask: safe::safe_number(raw, "bestAskPrice").or_else(|| top("asks")),
        open: safe::safe_number(raw, "open"),
        change: safe::safe_number(raw, "priceChange"),
        percentage: safe::safe_number(raw, "percentagePriceChange"),
        base_volume: safe::safe_number(raw, "baseVolume"),
        quote_volume: safe::safe_number(raw, "quoteVolume"),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// Public trades carry `side`; private fills carry `isBuyer` and `isTaker`.
pub(super) fn trade(descriptor: &Descriptor, raw: &Value, scope: MarketScope<'_>) -> Trade {
    let id = safe::safe_string(raw, "pair");
    let side = resolve_side(
        safe::safe_string_lower(raw, "side").as_deref(),
        safe::safe_bool(raw, "isBuyer"),
    );
    let taker_or_maker = safe::safe_bool(raw, "isTaker").map(|taker| {
        if taker {
            TakerOrMaker::Taker
        } else {
            TakerOrMaker::Maker
        }
    });
    Trade {
        id: safe::safe_string(raw, "id"),
        order: safe::safe_string(raw, "orderId"),
        timestamp: iso_ms(raw, "createdAt"),
        symbol: scope.symbol(id.as_deref(), Some("_")),
        side,
        taker_or_maker,
        price: safe::safe_number2(raw, "matchPrice", "price"),
        amount: safe::safe_number2(raw, "matchQuantity", "quantity"),
        cost: safe::safe_number(raw, "quoteQuantity"),
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

pub(super) fn order(raw: &Value, scope: MarketScope<'_>, status: Option<OrderStatus>, trades: Vec<Trade>) -> Order {
    let id = safe::safe_string(raw, "pair");
    let side = match safe::safe_string(raw, "side").as_deref() {
        Some("Bid") => Some(crate::shared::Side::Buy),
        Some("Ask") => Some(crate::shared::Side::Sell),
        other => other.and_then(crate::shared::Side::parse),
    };
    Order {
        id: safe::safe_string2(raw, "id", "orderId").unwrap_or_default(),
        timestamp: iso_ms(raw, "createdAt"),
        last_trade_timestamp: iso_ms(raw, "updatedAt"),
        last_update_timestamp: iso_ms(raw, "updatedAt"),
        status,
        symbol: scope.symbol(id.as_deref(), Some("_")),
        order_type: safe::safe_string_lower(raw, "type"),
        side,
        price: safe::safe_number(raw, "price"),
        trigger_price: safe::safe_number(raw, "stopPrice"),
        amount: safe::safe_number(raw, "quantity"),
        filled: safe::safe_number(raw, "executedQuantity"),
        cost: safe::safe_number(raw, "cost"),
        trades,
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

pub(super) fn transaction(descriptor: &Descriptor, raw: &Value, currency: Option<&Currency>) -> Transaction {
    let code = descriptor
        .safe_currency_code(safe::safe_string(raw, "asset").as_deref())
        .or_else(|| currency.map(|c| c.code.clone()));
    let transaction_type = match safe::safe_string_lower(raw, "type").as_deref() {
        Some("deposit") => TransactionType::Deposit,
        _ => TransactionType::Withdrawal,
    };
    let address = safe::safe_string(raw, "address");
    Transaction {
        id: safe::safe_string(raw, "id"),
        txid: safe::safe_string(raw, "txId"),
        timestamp: iso_ms(raw, "createdAt"),
        network: safe::safe_string(raw, "paymentCode")
            .map(|id| descriptor.options.network_id_to_code(&id)),
        address: address.clone(),
        address_to: address,
        transaction_type: Some(transaction_type),
        amount: safe::safe_number(raw, "amount"),
        status: safe::safe_string(raw, "status")
            .map(|s| TransactionStatus::from_table(&s, &TRANSACTION_STATUSES)),
        updated: iso_ms(raw, "updatedAt"),
        comment: safe::safe_string(raw, "memo").filter(|m| !m.is_empty()),
        fee: Fee::from_parts(safe::safe_number(raw, "fee"), code.clone(), None),
        currency: code,
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::MarketIndex;
    use crate::exchange::kuna::Kuna;
    use crate::exchange::ExchangeAdapter;
    use crate::shared::Side;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_currency_takes_tighter_precision() {
        let kuna = Kuna::new();
        let btc = currency(
            kuna.descriptor(),
            &json!({"code": "BTC", "name": "Bitcoin", "precision": 8, "tradePrecision": 6}),
        );
        assert_eq!(btc.code, "BTC");
        assert_eq!(btc.precision, Some(dec("0.000001")));
    }

    #[test]
    fn test_private_fill_uses_buyer_and_taker_flags() {
        let kuna = Kuna::new();
        let index = MarketIndex::default();
        let raw = json!({
            "id": "edb17459",
            "orderId": "a80bec3f",
            "pair": "BTC_USDT",
            "quantity": "1.5862",
            "price": "19087",
            "isTaker": true,
            "fee": "0.0039655",
            "feeCurrency": "BTC",
            "isBuyer": true,
            "quoteQuantity": "30275.7994",
            "createdAt": "2022-09-29T13:43:53.824Z"
        });
        let t = trade(kuna.descriptor(), &raw, MarketScope::new(&index));
        assert_eq!(t.symbol, "BTC/USDT");
        assert_eq!(t.side, Some(Side::Buy));
        assert_eq!(t.taker_or_maker, Some(TakerOrMaker::Taker));
        assert_eq!(t.cost, Some(dec("30275.7994")));
        assert_eq!(t.timestamp, Some(1664459033824));
        assert_eq!(t.fee.unwrap().currency.as_deref(), Some("BTC"));
    }

    #[test]
    fn test_public_trade_side_is_lowercased() {
        let kuna = Kuna::new();
        let index = MarketIndex::default();
        let raw = json!({"id": "3e55", "pair": "BTC_USDT", "matchPrice": "18649", "matchQuantity": "0.6182", "side": "Ask"});
        let t = trade(kuna.descriptor(), &raw, MarketScope::new(&index));
        assert_eq!(t.side, Some(Side::Sell));
        assert_eq!(t.price, Some(dec("18649")));
        assert!(t.taker_or_maker.is_none());
        assert_eq!(t.cost, Some(dec("11528.8118")));
    }

    #[test]
    fn test_ticker_from_book_lists() {
        let index = MarketIndex::default();
        let raw = json!({"pair": "ETH_UAH", "bids": [["1500.5", "2"]], "asks": [["1501", "1"]], "priceChange": "-3"});
        let t = ticker(&raw, MarketScope::new(&index));
        assert_eq!(t.symbol, "ETH/UAH");
        assert_eq!(t.bid, Some(dec("1500.5")));
        assert_eq!(t.ask, Some(dec("1501")));
        assert_eq!(t.change, Some(dec("-3")));
    }

    #[test]
    fn test_order_from_history() {
        let kuna = Kuna::new();
        let index = MarketIndex::default();
        let raw = json!({
            "id": "5992a049",
            "type": "Limit",
            "quantity": "5",
            "executedQuantity": "2",
            "cost": "0.05",
            "side": "Bid",
            "pair": "TRX_USDT",
            "price": "0.01",
            "status": "Open",
            "createdAt": "2023-07-11T07:04:20.131Z",
            "updatedAt": "2023-07-11T07:04:21.131Z"
        });
        let o = kuna.parse_order(&raw, MarketScope::new(&index)).unwrap();
        assert_eq!(o.symbol, "TRX/USDT");
        assert_eq!(o.status, Some(OrderStatus::Open));
        assert_eq!(o.order_type.as_deref(), Some("limit"));
        assert_eq!(o.side, Some(Side::Buy));
        assert_eq!(o.remaining, Some(dec("3")));
        assert_eq!(o.last_trade_timestamp, Some(1689059061131));
    }

    #[test]
    fn test_deposit_status_and_network() {
        let kuna = Kuna::new();
        let raw = json!({
            "id": "a201cb3c",
            "amount": "9.9",
            "asset": "USDT",
            "paymentCode": "TRX",
            "status": "Processed",
            "type": "Deposit",
            "address": "TNeBQz8R",
            "memo": "",
            "txId": "8a0b0c5a",
            "fee": "0.1",
            "createdAt": "2023-06-13T12:55:01.256Z"
        });
        let tx = transaction(kuna.descriptor(), &raw, None);
        assert_eq!(tx.transaction_type, Some(TransactionType::Deposit));
        assert_eq!(tx.status, Some(TransactionStatus::Ok));
        assert_eq!(tx.network.as_deref(), Some("TRX"));
        assert_eq!(tx.address.as_deref(), Some("TNeBQz8R"));
        assert!(tx.comment.is_none());
        assert_eq!(tx.fee.unwrap().cost, Some(dec("0.1")));
    }
}
