use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::describe::Descriptor;
use crate::domain::currency::{Currency, Network, WithdrawFee};
use crate::domain::fee::Fee;
use crate::domain::ledger::{LedgerDirection, LedgerEntry};
use crate::domain::market::{Market, MarketLimits, MarketPrecision, MinMax};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ticker::Ticker;
use crate::domain::trade::{resolve_side, Trade};
use crate::domain::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::exchange::MarketScope;
use crate::shared::precise::div_truncated;
use crate::shared::{safe, MarketType, TakerOrMaker};

const TRANSACTION_STATUSES: [(&str, TransactionStatus); 5] = [
    ("pending", TransactionStatus::Pending),
    ("processing", TransactionStatus::Pending),
    ("completed", TransactionStatus::Ok),
    ("failed", TransactionStatus::Failed),
    ("cancelled", TransactionStatus::Canceled),
];

fn min_max(limits: &Value, key: &str) -> MinMax {
    let range = safe::safe_value(limits, key).unwrap_or(&Value::Null);
    MinMax::new(safe::safe_number(range, "min"), safe::safe_number(range, "max"))
}

fn fee_of(descriptor: &Descriptor, raw: &Value) -> Option<Fee> {
    let fee = safe::safe_value(raw, "fee")?;
    Fee::from_parts(
        safe::safe_number(fee, "cost"),
        descriptor.safe_currency_code(safe::safe_string(fee, "currency").as_deref()),
        safe::safe_number(fee, "rate"),
    )
}

/// Precision values are digit counts.
pub(super) fn market(descriptor: &Descriptor, raw: &Value) -> Market {
    let precision = safe::safe_value(raw, "precision").unwrap_or(&Value::Null);
    let limits = safe::safe_value(raw, "limits").unwrap_or(&Value::Null);
    let base_id = safe::safe_string(raw, "base").unwrap_or_default();
    let quote_id = safe::safe_string(raw, "quote").unwrap_or_default();
    let schedule = descriptor.fees.trading;
    Market {
        id: safe::safe_string(raw, "id").unwrap_or_default(),
        base: descriptor.common_currency_code(&base_id),
        quote: descriptor.common_currency_code(&quote_id),
        base_id,
        quote_id,
        market_type: MarketType::Spot,
        active: safe::safe_bool(raw, "active").unwrap_or(true),
        taker: Some(schedule.taker),
        maker: Some(schedule.maker),
        precision: MarketPrecision {
            amount: safe::safe_number(precision, "amount"),
            price: safe::safe_number(precision, "price"),
        },
        limits: MarketLimits {
            amount: min_max(limits, "amount"),
            price: min_max(limits, "price"),
            cost: min_max(limits, "cost"),
            ..Default::default()
        },
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// `withdrawal_fee` is either one amount or an object keyed by network id.
pub(super) fn currency(descriptor: &Descriptor, raw: &Value) -> Currency {
    let id = safe::safe_string(raw, "id").unwrap_or_default();
    let deposit = safe::safe_bool(raw, "deposit_enabled").unwrap_or(true);
    let withdraw = safe::safe_bool(raw, "withdrawal_enabled").unwrap_or(true);
    let fees = safe::safe_value(raw, "withdrawal_fee").and_then(WithdrawFee::from_value);

    let mut networks = BTreeMap::new();
    for entry in safe::safe_list(raw, "networks").into_iter().flatten() {
        let Some(network_id) = safe::safe_string(entry, "id") else {
            continue;
        };
        let code = descriptor.options.network_id_to_code(&network_id);
        let network = Network {
            fee: fees.as_ref().and_then(|f| f.for_network(&network_id)),
            id: network_id,
            network: code.clone(),
            info: entry.clone(),
            ..Default::default()
        };
        networks.insert(code, network);
    }

    let fee = match &fees {
        Some(WithdrawFee::Flat(fee)) => Some(*fee),
        _ => None,
    };
    Currency {
        code: descriptor.common_currency_code(&id),
        id,
        name: safe::safe_string(raw, "name"),
        precision: safe::safe_number(raw, "precision"),
        active: Some(deposit && withdraw),
        deposit: Some(deposit),
        withdraw: Some(withdraw),
        fee,
        networks,
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

pub(super) fn ticker(raw: &Value, scope: MarketScope<'_>) -> Ticker {
    let id = safe::safe_string(raw, "symbol");
    Ticker {
        symbol: scope.symbol(id.as_deref(), None),
        last: safe::safe_number(raw, "last_price"),
        percentage: safe::safe_number(raw, "price_change_percent"),
        base_volume: safe::safe_number(raw, "base_volume"),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

pub(super) fn trade(descriptor: &Descriptor, raw: &Value, scope: MarketScope<'_>) -> Trade {
    let id = safe::safe_string(raw, "symbol");
    Trade {
        id: safe::safe_string(raw, "id"),
        order: safe::safe_string(raw, "order_id"),
        timestamp: safe::safe_integer(raw, "created_at"),
        symbol: scope.symbol(id.as_deref(), None),
        order_type: safe::safe_string(raw, "type"),
        side: resolve_side(safe::safe_string(raw, "side").as_deref(), None),
        taker_or_maker: safe::safe_string(raw, "taker_or_maker")
            .as_deref()
            .and_then(TakerOrMaker::parse),
        price: safe::safe_number(raw, "price"),
        amount: safe::safe_number(raw, "amount"),
        cost: safe::safe_number(raw, "cost"),
        fee: fee_of(descriptor, raw),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

pub(super) fn order(
    descriptor: &Descriptor,
    raw: &Value,
    scope: MarketScope<'_>,
    status: Option<OrderStatus>,
) -> Order {
    let id = safe::safe_string(raw, "symbol");
    let updated = safe::safe_integer(raw, "updated_at");
    Order {
        id: safe::safe_string(raw, "id").unwrap_or_default(),
        client_order_id: safe::safe_string(raw, "client_order_id"),
        timestamp: safe::safe_integer(raw, "created_at"),
        last_trade_timestamp: updated,
        last_update_timestamp: updated,
        status,
        symbol: scope.symbol(id.as_deref(), None),
        order_type: safe::safe_string(raw, "type"),
        side: resolve_side(safe::safe_string(raw, "side").as_deref(), None),
        price: safe::safe_number(raw, "price"),
        amount: safe::safe_number(raw, "amount"),
        filled: safe::safe_number(raw, "filled"),
        remaining: safe::safe_number(raw, "remaining"),
        cost: safe::safe_number(raw, "cost"),
        average: safe::safe_number(raw, "average"),
        fee: fee_of(descriptor, raw),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// Deposits report `address_to`, withdrawals `address`. The fee rate is the
/// fee's share of the gross amount.
pub(super) fn transaction(descriptor: &Descriptor, raw: &Value, currency: Option<&Currency>) -> Transaction {
    let code = descriptor
        .safe_currency_code(safe::safe_string(raw, "currency").as_deref())
        .or_else(|| currency.map(|c| c.code.clone()));
    let transaction_type = if safe::safe_value(raw, "address_to").is_some() {
        Some(TransactionType::Deposit)
    } else if safe::safe_value(raw, "address").is_some() {
        Some(TransactionType::Withdrawal)
    } else {
        None
    };
    let amount = safe::safe_number(raw, "amount");
    let fee_cost = safe::safe_number2(raw, "fee", "user_fee");
    let fee_rate = match (fee_cost, amount) {
        (Some(fee), Some(amount)) => {
            let gross = amount + fee;
            (gross > Decimal::ZERO)
                .then(|| div_truncated(fee, gross, 8).ok())
                .flatten()
                .map(|r| r.normalize())
        }
        _ => None,
    };
    let tag = safe::safe_string(raw, "memo").filter(|m| !m.is_empty());
    Transaction {
        id: safe::safe_string(raw, "id"),
        txid: safe::safe_string(raw, "txid"),
        timestamp: safe::safe_integer(raw, "timestamp"),
        network: safe::safe_string(raw, "network")
            .map(|id| descriptor.options.network_id_to_code(&id)),
        address_from: safe::safe_string2(raw, "address_from", "from_address"),
        address_to: safe::safe_string2(raw, "address_to", "address"),
        tag: tag.clone(),
        tag_to: tag,
        transaction_type,
        amount,
        status: safe::safe_string(raw, "status")
            .map(|s| TransactionStatus::from_table(&s, &TRANSACTION_STATUSES)),
        comment: safe::safe_string(raw, "message"),
        internal: Some(false),
        fee: Fee::from_parts(fee_cost, code.clone(), fee_rate),
        currency: code,
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// `in` gives the direction and `after` the post-entry balance; `before` is
/// derived from the two.
pub(super) fn ledger_entry(descriptor: &Descriptor, raw: &Value, currency: Option<&Currency>) -> LedgerEntry {
    let direction = match safe::safe_bool(raw, "in") {
        Some(true) => LedgerDirection::In,
        _ => LedgerDirection::Out,
    };
    LedgerEntry {
        id: safe::safe_string(raw, "id"),
        direction: Some(direction),
        reference_id: safe::safe_string(raw, "ref"),
        entry_type: safe::safe_string(raw, "type"),
        currency: descriptor
            .safe_currency_code(safe::safe_string(raw, "currency").as_deref())
            .or_else(|| currency.map(|c| c.code.clone())),
        amount: safe::safe_number(raw, "amount"),
        timestamp: safe::safe_integer(raw, "created_at"),
        after: safe::safe_number(raw, "after"),
        status: Some(TransactionStatus::Ok),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}
