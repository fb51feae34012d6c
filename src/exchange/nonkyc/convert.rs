use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::describe::Descriptor;
use crate::domain::address::DepositAddress;
use crate::domain::currency::{Currency, CurrencyLimits, Network};
use crate::domain::fee::Fee;
use crate::domain::market::{Market, MarketLimits, MarketPrecision, MinMax};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ticker::Ticker;
use crate::domain::trade::{resolve_side, Trade};
use crate::domain::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::exchange::MarketScope;
use crate::shared::{safe, time, MarketType, TakerOrMaker};

const MAIN_NETWORK: &str = "MAIN";

fn first_number(raw: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| safe::safe_number(raw, *key))
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| safe::safe_string(raw, *key))
}

/// Uppercase with separators and brackets removed; `None` when nothing is left.
pub(super) fn alnum_upper(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '_' | '.' | '/' | '(' | ')' | '[' | ']' | '{' | '}'))
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Unified symbol for an id that is either `eth_usdt` or `ETH/USDT`.
pub(super) fn symbol_of(scope: MarketScope<'_>, id: Option<&str>) -> String {
    if let Some(market) = id.and_then(|id| scope.markets.resolve(id)) {
        return market.symbol.clone();
    }
    let delimiter = if id.is_some_and(|id| id.contains('/')) { "/" } else { "_" };
    scope.symbol(id, Some(delimiter))
}

// ── Markets and currencies ──────────────────────────────────────────────

/// Two listing shapes: `name: "eth_usdt"` with `baseStep`/`quoteStep`
/// digits, and `symbol: "ETH/USDT"` with `quantityDecimals`/`priceDecimals`.
/// Precision is a digit count either way.
///
/// `None` only for a row carrying neither `name` nor `symbol`. An id that
/// cannot be split into base and quote still yields a market, left with an
/// empty base/quote so [`Market::complete`] keeps it inactive.
pub(super) fn market(descriptor: &Descriptor, raw: &Value) -> Option<Market> {
    let name = safe::safe_string(raw, "name");
    let symbol = safe::safe_string(raw, "symbol");
    let id = match (&name, &symbol) {
        (Some(name), _) => name.clone(),
        (None, Some(symbol)) => symbol.replacen('/', "_", 1),
        (None, None) => return None,
    };
    let (base_id, quote_id) = name
        .as_deref()
        .and_then(|name| name.split_once('_'))
        .map(|(base, quote)| (base.to_uppercase(), quote.to_uppercase()))
        .or_else(|| {
            let (base, quote) = symbol.as_deref()?.split_once('/')?;
            Some((
                safe::safe_string(raw, "primaryTicker").unwrap_or_else(|| base.to_string()),
                safe::safe_string(raw, "secondaryTicker").unwrap_or_else(|| quote.to_string()),
            ))
        })
        .unwrap_or_default();
    let min_quote_active = safe::safe_bool(raw, "minQuoteActive").unwrap_or(false)
        || safe::safe_bool(raw, "isMinQuoteActive").unwrap_or(false);
    let active = safe::safe_bool2(raw, "isActive", "active").unwrap_or(true)
        && !safe::safe_bool(raw, "isPaused").unwrap_or(false)
        && !safe::safe_bool(raw, "pauseBuys").unwrap_or(false)
        && !safe::safe_bool(raw, "pauseSells").unwrap_or(false);
    let schedule = descriptor.fees.trading;
    Some(
        Market {
            id,
            base: descriptor.common_currency_code(&base_id),
            quote: descriptor.common_currency_code(&quote_id),
            base_id,
            quote_id,
            market_type: MarketType::Spot,
            active,
            taker: Some(schedule.taker),
            maker: Some(schedule.maker),
            precision: MarketPrecision {
                amount: safe::safe_number2(raw, "baseStep", "quantityDecimals"),
                price: safe::safe_number2(raw, "quoteStep", "priceDecimals"),
            },
            limits: MarketLimits {
                amount: MinMax::new(safe::safe_number(raw, "minimumQuantity"), None),
                price: MinMax::new(
                    safe::safe_number(raw, "minAllowedPrice"),
                    safe::safe_number(raw, "maxAllowedPrice"),
                ),
                cost: MinMax::new(
                    min_quote_active.then(|| safe::safe_number(raw, "minQuote")).flatten(),
                    None,
                ),
                ..Default::default()
            },
            info: raw.clone(),
            ..Default::default()
        }
        .complete(),
    )
}

struct AssetFlags {
    active: bool,
    deposit: bool,
    withdraw: bool,
}

fn asset_flags(raw: &Value) -> AssetFlags {
    AssetFlags {
        active: safe::safe_bool(raw, "isActive").unwrap_or(true)
            && !safe::safe_bool(raw, "isMaintenance").unwrap_or(false)
            && !safe::safe_bool(raw, "isDelisting").unwrap_or(false),
        deposit: safe::safe_bool(raw, "depositActive").unwrap_or(true),
        withdraw: safe::safe_bool(raw, "withdrawalActive").unwrap_or(true),
    }
}

fn asset_decimals(raw: &Value) -> Option<Decimal> {
    safe::safe_number(raw, "withdrawDecimals").or_else(|| {
        safe::safe_value(raw, "tokenDetails").and_then(|details| safe::safe_number(details, "decimals"))
    })
}

/// Network key of a network-specific ticker such as `USDT-TRC20`: the token
/// standard for tokens, else the suffix after the last dash.
fn network_key(raw: &Value, ticker: &str) -> String {
    let from_token = safe::safe_bool(raw, "isToken")
        .unwrap_or(false)
        .then(|| safe::safe_value(raw, "tokenDetails"))
        .flatten()
        .and_then(|details| safe::safe_string(details, "type"))
        .and_then(|kind| alnum_upper(&kind));
    from_token
        .or_else(|| ticker.rsplit_once('-').and_then(|(_, suffix)| alnum_upper(suffix)))
        .unwrap_or_else(|| MAIN_NETWORK.to_string())
}

fn network(raw: &Value, id: &str, key: &str, fallback_precision: Option<Decimal>) -> Network {
    let flags = asset_flags(raw);
    Network {
        id: id.to_string(),
        network: key.to_string(),
        active: Some(flags.active),
        deposit: Some(flags.deposit),
        withdraw: Some(flags.withdraw),
        fee: safe::safe_number(raw, "withdrawFee"),
        precision: asset_decimals(raw).or(fallback_precision),
        limits: CurrencyLimits {
            deposit: MinMax::new(safe::safe_number(raw, "minimumDeposit"), None),
            withdraw: MinMax::new(None, safe::safe_number(raw, "maximumWithdraw")),
            ..Default::default()
        },
        info: raw.clone(),
    }
}

fn asset(descriptor: &Descriptor, raw: &Value, id: &str, code: String) -> Currency {
    let flags = asset_flags(raw);
    Currency {
        id: id.to_string(),
        name: safe::safe_string(raw, "name").or_else(|| Some(code.clone())),
        code: descriptor.common_currency_code(&code),
        active: Some(flags.active),
        deposit: Some(flags.deposit),
        withdraw: Some(flags.withdraw),
        fee: safe::safe_number(raw, "withdrawFee"),
        precision: asset_decimals(raw),
        limits: CurrencyLimits {
            deposit: MinMax::new(safe::safe_number(raw, "minimumDeposit"), None),
            withdraw: MinMax::new(None, safe::safe_number(raw, "maximumWithdraw")),
            ..Default::default()
        },
        info: raw.clone(),
        ..Default::default()
    }
}

/// One asset row on its own. A dashed ticker (`USDT-TRC20`) is the
/// `USDT` currency on a single network.
pub(super) fn currency(descriptor: &Descriptor, raw: &Value) -> Option<Currency> {
    let ticker = safe::safe_string(raw, "ticker")?;
    let base = ticker.split_once('-').map_or(ticker.as_str(), |(base, _)| base);
    let mut currency = asset(descriptor, raw, &ticker, base.to_string());
    if ticker.contains('-') {
        let key = network_key(raw, &ticker);
        currency.networks.insert(key.clone(), network(raw, &ticker, &key, None));
    }
    Some(currency.complete())
}

/// The full asset list. Child rows (`isChild`, `childOf`) whose ticker
/// extends the parent's (`USDT` / `USDT-TRC20`) become networks of the
/// parent; any other child is listed as a currency of its own.
pub(super) fn currencies(descriptor: &Descriptor, rows: &[Value]) -> Vec<Currency> {
    let is_child = |row: &Value| safe::safe_bool(row, "isChild").unwrap_or(false);
    let mut children: HashMap<String, Vec<&Value>> = HashMap::new();
    for row in rows.iter().filter(|row| is_child(*row)) {
        if let Some(parent) = safe::safe_string(row, "childOf") {
            children.entry(parent).or_default().push(row);
        }
    }

    let mut result: BTreeMap<String, Currency> = BTreeMap::new();
    let mut leftovers = Vec::new();
    for root in rows.iter().filter(|row| !is_child(*row)) {
        let Some(ticker) = safe::safe_string(root, "ticker") else {
            continue;
        };
        let mut currency = asset(descriptor, root, &ticker, ticker.clone());
        let prefix = format!("{}-", ticker);
        let kids = safe::safe_string2(root, "id", "_id")
            .and_then(|id| children.get(&id))
            .map(Vec::as_slice)
            .unwrap_or_default();
        for child in kids {
            match safe::safe_string(child, "ticker") {
                Some(child_ticker) if child_ticker.starts_with(&prefix) => {
                    let key = network_key(child, &child_ticker);
                    let net = network(child, &child_ticker, &key, currency.precision);
                    currency.networks.insert(key, net);
                }
                _ => leftovers.push(*child),
            }
        }
        if currency.networks.is_empty() && safe::safe_bool(root, "hasChildren").unwrap_or(false) {
            let net = network(root, &ticker, MAIN_NETWORK, currency.precision);
            currency.networks.insert(MAIN_NETWORK.to_string(), net);
        }
        result.insert(currency.code.clone(), currency.complete());
    }

    for child in leftovers {
        let Some(ticker) = safe::safe_string(child, "ticker") else {
            continue;
        };
        let code = descriptor.common_currency_code(&ticker);
        if result.contains_key(&code) {
            continue;
        }
        let mut currency = asset(descriptor, child, &ticker, ticker.clone());
        let standalone_token = safe::safe_bool(child, "isToken").unwrap_or(false) && !ticker.contains('-');
        if !standalone_token {
            let key = network_key(child, &ticker);
            currency.networks.insert(key.clone(), network(child, &ticker, &key, None));
        }
        result.insert(code, currency.complete());
    }
    result.into_values().collect()
}

// ── Market data ─────────────────────────────────────────────────────────

/// Covers the `market/info` shape (`lastPrice`, `bestBid`, ...) and the
/// `tickers` shape (`last_price`, `bid`, ...).
///
/// A previous close outside `[low, high]` is discarded, as is a quote
/// volume below `baseVolume × low`. Without a previous close the open is
/// the last price clamped into the day's range.
pub(super) fn ticker(raw: &Value, scope: MarketScope<'_>) -> Ticker {
    let id = first_string(raw, &["ticker_id", "symbol"]);
    let last = first_number(raw, &["lastPriceNumber", "lastPrice", "last_price", "last"]);
    let high = first_number(raw, &["highPriceNumber", "highPrice", "high", "high_price"]);
    let low = first_number(raw, &["lowPriceNumber", "lowPrice", "low", "low_price"]);
    let base_volume = first_number(raw, &["volumeNumber", "volume", "base_volume"]);
    let quote_volume = first_number(
        raw,
        &["volumeSecondaryNumber", "volumeSecondary", "target_volume", "quote_volume"],
    );
    let previous_close = first_number(
        raw,
        &["yesterdayPriceNumber", "yesterdayPrice", "previous_day_price", "previousClose"],
    )
    .filter(|close| high.map_or(true, |h| close <= &h) && low.map_or(true, |l| close >= &l));
    let quote_volume = match (quote_volume, base_volume.zip(low).and_then(|(b, l)| b.checked_mul(l))) {
        (Some(quote), Some(floor)) if quote < floor => None,
        (quote, _) => quote,
    };
    let open = previous_close.or_else(|| {
        last.map(|last| {
            let last = low.map_or(last, |l| last.max(l));
            high.map_or(last, |h| last.min(h))
        })
    });
    let percentage = safe::safe_string(raw, "change_percent")
        .and_then(|pct| crate::shared::precise::parse(&pct.replace(['%', '+'], "")).ok());
    Ticker {
        symbol: symbol_of(scope, id.as_deref()),
        timestamp: time::resolve_timestamp(raw, &["updatedAt", "lastTradeAt", "timestamp", "time"]),
        high,
        low,
        bid: first_number(raw, &["bestBidNumber", "bestBid", "bid", "best_bid"]),
        ask: first_number(raw, &["bestAskNumber", "bestAsk", "ask", "best_ask"]),
        last,
        open,
        previous_close,
        percentage,
        base_volume,
        quote_volume,
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// Public trades carry `side` or an `is_buy` flag. Private fills add
/// `isCurrentSide`, the account's role, and report the taker's side, so a
/// maker's fill is flipped.
pub(super) fn trade(raw: &Value, scope: MarketScope<'_>) -> Trade {
    let schema = safe::safe_value(raw, "market").and_then(|m| safe::safe_value(m, "schema"));
    let id = schema.and_then(|s| safe::safe_string2(s, "id", "symbol"));
    let market = scope.market.or_else(|| scope.resolve(id.as_deref()));
    let price = safe::safe_number(raw, "price");
    let amount = safe::safe_number2(raw, "quantity", "baseVolume");
    let fee = safe::safe_number(raw, "fee");
    let cost = safe::safe_number2(raw, "quoteVolume", "cost").or_else(|| {
        safe::safe_number(raw, "totalWithFee")
            .zip(fee)
            .and_then(|(total, fee)| total.checked_sub(fee))
    });
    let taker_or_maker = safe::safe_string(raw, "triggeredBy")
        .as_deref()
        .and_then(TakerOrMaker::parse);
    let trade = Trade {
        id: safe::safe_string(raw, "id"),
        order: safe::safe_string2(raw, "orderid", "orderId"),
        timestamp: time::resolve_timestamp(raw, &["timestamp", "time"]),
        symbol: match market {
            Some(market) => market.symbol.clone(),
            None => symbol_of(scope, id.as_deref()),
        },
        side: resolve_side(
            safe::safe_string2(raw, "side", "type").as_deref(),
            safe::safe_bool(raw, "is_buy"),
        ),
        taker_or_maker,
        price,
        amount,
        cost,
        fee: fee.and_then(|cost| Fee::from_parts(Some(cost), market.map(|m| m.quote.clone()), None)),
        info: raw.clone(),
        ..Default::default()
    };
    let trade = match safe::safe_string(raw, "isCurrentSide").as_deref().and_then(TakerOrMaker::parse) {
        Some(role) => trade.from_perspective(role),
        None => trade,
    };
    trade.complete()
}

// ── Orders ──────────────────────────────────────────────────────────────

/// Symbol from `symbol`, else the nested `market` object.
fn order_symbol(raw: &Value, scope: MarketScope<'_>) -> String {
    if let Some(symbol) = safe::safe_string(raw, "symbol") {
        return symbol_of(scope, Some(&symbol));
    }
    let nested = safe::safe_value(raw, "market").and_then(|market| {
        let schema = safe::safe_value(market, "schema");
        safe::safe_string(market, "symbol")
            .or_else(|| schema.and_then(|s| safe::safe_string(s, "symbol")))
            .or_else(|| safe::safe_string(market, "id"))
            .or_else(|| schema.and_then(|s| safe::safe_string(s, "id")))
    });
    match (nested, scope.market) {
        (Some(id), _) => symbol_of(scope, Some(&id)),
        (None, Some(market)) => market.symbol.clone(),
        (None, None) => String::new(),
    }
}

pub(super) fn order(raw: &Value, scope: MarketScope<'_>, status: Option<OrderStatus>) -> Order {
    let created = safe::safe_integer2(raw, "createdAt", "timestamp");
    Order {
        id: safe::safe_string(raw, "id").unwrap_or_default(),
        client_order_id: safe::safe_string2(raw, "userProvidedId", "clientOrderId"),
        timestamp: created,
        last_trade_timestamp: safe::safe_integer(raw, "lastTradeAt"),
        last_update_timestamp: safe::safe_integer(raw, "updatedAt"),
        status,
        symbol: order_symbol(raw, scope),
        order_type: safe::safe_string_lower(raw, "type"),
        side: safe::safe_string_lower(raw, "side").as_deref().and_then(crate::shared::Side::parse),
        price: safe::safe_number(raw, "price"),
        amount: safe::safe_number(raw, "quantity"),
        filled: safe::safe_number2(raw, "executedQuantity", "executed"),
        remaining: safe::safe_number(raw, "remainQuantity"),
        reduce_only: Some(safe::safe_bool(raw, "reduceOnly").unwrap_or(false)),
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

// ── Funding ─────────────────────────────────────────────────────────────

/// `isreversed` wins, then `isposted` without a status, then the status
/// text. Unknown text passes through.
pub(super) fn transaction_status(
    status: Option<&str>,
    posted: Option<bool>,
    reversed: Option<bool>,
) -> Option<TransactionStatus> {
    if reversed == Some(true) {
        return Some(TransactionStatus::Failed);
    }
    let Some(status) = status else {
        return (posted == Some(true)).then_some(TransactionStatus::Ok);
    };
    Some(match status.to_lowercase().as_str() {
        "completed" | "success" | "succeeded" | "confirmed" | "ok" => TransactionStatus::Ok,
        "pending" | "unconfirmed" | "processing" => TransactionStatus::Pending,
        "canceled" | "cancelled" | "rejected" | "failed" | "reversed" => TransactionStatus::Failed,
        _ => TransactionStatus::Other(status.to_string()),
    })
}

fn dated(raw: &Value, key: &str) -> Option<i64> {
    safe::safe_value(raw, key).and_then(time::timestamp_from_value)
}

/// Deposits and withdrawals share the row layout; `childticker` names the
/// network (`USDT-TRC20`).
pub(super) fn transaction(
    descriptor: &Descriptor,
    raw: &Value,
    kind: TransactionType,
    currency: Option<&Currency>,
) -> Transaction {
    let code = descriptor
        .safe_currency_code(safe::safe_string2(raw, "ticker", "currency").as_deref())
        .or_else(|| currency.map(|c| c.code.clone()));
    let network = safe::safe_string(raw, "childticker")
        .and_then(|ticker| ticker.split_once('-').map(|(_, id)| id.to_string()))
        .filter(|id| !id.is_empty())
        .map(|id| descriptor.options.network_id_to_code(&id));
    let address = safe::safe_string(raw, "address");
    let status = transaction_status(
        safe::safe_string(raw, "status").as_deref(),
        safe::safe_bool(raw, "isposted"),
        safe::safe_bool(raw, "isreversed"),
    );
    let (timestamp, updated, fee, address_to) = match kind {
        TransactionType::Deposit => (dated(raw, "firstseenat"), None, None, None),
        TransactionType::Withdrawal => {
            let fee_currency = descriptor
                .safe_currency_code(safe::safe_string2(raw, "feecurrency", "feeCurrency").as_deref())
                .or_else(|| code.clone());
            let sent = safe::safe_bool(raw, "issent").unwrap_or(false);
            (
                dated(raw, "requestedat"),
                sent.then(|| dated(raw, "sentat")).flatten(),
                safe::safe_number(raw, "fee").and_then(|cost| Fee::from_parts(Some(cost), fee_currency, None)),
                address.clone(),
            )
        }
    };
    Transaction {
        id: safe::safe_string(raw, "id"),
        txid: safe::safe_string(raw, "transactionid"),
        timestamp,
        network,
        address,
        address_to,
        tag: first_string(raw, &["paymentid", "memo", "tag"]),
        transaction_type: Some(kind),
        amount: safe::safe_number(raw, "quantity"),
        currency: code,
        status,
        updated,
        fee,
        info: raw.clone(),
        ..Default::default()
    }
    .complete()
}

/// Network from the ticker suffix, else from a `network` field that is
/// already a clean code.
pub(super) fn deposit_address(descriptor: &Descriptor, raw: &Value, currency: &Currency) -> DepositAddress {
    let from_ticker = safe::safe_string(raw, "ticker")
        .and_then(|ticker| ticker.rsplit_once('-').map(|(_, suffix)| suffix.to_uppercase()))
        .filter(|suffix| !suffix.is_empty());
    let from_field = safe::safe_string(raw, "network")
        .map(|id| descriptor.options.network_id_to_code(&id))
        .filter(|code| code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    DepositAddress {
        currency: currency.code.clone(),
        network: from_ticker.or(from_field),
        address: safe::safe_string(raw, "address").unwrap_or_default(),
        tag: first_string(raw, &["paymentid", "memo", "tag"]),
        info: raw.clone(),
    }
}
