//! NonKYC (spot).
//!
//! Market ids are `base_quote` in the legacy listing and `BASE/QUOTE` in the
//! current one; both are accepted. Assets form a parent/child tree where a
//! child ticker such as `USDT-TRC20` is one network of its parent. Private
//! calls sign `apiKey + url + body + nonce` with HMAC-SHA256, hex-encoded.

mod convert;

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::classify::ErrorReport;
use crate::describe::{
    Api, Capabilities, Descriptor, ExceptionTable, Fees, Options, RequiredCredentials, RouteTable,
    TradingFeeSchedule, Urls, Verb,
};
use crate::domain::address::{DepositAddress, WithdrawRequest};
use crate::domain::balance::{Balance, BalanceTrust};
use crate::domain::currency::Currency;
use crate::domain::fee::TradingFee;
use crate::domain::market::{Market, MarketIndex};
use crate::domain::ohlcv::Ohlcv;
use crate::domain::order::{Order, OrderFilter, OrderRequest, OrderStatus, OrderType};
use crate::domain::orderbook::{parse_mixed_levels, OrderBook};
use crate::domain::ticker::Ticker;
use crate::domain::trade::Trade;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{ErrorKind, ExchangeError, SdkError};
use crate::exchange::{list_at, merged_descriptor, ExchangeAdapter, MarketScope};
use crate::network::NONKYC_API_URL;
use crate::shared::{safe, time, PrecisionMode, Timeframe};
use crate::sign::{self, ApiCall, HttpRequest, SignContext};

const DEFAULT_CANDLES: usize = 100;

pub struct Nonkyc {
    descriptor: Descriptor,
}

impl Nonkyc {
    pub fn new() -> Self {
        Self {
            descriptor: describe(),
        }
    }
}

impl Default for Nonkyc {
    fn default() -> Self {
        Self::new()
    }
}

fn describe() -> Descriptor {
    let fee = Decimal::from_parts(2, 0, 0, false, 3);
    Descriptor {
        id: "nonkyc",
        name: "NonKYC",
        countries: Vec::new(),
        version: "v2",
        rate_limit: 1000,
        urls: Urls::single(NONKYC_API_URL),
        has: Capabilities::new().supported(&[
            "fetchTime",
            "fetchMarkets",
            "fetchCurrencies",
            "fetchOrderBook",
            "fetchTicker",
            "fetchTickers",
            "fetchTrades",
            "fetchOHLCV",
            "fetchBalance",
            "fetchTradingFees",
            "createOrder",
            "cancelOrder",
            "fetchOrder",
            "fetchOrders",
            "fetchOpenOrders",
            "fetchClosedOrders",
            "fetchMyTrades",
            "fetchDeposits",
            "fetchWithdrawals",
            "fetchDepositAddress",
            "withdraw",
        ]),
        timeframes: BTreeMap::from([
            (Timeframe::Minute5, "5"),
            (Timeframe::Minute15, "15"),
            (Timeframe::Minute30, "30"),
            (Timeframe::Hour1, "60"),
            (Timeframe::Hour4, "240"),
            (Timeframe::Hour12, "720"),
            (Timeframe::Day1, "1440"),
        ]),
        routes: RouteTable::new()
            .routes(
                Api::Public,
                Verb::Get,
                &[
                    ("time", 1),
                    ("asset/getlist", 1),
                    ("asset/info", 1),
                    ("market/getlist", 1),
                    ("market/info", 1),
                    ("market/orderbook", 1),
                    ("market/trades", 1),
                    ("market/candles", 2),
                    ("orderbook", 1),
                    ("ticker/{symbol}", 1),
                    ("tickers", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Get,
                &[
                    ("balances", 1),
                    ("getdepositaddress/{currency}", 1),
                    ("getdeposits", 1),
                    ("getwithdrawals", 1),
                    ("getorder/{orderId}", 1),
                    ("account/orders", 1),
                    ("account/trades", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Post,
                &[("createorder", 1), ("cancelorder", 1), ("cancelallorders", 1), ("createwithdrawal", 1)],
            ),
        fees: Fees {
            trading: TradingFeeSchedule::new(fee, fee),
            per_type: BTreeMap::new(),
        },
        precision_mode: PrecisionMode::DecimalPlaces,
        exceptions: ExceptionTable::new().broad(&[
            ("Available tickers for this master ticker are:", ErrorKind::BadRequest),
            ("Insufficient funds", ErrorKind::InsufficientFunds),
            ("Order not found", ErrorKind::OrderNotFound),
        ]),
        required_credentials: RequiredCredentials::key_and_secret(),
        common_currencies: BTreeMap::from([("XBT", "XBT")]),
        options: Options::new(),
    }
}

const ORDER_STATUSES: [(&str, OrderStatus); 16] = [
    ("open", OrderStatus::Open),
    ("new", OrderStatus::Open),
    ("pending", OrderStatus::Open),
    ("active", OrderStatus::Open),
    ("partially_filled", OrderStatus::Open),
    ("partiallyfilled", OrderStatus::Open),
    ("closed", OrderStatus::Closed),
    ("filled", OrderStatus::Closed),
    ("executed", OrderStatus::Closed),
    ("done", OrderStatus::Closed),
    ("completed", OrderStatus::Closed),
    ("canceled", OrderStatus::Canceled),
    ("cancelled", OrderStatus::Canceled),
    ("rejected", OrderStatus::Canceled),
    ("expired", OrderStatus::Canceled),
    ("partially_canceled", OrderStatus::Canceled),
];

/// Payload under `data`, or the root for unwrapped responses.
fn data(raw: &Value) -> &Value {
    safe::safe_value(raw, "data").unwrap_or(raw)
}

impl Nonkyc {
    /// Ticker to request a deposit address for: the currency itself, or one
    /// of its network children.
    fn deposit_ticker(&self, currency: &Currency, network: Option<&str>) -> Result<String, SdkError> {
        let candidates: Vec<_> = currency
            .networks
            .values()
            .filter(|n| n.active != Some(false) && n.deposit != Some(false))
            .collect();
        if let Some(requested) = network {
            let requested = requested.to_uppercase();
            if let Some(found) = currency.networks.get(&requested) {
                return Ok(found.id.clone());
            }
            if candidates.is_empty() && !requested.contains('-') && requested == currency.code {
                return Ok(currency.id.clone());
            }
            if candidates.is_empty() && requested.contains('-') {
                return Err(ExchangeError::new(
                    ErrorKind::BadRequest,
                    self.id(),
                    format!("fetchDepositAddress() {} has no network {}", currency.code, requested),
                )
                .into());
            }
            let id = self.descriptor.options.network_code_to_id(&requested);
            let ticker = format!("{}-{}", currency.id, id);
            if candidates.iter().any(|n| n.id == ticker) || candidates.is_empty() {
                return Ok(ticker);
            }
            return Err(ExchangeError::new(
                ErrorKind::BadRequest,
                self.id(),
                format!(
                    "fetchDepositAddress() unknown network {} for {}; supported: {}",
                    requested,
                    currency.code,
                    supported(&candidates)
                ),
            )
            .into());
        }
        match candidates.as_slice() {
            [] if currency.deposit == Some(false) => Err(ExchangeError::new(
                ErrorKind::ExchangeError,
                self.id(),
                format!("fetchDepositAddress() deposits of {} are disabled", currency.code),
            )
            .into()),
            [] => Ok(currency.id.clone()),
            [only] => Ok(only.id.clone()),
            several => Err(ExchangeError::new(
                ErrorKind::ArgumentsRequired,
                self.id(),
                format!(
                    "fetchDepositAddress() requires a network for {}; supported: {}",
                    currency.code,
                    supported(several)
                ),
            )
            .into()),
        }
    }

    /// Currency or network ticker for a withdrawal.
    fn withdraw_ticker(&self, request: &WithdrawRequest, currency: &Currency) -> String {
        match request.network.as_deref() {
            None => currency.id.clone(),
            Some(code) => match currency.networks.get(&code.to_uppercase()) {
                Some(network) => network.id.clone(),
                None => format!("{}-{}", currency.id, self.descriptor.options.network_code_to_id(code)),
            },
        }
    }
}

fn supported(networks: &[&crate::domain::currency::Network]) -> String {
    networks.iter().map(|n| n.id.as_str()).collect::<Vec<_>>().join(", ")
}

impl ExchangeAdapter for Nonkyc {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn with_options(&self, options: &Options) -> Self {
        Self {
            descriptor: merged_descriptor(&self.descriptor, options),
        }
    }

    fn sign(&self, call: &ApiCall, ctx: &SignContext<'_>) -> Result<HttpRequest, SdkError> {
        let prepared = sign::prepare(call)?;
        let url = prepared.url(ctx.urls.for_api(call.api));
        let mut request = HttpRequest::new(call.verb, url.clone());
        if call.verb != Verb::Get {
            request = request.with_body(prepared.body.clone());
        }
        if !call.is_private() {
            return Ok(request);
        }

        let nonce = ctx.nonce.to_string();
        let api_key = ctx.credentials.api_key();
        let payload = format!("{}{}{}{}", api_key, url, prepared.body.as_deref().unwrap_or_default(), nonce);
        let signature = sign::hmac_sha256_hex(ctx.credentials.secret(), &payload)?;
        request = request
            .header("X-API-KEY", api_key)
            .header("X-API-NONCE", nonce)
            .header("X-API-SIGN", signature)
            .header("Accept", "application/json");
        if call.verb != Verb::Get {
            request = request.header("Content-Type", "application/json");
        }
        Ok(request)
    }

    fn inspect_response(&self, status: u16, body: &Value) -> Option<ErrorReport> {
        let message = safe::safe_string2(body, "error", "message");
        if status < 400 && safe::safe_value(body, "error").is_none() {
            return None;
        }
        Some(ErrorReport::new(status, safe::safe_string(body, "code"), message))
    }

    // ── Parsers ─────────────────────────────────────────────────────────

    fn parse_market(&self, raw: &Value) -> Result<Market, SdkError> {
        convert::market(&self.descriptor, raw)
            .ok_or_else(|| SdkError::Validation(format!("nonkyc market without name or symbol {}", raw)))
    }

    /// Rows with neither a name nor a symbol are skipped; unsplittable ids
    /// come back inactive.
    fn parse_markets(&self, raw: &[Value]) -> Result<Vec<Market>, SdkError> {
        Ok(raw.iter().filter_map(|m| convert::market(&self.descriptor, m)).collect())
    }

    fn parse_currency(&self, raw: &Value) -> Result<Currency, SdkError> {
        convert::currency(&self.descriptor, raw)
            .ok_or_else(|| SdkError::Validation(format!("nonkyc asset without ticker {}", raw)))
    }

    fn parse_currencies(&self, raw: &[Value]) -> Result<Vec<Currency>, SdkError> {
        Ok(convert::currencies(&self.descriptor, raw))
    }

    fn parse_ticker(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        Ok(convert::ticker(raw, scope))
    }

    fn parse_trade(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Trade, SdkError> {
        Ok(convert::trade(raw, scope))
    }

    fn parse_ohlcv(&self, raw: &Value, _market: &Market) -> Result<Ohlcv, SdkError> {
        Ohlcv::from_keys(raw, ["time", "open", "high", "low", "close", "volume"])
            .ok_or_else(|| SdkError::Validation(format!("nonkyc malformed candle {}", raw)))
    }

    fn parse_order_status(&self, native: &str) -> OrderStatus {
        OrderStatus::from_table(&native.to_lowercase(), &ORDER_STATUSES)
    }

    /// Without a status, `isActive` decides between open and pass-through.
    fn parse_order(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let status = match safe::safe_string(raw, "status") {
            Some(native) => Some(self.parse_order_status(&native)),
            None if safe::safe_bool(raw, "isActive") == Some(true) => Some(OrderStatus::Open),
            None => None,
        };
        Ok(convert::order(raw, scope, status))
    }

    /// Withdrawal rows carry `requestedat`; anything else is a deposit.
    fn parse_transaction(&self, raw: &Value, currency: Option<&Currency>) -> Result<Transaction, SdkError> {
        let kind = if safe::safe_value(raw, "requestedat").is_some() {
            TransactionType::Withdrawal
        } else {
            TransactionType::Deposit
        };
        Ok(convert::transaction(&self.descriptor, raw, kind, currency))
    }

    // ── Operations ──────────────────────────────────────────────────────

    fn time_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("time"))
    }

    fn parse_time_response(&self, raw: &Value) -> Result<i64, SdkError> {
        safe::safe_integer2(raw, "serverTime", "time")
            .ok_or_else(|| SdkError::Validation("nonkyc server time missing".into()))
    }

    fn markets_requests(&self) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("market/getlist")])
    }

    fn parse_markets_response(&self, raw: &[Value]) -> Result<Vec<Market>, SdkError> {
        let mut markets = Vec::new();
        for response in raw {
            markets.extend(self.parse_markets(list_at(response, "data"))?);
        }
        Ok(markets)
    }

    fn currencies_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("asset/getlist"))
    }

    fn parse_currencies_response(&self, raw: &Value) -> Result<Vec<Currency>, SdkError> {
        self.parse_currencies(list_at(raw, "data"))
    }

    fn order_book_request(&self, market: &Market, limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("market/orderbook")
            .param("symbol", market.id.as_str())
            .param_opt("limit", limit))
    }

    fn parse_order_book_response(&self, raw: &Value, market: &Market) -> Result<OrderBook, SdkError> {
        let book = data(raw);
        let bids = safe::safe_list(book, "bids");
        let asks = safe::safe_list(book, "asks");
        // Object levels name the size `quantity`, older snapshots `amount`.
        let amount_key = bids
            .into_iter()
            .chain(asks)
            .flatten()
            .find(|level| level.is_object())
            .map_or("quantity", |level| {
                if safe::safe_value(level, "quantity").is_some() { "quantity" } else { "amount" }
            });
        Ok(OrderBook::from_levels(
            &market.symbol,
            parse_mixed_levels(bids, "price", amount_key),
            parse_mixed_levels(asks, "price", amount_key),
            time::resolve_timestamp(book, &["timestamp", "ts"]),
            safe::safe_integer2(book, "sequence", "nonce"),
        ))
    }

    fn ticker_request(&self, market: &Market) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("market/info").param("symbol", market.id.as_str()))
    }

    fn parse_ticker_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        let mut ticker = self.parse_ticker(data(raw), scope)?;
        if let Some(market) = scope.market {
            ticker.symbol = market.symbol.clone();
        }
        Ok(ticker)
    }

    fn tickers_requests(&self, _markets: &[&Market]) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("tickers")])
    }

    fn parse_tickers_response(&self, raw: &[Value], scope: MarketScope<'_>) -> Result<Vec<Ticker>, SdkError> {
        let mut tickers = Vec::new();
        for response in raw {
            tickers.extend(self.parse_tickers(list_at(response, "data"), scope)?);
        }
        Ok(tickers)
    }

    fn trades_request(&self, market: &Market, _since: Option<i64>, limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("market/trades")
            .param("symbol", market.id.as_str())
            .param_opt("limit", limit))
    }

    fn parse_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(raw, "data"), scope, None, None)
    }

    /// `to` is derived from `since` so the window spans `countBack` bars.
    fn ohlcv_request(
        &self,
        market: &Market,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let resolution = self.descriptor.timeframe(timeframe).ok_or_else(|| {
            ExchangeError::new(
                ErrorKind::ExchangeError,
                self.id(),
                format!("fetchOHLCV() unsupported timeframe {:?}", timeframe),
            )
        })?;
        let count_back = limit.unwrap_or(DEFAULT_CANDLES);
        let to = since.map(|since| since + timeframe.millis() * count_back as i64);
        Ok(ApiCall::public_get("market/candles")
            .param("symbol", market.id.as_str())
            .param("resolution", resolution)
            .param("countBack", count_back)
            .param("firstDataRequest", 0)
            .param_opt("from", since)
            .param_opt("to", to))
    }

    fn parse_ohlcv_response(&self, raw: &Value, market: &Market) -> Result<Vec<Ohlcv>, SdkError> {
        self.parse_ohlcvs(list_at(raw, "bars"), market, None, None)
    }

    fn balance_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("balances"))
    }

    fn parse_balance_response(&self, raw: &Value) -> Result<Balance, SdkError> {
        let accounts = list_at(raw, "data").iter().filter_map(|entry| {
            let code = self
                .descriptor
                .safe_currency_code(safe::safe_string2(entry, "asset", "ticker").as_deref())?;
            Some((
                code,
                safe::safe_number(entry, "available"),
                safe::safe_number(entry, "held"),
            ))
        });
        Ok(Balance::from_accounts(accounts, BalanceTrust::FreeUsed, raw.clone(), None))
    }

    fn trading_fees_request(&self) -> Result<Option<ApiCall>, SdkError> {
        Ok(None)
    }

    fn parse_trading_fees_response(
        &self,
        _raw: Option<&Value>,
        markets: &MarketIndex,
    ) -> Result<Vec<TradingFee>, SdkError> {
        let schedule = self.descriptor.fees.trading;
        Ok(markets
            .iter()
            .map(|market| TradingFee {
                symbol: market.symbol.clone(),
                maker: market.maker.or(Some(schedule.maker)),
                taker: market.taker.or(Some(schedule.taker)),
                percentage: Some(schedule.percentage),
                tier_based: Some(schedule.tier_based),
                info: Value::Null,
            })
            .collect())
    }

    fn create_order_request(&self, order: &OrderRequest, market: &Market) -> Result<ApiCall, SdkError> {
        let mode = self.descriptor.precision_mode;
        let mut call = ApiCall::private_post("createorder")
            .param("symbol", market.symbol.as_str())
            .param("side", order.side.as_str())
            .param("type", order.order_type.as_str())
            .param("quantity", market.amount_to_precision(order.amount, mode)?.to_string())
            .param_opt("userProvidedId", order.client_order_id.as_deref())
            .param("strictValidate", false);
        if order.order_type == OrderType::Limit {
            let price = order
                .price
                .ok_or_else(|| ExchangeError::arguments_required(self.id(), "createOrder", "price"))?;
            call = call.param("price", market.price_to_precision(price, mode)?.to_string());
        }
        Ok(call.extend(&order.params))
    }

    fn parse_create_order_response(
        &self,
        raw: &Value,
        _order: &OrderRequest,
        market: &Market,
    ) -> Result<Order, SdkError> {
        self.parse_order(data(raw), MarketScope::of(Some(market), &MarketIndex::default()))
    }

    fn cancel_order_request(&self, id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_post("cancelorder").param("id", id))
    }

    /// The acknowledgement carries at most the id; the order is canceled.
    fn parse_cancel_order_response(&self, raw: &Value, id: &str, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let payload = data(raw);
        Ok(Order {
            id: safe::safe_string(payload, "id").unwrap_or_else(|| id.to_string()),
            status: Some(OrderStatus::Canceled),
            symbol: scope.market.map(|m| m.symbol.clone()).unwrap_or_default(),
            info: raw.clone(),
            ..Default::default()
        })
    }

    fn order_request(&self, id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("getorder/{orderId}").param("orderId", id))
    }

    fn parse_order_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        self.parse_order(data(raw), scope)
    }

    fn orders_request(
        &self,
        filter: OrderFilter,
        market: Option<&Market>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let operation = match filter {
            OrderFilter::Open => "fetchOpenOrders",
            OrderFilter::Closed => "fetchClosedOrders",
            OrderFilter::All => "fetchOrders",
        };
        let market = market.ok_or_else(|| ExchangeError::arguments_required(self.id(), operation, "symbol"))?;
        let status = match filter {
            OrderFilter::Open => Some("active"),
            OrderFilter::Closed => Some("filled"),
            OrderFilter::All => None,
        };
        Ok(ApiCall::private_get("account/orders")
            .param("symbol", market.id.as_str())
            .param_opt("status", status)
            .param_opt("since", since)
            .param_opt("limit", limit))
    }

    fn parse_orders_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Order>, SdkError> {
        self.parse_orders(list_at(raw, "data"), scope, None, None)
    }

    fn my_trades_request(
        &self,
        market: Option<&Market>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let market = market.ok_or_else(|| ExchangeError::arguments_required(self.id(), "fetchMyTrades", "symbol"))?;
        Ok(ApiCall::private_get("account/trades")
            .param("symbol", market.id.as_str())
            .param_opt("since", since)
            .param_opt("limit", limit))
    }

    fn parse_my_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(raw, "data"), scope, None, None)
    }

    fn transactions_request(
        &self,
        kind: TransactionType,
        currency: Option<&Currency>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let call = match kind {
            TransactionType::Deposit => ApiCall::private_get("getdeposits"),
            TransactionType::Withdrawal => ApiCall::private_get("getwithdrawals"),
        };
        Ok(call
            .param_opt("ticker", currency.map(|c| c.id.as_str()))
            .param_opt("since", since)
            .param_opt("limit", limit))
    }

    fn parse_transactions_response(
        &self,
        raw: &Value,
        kind: TransactionType,
        currency: Option<&Currency>,
    ) -> Result<Vec<Transaction>, SdkError> {
        let rows = match raw {
            Value::Array(rows) => rows.as_slice(),
            other => safe::safe_list2(other, "data", "items")
                .or_else(|| safe::safe_list(other, "records"))
                .map(Vec::as_slice)
                .unwrap_or_default(),
        };
        Ok(rows
            .iter()
            .map(|row| convert::transaction(&self.descriptor, row, kind, currency))
            .collect())
    }

    fn deposit_address_request(&self, currency: &Currency, network: Option<&str>) -> Result<ApiCall, SdkError> {
        let ticker = self.deposit_ticker(currency, network)?;
        Ok(ApiCall::private_get("getdepositaddress/{currency}").param("currency", ticker))
    }

    fn parse_deposit_address_response(&self, raw: &Value, currency: &Currency) -> Result<DepositAddress, SdkError> {
        Ok(convert::deposit_address(&self.descriptor, data(raw), currency))
    }

    fn withdraw_request(&self, request: &WithdrawRequest, currency: &Currency) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_post("createwithdrawal")
            .param("ticker", self.withdraw_ticker(request, currency))
            .param("quantity", request.amount.to_string())
            .param("address", request.address.as_str())
            .param_opt("paymentid", request.tag.as_deref())
            .extend(&request.params))
    }

    fn parse_withdraw_response(&self, raw: &Value, currency: &Currency) -> Result<Transaction, SdkError> {
        Ok(convert::transaction(
            &self.descriptor,
            data(raw),
            TransactionType::Withdrawal,
            Some(currency),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::domain::currency::Network;
    use crate::shared::Side;
    use crate::sign::Credentials;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn eth_usdt() -> Market {
        Nonkyc::new()
            .parse_market(&json!({"name": "eth_usdt", "id": 2, "baseStep": 4, "quoteStep": 2, "active": true}))
            .unwrap()
    }

    fn ctx<'a>(credentials: &'a Credentials, urls: &'a Urls) -> SignContext<'a> {
        SignContext { credentials, nonce: 1700000000000, urls }
    }

    fn usdt(networks: &[(&str, &str)]) -> Currency {
        Currency {
            id: "USDT".into(),
            code: "USDT".into(),
            networks: networks
                .iter()
                .map(|(code, id)| {
                    (
                        code.to_string(),
                        Network {
                            id: id.to_string(),
                            network: code.to_string(),
                            active: Some(true),
                            deposit: Some(true),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_private_get_signs_full_url() {
        let nonkyc = Nonkyc::new();
        let credentials = Credentials::new("key", "secret");
        let urls = nonkyc.descriptor().urls.clone();
        let call = nonkyc.order_request("abc", None).unwrap();
        let request = nonkyc.sign(&call, &ctx(&credentials, &urls)).unwrap();

        assert_eq!(request.url, "https://api.nonkyc.io/api/v2/getorder/abc");
        let expected =
            sign::hmac_sha256_hex("secret", "keyhttps://api.nonkyc.io/api/v2/getorder/abc1700000000000").unwrap();
        assert_eq!(request.header_value("X-API-SIGN"), Some(expected.as_str()));
        assert_eq!(request.header_value("X-API-NONCE"), Some("1700000000000"));
        assert!(request.header_value("Content-Type").is_none());
    }

    #[test]
    fn test_post_signs_body() {
        let nonkyc = Nonkyc::new();
        let credentials = Credentials::new("key", "secret");
        let urls = nonkyc.descriptor().urls.clone();
        let call = nonkyc.cancel_order_request("abc", None).unwrap();
        let request = nonkyc.sign(&call, &ctx(&credentials, &urls)).unwrap();

        assert_eq!(request.body.as_deref(), Some(r#"{"id":"abc"}"#));
        let expected = sign::hmac_sha256_hex(
            "secret",
            r#"keyhttps://api.nonkyc.io/api/v2/cancelorder{"id":"abc"}1700000000000"#,
        )
        .unwrap();
        assert_eq!(request.header_value("X-API-SIGN"), Some(expected.as_str()));
        assert_eq!(request.header_value("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_executed_order_is_closed() {
        let nonkyc = Nonkyc::new();
        let index = MarketIndex::default();
        let raw = json!({"status": "executed", "side": "buy", "quantity": "1", "executed": "0.4"});
        let order = nonkyc.parse_order(&raw, MarketScope::new(&index)).unwrap();
        assert_eq!(order.status, Some(OrderStatus::Closed));
        assert_eq!(order.remaining, Some(dec("0.6")));
        assert_eq!(order.side, Some(Side::Buy));

        let active = nonkyc.parse_order(&json!({"isActive": true}), MarketScope::new(&index)).unwrap();
        assert_eq!(active.status, Some(OrderStatus::Open));
    }

    #[test]
    fn test_limit_order_needs_price() {
        let nonkyc = Nonkyc::new();
        let market = eth_usdt();
        let mut order = OrderRequest::limit("ETH/USDT", Side::Sell, dec("1.23456"), dec("2000.129"));
        let call = nonkyc.create_order_request(&order, &market).unwrap();
        assert_eq!(call.params.get("symbol"), Some(&json!("ETH/USDT")));
        assert_eq!(call.params.get("quantity"), Some(&json!("1.2345")));
        assert_eq!(call.params.get("price"), Some(&json!("2000.13")));
        assert_eq!(call.params.get("strictValidate"), Some(&json!(false)));

        order.price = None;
        let err = nonkyc.create_order_request(&order, &market).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ArgumentsRequired));
    }

    #[test]
    fn test_orders_need_symbol() {
        let nonkyc = Nonkyc::new();
        let err = nonkyc.orders_request(OrderFilter::Open, None, None, None).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ArgumentsRequired));
        let market = eth_usdt();
        let call = nonkyc.orders_request(OrderFilter::Closed, Some(&market), None, Some(5)).unwrap();
        assert_eq!(call.params.get("status"), Some(&json!("filled")));
    }

    #[test]
    fn test_order_book_accepts_objects_and_arrays() {
        let nonkyc = Nonkyc::new();
        let raw = json!({
            "bids": [["100", "1"], ["100", "2"], ["99", "5"]],
            "asks": [{"price": "101", "quantity": "1"}],
            "sequence": 42
        });
        let book = nonkyc.parse_order_book_response(&raw, &eth_usdt()).unwrap();
        assert_eq!(book.bids, vec![(dec("100"), dec("3")), (dec("99"), dec("5"))]);
        assert_eq!(book.best_ask(), Some((dec("101"), dec("1"))));
        assert_eq!(book.nonce, Some(42));
    }

    #[test]
    fn test_ohlcv_window_and_bars() {
        let nonkyc = Nonkyc::new();
        let market = eth_usdt();
        let call = nonkyc
            .ohlcv_request(&market, Timeframe::Hour1, Some(1_700_000_000_000), Some(2))
            .unwrap();
        assert_eq!(call.params.get("resolution"), Some(&json!("60")));
        assert_eq!(call.params.get("to"), Some(&json!(1_700_007_200_000i64)));
        assert!(nonkyc.ohlcv_request(&market, Timeframe::Minute1, None, None).is_err());

        let raw = json!({"bars": [
            {"time": 1700003600000i64, "open": 2, "high": 3, "low": 1, "close": 2, "volume": 10},
            {"time": 1700000000000i64, "open": 1, "high": 2, "low": 1, "close": 2, "volume": 5}
        ]});
        let candles = nonkyc.parse_ohlcv_response(&raw, &market).unwrap();
        assert_eq!(candles[0].timestamp, 1700000000000);
        assert_eq!(candles[1].volume, Some(dec("10")));
    }

    #[test]
    fn test_deposit_network_selection() {
        let nonkyc = Nonkyc::new();
        let both = usdt(&[("TRC20", "USDT-TRC20"), ("ERC20", "USDT-ERC20")]);
        let err = nonkyc.deposit_address_request(&both, None).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ArgumentsRequired));
        let call = nonkyc.deposit_address_request(&both, Some("trc20")).unwrap();
        assert_eq!(call.params.get("currency"), Some(&json!("USDT-TRC20")));
        let err = nonkyc.deposit_address_request(&both, Some("SOL")).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::BadRequest));

        let one = usdt(&[("TRC20", "USDT-TRC20")]);
        let call = nonkyc.deposit_address_request(&one, None).unwrap();
        assert_eq!(call.params.get("currency"), Some(&json!("USDT-TRC20")));

        let bare = usdt(&[]);
        let call = nonkyc.deposit_address_request(&bare, None).unwrap();
        assert_eq!(call.params.get("currency"), Some(&json!("USDT")));
    }

    #[test]
    fn test_deposit_address_network_from_ticker() {
        let nonkyc = Nonkyc::new();
        let raw = json!({"address": "T9zz", "paymentid": "", "ticker": "USDT-trc20"});
        let address = nonkyc.parse_deposit_address_response(&raw, &usdt(&[])).unwrap();
        assert_eq!(address.network.as_deref(), Some("TRC20"));
        assert_eq!(address.tag, None);
        assert_eq!(address.address, "T9zz");
    }

    #[test]
    fn test_withdraw_uses_network_ticker() {
        let nonkyc = Nonkyc::new();
        let currency = usdt(&[("TRC20", "USDT-TRC20")]);
        let request = WithdrawRequest {
            code: "USDT".into(),
            amount: dec("25"),
            address: "T9zz".into(),
            tag: None,
            network: Some("TRC20".into()),
            params: Default::default(),
        };
        let call = nonkyc.withdraw_request(&request, &currency).unwrap();
        assert_eq!(call.params.get("ticker"), Some(&json!("USDT-TRC20")));
        assert_eq!(call.params.get("quantity"), Some(&json!("25")));
    }

    #[test]
    fn test_master_ticker_message_is_bad_request() {
        let nonkyc = Nonkyc::new();
        let body = json!({"error": "Available tickers for this master ticker are: USDT-TRC20"});
        let report = nonkyc.inspect_response(400, &body).unwrap();
        let err = classify(nonkyc.descriptor(), None, &report, "url", "body");
        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert!(nonkyc.inspect_response(200, &json!([])).is_none());
    }

    #[test]
    fn test_static_trading_fees() {
        let nonkyc = Nonkyc::new();
        let index = MarketIndex::new(vec![eth_usdt()]);
        let fees = nonkyc.parse_trading_fees_response(None, &index).unwrap();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].taker, Some(dec("0.002")));
    }
}
