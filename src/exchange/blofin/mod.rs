//! BloFin (linear USDT-settled perpetuals).
//!
//! Every response is `{"code": "0", "msg": ..., "data": ...}`; a non-zero
//! `code`, at the top level or on the first `data` entry, is a failure.
//! Private calls sign `path + method + timestamp + nonce + body` with
//! HMAC-SHA256 and send the base64 of the hex digest.

mod convert;

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::classify::ErrorReport;
use crate::describe::{
    Api, Capabilities, Descriptor, ExceptionTable, Fees, Options, RequiredCredentials, RouteTable,
    TradingFeeSchedule, Urls, Verb,
};
use crate::domain::balance::{Account, Balance, BalanceTrust};
use crate::domain::currency::Currency;
use crate::domain::fee::TradingFee;
use crate::domain::ledger::LedgerEntry;
use crate::domain::market::{Market, MarketIndex};
use crate::domain::ohlcv::Ohlcv;
use crate::domain::order::{Order, OrderFilter, OrderRequest, OrderStatus, OrderType};
use crate::domain::orderbook::{parse_levels, OrderBook};
use crate::domain::position::Position;
use crate::domain::ticker::Ticker;
use crate::domain::trade::Trade;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{ErrorKind, ExchangeError, SdkError};
use crate::exchange::{list_at, merged_descriptor, ExchangeAdapter, MarketScope};
use crate::network::BLOFIN_API_URL;
use crate::shared::{safe, MarginMode, MarketType, PrecisionMode, Timeframe};
use crate::sign::{self, ApiCall, HttpRequest, SignContext};

pub struct Blofin {
    descriptor: Descriptor,
}

impl Blofin {
    pub fn new() -> Self {
        Self {
            descriptor: describe(),
        }
    }
}

impl Default for Blofin {
    fn default() -> Self {
        Self::new()
    }
}

fn describe() -> Descriptor {
    let swap_fees = TradingFeeSchedule::new(Decimal::new(2, 4), Decimal::new(6, 4));
    Descriptor {
        id: "blofin",
        name: "BloFin",
        countries: vec!["US"],
        version: "v1",
        rate_limit: 100,
        urls: Urls::single(BLOFIN_API_URL),
        has: Capabilities::new().supported(&[
            "fetchMarkets",
            "fetchOrderBook",
            "fetchTicker",
            "fetchTickers",
            "fetchTrades",
            "fetchOHLCV",
            "fetchBalance",
            "fetchTradingFees",
            "createOrder",
            "cancelOrder",
            "fetchOpenOrders",
            "fetchClosedOrders",
            "fetchMyTrades",
            "fetchPositions",
            "fetchDeposits",
            "fetchWithdrawals",
            "fetchLedger",
        ]),
        timeframes: BTreeMap::from([
            (Timeframe::Minute1, "1m"),
            (Timeframe::Minute3, "3m"),
            (Timeframe::Minute5, "5m"),
            (Timeframe::Minute15, "15m"),
            (Timeframe::Minute30, "30m"),
            (Timeframe::Hour1, "1H"),
            (Timeframe::Hour2, "2H"),
            (Timeframe::Hour4, "4H"),
            (Timeframe::Hour6, "6H"),
            (Timeframe::Hour12, "12H"),
            (Timeframe::Day1, "1D"),
            (Timeframe::Week1, "1W"),
            (Timeframe::Month1, "1M"),
        ]),
        routes: RouteTable::new()
            .routes(
                Api::Public,
                Verb::Get,
                &[
                    ("market/instruments", 1),
                    ("market/tickers", 1),
                    ("market/books", 1),
                    ("market/trades", 1),
                    ("market/candles", 1),
                    ("market/mark-price", 1),
                    ("market/funding-rate", 1),
                    ("market/funding-rate-history", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Get,
                &[
                    ("asset/balances", 1),
                    ("trade/orders-pending", 1),
                    ("trade/fills-history", 1),
                    ("asset/deposit-history", 1),
                    ("asset/withdrawal-history", 1),
                    ("asset/bills", 1),
                    ("account/balance", 1),
                    ("account/positions", 1),
                    ("account/leverage-info", 1),
                    ("account/margin-mode", 1),
                    ("trade/orders-tpsl-pending", 1),
                    ("trade/orders-history", 1),
                    ("trade/orders-tpsl-history", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Post,
                &[
                    ("trade/order", 1),
                    ("trade/cancel-order", 1),
                    ("account/set-leverage", 1),
                    ("trade/batch-orders", 1),
                    ("trade/order-tpsl", 1),
                    ("trade/cancel-batch-orders", 1),
                    ("trade/cancel-tpsl", 1),
                    ("trade/close-position", 1),
                    ("asset/transfer", 1),
                ],
            ),
        fees: Fees {
            trading: swap_fees,
            per_type: BTreeMap::from([(MarketType::Swap, swap_fees)]),
        },
        precision_mode: PrecisionMode::TickSize,
        exceptions: ExceptionTable::new()
            .exact(&[
                ("400", ErrorKind::BadRequest),
                ("401", ErrorKind::AuthenticationError),
                ("500", ErrorKind::ExchangeError),
                ("404", ErrorKind::BadRequest),
                ("405", ErrorKind::BadRequest),
                ("406", ErrorKind::BadRequest),
                ("429", ErrorKind::RateLimitExceeded),
                ("152001", ErrorKind::BadRequest),
                ("152002", ErrorKind::BadRequest),
                ("152003", ErrorKind::BadRequest),
                ("152004", ErrorKind::BadRequest),
                ("152005", ErrorKind::BadRequest),
                ("152006", ErrorKind::InvalidOrder),
                ("152007", ErrorKind::InvalidOrder),
                ("152008", ErrorKind::InvalidOrder),
                ("152009", ErrorKind::InvalidOrder),
                ("150003", ErrorKind::InvalidOrder),
                ("150004", ErrorKind::InvalidOrder),
                ("542", ErrorKind::InvalidOrder),
                ("102002", ErrorKind::InvalidOrder),
                ("102005", ErrorKind::InvalidOrder),
                ("102014", ErrorKind::InvalidOrder),
                ("102015", ErrorKind::InvalidOrder),
                ("102022", ErrorKind::InvalidOrder),
                ("102037", ErrorKind::InvalidOrder),
                ("102038", ErrorKind::InvalidOrder),
                ("102039", ErrorKind::InvalidOrder),
                ("102040", ErrorKind::InvalidOrder),
                ("102047", ErrorKind::InvalidOrder),
                ("102048", ErrorKind::InvalidOrder),
                ("102049", ErrorKind::InvalidOrder),
                ("102050", ErrorKind::InvalidOrder),
                ("102051", ErrorKind::InvalidOrder),
                ("102052", ErrorKind::InvalidOrder),
                ("102053", ErrorKind::InvalidOrder),
                ("102054", ErrorKind::InvalidOrder),
                ("102055", ErrorKind::InvalidOrder),
                ("102064", ErrorKind::BadRequest),
                ("102065", ErrorKind::BadRequest),
                ("102068", ErrorKind::BadRequest),
                ("103013", ErrorKind::ExchangeError),
                ("Order failed. Insufficient USDT margin in account", ErrorKind::InsufficientFunds),
            ])
            .broad(&[
                ("Internal Server Error", ErrorKind::ExchangeNotAvailable),
                ("server error", ErrorKind::ExchangeNotAvailable),
            ]),
        required_credentials: RequiredCredentials {
            api_key: true,
            secret: true,
            password: true,
        },
        common_currencies: BTreeMap::new(),
        options: Options::new()
            .with_default_type(MarketType::Swap)
            .with_default_margin_mode(MarginMode::Cross)
            .with_default_network("ERC20")
            .with_network("BTC", "Bitcoin")
            .with_network("BEP20", "BSC")
            .with_network("ERC20", "ERC20")
            .with_network("TRC20", "TRC20"),
    }
}

const ORDER_STATUSES: [(&str, OrderStatus); 6] = [
    ("canceled", OrderStatus::Canceled),
    ("order_failed", OrderStatus::Canceled),
    ("live", OrderStatus::Open),
    ("partially_filled", OrderStatus::Open),
    ("filled", OrderStatus::Closed),
    ("effective", OrderStatus::Closed),
];

fn first(raw: &Value) -> &Value {
    list_at(raw, "data").first().unwrap_or(&Value::Null)
}

/// Funding-account balances are a list reporting `balance` and `available`.
fn funding_balance(descriptor: &Descriptor, raw: &Value, entries: &[Value]) -> Balance {
    let accounts = entries.iter().filter_map(|entry| {
        let code = descriptor.safe_currency_code(safe::safe_string(entry, "currency").as_deref())?;
        Some((code, safe::safe_number(entry, "available"), safe::safe_number(entry, "balance")))
    });
    Balance::from_accounts(accounts, BalanceTrust::FreeTotal, raw.clone(), None)
}

/// Trading-account balances trust `available`/`equity` and fall back to
/// `availableEquity`/`frozen` when either is missing.
fn trading_balance(descriptor: &Descriptor, raw: &Value, data: &Value) -> Balance {
    let mut balance = Balance::new(raw.clone(), safe::safe_integer(data, "ts"));
    for entry in list_at(data, "details") {
        let Some(code) = descriptor.safe_currency_code(safe::safe_string(entry, "currency").as_deref()) else {
            continue;
        };
        let equity = safe::safe_number(entry, "equity");
        let available = safe::safe_number(entry, "available");
        let account = match (available, equity) {
            (Some(_), Some(_)) => Account::derive(BalanceTrust::FreeTotal, available, equity),
            _ => Account::derive(
                BalanceTrust::FreeUsed,
                safe::safe_number(entry, "availableEquity"),
                safe::safe_number(entry, "frozen"),
            ),
        };
        balance.insert(code, account);
    }
    balance
}

impl Blofin {
    fn margin_mode(&self, order: &OrderRequest) -> Result<&'static str, SdkError> {
        match order.param_str("marginMode") {
            Some(raw) => MarginMode::parse(raw).map(|m| m.as_str()).ok_or_else(|| {
                ExchangeError::new(
                    ErrorKind::BadRequest,
                    self.id(),
                    "createOrder() marginMode must be either cross or isolated",
                )
                .into()
            }),
            None => Ok(self
                .descriptor
                .options
                .default_margin_mode
                .unwrap_or(MarginMode::Cross)
                .as_str()),
        }
    }

    fn price(&self, market: &Market, raw: &str) -> Result<String, SdkError> {
        if raw == "-1" {
            return Ok(raw.to_string());
        }
        let price = crate::shared::precise::parse(raw)?;
        Ok(market
            .price_to_precision(price, self.descriptor.precision_mode)?
            .to_string())
    }

    /// Stop-loss or take-profit order against an open position.
    fn tpsl_order_request(&self, order: &OrderRequest, market: &Market, margin_mode: &str) -> Result<ApiCall, SdkError> {
        let mode = self.descriptor.precision_mode;
        let order_price = match (order.order_type, order.price) {
            (OrderType::Limit, Some(price)) => market.price_to_precision(price, mode)?.to_string(),
            _ => "-1".to_string(),
        };
        let mut call = ApiCall::private_post("trade/order-tpsl")
            .param("instId", market.id.as_str())
            .param("side", order.side.as_str())
            .param("positionSide", order.param_str("positionSide").unwrap_or("net"))
            .param("marginMode", margin_mode)
            .param("size", market.amount_to_precision(order.amount, mode)?.to_string());
        if let Some(trigger) = order.param_str("stopLossPrice") {
            call = call
                .param("slTriggerPrice", self.price(market, trigger)?)
                .param("slOrderPrice", order_price);
        } else if let Some(trigger) = order.param_str("takeProfitPrice") {
            call = call
                .param("tpTriggerPrice", self.price(market, trigger)?)
                .param("tpOrderPrice", order_price);
        }
        let mut params = order.params.clone();
        for key in ["stopLossPrice", "takeProfitPrice", "marginMode", "positionSide"] {
            params.remove(key);
        }
        Ok(call.extend(&params))
    }
}

impl ExchangeAdapter for Blofin {
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
        let request_path = sign::with_query(
            format!("/api/{}/{}", self.descriptor.version, prepared.path),
            &prepared.query,
        );
        let url = format!("{}{}", ctx.urls.for_api(call.api).trim_end_matches('/'), request_path);
        let mut request = HttpRequest::new(call.verb, url);
        if !call.is_private() {
            return Ok(request);
        }

        let timestamp = ctx.nonce.to_string();
        let body = prepared.body.clone().unwrap_or_default();
        let auth = format!("{}{}{}{}{}", request_path, call.verb, timestamp, timestamp, body);
        let digest = sign::hmac_sha256_hex(ctx.credentials.secret(), &auth)?;
        request = request
            .header("ACCESS-KEY", ctx.credentials.api_key())
            .header("ACCESS-PASSPHRASE", ctx.credentials.password())
            .header("ACCESS-TIMESTAMP", timestamp.clone())
            .header("ACCESS-NONCE", timestamp)
            .header("ACCESS-SIGN", sign::base64_encode(digest.as_bytes()));
        if call.verb != Verb::Get {
            request = request
                .header("Content-Type", "application/json")
                .with_body(prepared.body);
        }
        Ok(request)
    }

    fn inspect_response(&self, status: u16, body: &Value) -> Option<ErrorReport> {
        let failed = |code: &Option<String>| code.as_deref().is_some_and(|c| c != "0");
        let code = safe::safe_string(body, "code");
        if failed(&code) {
            return Some(ErrorReport::new(status, code, safe::safe_string(body, "msg")));
        }
        // Order endpoints answer 0 at the top and report per-order failures inside.
        let inner = safe::safe_list(body, "data").and_then(|data| data.first());
        if let Some(inner) = inner {
            let inner_code = safe::safe_string(inner, "code");
            if failed(&inner_code) {
                return Some(ErrorReport::new(status, inner_code, safe::safe_string(inner, "msg")));
            }
        }
        if status >= 400 {
            return Some(ErrorReport::new(status, None, safe::safe_string(body, "msg")));
        }
        None
    }

    // ── Parsers ─────────────────────────────────────────────────────────

    fn parse_market(&self, raw: &Value) -> Result<Market, SdkError> {
        Ok(convert::market(&self.descriptor, raw))
    }

    fn parse_ticker(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        Ok(convert::ticker(raw, scope))
    }

    fn parse_trade(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Trade, SdkError> {
        Ok(convert::trade(raw, scope))
    }

    /// Spot candles carry base volume in column 5; contract candles carry
    /// the contract count there and base volume in column 6.
    fn parse_ohlcv(&self, raw: &Value, market: &Market) -> Result<Ohlcv, SdkError> {
        let volume_index = if market.spot { 5 } else { 6 };
        Ohlcv::from_array(raw, volume_index)
            .ok_or_else(|| SdkError::Validation(format!("blofin malformed candle {}", raw)))
    }

    fn parse_order_status(&self, native: &str) -> OrderStatus {
        OrderStatus::from_table(native, &ORDER_STATUSES)
    }

    fn parse_order(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let status = safe::safe_string(raw, "state").map(|s| self.parse_order_status(&s));
        Ok(convert::order(&self.descriptor, raw, scope, status))
    }

    fn parse_position(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Position, SdkError> {
        Ok(convert::position(raw, scope))
    }

    fn parse_transaction(&self, raw: &Value, currency: Option<&Currency>) -> Result<Transaction, SdkError> {
        Ok(convert::transaction(&self.descriptor, raw, currency))
    }

    fn parse_ledger_entry(&self, raw: &Value, currency: Option<&Currency>) -> Result<LedgerEntry, SdkError> {
        Ok(convert::ledger_entry(&self.descriptor, raw, currency))
    }

    // ── Operations ──────────────────────────────────────────────────────

    fn markets_requests(&self) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("market/instruments")])
    }

    fn parse_markets_response(&self, raw: &[Value]) -> Result<Vec<Market>, SdkError> {
        let mut markets = Vec::new();
        for response in raw {
            markets.extend(self.parse_markets(list_at(response, "data"))?);
        }
        Ok(markets)
    }

    fn order_book_request(&self, market: &Market, limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("market/books")
            .param("instId", market.id.as_str())
            .param("size", limit.unwrap_or(50)))
    }

    fn parse_order_book_response(&self, raw: &Value, market: &Market) -> Result<OrderBook, SdkError> {
        let book = first(raw);
        Ok(OrderBook::from_levels(
            &market.symbol,
            parse_levels(safe::safe_list(book, "bids"), 0usize, 1),
            parse_levels(safe::safe_list(book, "asks"), 0usize, 1),
            safe::safe_integer(book, "ts"),
            None,
        ))
    }

    fn ticker_request(&self, market: &Market) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("market/tickers").param("instId", market.id.as_str()))
    }

    fn parse_ticker_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        self.parse_ticker(first(raw), scope)
    }

    fn tickers_requests(&self, _markets: &[&Market]) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("market/tickers")])
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
            .param("instId", market.id.as_str())
            .param_opt("limit", limit))
    }

    fn parse_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(raw, "data"), scope, None, None)
    }

    /// `before` and `after` bound the window exclusively.
    fn ohlcv_request(
        &self,
        market: &Market,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let bar = self
            .descriptor
            .timeframe(timeframe)
            .ok_or_else(|| ExchangeError::new(ErrorKind::BadRequest, self.id(), format!("unsupported timeframe {}", timeframe.as_str())))?;
        let limit = limit.unwrap_or(100);
        let mut call = ApiCall::public_get("market/candles")
            .param("instId", market.id.as_str())
            .param("bar", bar)
            .param("limit", limit);
        if let Some(since) = since {
            let start = (since - 1).max(0);
            call = call
                .param("before", start)
                .param("after", start + timeframe.millis() * limit as i64);
        }
        Ok(call)
    }

    fn parse_ohlcv_response(&self, raw: &Value, market: &Market) -> Result<Vec<Ohlcv>, SdkError> {
        let mut candles = self.parse_ohlcvs(list_at(raw, "data"), market, None, None)?;
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    /// The funding account when `account_type` is set, else the trading account.
    fn balance_request(&self) -> Result<ApiCall, SdkError> {
        Ok(match self.descriptor.options.account_type.as_deref() {
            Some(account) => {
                let account = match account {
                    "swap" | "future" => "futures",
                    other => other,
                };
                ApiCall::private_get("asset/balances").param("accountType", account)
            }
            None => ApiCall::private_get("account/balance"),
        })
    }

    fn parse_balance_response(&self, raw: &Value) -> Result<Balance, SdkError> {
        Ok(match safe::safe_value(raw, "data") {
            Some(Value::Array(entries)) => funding_balance(&self.descriptor, raw, entries),
            Some(data) => trading_balance(&self.descriptor, raw, data),
            None => Balance::new(raw.clone(), None),
        })
    }

    fn trading_fees_request(&self) -> Result<Option<ApiCall>, SdkError> {
        Ok(None)
    }

    fn parse_trading_fees_response(
        &self,
        _raw: Option<&Value>,
        markets: &MarketIndex,
    ) -> Result<Vec<TradingFee>, SdkError> {
        Ok(markets
            .iter()
            .map(|market| {
                let schedule = self.descriptor.fees.for_type(market.market_type);
                TradingFee {
                    symbol: market.symbol.clone(),
                    maker: market.maker.or(Some(schedule.maker)),
                    taker: market.taker.or(Some(schedule.taker)),
                    percentage: Some(schedule.percentage),
                    tier_based: Some(schedule.tier_based),
                    info: Value::Null,
                }
            })
            .collect())
    }

    fn create_order_request(&self, order: &OrderRequest, market: &Market) -> Result<ApiCall, SdkError> {
        let mode = self.descriptor.precision_mode;
        let margin_mode = self.margin_mode(order)?;
        if order.param_str("stopLossPrice").is_some() || order.param_str("takeProfitPrice").is_some() {
            return self.tpsl_order_request(order, market, margin_mode);
        }

        let time_in_force = order.param_str("timeInForce").unwrap_or("GTC");
        let order_type = match order.order_type {
            OrderType::Market => "market",
            OrderType::Limit if order.param_bool("postOnly") => "post_only",
            OrderType::Limit if time_in_force == "IOC" => "ioc",
            OrderType::Limit if time_in_force == "FOK" => "fok",
            OrderType::Limit => "limit",
        };
        let mut call = ApiCall::private_post("trade/order")
            .param("instId", market.id.as_str())
            .param("side", order.side.as_str())
            .param("orderType", order_type)
            .param("marginMode", margin_mode)
            .param("size", market.amount_to_precision(order.amount, mode)?.to_string())
            .param_opt("clientOrderId", order.client_order_id.as_deref());
        if order.order_type == OrderType::Limit {
            let price = order
                .price
                .ok_or_else(|| ExchangeError::arguments_required(self.id(), "createOrder", "price"))?;
            call = call.param("price", market.price_to_precision(price, mode)?.to_string());
        }

        // Attached stop-loss / take-profit legs: {"triggerPrice", "price"?}.
        for (key, trigger_key, price_key) in [
            ("stopLoss", "slTriggerPrice", "slOrderPrice"),
            ("takeProfit", "tpTriggerPrice", "tpOrderPrice"),
        ] {
            let Some(leg) = order.params.get(key) else {
                continue;
            };
            let trigger = safe::safe_string2(leg, "triggerPrice", "stopPrice")
                .ok_or_else(|| ExchangeError::arguments_required(self.id(), "createOrder", "triggerPrice"))?;
            let leg_price = safe::safe_string(leg, "price").unwrap_or_else(|| "-1".to_string());
            call = call
                .param(trigger_key, self.price(market, &trigger)?)
                .param(price_key, self.price(market, &leg_price)?);
        }

        let mut params = order.params.clone();
        for key in ["marginMode", "timeInForce", "postOnly", "stopLoss", "takeProfit"] {
            params.remove(key);
        }
        Ok(call.extend(&params))
    }

    fn parse_create_order_response(
        &self,
        raw: &Value,
        order: &OrderRequest,
        market: &Market,
    ) -> Result<Order, SdkError> {
        let markets = MarketIndex::default();
        let mut parsed = self.parse_order(first(raw), MarketScope::of(Some(market), &markets))?;
        parsed.symbol = market.symbol.clone();
        parsed.order_type = Some(order.order_type.as_str().to_string());
        parsed.side = Some(order.side);
        if parsed.client_order_id.is_none() {
            parsed.client_order_id = order.client_order_id.clone();
        }
        Ok(parsed)
    }

    fn cancel_order_request(&self, id: &str, market: Option<&Market>) -> Result<ApiCall, SdkError> {
        let market = market.ok_or_else(|| ExchangeError::arguments_required(self.id(), "cancelOrder", "symbol"))?;
        Ok(ApiCall::private_post("trade/cancel-order")
            .param("instId", market.id.as_str())
            .param("orderId", id))
    }

    fn parse_cancel_order_response(&self, raw: &Value, id: &str, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let mut order = self.parse_order(first(raw), scope)?;
        if order.id.is_empty() {
            order.id = id.to_string();
        }
        if order.status.is_none() {
            order.status = Some(OrderStatus::Canceled);
        }
        Ok(order)
    }

    fn orders_request(
        &self,
        filter: OrderFilter,
        market: Option<&Market>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let call = match filter {
            OrderFilter::Open => ApiCall::private_get("trade/orders-pending"),
            OrderFilter::Closed => ApiCall::private_get("trade/orders-history").param_opt("begin", since),
            OrderFilter::All => return Err(self.unsupported("fetchOrders")),
        };
        Ok(call
            .param_opt("instId", market.map(|m| m.id.as_str()))
            .param_opt("limit", limit))
    }

    fn parse_orders_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Order>, SdkError> {
        self.parse_orders(list_at(raw, "data"), scope, None, None)
    }

    fn my_trades_request(
        &self,
        market: Option<&Market>,
        _since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("trade/fills-history")
            .param_opt("instId", market.map(|m| m.id.as_str()))
            .param_opt("limit", limit))
    }

    fn parse_my_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(raw, "data"), scope, None, None)
    }

    fn positions_request(&self, markets: &[&Market]) -> Result<ApiCall, SdkError> {
        let call = ApiCall::private_get("account/positions");
        Ok(match markets {
            [market] => call.param("instId", market.id.as_str()),
            _ => call,
        })
    }

    fn parse_positions_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Position>, SdkError> {
        self.parse_positions(list_at(raw, "data"), scope)
    }

    fn transactions_request(
        &self,
        kind: TransactionType,
        currency: Option<&Currency>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let call = match kind {
            TransactionType::Deposit => ApiCall::private_get("asset/deposit-history"),
            TransactionType::Withdrawal => ApiCall::private_get("asset/withdrawal-history"),
        };
        Ok(call
            .param_opt("currency", currency.map(|c| c.id.as_str()))
            .param_opt("before", since.map(|s| (s - 1).max(0)))
            .param_opt("limit", limit))
    }

    fn parse_transactions_response(
        &self,
        raw: &Value,
        _kind: TransactionType,
        currency: Option<&Currency>,
    ) -> Result<Vec<Transaction>, SdkError> {
        self.parse_transactions(list_at(raw, "data"), currency, None, None)
    }

    fn ledger_request(
        &self,
        currency: Option<&Currency>,
        _since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("asset/bills")
            .param_opt("currency", currency.map(|c| c.id.as_str()))
            .param_opt("limit", limit))
    }

    fn parse_ledger_response(&self, raw: &Value, currency: Option<&Currency>) -> Result<Vec<LedgerEntry>, SdkError> {
        self.parse_ledger(list_at(raw, "data"), currency, None, None)
    }
}
