//! ExKoin.
//!
//! Plain JSON responses; failures come back as
//! `{"success": false, "error": {"code": "...", "message": "..."}}`, often
//! with HTTP 200. Private calls use HTTP Basic auth.

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
use crate::domain::ledger::LedgerEntry;
use crate::domain::market::{Market, MarketIndex};
use crate::domain::ohlcv::Ohlcv;
use crate::domain::order::{Order, OrderFilter, OrderRequest, OrderStatus, OrderType};
use crate::domain::orderbook::{parse_levels, OrderBook};
use crate::domain::ticker::Ticker;
use crate::domain::trade::Trade;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{ErrorKind, ExchangeError, SdkError};
use crate::exchange::{list_at, merged_descriptor, ExchangeAdapter, MarketScope};
use crate::network::EXKOIN_API_URL;
use crate::shared::{safe, PrecisionMode, Side, Timeframe};
use crate::sign::{self, ApiCall, HttpRequest, SignContext};

pub struct Exkoin {
    descriptor: Descriptor,
}

impl Exkoin {
    pub fn new() -> Self {
        Self {
            descriptor: describe(),
        }
    }
}

impl Default for Exkoin {
    fn default() -> Self {
        Self::new()
    }
}

fn describe() -> Descriptor {
    Descriptor {
        id: "exkoin",
        name: "ExKoin",
        countries: vec![],
        version: "v1",
        rate_limit: 30,
        urls: Urls::single(EXKOIN_API_URL),
        has: Capabilities::new().supported(&[
            "fetchCurrencies",
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
            "fetchOrder",
            "fetchOrders",
            "fetchOpenOrders",
            "fetchClosedOrders",
            "fetchMyTrades",
            "fetchDeposits",
            "fetchWithdrawals",
            "fetchLedger",
            "fetchDepositAddress",
            "withdraw",
        ]),
        timeframes: BTreeMap::from([
            (Timeframe::Minute1, "1"),
            (Timeframe::Minute5, "5"),
            (Timeframe::Minute15, "15"),
            (Timeframe::Minute30, "30"),
            (Timeframe::Hour1, "60"),
            (Timeframe::Hour4, "240"),
            (Timeframe::Day1, "1440"),
        ]),
        routes: RouteTable::new()
            .routes(
                Api::Public,
                Verb::Get,
                &[
                    ("public/currencies", 1),
                    ("public/networks", 1),
                    ("public/markets", 1),
                    ("public/orderbook", 1),
                    ("public/ohlcv", 1),
                    ("public/markets/tickers-list", 1),
                    ("public/markets/ticker", 1),
                    ("public/trades", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Get,
                &[
                    ("private/deposit-address", 1),
                    ("private/balances", 1),
                    ("private/orders", 1),
                    ("private/order", 1),
                    ("private/trades/by-order-id", 1),
                    ("private/trades", 1),
                    ("private/deposit", 1),
                    ("private/deposits", 1),
                    ("private/withdrawal", 1),
                    ("private/withdrawals", 1),
                    ("private/account/get-trading-fees", 1),
                    ("private/ledgers", 1),
                    ("private/ledger", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Post,
                &[
                    ("private/orders", 1),
                    ("private/orders/cancel", 1),
                    ("private/orders/cancel-all", 1),
                    ("private/withdrawals/prepare", 1),
                    ("private/withdrawals/finish", 1),
                ],
            ),
        fees: Fees {
            trading: TradingFeeSchedule::new(Decimal::ZERO, Decimal::new(4, 4)),
            per_type: BTreeMap::new(),
        },
        precision_mode: PrecisionMode::DecimalPlaces,
        exceptions: ExceptionTable::new().exact(&[
            ("UNAUTHORIZED", ErrorKind::AuthenticationError),
            ("INSUFFICIENT_BALANCE", ErrorKind::InsufficientFunds),
            ("INVALID_INPUT", ErrorKind::BadRequest),
            ("INVALID_ADDRESS", ErrorKind::BadRequest),
            ("NOT_FOUND", ErrorKind::OrderNotFound),
            ("ORDER_NOT_FOUND", ErrorKind::OrderNotFound),
            ("SYMBOL_NOT_FOUND", ErrorKind::BadSymbol),
            ("ACCOUNT_FREEZED", ErrorKind::AuthenticationError),
            ("ACCOUNT_NOT_ENABLED", ErrorKind::AuthenticationError),
            ("FORBIDDEN", ErrorKind::AuthenticationError),
            ("INVALID_SIGNATURE", ErrorKind::AuthenticationError),
            ("EXPIRED_TOKEN", ErrorKind::AuthenticationError),
            ("MARKET_CLOSED", ErrorKind::ExchangeNotAvailable),
            ("MAINTENANCE", ErrorKind::ExchangeNotAvailable),
            ("RATE_LIMIT", ErrorKind::RateLimitExceeded),
            ("INTERNAL_ERROR", ErrorKind::ExchangeError),
        ]),
        required_credentials: RequiredCredentials::key_and_secret(),
        common_currencies: BTreeMap::new(),
        options: Options::new()
            .with_network("TRC20", "TRX")
            .with_network("ERC20", "ETH")
            .with_network("BEP20", "BSC")
            .with_network("OPTIMISM", "OP")
            .with_network("ARB", "ARB")
            .with_network("MATIC", "POL"),
    }
}

impl Exkoin {
    fn network_id(&self, network: Option<&str>, operation: &str) -> Result<String, SdkError> {
        network
            .or(self.descriptor.options.default_network.as_deref())
            .map(|code| self.descriptor.options.network_code_to_id(code))
            .ok_or_else(|| ExchangeError::arguments_required(self.id(), operation, "network").into())
    }
}

impl ExchangeAdapter for Exkoin {
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
        let mut request = HttpRequest::new(call.verb, prepared.url(ctx.urls.for_api(call.api)));
        if call.is_private() {
            request = request
                .header("Content-Type", "application/json")
                .header(
                    "authorization",
                    sign::basic_auth(ctx.credentials.api_key(), ctx.credentials.secret()),
                );
            if call.verb != Verb::Get {
                let body = serde_json::to_string(&Value::Object(prepared.rest))?;
                request = request.with_body(Some(body));
            }
        }
        Ok(request)
    }

    /// `success` may be a bool or the string `"true"`.
    fn inspect_response(&self, status: u16, body: &Value) -> Option<ErrorReport> {
        let flagged = match safe::safe_value(body, "success") {
            Some(Value::Bool(ok)) => !ok,
            Some(other) => safe::value_to_string(other).as_deref() != Some("true"),
            None => false,
        };
        if !flagged && status < 400 {
            return None;
        }
        let error = safe::safe_value(body, "error").unwrap_or(&Value::Null);
        Some(ErrorReport::new(
            status,
            safe::safe_string(error, "code"),
            safe::safe_string(error, "message"),
        ))
    }

    // ── Parsers ─────────────────────────────────────────────────────────

    fn parse_market(&self, raw: &Value) -> Result<Market, SdkError> {
        Ok(convert::market(&self.descriptor, raw))
    }

    fn parse_currency(&self, raw: &Value) -> Result<Currency, SdkError> {
        Ok(convert::currency(&self.descriptor, raw))
    }

    fn parse_ticker(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        Ok(convert::ticker(raw, scope))
    }

    fn parse_trade(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Trade, SdkError> {
        Ok(convert::trade(&self.descriptor, raw, scope))
    }

    fn parse_ohlcv(&self, raw: &Value, _market: &Market) -> Result<Ohlcv, SdkError> {
        Ohlcv::from_keys(raw, ["time", "open", "high", "low", "close", "volume"])
            .ok_or_else(|| SdkError::Validation(format!("exkoin malformed candle {}", raw)))
    }

    fn parse_order_status(&self, native: &str) -> OrderStatus {
        match native {
            "cancelled" => OrderStatus::Canceled,
            other => OrderStatus::from(other.to_string()),
        }
    }

    fn parse_order(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let status = safe::safe_string(raw, "status").map(|s| self.parse_order_status(&s));
        Ok(convert::order(&self.descriptor, raw, scope, status))
    }

    fn parse_transaction(&self, raw: &Value, currency: Option<&Currency>) -> Result<Transaction, SdkError> {
        Ok(convert::transaction(&self.descriptor, raw, currency))
    }

    fn parse_ledger_entry(&self, raw: &Value, currency: Option<&Currency>) -> Result<LedgerEntry, SdkError> {
        Ok(convert::ledger_entry(&self.descriptor, raw, currency))
    }

    // ── Operations ──────────────────────────────────────────────────────

    fn markets_requests(&self) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("public/markets")])
    }

    fn parse_markets_response(&self, raw: &[Value]) -> Result<Vec<Market>, SdkError> {
        let mut markets = Vec::new();
        for response in raw {
            markets.extend(self.parse_markets(list_at(response, "data"))?);
        }
        Ok(markets)
    }

    fn currencies_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("public/currencies"))
    }

    fn parse_currencies_response(&self, raw: &Value) -> Result<Vec<Currency>, SdkError> {
        self.parse_currencies(list_at(raw, "data"))
    }

    fn order_book_request(&self, market: &Market, limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("public/orderbook")
            .param("symbol", market.id.as_str())
            .param_opt("limit", limit))
    }

    fn parse_order_book_response(&self, raw: &Value, market: &Market) -> Result<OrderBook, SdkError> {
        Ok(OrderBook::from_levels(
            &market.symbol,
            parse_levels(safe::safe_list(raw, "bids"), 0usize, 1),
            parse_levels(safe::safe_list(raw, "asks"), 0usize, 1),
            safe::safe_integer(raw, "timestamp"),
            None,
        ))
    }

    fn ticker_request(&self, market: &Market) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("public/markets/ticker").param("symbol", market.id.as_str()))
    }

    fn parse_ticker_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        self.parse_ticker(raw, scope)
    }

    fn tickers_requests(&self, _markets: &[&Market]) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("public/markets/tickers-list")])
    }

    fn parse_tickers_response(&self, raw: &[Value], scope: MarketScope<'_>) -> Result<Vec<Ticker>, SdkError> {
        let mut tickers = Vec::new();
        for response in raw {
            tickers.extend(self.parse_tickers(list_at(response, "data"), scope)?);
        }
        Ok(tickers)
    }

    fn trades_request(&self, market: &Market, _since: Option<i64>, limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("public/trades")
            .param("symbol", market.id.as_str())
            .param_opt("limit", limit))
    }

    fn parse_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(raw, "data"), scope, None, None)
    }

    fn ohlcv_request(
        &self,
        market: &Market,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let interval = self.descriptor.timeframe(timeframe).unwrap_or("60");
        Ok(ApiCall::public_get("public/ohlcv")
            .param("symbol", market.id.as_str())
            .param("interval", interval)
            .param_opt("from", since.map(|ms| ms / 1000))
            .param_opt("limit", limit))
    }

    fn parse_ohlcv_response(&self, raw: &Value, market: &Market) -> Result<Vec<Ohlcv>, SdkError> {
        self.parse_ohlcvs(list_at(raw, "data"), market, None, None)
    }

    fn balance_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("private/balances"))
    }

    /// Two maps keyed by currency id; an id missing from `locked` holds
    /// nothing in orders.
    fn parse_balance_response(&self, raw: &Value) -> Result<Balance, SdkError> {
        let locked = safe::safe_value(raw, "locked").unwrap_or(&Value::Null);
        let entries = safe::safe_dict(raw, "free")
            .into_iter()
            .flatten()
            .map(|(id, free)| {
                (
                    self.descriptor.common_currency_code(id),
                    safe::value_to_string(free).and_then(|s| crate::shared::precise::parse(&s).ok()),
                    // absent from `locked` means nothing is locked
                    safe::safe_number(locked, id.as_str()).or(Some(Decimal::ZERO)),
                )
            });
        Ok(Balance::from_accounts(entries, BalanceTrust::FreeUsed, raw.clone(), None))
    }

    fn trading_fees_request(&self) -> Result<Option<ApiCall>, SdkError> {
        Ok(Some(ApiCall::private_get("private/account/get-trading-fees")))
    }

    /// One account-wide schedule, applied to every loaded market.
    fn parse_trading_fees_response(
        &self,
        raw: Option<&Value>,
        markets: &MarketIndex,
    ) -> Result<Vec<TradingFee>, SdkError> {
        let raw = raw.unwrap_or(&Value::Null);
        let maker = safe::safe_number(raw, "maker");
        let taker = safe::safe_number(raw, "taker");
        Ok(markets
            .symbols()
            .map(|symbol| TradingFee {
                symbol: symbol.to_string(),
                maker,
                taker,
                percentage: Some(true),
                tier_based: Some(false),
                info: raw.clone(),
            })
            .collect())
    }

    fn create_order_request(&self, order: &OrderRequest, market: &Market) -> Result<ApiCall, SdkError> {
        let mode = self.descriptor.precision_mode;
        let mut call = ApiCall::private_post("private/orders")
            .param("symbol", market.id.as_str())
            .param("type", order.order_type.as_str())
            .param("side", order.side.as_str());
        let mut params = order.params.clone();
        match (order.order_type, order.side) {
            // Market buys are sized in quote currency.
            (OrderType::Market, Side::Buy) => {
                let cost = match params.remove("cost") {
                    Some(cost) => cost,
                    None => {
                        let price = order.price.ok_or_else(|| {
                            ExchangeError::arguments_required(self.id(), "createOrder", "price")
                        })?;
                        let cost = order.amount.checked_mul(price).ok_or_else(|| {
                            SdkError::Validation("exkoin order cost overflow".into())
                        })?;
                        Value::from(market.price_to_precision(cost, mode)?.to_string())
                    }
                };
                call = call.param("cost", cost);
            }
            (OrderType::Market, Side::Sell) => {
                call = call.param("quantity", market.amount_to_precision(order.amount, mode)?.to_string());
            }
            (OrderType::Limit, _) => {
                let price = order
                    .price
                    .ok_or_else(|| ExchangeError::arguments_required(self.id(), "createOrder", "price"))?;
                call = call
                    .param("quantity", market.amount_to_precision(order.amount, mode)?.to_string())
                    .param("price", market.price_to_precision(price, mode)?.to_string());
            }
        }
        let client_order_id = order
            .client_order_id
            .clone()
            .or_else(|| order.param_str("clientOrderId").map(String::from));
        params.remove("clientOrderId");
        Ok(call.param_opt("client_order_id", client_order_id).extend(&params))
    }

    fn parse_create_order_response(
        &self,
        raw: &Value,
        order: &OrderRequest,
        market: &Market,
    ) -> Result<Order, SdkError> {
        let markets = MarketIndex::default();
        let mut parsed = self.parse_order(raw, MarketScope::of(Some(market), &markets))?;
        parsed.side = parsed.side.or(Some(order.side));
        parsed.amount = parsed.amount.or(Some(order.amount));
        Ok(parsed)
    }

    fn cancel_order_request(&self, id: &str, market: Option<&Market>) -> Result<ApiCall, SdkError> {
        let market =
            market.ok_or_else(|| ExchangeError::arguments_required(self.id(), "cancelOrder", "symbol"))?;
        Ok(ApiCall::private_post("private/orders/cancel")
            .param("order_id", id)
            .param("symbol", market.id.as_str()))
    }

    fn parse_cancel_order_response(&self, raw: &Value, id: &str, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let mut order = self.parse_order(raw, scope)?;
        if order.id.is_empty() {
            order.id = id.to_string();
        }
        Ok(order)
    }

    fn order_request(&self, id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("private/order").param("order_id", id))
    }

    fn parse_order_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        self.parse_order(raw, scope)
    }

    fn orders_request(
        &self,
        filter: OrderFilter,
        market: Option<&Market>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let is_open = match filter {
            OrderFilter::Open => Some(true),
            OrderFilter::Closed => Some(false),
            OrderFilter::All => None,
        };
        Ok(ApiCall::private_get("private/orders")
            .param_opt("is_open", is_open)
            .param_opt("symbol", market.map(|m| m.id.as_str()))
            .param_opt("limit", limit)
            .param_opt("since", since))
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
        Ok(ApiCall::private_get("private/trades")
            .param_opt("symbol", market.map(|m| m.id.as_str()))
            .param_opt("limit", limit)
            .param_opt("since", since))
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
            TransactionType::Deposit => ApiCall::private_get("private/deposits"),
            TransactionType::Withdrawal => ApiCall::private_get("private/withdrawals"),
        };
        Ok(call
            .param_opt("currency", currency.map(|c| c.id.as_str()))
            .param_opt("limit", limit)
            .param_opt("start_time", since.map(|ms| ms / 1000)))
    }

    /// Entries whose direction cannot be read from their address fields take
    /// the kind that was requested.
    fn parse_transactions_response(
        &self,
        raw: &Value,
        kind: TransactionType,
        currency: Option<&Currency>,
    ) -> Result<Vec<Transaction>, SdkError> {
        let mut transactions = self.parse_transactions(list_at(raw, "data"), currency, None, None)?;
        for tx in &mut transactions {
            tx.transaction_type.get_or_insert(kind);
        }
        Ok(transactions)
    }

    fn ledger_request(
        &self,
        currency: Option<&Currency>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("private/ledgers")
            .param_opt("currency", currency.map(|c| c.id.as_str()))
            .param_opt("since", since.map(|ms| ms / 1000))
            .param_opt("limit", limit))
    }

    fn parse_ledger_response(&self, raw: &Value, currency: Option<&Currency>) -> Result<Vec<LedgerEntry>, SdkError> {
        self.parse_ledger(list_at(raw, "data"), currency, None, None)
    }

    fn deposit_address_request(&self, currency: &Currency, network: Option<&str>) -> Result<ApiCall, SdkError> {
        let network = self.network_id(network, "fetchDepositAddress")?;
        Ok(ApiCall::private_get("private/deposit-address")
            .param("currency", currency.id.as_str())
            .param("network", network))
    }

    fn parse_deposit_address_response(&self, raw: &Value, currency: &Currency) -> Result<DepositAddress, SdkError> {
        Ok(DepositAddress {
            currency: currency.code.clone(),
            network: safe::safe_string(raw, "network")
                .map(|id| self.descriptor.options.network_id_to_code(&id)),
            address: safe::safe_string(raw, "address").unwrap_or_default(),
            tag: safe::safe_string(raw, "memo").filter(|m| !m.is_empty()),
            info: raw.clone(),
        })
    }

    /// First leg of the two-step withdrawal; the response carries the
    /// payload the confirmation needs.
    fn withdraw_request(&self, request: &WithdrawRequest, currency: &Currency) -> Result<ApiCall, SdkError> {
        let network = self.network_id(request.network.as_deref(), "withdraw")?;
        Ok(ApiCall::private_post("private/withdrawals/prepare")
            .param("currency", currency.id.as_str())
            .param("address", request.address.as_str())
            .param("amount", request.amount.normalize().to_string())
            .param("network", network)
            .param_opt("memo", request.tag.as_deref())
            .extend(&request.params))
    }

    fn withdraw_followup(&self, raw: &Value, _request: &WithdrawRequest) -> Result<Option<ApiCall>, SdkError> {
        let payload = safe::safe_string(raw, "payload").ok_or_else(|| {
            ExchangeError::new(ErrorKind::ExchangeError, self.id(), "withdrawal prepare returned no payload")
        })?;
        Ok(Some(ApiCall::private_post("private/withdrawals/finish").param("payload", payload)))
    }

    fn parse_withdraw_response(&self, raw: &Value, currency: &Currency) -> Result<Transaction, SdkError> {
        let mut tx = self.parse_transaction(raw, Some(currency))?;
        tx.transaction_type = Some(TransactionType::Withdrawal);
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::Credentials;
    use serde_json::json;

    fn market() -> Market {
        Exkoin::new()
            .parse_market(&json!({
                "id": "BTC_USDT",
                "base": "BTC",
                "quote": "USDT",
                "precision": {"amount": 6, "price": 2},
                "limits": {"amount": {"min": "0.0001"}, "cost": {"min": "5"}}
            }))
            .unwrap()
    }

    #[test]
    fn test_private_calls_use_basic_auth() {
        let exkoin = Exkoin::new();
        let credentials = Credentials::new("key", "secret");
        let urls = Urls::single(EXKOIN_API_URL);
        let ctx = SignContext { credentials: &credentials, nonce: 1, urls: &urls };
        let call = ApiCall::private_post("private/orders/cancel").param("order_id", "7");
        let request = exkoin.sign(&call, &ctx).unwrap();
        assert_eq!(request.url, "https://api.exkoin.com/v1/private/orders/cancel");
        assert_eq!(request.header_value("authorization"), Some("Basic a2V5OnNlY3JldA=="));
        assert_eq!(request.body.as_deref(), Some(r#"{"order_id":"7"}"#));
    }

    #[test]
    fn test_success_flag_drives_failure() {
        let exkoin = Exkoin::new();
        let failed = json!({"success": false, "error": {"code": "INSUFFICIENT_BALANCE", "message": "no funds"}});
        let report = exkoin.inspect_response(200, &failed).unwrap();
        assert_eq!(report.code.as_deref(), Some("INSUFFICIENT_BALANCE"));
        assert!(exkoin.inspect_response(200, &json!({"success": "true"})).is_none());
        assert!(exkoin.inspect_response(200, &json!([{"id": "BTC"}])).is_none());
    }

    #[test]
    fn test_market_precision_is_digit_count() {
        let m = market();
        assert_eq!(m.symbol, "BTC/USDT");
        assert_eq!(m.precision.amount, Some(Decimal::from(6)));
        assert_eq!(m.limits.cost.min, Some(Decimal::from(5)));
        assert_eq!(m.taker, Some(Decimal::new(4, 4)));
        assert_eq!(
            m.amount_to_precision(Decimal::new(1_2345678, 7), PrecisionMode::DecimalPlaces).unwrap(),
            Decimal::new(1_234567, 6)
        );
    }

    #[test]
    fn test_market_buy_sized_by_cost() {
        let exkoin = Exkoin::new();
        let order = OrderRequest::market("BTC/USDT", Side::Buy, Decimal::new(5, 1));
        let err = exkoin.create_order_request(&order, &market()).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ArgumentsRequired));

        let priced = OrderRequest { price: Some(Decimal::from(100)), ..order.clone() };
        let call = exkoin.create_order_request(&priced, &market()).unwrap();
        assert_eq!(call.params.get("cost"), Some(&json!("50")));
        assert!(!call.params.contains_key("quantity"));

        let explicit = order.with_param("cost", json!("12.5"));
        let call = exkoin.create_order_request(&explicit, &market()).unwrap();
        assert_eq!(call.params.get("cost"), Some(&json!("12.5")));
    }

    #[test]
    fn test_withdraw_is_two_step() {
        let exkoin = Exkoin::new();
        let usdt = Currency::placeholder("USDT");
        let request = WithdrawRequest::new("USDT", Decimal::from(25), "TXabc").with_network("TRC20");
        let prepare = exkoin.withdraw_request(&request, &usdt).unwrap();
        assert_eq!(prepare.path, "private/withdrawals/prepare");
        assert_eq!(prepare.params.get("network"), Some(&json!("TRX")));

        let finish = exkoin
            .withdraw_followup(&json!({"payload": "opaque"}), &request)
            .unwrap()
            .unwrap();
        assert_eq!(finish.path, "private/withdrawals/finish");
        assert_eq!(finish.params.get("payload"), Some(&json!("opaque")));

        let missing = WithdrawRequest::new("USDT", Decimal::from(25), "TXabc");
        let err = exkoin.withdraw_request(&missing, &usdt).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ArgumentsRequired));
    }

    #[test]
    fn test_balance_from_free_and_locked_maps() {
        let exkoin = Exkoin::new();
        let raw = json!({"free": {"BTC": "0.5", "USDT": "100"}, "locked": {"BTC": "0.25"}});
        let balance = exkoin.parse_balance_response(&raw).unwrap();
        assert_eq!(balance.total("BTC"), Some(Decimal::new(75, 2)));
        assert_eq!(balance.used("USDT"), Some(Decimal::ZERO));
        assert_eq!(balance.total("USDT"), Some(Decimal::from(100)));
    }

    #[test]
    fn test_trading_fees_cover_every_market() {
        let exkoin = Exkoin::new();
        let index = MarketIndex::new(vec![market()]);
        let fees = exkoin
            .parse_trading_fees_response(Some(&json!({"maker": "0.001", "taker": "0.002"})), &index)
            .unwrap();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].symbol, "BTC/USDT");
        assert_eq!(fees[0].taker, Some(Decimal::new(2, 3)));
    }
}
