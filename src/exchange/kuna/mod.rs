//! Kuna (v4 API).
//!
//! Responses wrap their payload in `{"data": ...}`; failures carry an
//! `errors` list or come back as HTTP 400 with an `error` object. Private
//! calls are signed with HMAC-SHA384 over `urlPath + nonce + json(body)`.

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
use crate::domain::market::Market;
use crate::domain::order::{Order, OrderFilter, OrderRequest, OrderStatus, OrderType};
use crate::domain::orderbook::{parse_levels, OrderBook};
use crate::domain::ticker::Ticker;
use crate::domain::trade::Trade;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{ErrorKind, ExchangeError, SdkError};
use crate::exchange::{list_at, merged_descriptor, ExchangeAdapter, MarketScope};
use crate::network::KUNA_API_URL;
use crate::shared::{safe, time, PrecisionMode, Side};
use crate::sign::{self, ApiCall, HttpRequest, SignContext};

pub struct Kuna {
    descriptor: Descriptor,
}

impl Kuna {
    pub fn new() -> Self {
        Self {
            descriptor: describe(),
        }
    }
}

impl Default for Kuna {
    fn default() -> Self {
        Self::new()
    }
}

fn describe() -> Descriptor {
    let fee = Decimal::new(25, 4);
    Descriptor {
        id: "kuna",
        name: "Kuna",
        countries: vec!["UA"],
        version: "v4",
        rate_limit: 1000,
        urls: Urls::single(KUNA_API_URL),
        has: Capabilities::new()
            .supported(&[
                "fetchTime",
                "fetchCurrencies",
                "fetchMarkets",
                "fetchOrderBook",
                "fetchTicker",
                "fetchTickers",
                "fetchTrades",
                "fetchBalance",
                "createOrder",
                "cancelOrder",
                "fetchOrder",
                "fetchOpenOrders",
                "fetchClosedOrders",
                "fetchMyTrades",
                "fetchDeposits",
                "fetchWithdrawals",
                "fetchDepositAddress",
                "withdraw",
            ])
            .emulated(&["fetchOHLCV"]),
        timeframes: BTreeMap::new(),
        routes: RouteTable::new()
            .routes(
                Api::Public,
                Verb::Get,
                &[
                    ("public/timestamp", 1),
                    ("public/fees", 1),
                    ("public/currencies", 1),
                    ("markets/public/getAll", 1),
                    ("markets/public/tickers?pairs={pairs}", 1),
                    ("order/public/book/{pairs}", 1),
                    ("trade/public/book/{pairs}", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Get,
                &[
                    ("private/me", 1),
                    ("private/getBalance", 1),
                    ("order/private/active", 1),
                    ("order/private/history", 1),
                    ("order/private/{id}/trades", 1),
                    ("order/private/details/{id}", 1),
                    ("trade/private/history", 1),
                    ("deposit/private/crypto/address", 1),
                    ("deposit/private/history", 1),
                    ("deposit/private/details/{depositId}", 1),
                    ("withdraw/private/history", 1),
                    ("withdraw/private/details/{withdrawId}", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Post,
                &[
                    ("order/private/create", 1),
                    ("order/private/cancel", 1),
                    ("order/private/cancel/multi", 1),
                    ("deposit/private/crypto/generateAddress", 1),
                    ("withdraw/private/create", 1),
                ],
            ),
        fees: Fees {
            trading: TradingFeeSchedule::new(fee, fee),
            per_type: BTreeMap::new(),
        },
        precision_mode: PrecisionMode::TickSize,
        exceptions: ExceptionTable::new().exact(&[
            ("ARGUMENT_VALIDATION_ERROR", ErrorKind::BadRequest),
            ("PAYMENT_METHOD_NOT_SUPPORTED", ErrorKind::BadRequest),
            ("NOT_FOUND", ErrorKind::OrderNotFound),
            ("INVALID:ORDER_SIZE", ErrorKind::InvalidOrder),
            ("WrongRequestException", ErrorKind::BadRequest),
            ("INSUFFICIENT_FUNDS", ErrorKind::InsufficientFunds),
            ("2002", ErrorKind::InsufficientFunds),
            ("2003", ErrorKind::OrderNotFound),
        ]),
        required_credentials: RequiredCredentials::key_and_secret(),
        common_currencies: BTreeMap::from([("PLA", "Plair")]),
        options: Options::new(),
    }
}

const ORDER_STATUSES: [(&str, OrderStatus); 7] = [
    ("Canceled", OrderStatus::Canceled),
    ("Closed", OrderStatus::Closed),
    ("Pending", OrderStatus::Open),
    ("Open", OrderStatus::Open),
    ("done", OrderStatus::Closed),
    ("wait", OrderStatus::Open),
    ("cancel", OrderStatus::Canceled),
];

/// The `data` member of the envelope.
fn data(raw: &Value) -> &Value {
    safe::safe_value(raw, "data").unwrap_or(raw)
}

fn iso(ms: i64) -> Option<String> {
    time::iso8601(ms)
}

impl ExchangeAdapter for Kuna {
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
        let url_path = sign::with_query(
            format!("/{}/{}", self.descriptor.version, prepared.path),
            &prepared.query,
        );
        let url = format!("{}{}", ctx.urls.for_api(call.api).trim_end_matches('/'), url_path);
        let mut request = HttpRequest::new(call.verb, url);

        if call.is_private() {
            let nonce = ctx.nonce.to_string();
            let payload = match call.verb {
                Verb::Get => "{}".to_string(),
                _ => serde_json::to_string(&Value::Object(prepared.rest.clone()))?,
            };
            let auth = format!("{}{}{}", url_path, nonce, payload);
            let signature = sign::hmac_sha384_hex(ctx.credentials.secret(), &auth)?;
            request = request
                .header("Content-Type", "application/json")
                .header("accept", "application/json")
                .header("nonce", nonce)
                .header("public-key", ctx.credentials.api_key())
                .header("signature", signature);
            if self.descriptor.options.account_type.as_deref() == Some("pro") {
                request = request.header("account", "pro");
            }
            if call.verb != Verb::Get {
                request = request.with_body(Some(payload));
            }
        } else if let Some(body) = prepared.body {
            request = request
                .header("Content-Type", "application/json")
                .with_body(Some(body));
        }
        Ok(request)
    }

    fn inspect_response(&self, status: u16, body: &Value) -> Option<ErrorReport> {
        let errors = safe::safe_value(body, "errors");
        if errors.is_none() && status < 400 {
            return None;
        }
        let error = errors
            .and_then(|e| safe::safe_value(e, 0))
            .or_else(|| safe::safe_value(body, "error"))
            .unwrap_or(&Value::Null);
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

    fn parse_order_status(&self, native: &str) -> OrderStatus {
        OrderStatus::from_table(native, &ORDER_STATUSES)
    }

    fn parse_order(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let trades = self.parse_trades(list_at(raw, "trades"), scope, None, None)?;
        let status = safe::safe_string(raw, "status").map(|s| self.parse_order_status(&s));
        Ok(convert::order(raw, scope, status, trades))
    }

    fn parse_transaction(&self, raw: &Value, currency: Option<&Currency>) -> Result<Transaction, SdkError> {
        Ok(convert::transaction(&self.descriptor, raw, currency))
    }

    // ── Operations ──────────────────────────────────────────────────────

    fn time_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("public/timestamp"))
    }

    fn parse_time_response(&self, raw: &Value) -> Result<i64, SdkError> {
        safe::safe_integer(data(raw), "timestamp_miliseconds")
            .ok_or_else(|| SdkError::Validation("kuna timestamp missing".into()))
    }

    fn markets_requests(&self) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("markets/public/getAll")])
    }

    fn parse_markets_response(&self, raw: &[Value]) -> Result<Vec<Market>, SdkError> {
        let mut markets = Vec::new();
        for response in raw {
            markets.extend(self.parse_markets(list_at(data(response), "data"))?);
        }
        Ok(markets)
    }

    fn currencies_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("public/currencies"))
    }

    fn parse_currencies_response(&self, raw: &Value) -> Result<Vec<Currency>, SdkError> {
        self.parse_currencies(list_at(data(raw), "data"))
    }

    fn order_book_request(&self, market: &Market, limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("order/public/book/{pairs}")
            .param("pairs", market.id.as_str())
            .param_opt("level", limit))
    }

    fn parse_order_book_response(&self, raw: &Value, market: &Market) -> Result<OrderBook, SdkError> {
        let book = data(raw);
        Ok(OrderBook::from_levels(
            &market.symbol,
            parse_levels(safe::safe_list(book, "bids"), 0usize, 1),
            parse_levels(safe::safe_list(book, "asks"), 0usize, 1),
            None,
            None,
        ))
    }

    fn ticker_request(&self, market: &Market) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("markets/public/tickers?pairs={pairs}").param("pairs", market.id.as_str()))
    }

    fn parse_ticker_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        let first = list_at(data(raw), "data").first().unwrap_or(&Value::Null);
        self.parse_ticker(first, scope)
    }

    fn tickers_requests(&self, markets: &[&Market]) -> Result<Vec<ApiCall>, SdkError> {
        if markets.is_empty() {
            return Err(ExchangeError::arguments_required(self.id(), "fetchTickers", "symbols").into());
        }
        let pairs = markets.iter().map(|m| m.id.as_str()).collect::<Vec<_>>().join(",");
        Ok(vec![ApiCall::public_get("markets/public/tickers?pairs={pairs}").param("pairs", pairs)])
    }

    fn parse_tickers_response(&self, raw: &[Value], scope: MarketScope<'_>) -> Result<Vec<Ticker>, SdkError> {
        let mut tickers = Vec::new();
        for response in raw {
            tickers.extend(self.parse_tickers(list_at(data(response), "data"), scope)?);
        }
        Ok(tickers)
    }

    fn trades_request(&self, market: &Market, _since: Option<i64>, limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("trade/public/book/{pairs}")
            .param("pairs", market.id.as_str())
            .param_opt("limit", limit))
    }

    fn parse_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(data(raw), "data"), scope, None, None)
    }

    fn balance_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("private/getBalance"))
    }

    fn parse_balance_response(&self, raw: &Value) -> Result<Balance, SdkError> {
        let entries = list_at(data(raw), "data").iter().filter_map(|entry| {
            let code = self
                .descriptor
                .safe_currency_code(safe::safe_string(entry, "currency").as_deref())?;
            Some((
                code,
                safe::safe_number(entry, "balance"),
                safe::safe_number(entry, "lockBalance"),
            ))
        });
        Ok(Balance::from_accounts(entries, BalanceTrust::FreeUsed, raw.clone(), None))
    }

    fn create_order_request(&self, order: &OrderRequest, market: &Market) -> Result<ApiCall, SdkError> {
        let mode = self.descriptor.precision_mode;
        let trigger = order
            .param_str("triggerPrice")
            .or_else(|| order.param_str("stopPrice"))
            .map(crate::shared::precise::parse)
            .transpose()?;
        let mut params = order.params.clone();
        params.remove("triggerPrice");
        params.remove("stopPrice");

        let mut order_type = match order.order_type {
            OrderType::Limit => "Limit",
            OrderType::Market => "Market",
        };
        let mut call = ApiCall::private_post("order/private/create")
            .param("pair", market.id.as_str())
            .param("orderSide", if order.side == Side::Buy { "Bid" } else { "Ask" })
            .param("quantity", market.amount_to_precision(order.amount, mode)?.to_string());
        if order.order_type == OrderType::Limit {
            let price = order
                .price
                .ok_or_else(|| ExchangeError::arguments_required(self.id(), "createOrder", "price"))?;
            call = call.param("price", market.price_to_precision(price, mode)?.to_string());
        }
        if let Some(trigger) = trigger {
            if order.order_type == OrderType::Market {
                return Err(ExchangeError::new(
                    ErrorKind::BadRequest,
                    self.id(),
                    "createOrder() cannot place trigger market orders",
                )
                .into());
            }
            call = call.param("stopPrice", market.price_to_precision(trigger, mode)?.to_string());
            if params.get("type").and_then(Value::as_str) != Some("TakeProfitLimit") {
                order_type = "StopLossLimit";
            }
        }
        Ok(call.param("type", order_type).extend(&params))
    }

    fn parse_create_order_response(
        &self,
        raw: &Value,
        order: &OrderRequest,
        market: &Market,
    ) -> Result<Order, SdkError> {
        let markets = crate::domain::market::MarketIndex::default();
        let mut parsed = self.parse_order(data(raw), MarketScope::of(Some(market), &markets))?;
        parsed.side = parsed.side.or(Some(order.side));
        Ok(parsed)
    }

    fn cancel_order_request(&self, id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_post("order/private/cancel").param("orderId", id))
    }

    fn parse_cancel_order_response(&self, raw: &Value, id: &str, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let payload = data(raw);
        let mut order = self.parse_order(payload, scope)?;
        order.id = id.to_string();
        if safe::safe_bool(payload, "success") == Some(true) {
            order.status = Some(OrderStatus::Canceled);
        }
        Ok(order)
    }

    fn order_request(&self, id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("order/private/details/{id}")
            .param("id", id)
            .param("withTrades", true))
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
        let call = match filter {
            OrderFilter::Open => ApiCall::private_get("order/private/active"),
            OrderFilter::Closed => ApiCall::private_get("order/private/history").param("status", "Closed"),
            OrderFilter::All => ApiCall::private_get("order/private/history"),
        };
        Ok(call
            .param_opt("pairs", market.map(|m| m.id.as_str()))
            .param_opt("start", since.and_then(iso))
            .param_opt("limit", limit))
    }

    fn parse_orders_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Order>, SdkError> {
        self.parse_orders(list_at(data(raw), "data"), scope, None, None)
    }

    fn my_trades_request(
        &self,
        market: Option<&Market>,
        _since: Option<i64>,
        _limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("trade/private/history").param_opt("pair", market.map(|m| m.id.as_str())))
    }

    fn parse_my_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(data(raw), "data"), scope, None, None)
    }

    fn transactions_request(
        &self,
        kind: TransactionType,
        currency: Option<&Currency>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let call = match kind {
            TransactionType::Deposit => ApiCall::private_get("deposit/private/history"),
            TransactionType::Withdrawal => ApiCall::private_get("withdraw/private/history"),
        };
        Ok(call
            .param_opt("currency", currency.map(|c| c.code.as_str()))
            .param_opt("dateFrom", since.and_then(iso))
            .param_opt("take", limit))
    }

    fn parse_transactions_response(
        &self,
        raw: &Value,
        _kind: TransactionType,
        currency: Option<&Currency>,
    ) -> Result<Vec<Transaction>, SdkError> {
        self.parse_transactions(list_at(data(raw), "data"), currency, None, None)
    }

    fn deposit_address_request(&self, currency: &Currency, _network: Option<&str>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("deposit/private/crypto/address").param("source", currency.id.to_uppercase()))
    }

    fn parse_deposit_address_response(&self, raw: &Value, currency: &Currency) -> Result<DepositAddress, SdkError> {
        let payload = data(raw);
        Ok(DepositAddress {
            currency: self
                .descriptor
                .safe_currency_code(safe::safe_string(payload, "source").as_deref())
                .unwrap_or_else(|| currency.code.clone()),
            network: None,
            address: safe::safe_string(payload, "address").unwrap_or_default(),
            tag: None,
            info: payload.clone(),
        })
    }

    fn withdraw_request(&self, request: &WithdrawRequest, currency: &Currency) -> Result<ApiCall, SdkError> {
        let chain = match request.network.clone() {
            Some(network) => network,
            // Stablecoins exist on several chains and need an explicit one.
            None if currency.code.find("USD").is_some_and(|i| i > 0) => {
                return Err(ExchangeError::arguments_required(self.id(), "withdraw", "network").into());
            }
            None => currency.id.to_uppercase(),
        };
        let network_id = self.descriptor.options.network_code_to_id(&chain);
        Ok(ApiCall::private_post("withdraw/private/create")
            .param("currency", network_id)
            .param("amount", request.amount.to_string())
            .param("address", request.address.as_str())
            .param("paymentMethod", chain)
            .param_opt("paymentId", request.tag.as_deref())
            .extend(&request.params))
    }

    fn parse_withdraw_response(&self, raw: &Value, currency: &Currency) -> Result<Transaction, SdkError> {
        self.parse_transaction(data(raw), Some(currency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::Urls;
    use crate::domain::market::MarketIndex;
    use crate::sign::Credentials;
    use serde_json::json;
    use std::str::FromStr;

    fn btc_usdt() -> Market {
        Kuna::new()
            .parse_market(&json!({
                "pair": "BTC_USDT",
                "baseAsset": {"code": "BTC", "precision": 6},
                "quoteAsset": {"code": "USDT", "precision": 2},
            }))
            .unwrap()
    }

    #[test]
    fn test_private_get_signature_covers_path_and_empty_body() {
        let kuna = Kuna::new();
        let credentials = Credentials::new("pub", "secret");
        let urls = Urls::single(KUNA_API_URL);
        let ctx = SignContext { credentials: &credentials, nonce: 1700000000000, urls: &urls };
        let call = ApiCall::private_get("order/private/active").param("pairs", "BTC_USDT");
        let request = kuna.sign(&call, &ctx).unwrap();

        assert_eq!(request.url, "https://api.kuna.io/v4/order/private/active?pairs=BTC_USDT");
        let expected = sign::hmac_sha384_hex(
            "secret",
            "/v4/order/private/active?pairs=BTC_USDT1700000000000{}",
        )
        .unwrap();
        assert_eq!(request.header_value("signature"), Some(expected.as_str()));
        assert_eq!(request.header_value("public-key"), Some("pub"));
        assert_eq!(request.header_value("nonce"), Some("1700000000000"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_private_post_signs_json_body() {
        let kuna = Kuna::new();
        let credentials = Credentials::new("pub", "secret");
        let urls = Urls::single(KUNA_API_URL);
        let ctx = SignContext { credentials: &credentials, nonce: 42, urls: &urls };
        let call = ApiCall::private_post("order/private/cancel").param("orderId", "abc");
        let request = kuna.sign(&call, &ctx).unwrap();

        assert_eq!(request.body.as_deref(), Some(r#"{"orderId":"abc"}"#));
        let expected = sign::hmac_sha384_hex("secret", r#"/v4/order/private/cancel42{"orderId":"abc"}"#).unwrap();
        assert_eq!(request.header_value("signature"), Some(expected.as_str()));
    }

    #[test]
    fn test_templated_query_route() {
        let kuna = Kuna::new();
        let credentials = Credentials::default();
        let urls = Urls::single(KUNA_API_URL);
        let ctx = SignContext { credentials: &credentials, nonce: 0, urls: &urls };
        let call = kuna.ticker_request(&btc_usdt()).unwrap();
        let request = kuna.sign(&call, &ctx).unwrap();
        assert_eq!(request.url, "https://api.kuna.io/v4/markets/public/tickers?pairs=BTC_USDT");
        assert!(request.header_value("signature").is_none());
    }

    #[test]
    fn test_market_precision_from_digits() {
        let market = btc_usdt();
        assert_eq!(market.symbol, "BTC/USDT");
        assert_eq!(market.precision.amount, Some(Decimal::new(1, 6)));
        assert_eq!(market.precision.price, Some(Decimal::new(1, 2)));
        assert!(market.spot);
    }

    #[test]
    fn test_error_list_is_reported() {
        let kuna = Kuna::new();
        let body = json!({"errors": [{"code": "INSUFFICIENT_FUNDS", "message": "Not enough funds"}]});
        let report = kuna.inspect_response(200, &body).unwrap();
        assert_eq!(report.code.as_deref(), Some("INSUFFICIENT_FUNDS"));
        assert!(kuna.inspect_response(200, &json!({"data": []})).is_none());
        let legacy = kuna.inspect_response(400, &json!({"error": {"code": 2002}})).unwrap();
        assert_eq!(legacy.code.as_deref(), Some("2002"));
    }

    #[test]
    fn test_order_status_table_and_fallback() {
        let kuna = Kuna::new();
        assert_eq!(kuna.parse_order_status("Pending"), OrderStatus::Open);
        assert_eq!(kuna.parse_order_status("Closed"), OrderStatus::Closed);
        assert_eq!(kuna.parse_order_status("Frozen"), OrderStatus::Other("Frozen".into()));
    }

    #[test]
    fn test_stablecoin_withdraw_needs_network() {
        let kuna = Kuna::new();
        let usdt = Currency::placeholder("USDT");
        let request = WithdrawRequest::new("USDT", Decimal::from(10), "TXyz");
        let err = kuna.withdraw_request(&request, &usdt).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ArgumentsRequired));

        let call = kuna.withdraw_request(&request.with_network("TRC20"), &usdt).unwrap();
        assert_eq!(call.params.get("paymentMethod"), Some(&json!("TRC20")));
    }

    #[test]
    fn test_trigger_limit_becomes_stop_loss() {
        let kuna = Kuna::new();
        let market = btc_usdt();
        let order = OrderRequest::limit("BTC/USDT", Side::Sell, Decimal::new(123_4567, 7), Decimal::from(20000))
            .with_param("triggerPrice", json!("19500"));
        let call = kuna.create_order_request(&order, &market).unwrap();
        assert_eq!(call.params.get("type"), Some(&json!("StopLossLimit")));
        assert_eq!(call.params.get("stopPrice"), Some(&json!("19500")));
        assert_eq!(call.params.get("orderSide"), Some(&json!("Ask")));
        assert_eq!(call.params.get("quantity"), Some(&json!("0.123456")));
        assert!(!call.params.contains_key("triggerPrice"));

        let market_order = OrderRequest::market("BTC/USDT", Side::Buy, Decimal::ONE)
            .with_param("triggerPrice", json!("1"));
        let err = kuna.create_order_request(&market_order, &market).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::BadRequest));
    }

    #[test]
    fn test_balance_trusts_free_and_locked() {
        let kuna = Kuna::new();
        let raw = json!({"data": [{"currency": "UAH", "balance": "7134.6", "lockBalance": "100"}]});
        let balance = kuna.parse_balance_response(&raw).unwrap();
        assert_eq!(balance.total("UAH"), Some(Decimal::from_str("7234.6").unwrap()));
        assert_eq!(balance.used("UAH"), Some(Decimal::from(100)));
    }

    #[test]
    fn test_tickers_require_symbols() {
        let kuna = Kuna::new();
        let err = kuna.tickers_requests(&[]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ArgumentsRequired));
        let index = MarketIndex::new(vec![btc_usdt()]);
        let raw = json!({"data": [
            {"pair": "BTC_USDT", "bestBidPrice": "27926.91", "bestAskPrice": "27970.02"},
            {"pair": "XRP_UAH", "bestBidPrice": "1"}
        ]});
        let tickers = kuna.parse_tickers_response(&[raw], MarketScope::new(&index)).unwrap();
        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].symbol, "BTC/USDT");
    }
}
