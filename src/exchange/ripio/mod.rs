//! Ripio Trade (spot, Argentina and Brazil).
//!
//! Public and private routes live on different roots. Failures arrive as
//! HTTP 4xx/5xx with a `message`; the broad table is consulted before the
//! status code. Private calls sign `timestamp + method + /v4/<path> + body`
//! with HMAC-SHA256, base64-encoded, where `<path>` is the imploded path
//! without its trailing slash.

mod convert;

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::classify::ErrorReport;
use crate::describe::{
    Api, Capabilities, Descriptor, ExceptionTable, Fees, Options, RequiredCredentials, RouteTable,
    TradingFeeSchedule, Urls, Verb,
};
use crate::domain::balance::{Balance, BalanceTrust};
use crate::domain::currency::Currency;
use crate::domain::market::Market;
use crate::domain::order::{Order, OrderFilter, OrderRequest, OrderStatus, OrderType};
use crate::domain::orderbook::{parse_levels, OrderBook};
use crate::domain::ticker::Ticker;
use crate::domain::trade::Trade;
use crate::error::{ErrorKind, ExchangeError, SdkError};
use crate::exchange::{list_at, merged_descriptor, ExchangeAdapter, MarketScope};
use crate::network::RIPIO_API_URL;
use crate::shared::{safe, PrecisionMode};
use crate::sign::{self, ApiCall, HttpRequest, SignContext};

pub struct Ripio {
    descriptor: Descriptor,
}

impl Ripio {
    pub fn new() -> Self {
        Self {
            descriptor: describe(),
        }
    }
}

impl Default for Ripio {
    fn default() -> Self {
        Self::new()
    }
}

fn describe() -> Descriptor {
    let mut trading = TradingFeeSchedule::new(Decimal::ZERO, Decimal::ZERO);
    trading.tier_based = true;
    Descriptor {
        id: "ripio",
        name: "Ripio",
        countries: vec!["AR", "BR"],
        version: "v4",
        rate_limit: 50,
        urls: Urls {
            public: format!("{}/public", RIPIO_API_URL),
            private: RIPIO_API_URL.to_string(),
        },
        has: Capabilities::new().supported(&[
            "fetchMarkets",
            "fetchCurrencies",
            "fetchOrderBook",
            "fetchTicker",
            "fetchTickers",
            "fetchTrades",
            "fetchBalance",
            "createOrder",
            "cancelOrder",
            "fetchOrder",
            "fetchOrders",
            "fetchOpenOrders",
            "fetchClosedOrders",
            "fetchMyTrades",
        ]),
        timeframes: BTreeMap::new(),
        routes: RouteTable::new()
            .routes(
                Api::Public,
                Verb::Get,
                &[
                    ("tickers/", 1),
                    ("tickers/{pair}/", 1),
                    ("orders/level-3/", 1),
                    ("orders/level-2/", 1),
                    ("trades/", 1),
                    ("currencies/", 1),
                    ("pairs/", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Get,
                &[
                    ("book/summaries/", 1),
                    ("book/estimate-price/{pair}/", 1),
                    ("book/orders/level-3/", 1),
                    ("book/orders/level-2/", 1),
                    ("user/balances/", 1),
                    ("user/fees-and-limits/", 1),
                    ("user/statement/", 1),
                    ("user/statement/{currency_code}/", 1),
                    ("user/trades/", 1),
                    ("orders/", 1),
                    ("orders/open/", 1),
                    ("orders/{id}/", 1),
                    ("orders/by-external-id/{external_id}/", 1),
                    ("deposits/", 1),
                    ("withdrawals/", 1),
                    ("withdrawals/estimate-fee/{currency_code}/", 1),
                    ("wallets/is-internal/", 1),
                    ("wallets/balance/", 1),
                    ("wallets/balance/{date}/", 1),
                ],
            )
            .routes(
                Api::Private,
                Verb::Post,
                &[("orders/", 1), ("withdrawals/", 1), ("transactions/sync/", 1), ("ticket/", 1)],
            )
            .routes(
                Api::Private,
                Verb::Delete,
                &[("orders/", 1), ("orders/by-external-id/", 1), ("orders/all/", 1)],
            ),
        fees: Fees {
            trading,
            per_type: BTreeMap::new(),
        },
        precision_mode: PrecisionMode::TickSize,
        exceptions: ExceptionTable::new()
            .exact(&[
                ("400", ErrorKind::InvalidOrder),
                ("401", ErrorKind::AuthenticationError),
                ("402", ErrorKind::AuthenticationError),
                ("403", ErrorKind::AuthenticationError),
                ("404", ErrorKind::BadRequest),
                ("405", ErrorKind::ExchangeError),
                ("429", ErrorKind::RateLimitExceeded),
                ("500", ErrorKind::ExchangeError),
                ("502", ErrorKind::ExchangeNotAvailable),
                ("503", ErrorKind::ExchangeNotAvailable),
            ])
            .broad(&[
                (
                    "You did another transaction with the same amount in an interval lower than 10 (ten) minutes, it is not allowed in order to prevent mistakes. Try again in a few minutes",
                    ErrorKind::ExchangeError,
                ),
                ("Invalid order quantity", ErrorKind::InvalidOrder),
                ("Funds insufficient", ErrorKind::InsufficientFunds),
                ("Order already canceled", ErrorKind::InvalidOrder),
                ("Order already completely executed", ErrorKind::InvalidOrder),
                ("No orders to cancel", ErrorKind::OrderNotFound),
                ("Minimum value not reached", ErrorKind::ExchangeError),
                ("Limit exceeded", ErrorKind::RateLimitExceeded),
                ("Too many requests", ErrorKind::RateLimitExceeded),
            ]),
        required_credentials: RequiredCredentials {
            api_key: true,
            secret: true,
            password: false,
        },
        common_currencies: BTreeMap::new(),
        options: Options::new(),
    }
}

// `pending_creation` is left to pass through.
const ORDER_STATUSES: [(&str, OrderStatus); 4] = [
    ("executed_completely", OrderStatus::Closed),
    ("executed_partially", OrderStatus::Open),
    ("waiting", OrderStatus::Open),
    ("canceled", OrderStatus::Canceled),
];

const CLOSED_STATUSES: [&str; 2] = ["executed_completely", "canceled"];

fn data(raw: &Value) -> &Value {
    safe::safe_value(raw, "data").unwrap_or(&Value::Null)
}

impl ExchangeAdapter for Ripio {
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
        let mut request = HttpRequest::new(call.verb, url);
        if !call.is_private() {
            return Ok(request);
        }

        let timestamp = ctx.nonce.to_string();
        let body = prepared.body.clone().unwrap_or_default();
        let message = format!(
            "{}{}/{}/{}{}",
            timestamp,
            call.verb,
            self.descriptor.version,
            prepared.path.trim_end_matches('/'),
            body
        );
        let signature = sign::hmac_sha256_base64(ctx.credentials.secret(), &message)?;
        request = request
            .header("Content-Type", "application/json")
            .header("Authorization", ctx.credentials.api_key())
            .header("timestamp", timestamp)
            .header("signature", signature);
        if call.verb != Verb::Get {
            request = request.with_body(prepared.body);
        }
        Ok(request)
    }

    /// Only 400..=503 responses are failures; the status doubles as the code.
    fn inspect_response(&self, status: u16, body: &Value) -> Option<ErrorReport> {
        if !(400..=503).contains(&status) {
            return None;
        }
        Some(ErrorReport::new(
            status,
            Some(status.to_string()),
            safe::safe_string(body, "message"),
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
        Ok(convert::trade(raw, scope))
    }

    fn parse_order_status(&self, native: &str) -> OrderStatus {
        OrderStatus::from_table(native, &ORDER_STATUSES)
    }

    fn parse_order(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let status = safe::safe_string(raw, "status").map(|s| self.parse_order_status(&s));
        Ok(convert::order(raw, scope, status))
    }

    // ── Operations ──────────────────────────────────────────────────────

    fn markets_requests(&self) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("pairs/")])
    }

    fn parse_markets_response(&self, raw: &[Value]) -> Result<Vec<Market>, SdkError> {
        let mut markets = Vec::new();
        for response in raw {
            markets.extend(self.parse_markets(list_at(response, "data"))?);
        }
        Ok(markets)
    }

    fn currencies_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("currencies/"))
    }

    fn parse_currencies_response(&self, raw: &Value) -> Result<Vec<Currency>, SdkError> {
        self.parse_currencies(list_at(raw, "data"))
    }

    fn order_book_request(&self, market: &Market, _limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("orders/level-2/").param("pair", market.id.as_str()))
    }

    fn parse_order_book_response(&self, raw: &Value, market: &Market) -> Result<OrderBook, SdkError> {
        let book = data(raw);
        Ok(OrderBook::from_levels(
            &market.symbol,
            parse_levels(safe::safe_list(book, "bids"), "price", "amount"),
            parse_levels(safe::safe_list(book, "asks"), "price", "amount"),
            safe::safe_integer(book, "timestamp").or_else(|| safe::safe_integer(raw, "timestamp")),
            None,
        ))
    }

    fn ticker_request(&self, market: &Market) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("tickers/{pair}/").param("pair", market.id.as_str()))
    }

    fn parse_ticker_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        self.parse_ticker(data(raw), scope)
    }

    fn tickers_requests(&self, _markets: &[&Market]) -> Result<Vec<ApiCall>, SdkError> {
        Ok(vec![ApiCall::public_get("tickers/")])
    }

    fn parse_tickers_response(&self, raw: &[Value], scope: MarketScope<'_>) -> Result<Vec<Ticker>, SdkError> {
        let mut tickers = Vec::new();
        for response in raw {
            tickers.extend(self.parse_tickers(list_at(response, "data"), scope)?);
        }
        Ok(tickers)
    }

    fn trades_request(&self, market: &Market, _since: Option<i64>, _limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::public_get("trades/").param("pair", market.id.as_str()))
    }

    fn parse_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(data(raw), "trades"), scope, None, None)
    }

    fn balance_request(&self) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("user/balances/"))
    }

    fn parse_balance_response(&self, raw: &Value) -> Result<Balance, SdkError> {
        let accounts = list_at(raw, "data").iter().filter_map(|entry| {
            let code = self
                .descriptor
                .safe_currency_code(safe::safe_string(entry, "currency_code").as_deref())?;
            Some((
                code,
                safe::safe_number(entry, "available_amount"),
                safe::safe_number(entry, "locked_amount"),
            ))
        });
        Ok(Balance::from_accounts(accounts, BalanceTrust::FreeUsed, raw.clone(), None))
    }

    fn create_order_request(&self, order: &OrderRequest, market: &Market) -> Result<ApiCall, SdkError> {
        let mode = self.descriptor.precision_mode;
        let mut call = ApiCall::private_post("orders/")
            .param("pair", market.id.as_str())
            .param("type", order.order_type.as_str())
            .param("side", order.side.as_str())
            .param("amount", market.amount_to_precision(order.amount, mode)?.to_string())
            .param_opt("external_id", order.client_order_id.as_deref());
        if order.order_type == OrderType::Limit {
            let price = order
                .price
                .ok_or_else(|| ExchangeError::arguments_required(self.id(), "createOrder", "price"))?;
            call = call.param("price", market.price_to_precision(price, mode)?.to_string());
        }
        Ok(call.extend(&order.params))
    }

    /// The exchange answers with the new id only.
    fn parse_create_order_response(
        &self,
        raw: &Value,
        order: &OrderRequest,
        market: &Market,
    ) -> Result<Order, SdkError> {
        let id = safe::safe_string(data(raw), "id").ok_or_else(|| {
            ExchangeError::new(ErrorKind::ExchangeError, self.id(), "createOrder() response carries no order id")
        })?;
        Ok(Order {
            id,
            client_order_id: order.client_order_id.clone(),
            symbol: market.symbol.clone(),
            order_type: Some(order.order_type.as_str().to_string()),
            side: Some(order.side),
            price: order.price,
            amount: Some(order.amount),
            info: raw.clone(),
            ..Default::default()
        }
        .complete())
    }

    fn cancel_order_request(&self, id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_delete("orders/").param("id", id))
    }

    fn parse_cancel_order_response(&self, raw: &Value, id: &str, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        let mut order = self.parse_order(data(raw), scope)?;
        if order.id.is_empty() {
            order.id = id.to_string();
        }
        Ok(order)
    }

    fn order_request(&self, id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("orders/{id}/").param("id", id))
    }

    fn parse_order_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Order, SdkError> {
        self.parse_order(data(raw), scope)
    }

    /// Open orders may span every pair; the full history needs one.
    fn orders_request(
        &self,
        filter: OrderFilter,
        market: Option<&Market>,
        _since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        let call = match (filter, market) {
            (OrderFilter::Open, market) => ApiCall::private_get("orders/open/")
                .param_opt("pair", market.map(|m| m.id.as_str())),
            (OrderFilter::Closed, Some(market)) => ApiCall::private_get("orders/")
                .param("pair", market.id.as_str())
                .param("status", CLOSED_STATUSES.to_vec()),
            (OrderFilter::All, Some(market)) => ApiCall::private_get("orders/").param("pair", market.id.as_str()),
            (OrderFilter::Closed, None) => {
                return Err(ExchangeError::arguments_required(self.id(), "fetchClosedOrders", "symbol").into())
            }
            (OrderFilter::All, None) => {
                return Err(ExchangeError::arguments_required(self.id(), "fetchOrders", "symbol").into())
            }
        };
        Ok(call.param_opt("page_size", limit))
    }

    fn parse_orders_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Order>, SdkError> {
        self.parse_orders(list_at(data(raw), "orders"), scope, None, None)
    }

    fn my_trades_request(
        &self,
        market: Option<&Market>,
        _since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Ok(ApiCall::private_get("user/trades/")
            .param_opt("pair", market.map(|m| m.id.as_str()))
            .param_opt("page_size", limit))
    }

    fn parse_my_trades_response(&self, raw: &Value, scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        self.parse_trades(list_at(data(raw), "trades"), scope, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::shared::Side;
    use crate::sign::Credentials;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn btc_brl() -> Market {
        Ripio::new()
            .parse_market(&json!({
                "base": "BTC",
                "quote": "BRL",
                "symbol": "BTC_BRL",
                "amount_tick": "0.0001",
                "price_tick": "1",
                "min_amount": "0.0005",
                "min_value": "10",
                "enabled": true
            }))
            .unwrap()
    }

    fn ctx<'a>(credentials: &'a Credentials, urls: &'a Urls) -> SignContext<'a> {
        SignContext { credentials, nonce: 1700000000000, urls }
    }

    #[test]
    fn test_public_call_uses_public_root() {
        let ripio = Ripio::new();
        let credentials = Credentials::default();
        let urls = ripio.descriptor().urls.clone();
        let call = ripio.ticker_request(&btc_brl()).unwrap();
        let request = ripio.sign(&call, &ctx(&credentials, &urls)).unwrap();
        assert_eq!(request.url, "https://api.ripiotrade.co/v4/public/tickers/BTC_BRL/");
        assert!(request.header_value("signature").is_none());
    }

    #[test]
    fn test_private_get_signs_imploded_path() {
        let ripio = Ripio::new();
        let credentials = Credentials::new("key", "secret");
        let urls = ripio.descriptor().urls.clone();
        let call = ripio.order_request("ABC", None).unwrap();
        let request = ripio.sign(&call, &ctx(&credentials, &urls)).unwrap();

        assert_eq!(request.url, "https://api.ripiotrade.co/v4/orders/ABC/");
        let expected = sign::hmac_sha256_base64("secret", "1700000000000GET/v4/orders/ABC").unwrap();
        assert_eq!(request.header_value("signature"), Some(expected.as_str()));
        assert_eq!(request.header_value("Authorization"), Some("key"));
        assert_eq!(request.header_value("timestamp"), Some("1700000000000"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_delete_signs_json_body() {
        let ripio = Ripio::new();
        let credentials = Credentials::new("key", "secret");
        let urls = ripio.descriptor().urls.clone();
        let call = ripio.cancel_order_request("ABC", None).unwrap();
        let request = ripio.sign(&call, &ctx(&credentials, &urls)).unwrap();

        assert_eq!(request.body.as_deref(), Some(r#"{"id":"ABC"}"#));
        let expected = sign::hmac_sha256_base64("secret", r#"1700000000000DELETE/v4/orders{"id":"ABC"}"#).unwrap();
        assert_eq!(request.header_value("signature"), Some(expected.as_str()));
    }

    #[test]
    fn test_broad_message_beats_status() {
        let ripio = Ripio::new();
        let body = json!({"message": "Funds insufficient for this operation"});
        let report = ripio.inspect_response(400, &body).unwrap();
        let err = classify(ripio.descriptor(), None, &report, "url", "body");
        assert_eq!(err.kind, ErrorKind::InsufficientFunds);

        let report = ripio.inspect_response(400, &json!({"message": "something else"})).unwrap();
        let err = classify(ripio.descriptor(), None, &report, "url", "body");
        assert_eq!(err.kind, ErrorKind::InvalidOrder);

        assert!(ripio.inspect_response(200, &json!({"data": []})).is_none());
        assert!(ripio.inspect_response(504, &json!({})).is_none());
    }

    #[test]
    fn test_order_book_levels_are_objects() {
        let ripio = Ripio::new();
        let raw = json!({"data": {
            "timestamp": 1675708481219i64,
            "asks": [{"amount": "0.5", "price": "101"}],
            "bids": [{"amount": "1", "price": "99"}, {"amount": "2", "price": "98"}]
        }});
        let book = ripio.parse_order_book_response(&raw, &btc_brl()).unwrap();
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.best_ask(), Some((dec("101"), dec("0.5"))));
        assert_eq!(book.timestamp, Some(1675708481219));
    }

    #[test]
    fn test_balance_trusts_available_and_locked() {
        let ripio = Ripio::new();
        let raw = json!({"data": [
            {"currency_code": "BRL", "available_amount": 100, "locked_amount": 25.5}
        ]});
        let balance = ripio.parse_balance_response(&raw).unwrap();
        assert_eq!(balance.total("BRL"), Some(dec("125.5")));
    }

    #[test]
    fn test_limit_order_and_id_only_response() {
        let ripio = Ripio::new();
        let market = btc_brl();
        let order = OrderRequest::limit("BTC/BRL", Side::Buy, dec("0.12345"), dec("100000.7"));
        let call = ripio.create_order_request(&order, &market).unwrap();
        assert_eq!(call.params.get("amount"), Some(&json!("0.1234")));
        assert_eq!(call.params.get("price"), Some(&json!("100000")));
        assert_eq!(call.params.get("type"), Some(&json!("limit")));

        let parsed = ripio
            .parse_create_order_response(&json!({"data": {"id": "XYZ"}}), &order, &market)
            .unwrap();
        assert_eq!(parsed.id, "XYZ");
        assert_eq!(parsed.symbol, "BTC/BRL");
        assert_eq!(parsed.amount, Some(dec("0.12345")));
    }

    #[test]
    fn test_closed_orders_need_symbol_and_filter_status() {
        let ripio = Ripio::new();
        let err = ripio.orders_request(OrderFilter::Closed, None, None, None).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ArgumentsRequired));

        let market = btc_brl();
        let call = ripio.orders_request(OrderFilter::Closed, Some(&market), None, Some(10)).unwrap();
        assert_eq!(call.params.get("status"), Some(&json!(["executed_completely", "canceled"])));
        assert_eq!(call.params.get("page_size"), Some(&json!(10)));

        let open = ripio.orders_request(OrderFilter::Open, None, None, None).unwrap();
        assert_eq!(open.path, "orders/open/");
    }

    #[test]
    fn test_order_status_vocabulary() {
        let ripio = Ripio::new();
        assert_eq!(ripio.parse_order_status("executed_completely"), OrderStatus::Closed);
        assert_eq!(ripio.parse_order_status("executed_partially"), OrderStatus::Open);
        assert_eq!(
            ripio.parse_order_status("pending_creation"),
            OrderStatus::Other("pending_creation".to_string())
        );
    }
}
