//! High-level client: `Exchange<A>` drives one adapter end to end.
//!
//! Every operation follows the same pipeline: check the capability map,
//! resolve markets and currencies through the TTL caches, build the call
//! with the adapter, sign it, hand it to the [`Transport`], classify
//! failures and parse the payload. Composite operations issue their
//! sub-requests concurrently and fail as a whole.

use async_lock::RwLock;
use futures_util::future::try_join_all;
use futures_util::Stream;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::classify::{classify, ErrorReport};
use crate::describe::{Descriptor, Has, Options, Urls};
use crate::domain::address::{DepositAddress, WithdrawRequest};
use crate::domain::balance::Balance;
use crate::domain::currency::Currency;
use crate::domain::fee::TradingFee;
use crate::domain::ledger::LedgerEntry;
use crate::domain::market::{Market, MarketIndex};
use crate::domain::ohlcv::Ohlcv;
use crate::domain::order::{Order, OrderFilter, OrderRequest};
use crate::domain::orderbook::OrderBook;
use crate::domain::position::Position;
use crate::domain::ticker::Ticker;
use crate::domain::trade::Trade;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::domain::{filter_by_since_limit, Timestamped};
use crate::error::{ErrorKind, ExchangeError, SdkError};
use crate::exchange::{ExchangeAdapter, MarketScope};
use crate::http::retry::RetryPolicy;
use crate::http::transport::Transport;
use crate::shared::time::{Clock, SystemClock};
use crate::shared::Timeframe;
use crate::sign::{ApiCall, Credentials, NonceSource, SignContext};

type Cached<T> = Arc<RwLock<Option<(Arc<T>, Instant)>>>;

/// Currencies keyed by unified code.
pub type CurrencyMap = BTreeMap<String, Currency>;

/// A unified client over one exchange adapter.
pub struct Exchange<A> {
    adapter: Arc<A>,
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
    nonce: Arc<NonceSource>,
    clock: Arc<dyn Clock>,
    urls: Urls,
    markets: Cached<MarketIndex>,
    currencies: Cached<CurrencyMap>,
    cache_ttl: Duration,
}

impl<A> Clone for Exchange<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            transport: self.transport.clone(),
            credentials: self.credentials.clone(),
            nonce: self.nonce.clone(),
            clock: self.clock.clone(),
            urls: self.urls.clone(),
            markets: self.markets.clone(),
            currencies: self.currencies.clone(),
            cache_ttl: self.cache_ttl,
        }
    }
}

impl<A: ExchangeAdapter> Exchange<A> {
    pub fn builder(adapter: A) -> ExchangeBuilder<A> {
        ExchangeBuilder::new(adapter)
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn descriptor(&self) -> &Descriptor {
        self.adapter.descriptor()
    }

    pub fn id(&self) -> &'static str {
        self.adapter.id()
    }

    pub fn has(&self, operation: &str) -> Has {
        self.descriptor().has(operation)
    }

    /// A client whose adapter runs with `options` merged over its own. The
    /// transport, credentials and caches are shared.
    pub fn with_options(&self, options: &Options) -> Self {
        Self {
            adapter: Arc::new(self.adapter.with_options(options)),
            ..self.clone()
        }
    }

    fn require(&self, operation: &str) -> Result<Has, SdkError> {
        match self.has(operation) {
            Has::Unsupported => Err(self.adapter.unsupported(operation)),
            has => Ok(has),
        }
    }

    // ── Request pipeline ────────────────────────────────────────────────

    /// Sign, send and decode one call. Failures come back classified.
    pub async fn request(&self, call: ApiCall) -> Result<Value, SdkError> {
        let descriptor = self.adapter.descriptor();
        if call.is_private() {
            self.credentials.require(&descriptor.required_credentials, descriptor.id)?;
        }
        let ctx = SignContext {
            credentials: &self.credentials,
            nonce: self.nonce.next(self.clock.as_ref()),
            urls: &self.urls,
        };
        let request = self.adapter.sign(&call, &ctx)?;
        tracing::debug!(
            exchange = descriptor.id,
            method = %call.verb,
            path = call.path,
            cost = descriptor.routes.cost(call.api, call.verb, call.path),
            "request"
        );

        let response = self.transport.execute(&request).await?;
        let body = match serde_json::from_str::<Value>(&response.body) {
            Ok(body) => body,
            Err(_) if !response.is_success() || response.body.trim().is_empty() => Value::Null,
            Err(e) => return Err(e.into()),
        };
        let report = self
            .adapter
            .inspect_response(response.status, &body)
            .or_else(|| (!response.is_success()).then(|| ErrorReport::new(response.status, None, None)));
        if let Some(report) = report {
            let precheck = self.adapter.precheck(&call, response.status);
            return Err(classify(descriptor, precheck, &report, &request.url, &response.body).into());
        }
        Ok(body)
    }

    async fn request_all(&self, calls: Vec<ApiCall>) -> Result<Vec<Value>, SdkError> {
        try_join_all(calls.into_iter().map(|call| self.request(call))).await
    }

    // ── Markets and currencies ──────────────────────────────────────────

    /// Fetch the market list, bypassing the cache.
    pub async fn fetch_markets(&self) -> Result<Vec<Market>, SdkError> {
        self.require("fetchMarkets")?;
        let responses = self.request_all(self.adapter.markets_requests()?).await?;
        self.adapter.parse_markets_response(&responses)
    }

    /// The market index, fetched once per cache lifetime.
    pub async fn load_markets(&self, reload: bool) -> Result<Arc<MarketIndex>, SdkError> {
        if !reload {
            if let Some((index, fetched_at)) = self.markets.read().await.as_ref() {
                if fetched_at.elapsed() < self.cache_ttl {
                    tracing::trace!(exchange = self.id(), "markets cache hit");
                    return Ok(index.clone());
                }
            }
        }
        let index = Arc::new(MarketIndex::new(self.fetch_markets().await?));
        *self.markets.write().await = Some((index.clone(), Instant::now()));
        Ok(index)
    }

    /// Market by unified symbol or exchange id.
    pub async fn market(&self, symbol_or_id: &str) -> Result<Market, SdkError> {
        let index = self.load_markets(false).await?;
        index
            .resolve(symbol_or_id)
            .cloned()
            .ok_or_else(|| ExchangeError::bad_symbol(self.id(), symbol_or_id).into())
    }

    async fn market_opt(&self, symbol: Option<&str>) -> Result<Option<Market>, SdkError> {
        match symbol {
            Some(symbol) => Ok(Some(self.market(symbol).await?)),
            None => Ok(None),
        }
    }

    pub async fn fetch_currencies(&self) -> Result<Vec<Currency>, SdkError> {
        self.require("fetchCurrencies")?;
        let raw = self.request(self.adapter.currencies_request()?).await?;
        self.adapter.parse_currencies_response(&raw)
    }

    async fn load_currencies(&self) -> Result<Arc<CurrencyMap>, SdkError> {
        if let Some((map, fetched_at)) = self.currencies.read().await.as_ref() {
            if fetched_at.elapsed() < self.cache_ttl {
                tracing::trace!(exchange = self.id(), "currencies cache hit");
                return Ok(map.clone());
            }
        }
        let map: CurrencyMap = self
            .fetch_currencies()
            .await?
            .into_iter()
            .map(|currency| (currency.code.clone(), currency))
            .collect();
        let map = Arc::new(map);
        *self.currencies.write().await = Some((map.clone(), Instant::now()));
        Ok(map)
    }

    /// Currency by unified code. Exchanges without a currency listing get a
    /// placeholder carrying the code.
    pub async fn currency(&self, code: &str) -> Result<Currency, SdkError> {
        if !self.has("fetchCurrencies").is_available() {
            return Ok(Currency::placeholder(code));
        }
        let map = self.load_currencies().await?;
        map.get(code).cloned().ok_or_else(|| {
            ExchangeError::new(ErrorKind::BadSymbol, self.id(), format!("does not have currency code {}", code)).into()
        })
    }

    async fn currency_opt(&self, code: Option<&str>) -> Result<Option<Currency>, SdkError> {
        match code {
            Some(code) => Ok(Some(self.currency(code).await?)),
            None => Ok(None),
        }
    }

    /// Drop cached markets and currencies.
    pub async fn clear_caches(&self) {
        *self.markets.write().await = None;
        *self.currencies.write().await = None;
    }

    // ── Market data ─────────────────────────────────────────────────────

    pub async fn fetch_time(&self) -> Result<i64, SdkError> {
        self.require("fetchTime")?;
        let raw = self.request(self.adapter.time_request()?).await?;
        self.adapter.parse_time_response(&raw)
    }

    pub async fn fetch_order_book(&self, symbol: &str, limit: Option<usize>) -> Result<OrderBook, SdkError> {
        self.require("fetchOrderBook")?;
        let market = self.market(symbol).await?;
        let raw = self.request(self.adapter.order_book_request(&market, limit)?).await?;
        Ok(self.adapter.parse_order_book_response(&raw, &market)?.truncate(limit))
    }

    pub async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, SdkError> {
        self.require("fetchTicker")?;
        let index = self.load_markets(false).await?;
        let market = self.market(symbol).await?;
        let raw = self.request(self.adapter.ticker_request(&market)?).await?;
        self.adapter
            .parse_ticker_response(&raw, MarketScope::of(Some(&market), &index))
    }

    /// Tickers for `symbols`, or for every market the exchange reports.
    pub async fn fetch_tickers(&self, symbols: Option<&[&str]>) -> Result<Vec<Ticker>, SdkError> {
        self.require("fetchTickers")?;
        let index = self.load_markets(false).await?;
        let requested = match symbols {
            Some(symbols) => {
                let mut markets = Vec::with_capacity(symbols.len());
                for symbol in symbols {
                    markets.push(self.market(symbol).await?);
                }
                markets
            }
            None => Vec::new(),
        };
        let refs: Vec<&Market> = requested.iter().collect();
        let responses = self.request_all(self.adapter.tickers_requests(&refs)?).await?;
        let tickers = self.adapter.parse_tickers_response(&responses, MarketScope::new(&index))?;
        Ok(match symbols {
            Some(_) => tickers
                .into_iter()
                .filter(|t| requested.iter().any(|m| m.symbol == t.symbol))
                .collect(),
            None => tickers,
        })
    }

    pub async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>, SdkError> {
        self.require("fetchTrades")?;
        let index = self.load_markets(false).await?;
        let market = self.market(symbol).await?;
        let raw = self.request(self.adapter.trades_request(&market, since, limit)?).await?;
        let trades = self
            .adapter
            .parse_trades_response(&raw, MarketScope::of(Some(&market), &index))?;
        Ok(filter_by_since_limit(trades, since, limit))
    }

    /// Candles from the exchange, or bucketed from public trades where the
    /// exchange has no candle endpoint.
    pub async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Ohlcv>, SdkError> {
        let candles = match self.require("fetchOHLCV")? {
            Has::Emulated => {
                let trades = self.fetch_trades(symbol, since, None).await?;
                Ohlcv::build_from_trades(&trades, timeframe)
            }
            _ => {
                let market = self.market(symbol).await?;
                let call = self.adapter.ohlcv_request(&market, timeframe, since, limit)?;
                let raw = self.request(call).await?;
                self.adapter.parse_ohlcv_response(&raw, &market)?
            }
        };
        Ok(filter_by_since_limit(candles, since, limit))
    }

    // ── Account ─────────────────────────────────────────────────────────

    pub async fn fetch_balance(&self) -> Result<Balance, SdkError> {
        self.require("fetchBalance")?;
        let raw = self.request(self.adapter.balance_request()?).await?;
        self.adapter.parse_balance_response(&raw)
    }

    /// Maker/taker rates per market. Exchanges with static fees answer
    /// without a request.
    pub async fn fetch_trading_fees(&self) -> Result<Vec<TradingFee>, SdkError> {
        self.require("fetchTradingFees")?;
        let index = self.load_markets(false).await?;
        let raw = match self.adapter.trading_fees_request()? {
            Some(call) => Some(self.request(call).await?),
            None => None,
        };
        self.adapter.parse_trading_fees_response(raw.as_ref(), &index)
    }

    pub async fn fetch_positions(&self, symbols: Option<&[&str]>) -> Result<Vec<Position>, SdkError> {
        self.require("fetchPositions")?;
        let index = self.load_markets(false).await?;
        let mut requested = Vec::new();
        for symbol in symbols.unwrap_or_default() {
            requested.push(self.market(symbol).await?);
        }
        let refs: Vec<&Market> = requested.iter().collect();
        let raw = self.request(self.adapter.positions_request(&refs)?).await?;
        let positions = self.adapter.parse_positions_response(&raw, MarketScope::new(&index))?;
        Ok(match symbols {
            Some(_) => positions
                .into_iter()
                .filter(|p| requested.iter().any(|m| m.symbol == p.symbol))
                .collect(),
            None => positions,
        })
    }

    // ── Trading ─────────────────────────────────────────────────────────

    pub async fn create_order(&self, order: &OrderRequest) -> Result<Order, SdkError> {
        self.require("createOrder")?;
        let market = self.market(&order.symbol).await?;
        let raw = self.request(self.adapter.create_order_request(order, &market)?).await?;
        self.adapter.parse_create_order_response(&raw, order, &market)
    }

    pub async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, SdkError> {
        self.require("cancelOrder")?;
        let index = self.load_markets(false).await?;
        let market = self.market_opt(symbol).await?;
        let raw = self.request(self.adapter.cancel_order_request(id, market.as_ref())?).await?;
        self.adapter
            .parse_cancel_order_response(&raw, id, MarketScope::of(market.as_ref(), &index))
    }

    pub async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, SdkError> {
        self.require("fetchOrder")?;
        let index = self.load_markets(false).await?;
        let market = self.market_opt(symbol).await?;
        let raw = self.request(self.adapter.order_request(id, market.as_ref())?).await?;
        self.adapter
            .parse_order_response(&raw, MarketScope::of(market.as_ref(), &index))
    }

    async fn fetch_filtered_orders(
        &self,
        operation: &str,
        filter: OrderFilter,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, SdkError> {
        self.require(operation)?;
        let index = self.load_markets(false).await?;
        let market = self.market_opt(symbol).await?;
        let call = self.adapter.orders_request(filter, market.as_ref(), since, limit)?;
        let raw = self.request(call).await?;
        let orders = self
            .adapter
            .parse_orders_response(&raw, MarketScope::of(market.as_ref(), &index))?;
        Ok(filter_by_since_limit(orders, since, limit))
    }

    pub async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, SdkError> {
        self.fetch_filtered_orders("fetchOrders", OrderFilter::All, symbol, since, limit)
            .await
    }

    pub async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, SdkError> {
        self.fetch_filtered_orders("fetchOpenOrders", OrderFilter::Open, symbol, since, limit)
            .await
    }

    pub async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, SdkError> {
        self.fetch_filtered_orders("fetchClosedOrders", OrderFilter::Closed, symbol, since, limit)
            .await
    }

    pub async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>, SdkError> {
        self.require("fetchMyTrades")?;
        let index = self.load_markets(false).await?;
        let market = self.market_opt(symbol).await?;
        let raw = self
            .request(self.adapter.my_trades_request(market.as_ref(), since, limit)?)
            .await?;
        let trades = self
            .adapter
            .parse_my_trades_response(&raw, MarketScope::of(market.as_ref(), &index))?;
        Ok(filter_by_since_limit(trades, since, limit))
    }

    // ── Funding ─────────────────────────────────────────────────────────

    async fn fetch_transactions(
        &self,
        kind: TransactionType,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, SdkError> {
        self.require(match kind {
            TransactionType::Deposit => "fetchDeposits",
            TransactionType::Withdrawal => "fetchWithdrawals",
        })?;
        let currency = self.currency_opt(code).await?;
        let call = self.adapter.transactions_request(kind, currency.as_ref(), since, limit)?;
        let raw = self.request(call).await?;
        let transactions = self
            .adapter
            .parse_transactions_response(&raw, kind, currency.as_ref())?;
        Ok(filter_by_since_limit(transactions, since, limit))
    }

    pub async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, SdkError> {
        self.fetch_transactions(TransactionType::Deposit, code, since, limit)
            .await
    }

    pub async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, SdkError> {
        self.fetch_transactions(TransactionType::Withdrawal, code, since, limit)
            .await
    }

    pub async fn fetch_ledger(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<LedgerEntry>, SdkError> {
        self.require("fetchLedger")?;
        let currency = self.currency_opt(code).await?;
        let raw = self
            .request(self.adapter.ledger_request(currency.as_ref(), since, limit)?)
            .await?;
        let entries = self.adapter.parse_ledger_response(&raw, currency.as_ref())?;
        Ok(filter_by_since_limit(entries, since, limit))
    }

    pub async fn fetch_deposit_address(&self, code: &str, network: Option<&str>) -> Result<DepositAddress, SdkError> {
        self.require("fetchDepositAddress")?;
        let currency = self.currency(code).await?;
        let raw = self
            .request(self.adapter.deposit_address_request(&currency, network)?)
            .await?;
        self.adapter.parse_deposit_address_response(&raw, &currency)
    }

    /// Submit a withdrawal, running the confirmation call when the exchange
    /// needs one.
    pub async fn withdraw(&self, request: &WithdrawRequest) -> Result<Transaction, SdkError> {
        self.require("withdraw")?;
        let currency = self.currency(&request.code).await?;
        let raw = self.request(self.adapter.withdraw_request(request, &currency)?).await?;
        let raw = match self.adapter.withdraw_followup(&raw, request)? {
            Some(confirm) => self.request(confirm).await?,
            None => raw,
        };
        self.adapter.parse_withdraw_response(&raw, &currency)
    }

    // ── Pagination ──────────────────────────────────────────────────────

    /// Public trades from `since` onwards, one page per poll.
    pub fn trades_stream<'a>(
        &'a self,
        symbol: &'a str,
        since: Option<i64>,
        limit: usize,
    ) -> impl Stream<Item = Result<Trade, SdkError>> + 'a {
        paginate(since, limit, 1, move |cursor| self.fetch_trades(symbol, cursor, Some(limit)))
    }

    pub fn ohlcv_stream<'a>(
        &'a self,
        symbol: &'a str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: usize,
    ) -> impl Stream<Item = Result<Ohlcv, SdkError>> + 'a {
        paginate(since, limit, timeframe.millis(), move |cursor| {
            self.fetch_ohlcv(symbol, timeframe, cursor, Some(limit))
        })
    }

    pub fn ledger_stream<'a>(
        &'a self,
        code: Option<&'a str>,
        since: Option<i64>,
        limit: usize,
    ) -> impl Stream<Item = Result<LedgerEntry, SdkError>> + 'a {
        paginate(since, limit, 1, move |cursor| self.fetch_ledger(code, cursor, Some(limit)))
    }
}

/// Walk pages forward by timestamp. Stops on an empty or short page, or
/// when the cursor would not advance.
fn paginate<'a, T, F, Fut>(
    since: Option<i64>,
    limit: usize,
    step: i64,
    mut fetch: F,
) -> impl Stream<Item = Result<T, SdkError>> + 'a
where
    T: Timestamped + 'a,
    F: FnMut(Option<i64>) -> Fut + 'a,
    Fut: Future<Output = Result<Vec<T>, SdkError>> + 'a,
{
    async_stream::try_stream! {
        let mut cursor = since;
        loop {
            let page = fetch(cursor).await?;
            let count = page.len();
            let newest = page.iter().filter_map(Timestamped::timestamp).max();
            for item in page {
                yield item;
            }
            if count == 0 || count < limit {
                break;
            }
            let Some(newest) = newest else { break };
            let next = newest + step;
            if cursor.is_some_and(|c| next <= c) {
                break;
            }
            cursor = Some(next);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct ExchangeBuilder<A> {
    adapter: A,
    urls: Option<Urls>,
    credentials: Credentials,
    options: Option<Options>,
    cache_ttl: Duration,
    retry: RetryPolicy,
    timeout: Duration,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl<A: ExchangeAdapter> ExchangeBuilder<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            urls: None,
            credentials: Credentials::default(),
            options: None,
            cache_ttl: Duration::from_secs(3600),
            retry: RetryPolicy::Idempotent,
            timeout: Duration::from_secs(10),
            transport: None,
            clock: None,
        }
    }

    /// Route every call to `url` (a sandbox or a proxy).
    pub fn base_url(mut self, url: &str) -> Self {
        self.urls = Some(Urls::single(url));
        self
    }

    pub fn urls(mut self, urls: Urls) -> Self {
        self.urls = Some(urls);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Policy for `GET` calls; other verbs never retry.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Exchange<A>, SdkError> {
        let adapter = match &self.options {
            Some(options) => self.adapter.with_options(options),
            None => self.adapter,
        };
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(self.timeout, self.retry)?,
        };
        Ok(Exchange {
            urls: self.urls.unwrap_or_else(|| adapter.descriptor().urls.clone()),
            adapter: Arc::new(adapter),
            transport,
            credentials: Arc::new(self.credentials),
            nonce: Arc::new(NonceSource::new()),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            markets: Arc::new(RwLock::new(None)),
            currencies: Arc::new(RwLock::new(None)),
            cache_ttl: self.cache_ttl,
        })
    }
}

#[cfg(feature = "http")]
fn default_transport(timeout: Duration, retry: RetryPolicy) -> Result<Arc<dyn Transport>, SdkError> {
    Ok(Arc::new(crate::http::ReqwestTransport::new(timeout, retry)?))
}

#[cfg(not(feature = "http"))]
fn default_transport(_timeout: Duration, _retry: RetryPolicy) -> Result<Arc<dyn Transport>, SdkError> {
    Err(SdkError::Validation(
        "no transport configured; enable the `http` feature or supply one".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::Verb;
    use crate::exchange::Ripio;
    use crate::http::{HttpResponse, MockTransport};
    use crate::shared::time::FixedClock;
    use futures_util::StreamExt;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn pairs() -> Value {
        json!({"data": [
            {"base": "BTC", "quote": "BRL", "symbol": "BTC_BRL", "amount_tick": 0.0001, "price_tick": 1, "enabled": true},
            {"base": "ETH", "quote": "BRL", "symbol": "ETH_BRL", "amount_tick": 0.001, "price_tick": 0.1, "enabled": true}
        ]})
    }

    fn client(transport: MockTransport) -> (Exchange<Ripio>, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let exchange = Exchange::builder(Ripio::new())
            .credentials(Credentials::new("key", "secret"))
            .transport(transport.clone())
            .clock(Arc::new(FixedClock(1_700_000_000_000)))
            .build()
            .unwrap();
        (exchange, transport)
    }

    fn trade(id: &str, date: &str) -> Value {
        json!({"id": id, "pair": "BTC_BRL", "date": date, "price": "100", "amount": "1", "taker_side": "buy"})
    }

    #[tokio::test]
    async fn test_markets_are_cached() {
        let (exchange, transport) = client(MockTransport::new().json(Verb::Get, "pairs/", pairs()));
        let first = exchange.load_markets(false).await.unwrap();
        let second = exchange.load_markets(false).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.count("pairs/").await, 1);

        exchange.load_markets(true).await.unwrap();
        assert_eq!(transport.count("pairs/").await, 2);
    }

    #[tokio::test]
    async fn test_market_lookup_by_symbol_or_id() {
        let (exchange, _) = client(MockTransport::new().json(Verb::Get, "pairs/", pairs()));
        assert_eq!(exchange.market("BTC/BRL").await.unwrap().id, "BTC_BRL");
        assert_eq!(exchange.market("ETH_BRL").await.unwrap().symbol, "ETH/BRL");
        let err = exchange.market("DOGE/BRL").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::BadSymbol));
    }

    #[tokio::test]
    async fn test_ticker_routes_through_pipeline() {
        let transport = MockTransport::new()
            .json(Verb::Get, "pairs/", pairs())
            .json(
                Verb::Get,
                "tickers/BTC_BRL",
                json!({"data": {"pair": "BTC_BRL", "last": "100", "high": "110", "low": "90", "volume": "2"}}),
            );
        let (exchange, transport) = client(transport);
        let ticker = exchange.fetch_ticker("BTC/BRL").await.unwrap();
        assert_eq!(ticker.symbol, "BTC/BRL");
        assert_eq!(ticker.last, Some(dec("100")));
        let requests = transport.requests().await;
        assert!(requests.iter().all(|r| r.headers.is_empty()));
    }

    #[tokio::test]
    async fn test_tickers_filtered_to_requested_symbols() {
        let transport = MockTransport::new().json(Verb::Get, "pairs/", pairs()).json(
            Verb::Get,
            "tickers/",
            json!({"data": [
                {"pair": "BTC_BRL", "last": "100"},
                {"pair": "ETH_BRL", "last": "10"}
            ]}),
        );
        let (exchange, _) = client(transport);
        let all = exchange.fetch_tickers(None).await.unwrap();
        assert_eq!(all.len(), 2);
        let some = exchange.fetch_tickers(Some(&["ETH/BRL"])).await.unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].symbol, "ETH/BRL");
    }

    #[tokio::test]
    async fn test_private_call_is_signed() {
        let transport = MockTransport::new().json(
            Verb::Get,
            "user/balances/",
            json!({"data": [{"currency_code": "BRL", "available_amount": 100, "locked_amount": 25}]}),
        );
        let (exchange, transport) = client(transport);
        let balance = exchange.fetch_balance().await.unwrap();
        assert_eq!(balance.total("BRL"), Some(dec("125")));

        let request = &transport.requests().await[0];
        let header = |name: &str| {
            request
                .headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(header("Authorization").as_deref(), Some("key"));
        assert!(header("signature").is_some());
        assert!(header("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_request() {
        let transport = Arc::new(MockTransport::new());
        let exchange = Exchange::builder(Ripio::new())
            .transport(transport.clone())
            .build()
            .unwrap();
        let err = exchange.fetch_balance().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AuthenticationError));
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_classified() {
        let transport = MockTransport::new()
            .route(
                Verb::Get,
                "user/balances/",
                vec![HttpResponse::new(400, r#"{"message": "Funds insufficient"}"#)],
            )
            .route(Verb::Get, "currencies/", vec![HttpResponse::new(504, "gateway timeout")]);
        let (exchange, _) = client(transport);

        let err = exchange.fetch_balance().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientFunds));

        let err = exchange.fetch_currencies().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ExchangeNotAvailable));
        match err {
            SdkError::Exchange(e) => assert_eq!(e.body.as_deref(), Some("gateway timeout")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_operation() {
        let (exchange, transport) = client(MockTransport::new());
        let err = exchange
            .fetch_ohlcv("BTC/BRL", Timeframe::Hour1, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotSupported));
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_composite_failure_fails_whole_operation() {
        let transport = MockTransport::new().route(Verb::Get, "pairs/", vec![HttpResponse::new(503, "")]);
        let (exchange, _) = client(transport);
        let err = exchange.load_markets(false).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ExchangeNotAvailable));
    }

    #[tokio::test]
    async fn test_trades_stream_stops_on_short_page() {
        let transport = MockTransport::new().json(Verb::Get, "pairs/", pairs()).route(
            Verb::Get,
            "public/trades/",
            vec![
                HttpResponse::new(
                    200,
                    json!({"data": {"trades": [
                        trade("a", "2024-01-01T00:00:00.000Z"),
                        trade("b", "2024-01-01T00:00:01.000Z")
                    ]}})
                    .to_string(),
                ),
                HttpResponse::new(
                    200,
                    json!({"data": {"trades": [trade("c", "2024-01-01T00:00:02.000Z")]}}).to_string(),
                ),
            ],
        );
        let (exchange, transport) = client(transport);
        let trades: Vec<Trade> = exchange
            .trades_stream("BTC/BRL", None, 2)
            .map(|t| t.unwrap())
            .collect()
            .await;
        let ids: Vec<_> = trades.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(transport.count("public/trades/").await, 2);
    }

    #[tokio::test]
    async fn test_stream_stops_when_cursor_stalls() {
        let page = json!({"data": {"trades": [
            trade("a", "2024-01-01T00:00:00.000Z"),
            trade("b", "2024-01-01T00:00:01.000Z")
        ]}});
        let transport = MockTransport::new()
            .json(Verb::Get, "pairs/", pairs())
            .json(Verb::Get, "public/trades/", page);
        let (exchange, _) = client(transport);
        let trades: Vec<_> = exchange.trades_stream("BTC/BRL", None, 2).collect().await;
        assert_eq!(trades.len(), 2);
    }

    #[tokio::test]
    async fn test_with_options_shares_caches() {
        let (exchange, transport) = client(MockTransport::new().json(Verb::Get, "pairs/", pairs()));
        exchange.load_markets(false).await.unwrap();
        let derived = exchange.with_options(&Options::new());
        derived.load_markets(false).await.unwrap();
        assert_eq!(transport.count("pairs/").await, 1);
    }

    #[test]
    fn test_build_uses_descriptor_urls() {
        let exchange = Exchange::builder(Ripio::new())
            .transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();
        assert_eq!(exchange.urls.public, exchange.descriptor().urls.public);

        let exchange = Exchange::builder(Ripio::new())
            .base_url("http://localhost:8080")
            .transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();
        assert_eq!(exchange.urls.public, "http://localhost:8080");
    }
}
