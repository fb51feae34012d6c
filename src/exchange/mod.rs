//! The [`ExchangeAdapter`] trait and the five exchange adapters.
//!
//! An adapter is pure: it turns unified arguments into [`ApiCall`]s, signs
//! them, decides whether a decoded response is a failure, and maps raw
//! payloads onto the canonical entities. It never performs I/O; the
//! [`Exchange`](crate::client::Exchange) client drives it.
//!
//! Operations come in pairs, `*_request` building the call(s) and
//! `parse_*_response` normalizing what came back. Everything defaults to
//! `NotSupported`, so an adapter only implements what its exchange offers.

pub mod blofin;
pub mod exkoin;
pub mod kuna;
pub mod nonkyc;
pub mod ripio;

pub use blofin::Blofin;
pub use exkoin::Exkoin;
pub use kuna::Kuna;
pub use nonkyc::Nonkyc;
pub use ripio::Ripio;

use serde_json::Value;

use crate::classify::ErrorReport;
use crate::describe::{Descriptor, Options};
use crate::domain::address::{DepositAddress, WithdrawRequest};
use crate::domain::balance::Balance;
use crate::domain::currency::Currency;
use crate::domain::fee::TradingFee;
use crate::domain::filter_by_since_limit;
use crate::domain::ledger::LedgerEntry;
use crate::domain::market::{Market, MarketIndex};
use crate::domain::ohlcv::Ohlcv;
use crate::domain::order::{Order, OrderFilter, OrderRequest, OrderStatus};
use crate::domain::orderbook::OrderBook;
use crate::domain::position::Position;
use crate::domain::ticker::Ticker;
use crate::domain::trade::Trade;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{ErrorKind, ExchangeError, SdkError};
use crate::shared::Timeframe;
use crate::sign::{ApiCall, HttpRequest, SignContext};

// ─── Market scope ────────────────────────────────────────────────────────────

/// Markets a parser may consult: the market the call was made for, if any,
/// and the loaded index for resolving ids found in the payload.
#[derive(Debug, Clone, Copy)]
pub struct MarketScope<'a> {
    pub market: Option<&'a Market>,
    pub markets: &'a MarketIndex,
}

impl<'a> MarketScope<'a> {
    pub fn new(markets: &'a MarketIndex) -> Self {
        Self { market: None, markets }
    }

    pub fn of(market: Option<&'a Market>, markets: &'a MarketIndex) -> Self {
        Self { market, markets }
    }

    /// The call's market, else the market whose id is `id`.
    pub fn resolve(&self, id: Option<&str>) -> Option<&'a Market> {
        match id.and_then(|id| self.markets.by_id(id)) {
            Some(found) => Some(found),
            None => self.market,
        }
    }

    /// Unified symbol for a raw market id. Unknown ids fall back to
    /// splitting on `delimiter`.
    pub fn symbol(&self, id: Option<&str>, delimiter: Option<&str>) -> String {
        if let Some(market) = self.resolve(id) {
            return market.symbol.clone();
        }
        self.markets.safe_symbol(id, delimiter).unwrap_or_default()
    }
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

pub trait ExchangeAdapter: Send + Sync {
    fn descriptor(&self) -> &Descriptor;

    /// A copy of this adapter with `options` merged over its own.
    fn with_options(&self, options: &Options) -> Self
    where
        Self: Sized;

    fn id(&self) -> &'static str {
        self.descriptor().id
    }

    fn unsupported(&self, operation: &str) -> SdkError {
        ExchangeError::not_supported(self.id(), operation).into()
    }

    /// Build the concrete request for one call.
    fn sign(&self, call: &ApiCall, ctx: &SignContext<'_>) -> Result<HttpRequest, SdkError>;

    /// Extract an error report when the decoded response is a failure,
    /// whatever the HTTP status says.
    fn inspect_response(&self, status: u16, body: &Value) -> Option<ErrorReport>;

    /// Structural classification from the route and status alone.
    fn precheck(&self, _call: &ApiCall, _status: u16) -> Option<ErrorKind> {
        None
    }

    // ── Single-entity parsers ───────────────────────────────────────────

    fn parse_market(&self, _raw: &Value) -> Result<Market, SdkError> {
        Err(self.unsupported("parseMarket"))
    }

    fn parse_currency(&self, _raw: &Value) -> Result<Currency, SdkError> {
        Err(self.unsupported("parseCurrency"))
    }

    fn parse_ticker(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        Err(self.unsupported("parseTicker"))
    }

    fn parse_trade(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Trade, SdkError> {
        Err(self.unsupported("parseTrade"))
    }

    fn parse_ohlcv(&self, raw: &Value, _market: &Market) -> Result<Ohlcv, SdkError> {
        Ohlcv::from_array(raw, 5)
            .ok_or_else(|| SdkError::Validation(format!("{} malformed candle {}", self.id(), raw)))
    }

    fn parse_order_status(&self, native: &str) -> OrderStatus {
        OrderStatus::from(native.to_string())
    }

    fn parse_order(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Order, SdkError> {
        Err(self.unsupported("parseOrder"))
    }

    fn parse_position(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Position, SdkError> {
        Err(self.unsupported("parsePosition"))
    }

    fn parse_transaction(&self, _raw: &Value, _currency: Option<&Currency>) -> Result<Transaction, SdkError> {
        Err(self.unsupported("parseTransaction"))
    }

    fn parse_ledger_entry(&self, _raw: &Value, _currency: Option<&Currency>) -> Result<LedgerEntry, SdkError> {
        Err(self.unsupported("parseLedgerEntry"))
    }

    // ── List helpers ────────────────────────────────────────────────────

    fn parse_markets(&self, raw: &[Value]) -> Result<Vec<Market>, SdkError> {
        raw.iter().map(|m| self.parse_market(m)).collect()
    }

    fn parse_currencies(&self, raw: &[Value]) -> Result<Vec<Currency>, SdkError> {
        raw.iter().map(|c| self.parse_currency(c)).collect()
    }

    /// Tickers for known markets only; entries whose symbol the index cannot
    /// place are dropped.
    fn parse_tickers(&self, raw: &[Value], scope: MarketScope<'_>) -> Result<Vec<Ticker>, SdkError> {
        let mut tickers = Vec::with_capacity(raw.len());
        for item in raw {
            let ticker = self.parse_ticker(item, scope)?;
            if scope.markets.market(&ticker.symbol).is_some() {
                tickers.push(ticker);
            }
        }
        Ok(tickers)
    }

    fn parse_trades(
        &self,
        raw: &[Value],
        scope: MarketScope<'_>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>, SdkError> {
        let trades = raw
            .iter()
            .map(|t| self.parse_trade(t, scope))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(filter_by_since_limit(trades, since, limit))
    }

    fn parse_ohlcvs(
        &self,
        raw: &[Value],
        market: &Market,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Ohlcv>, SdkError> {
        let candles = raw
            .iter()
            .map(|c| self.parse_ohlcv(c, market))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(filter_by_since_limit(candles, since, limit))
    }

    fn parse_orders(
        &self,
        raw: &[Value],
        scope: MarketScope<'_>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, SdkError> {
        let orders = raw
            .iter()
            .map(|o| self.parse_order(o, scope))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(filter_by_since_limit(orders, since, limit))
    }

    fn parse_positions(&self, raw: &[Value], scope: MarketScope<'_>) -> Result<Vec<Position>, SdkError> {
        raw.iter().map(|p| self.parse_position(p, scope)).collect()
    }

    fn parse_transactions(
        &self,
        raw: &[Value],
        currency: Option<&Currency>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, SdkError> {
        let transactions = raw
            .iter()
            .map(|t| self.parse_transaction(t, currency))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(filter_by_since_limit(transactions, since, limit))
    }

    fn parse_ledger(
        &self,
        raw: &[Value],
        currency: Option<&Currency>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<LedgerEntry>, SdkError> {
        let entries = raw
            .iter()
            .map(|e| self.parse_ledger_entry(e, currency))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(filter_by_since_limit(entries, since, limit))
    }

    // ── Operations ──────────────────────────────────────────────────────

    fn time_request(&self) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchTime"))
    }

    fn parse_time_response(&self, _raw: &Value) -> Result<i64, SdkError> {
        Err(self.unsupported("fetchTime"))
    }

    /// One or more calls whose responses together list every market. They
    /// run concurrently; responses arrive in request order.
    fn markets_requests(&self) -> Result<Vec<ApiCall>, SdkError> {
        Err(self.unsupported("fetchMarkets"))
    }

    fn parse_markets_response(&self, _raw: &[Value]) -> Result<Vec<Market>, SdkError> {
        Err(self.unsupported("fetchMarkets"))
    }

    fn currencies_request(&self) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchCurrencies"))
    }

    fn parse_currencies_response(&self, _raw: &Value) -> Result<Vec<Currency>, SdkError> {
        Err(self.unsupported("fetchCurrencies"))
    }

    fn order_book_request(&self, _market: &Market, _limit: Option<usize>) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchOrderBook"))
    }

    fn parse_order_book_response(&self, _raw: &Value, _market: &Market) -> Result<OrderBook, SdkError> {
        Err(self.unsupported("fetchOrderBook"))
    }

    fn ticker_request(&self, _market: &Market) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchTicker"))
    }

    fn parse_ticker_response(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Ticker, SdkError> {
        Err(self.unsupported("fetchTicker"))
    }

    /// `markets` empty means every market.
    fn tickers_requests(&self, _markets: &[&Market]) -> Result<Vec<ApiCall>, SdkError> {
        Err(self.unsupported("fetchTickers"))
    }

    fn parse_tickers_response(&self, _raw: &[Value], _scope: MarketScope<'_>) -> Result<Vec<Ticker>, SdkError> {
        Err(self.unsupported("fetchTickers"))
    }

    fn trades_request(
        &self,
        _market: &Market,
        _since: Option<i64>,
        _limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchTrades"))
    }

    fn parse_trades_response(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        Err(self.unsupported("fetchTrades"))
    }

    fn ohlcv_request(
        &self,
        _market: &Market,
        _timeframe: Timeframe,
        _since: Option<i64>,
        _limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchOHLCV"))
    }

    fn parse_ohlcv_response(&self, _raw: &Value, _market: &Market) -> Result<Vec<Ohlcv>, SdkError> {
        Err(self.unsupported("fetchOHLCV"))
    }

    fn balance_request(&self) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchBalance"))
    }

    fn parse_balance_response(&self, _raw: &Value) -> Result<Balance, SdkError> {
        Err(self.unsupported("fetchBalance"))
    }

    /// `None` when the fees are static and come from the loaded markets.
    fn trading_fees_request(&self) -> Result<Option<ApiCall>, SdkError> {
        Err(self.unsupported("fetchTradingFees"))
    }

    fn parse_trading_fees_response(
        &self,
        _raw: Option<&Value>,
        _markets: &MarketIndex,
    ) -> Result<Vec<TradingFee>, SdkError> {
        Err(self.unsupported("fetchTradingFees"))
    }

    fn create_order_request(&self, _order: &OrderRequest, _market: &Market) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("createOrder"))
    }

    /// Exchanges often echo only an id; the request fills the gaps.
    fn parse_create_order_response(
        &self,
        _raw: &Value,
        _order: &OrderRequest,
        _market: &Market,
    ) -> Result<Order, SdkError> {
        Err(self.unsupported("createOrder"))
    }

    fn cancel_order_request(&self, _id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("cancelOrder"))
    }

    fn parse_cancel_order_response(
        &self,
        _raw: &Value,
        _id: &str,
        _scope: MarketScope<'_>,
    ) -> Result<Order, SdkError> {
        Err(self.unsupported("cancelOrder"))
    }

    fn order_request(&self, _id: &str, _market: Option<&Market>) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchOrder"))
    }

    fn parse_order_response(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Order, SdkError> {
        Err(self.unsupported("fetchOrder"))
    }

    fn orders_request(
        &self,
        _filter: OrderFilter,
        _market: Option<&Market>,
        _since: Option<i64>,
        _limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchOrders"))
    }

    fn parse_orders_response(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Vec<Order>, SdkError> {
        Err(self.unsupported("fetchOrders"))
    }

    fn my_trades_request(
        &self,
        _market: Option<&Market>,
        _since: Option<i64>,
        _limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchMyTrades"))
    }

    fn parse_my_trades_response(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Vec<Trade>, SdkError> {
        Err(self.unsupported("fetchMyTrades"))
    }

    fn positions_request(&self, _markets: &[&Market]) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchPositions"))
    }

    fn parse_positions_response(&self, _raw: &Value, _scope: MarketScope<'_>) -> Result<Vec<Position>, SdkError> {
        Err(self.unsupported("fetchPositions"))
    }

    fn transactions_request(
        &self,
        kind: TransactionType,
        _currency: Option<&Currency>,
        _since: Option<i64>,
        _limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Err(self.unsupported(transactions_operation(kind)))
    }

    fn parse_transactions_response(
        &self,
        _raw: &Value,
        kind: TransactionType,
        _currency: Option<&Currency>,
    ) -> Result<Vec<Transaction>, SdkError> {
        Err(self.unsupported(transactions_operation(kind)))
    }

    fn ledger_request(
        &self,
        _currency: Option<&Currency>,
        _since: Option<i64>,
        _limit: Option<usize>,
    ) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchLedger"))
    }

    fn parse_ledger_response(&self, _raw: &Value, _currency: Option<&Currency>) -> Result<Vec<LedgerEntry>, SdkError> {
        Err(self.unsupported("fetchLedger"))
    }

    fn deposit_address_request(&self, _currency: &Currency, _network: Option<&str>) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("fetchDepositAddress"))
    }

    fn parse_deposit_address_response(&self, _raw: &Value, _currency: &Currency) -> Result<DepositAddress, SdkError> {
        Err(self.unsupported("fetchDepositAddress"))
    }

    fn withdraw_request(&self, _request: &WithdrawRequest, _currency: &Currency) -> Result<ApiCall, SdkError> {
        Err(self.unsupported("withdraw"))
    }

    /// A second call some exchanges need to confirm a withdrawal, built from
    /// the first response.
    fn withdraw_followup(&self, _raw: &Value, _request: &WithdrawRequest) -> Result<Option<ApiCall>, SdkError> {
        Ok(None)
    }

    fn parse_withdraw_response(&self, _raw: &Value, _currency: &Currency) -> Result<Transaction, SdkError> {
        Err(self.unsupported("withdraw"))
    }
}

fn transactions_operation(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Deposit => "fetchDeposits",
        TransactionType::Withdrawal => "fetchWithdrawals",
    }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// The list under `key`, or the value itself when it already is a list.
pub fn list_at<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    match raw {
        Value::Array(items) => items,
        other => crate::shared::safe::safe_list(other, key)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    }
}

/// Copy of `descriptor` with `options` merged over its own.
pub(crate) fn merged_descriptor(descriptor: &Descriptor, options: &Options) -> Descriptor {
    let mut next = descriptor.clone();
    next.options = descriptor.options.merge(options);
    next
}
