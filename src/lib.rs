//! # exchange-normalizer
//!
//! One data model over several cryptocurrency exchange REST APIs: markets,
//! order books, tickers, trades, candles, orders, balances, positions,
//! transactions and ledger entries, normalized from each exchange's wire
//! format.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: shared vocabulary, canonical entities, capability
//!    descriptors, the error taxonomy and its classifier (pure, no I/O)
//! 2. **Signing**: request preparation, HMAC signatures, credentials, nonces
//! 3. **Adapters**: one `ExchangeAdapter` per exchange, building calls and
//!    normalizing responses
//! 4. **HTTP**: the `Transport` seam with retry policies; `reqwest` behind
//!    the `http` feature
//! 5. **High-Level Client**: `Exchange<A>` with a market cache and
//!    pagination streams
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use exchange_normalizer::prelude::*;
//!
//! let ripio = Exchange::builder(Ripio::new())
//!     .credentials(Credentials::from_env("RIPIO"))
//!     .build()?;
//!
//! let ticker = ripio.fetch_ticker("BTC/BRL").await?;
//! let book = ripio.fetch_order_book("BTC/BRL", Some(20)).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared enums, numeric helpers, field accessors and time utilities.
pub mod shared;

/// Canonical entities and their normalization helpers.
pub mod domain;

/// Exchange descriptors: capabilities, routes, fees, exceptions, options.
pub mod describe;

/// Error taxonomy and SDK error types.
pub mod error;

/// Mapping of failed responses onto the error taxonomy.
pub mod classify;

/// Exchange base URLs.
pub mod network;

// ── Layer 2: Signing ─────────────────────────────────────────────────────────

/// Call preparation, signatures, credentials and nonces.
pub mod sign;

// ── Layer 3: Adapters ────────────────────────────────────────────────────────

/// The adapter trait and the supported exchanges.
pub mod exchange;

// ── Layer 4: HTTP ────────────────────────────────────────────────────────────

/// Transport trait, retry policies and transports.
pub mod http;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `Exchange<A>`, the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared vocabulary
    pub use crate::shared::{MarketType, PrecisionMode, Side, TakerOrMaker, Timeframe};

    // Canonical entities
    pub use crate::domain::address::{DepositAddress, WithdrawRequest};
    pub use crate::domain::balance::{Account, Balance};
    pub use crate::domain::currency::{Currency, Network};
    pub use crate::domain::fee::{Fee, TradingFee};
    pub use crate::domain::ledger::LedgerEntry;
    pub use crate::domain::market::{Market, MarketIndex};
    pub use crate::domain::ohlcv::Ohlcv;
    pub use crate::domain::order::{Order, OrderRequest, OrderStatus, OrderType};
    pub use crate::domain::orderbook::{OrderBook, OrderBookState};
    pub use crate::domain::position::Position;
    pub use crate::domain::ticker::Ticker;
    pub use crate::domain::trade::Trade;
    pub use crate::domain::transaction::{Transaction, TransactionType};

    // Descriptors
    pub use crate::describe::{Descriptor, Has, Options};

    // Errors
    pub use crate::error::{ErrorKind, ExchangeError, SdkError};

    // Signing
    pub use crate::sign::Credentials;

    // Adapters
    pub use crate::exchange::{Blofin, ExchangeAdapter, Exkoin, Kuna, Nonkyc, Ripio};

    // HTTP
    pub use crate::http::retry::{RetryConfig, RetryPolicy};
    pub use crate::http::transport::{HttpResponse, Transport};

    // Client
    pub use crate::client::{Exchange, ExchangeBuilder};
}
