//! Unified error types.
//!
//! [`ErrorKind`] is the shared taxonomy every adapter maps its native error
//! codes onto. [`ExchangeError`] is one classified failure and always carries
//! the adapter id, the request URL, the raw body and the upstream message.
//! [`SdkError`] is what every public operation returns.

use std::fmt;
use thiserror::Error;

// ─── Taxonomy ────────────────────────────────────────────────────────────────

/// Kind of a classified exchange failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request parameters.
    BadRequest,
    /// Unknown market symbol or id.
    BadSymbol,
    /// Bad or missing credentials.
    AuthenticationError,
    InsufficientFunds,
    /// The exchange rejected the order parameters.
    InvalidOrder,
    OrderNotFound,
    RateLimitExceeded,
    /// Upstream outage or maintenance.
    ExchangeNotAvailable,
    /// Uncategorized upstream failure.
    ExchangeError,
    /// The adapter does not implement the operation.
    NotSupported,
    /// A required argument was missing; raised before any request.
    ArgumentsRequired,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::BadSymbol => "BadSymbol",
            ErrorKind::AuthenticationError => "AuthenticationError",
            ErrorKind::InsufficientFunds => "InsufficientFunds",
            ErrorKind::InvalidOrder => "InvalidOrder",
            ErrorKind::OrderNotFound => "OrderNotFound",
            ErrorKind::RateLimitExceeded => "RateLimitExceeded",
            ErrorKind::ExchangeNotAvailable => "ExchangeNotAvailable",
            ErrorKind::ExchangeError => "ExchangeError",
            ErrorKind::NotSupported => "NotSupported",
            ErrorKind::ArgumentsRequired => "ArgumentsRequired",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure classified into the shared taxonomy.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {exchange} {message}")]
pub struct ExchangeError {
    pub kind: ErrorKind,
    /// Adapter id, e.g. `"blofin"`.
    pub exchange: String,
    /// Raw upstream message, or a local description for precondition failures.
    pub message: String,
    pub url: Option<String>,
    /// Raw response body.
    pub body: Option<String>,
}

impl ExchangeError {
    pub fn new(kind: ErrorKind, exchange: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            exchange: exchange.to_string(),
            message: message.into(),
            url: None,
            body: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn not_supported(exchange: &str, operation: &str) -> Self {
        Self::new(
            ErrorKind::NotSupported,
            exchange,
            format!("{}() is not supported yet", operation),
        )
    }

    pub fn arguments_required(exchange: &str, operation: &str, argument: &str) -> Self {
        Self::new(
            ErrorKind::ArgumentsRequired,
            exchange,
            format!("{}() requires a {} argument", operation, argument),
        )
    }

    pub fn bad_symbol(exchange: &str, symbol: &str) -> Self {
        Self::new(
            ErrorKind::BadSymbol,
            exchange,
            format!("does not have market symbol {}", symbol),
        )
    }
}

// ─── SDK error ───────────────────────────────────────────────────────────────

/// Top-level error returned by every public operation.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] PreciseError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl SdkError {
    /// The taxonomy kind, when the failure was classified.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SdkError::Exchange(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// Transport-layer errors. Status codes are not errors at this layer; the
/// classifier turns them into [`ExchangeError`]s.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Transport failed: {0}")]
    Transport(String),

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

/// Numeric string engine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreciseError {
    #[error("not a decimal number: {0:?}")]
    Parse(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("value out of range")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_error_display_carries_context() {
        let err = ExchangeError::new(ErrorKind::BadRequest, "blofin", "Parameter bar error.")
            .with_url("https://openapi.blofin.com/api/v1/market/candles")
            .with_body("{\"code\":\"152002\"}");
        assert_eq!(err.to_string(), "BadRequest: blofin Parameter bar error.");
        assert_eq!(err.body.as_deref(), Some("{\"code\":\"152002\"}"));
    }

    #[test]
    fn test_sdk_error_kind() {
        let err: SdkError = ExchangeError::not_supported("kuna", "fetchPositions").into();
        assert_eq!(err.kind(), Some(ErrorKind::NotSupported));
        let err: SdkError = PreciseError::DivisionByZero.into();
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn test_arguments_required_message() {
        let err = ExchangeError::arguments_required("kuna", "fetchOpenOrders", "symbol");
        assert_eq!(err.kind, ErrorKind::ArgumentsRequired);
        assert!(err.message.contains("requires a symbol argument"));
    }
}
