//! Error classifier.
//!
//! Runs on every response an adapter flags as a failure. The first step that
//! yields a kind wins:
//!
//! 1. the adapter's structural precheck (route and status, body unseen);
//! 2. the broad table, substring match on the message, declaration order;
//! 3. the exact table, keyed by error code, then by the whole message;
//! 4. the HTTP status, for statuses with an unambiguous meaning;
//! 5. a generic `ExchangeError` carrying the body.

use crate::describe::Descriptor;
use crate::error::{ErrorKind, ExchangeError};

/// What an adapter extracted from a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ErrorReport {
    pub fn new(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self { status, code, message }
    }
}

/// Kind implied by an HTTP status alone.
pub fn http_status_kind(status: u16) -> Option<ErrorKind> {
    match status {
        401 | 403 => Some(ErrorKind::AuthenticationError),
        404 => Some(ErrorKind::BadRequest),
        429 => Some(ErrorKind::RateLimitExceeded),
        500..=599 => Some(ErrorKind::ExchangeNotAvailable),
        _ => None,
    }
}

pub fn classify(
    descriptor: &Descriptor,
    precheck: Option<ErrorKind>,
    report: &ErrorReport,
    url: &str,
    body: &str,
) -> ExchangeError {
    let table = &descriptor.exceptions;
    let message = report.message.as_deref().unwrap_or_default();
    let kind = precheck
        .or_else(|| (!message.is_empty()).then(|| table.match_broad(message)).flatten())
        .or_else(|| report.code.as_deref().and_then(|code| table.match_exact(code)))
        .or_else(|| (!message.is_empty()).then(|| table.match_exact(message)).flatten())
        .or_else(|| http_status_kind(report.status))
        .unwrap_or(ErrorKind::ExchangeError);

    let text = if message.is_empty() { body } else { message };
    tracing::debug!(exchange = descriptor.id, kind = %kind, status = report.status, "classified error response");
    ExchangeError::new(kind, descriptor.id, text)
        .with_url(url)
        .with_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{
        Capabilities, ExceptionTable, Fees, Options, RequiredCredentials, RouteTable, Urls,
    };
    use crate::shared::PrecisionMode;
    use std::collections::BTreeMap;

    fn descriptor(exceptions: ExceptionTable) -> Descriptor {
        Descriptor {
            id: "test",
            name: "Test",
            countries: vec![],
            version: "v1",
            rate_limit: 100,
            urls: Urls::single("https://example.invalid"),
            has: Capabilities::new(),
            timeframes: BTreeMap::new(),
            routes: RouteTable::new(),
            fees: Fees::default(),
            precision_mode: PrecisionMode::TickSize,
            exceptions,
            required_credentials: RequiredCredentials::default(),
            common_currencies: BTreeMap::new(),
            options: Options::new(),
        }
    }

    fn report(status: u16, code: Option<&str>, message: Option<&str>) -> ErrorReport {
        ErrorReport::new(status, code.map(String::from), message.map(String::from))
    }

    #[test]
    fn test_exact_code_match_carries_message() {
        let d = descriptor(ExceptionTable::new().exact(&[("152002", ErrorKind::BadRequest)]));
        let body = r#"{"code":"152002","msg":"Parameter bar error."}"#;
        let err = classify(
            &d,
            None,
            &report(200, Some("152002"), Some("Parameter bar error.")),
            "https://x/candles",
            body,
        );
        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(err.message, "Parameter bar error.");
        assert_eq!(err.body.as_deref(), Some(body));
        assert_eq!(err.url.as_deref(), Some("https://x/candles"));
        assert_eq!(err.exchange, "test");
    }

    #[test]
    fn test_broad_beats_exact() {
        let d = descriptor(
            ExceptionTable::new()
                .exact(&[("400", ErrorKind::InvalidOrder)])
                .broad(&[("Funds insufficient", ErrorKind::InsufficientFunds)]),
        );
        let err = classify(&d, None, &report(400, Some("400"), Some("Funds insufficient for order")), "u", "b");
        assert_eq!(err.kind, ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_precheck_wins() {
        let d = descriptor(ExceptionTable::new().broad(&[("x", ErrorKind::BadRequest)]));
        let err = classify(&d, Some(ErrorKind::OrderNotFound), &report(404, None, Some("x")), "u", "b");
        assert_eq!(err.kind, ErrorKind::OrderNotFound);
    }

    #[test]
    fn test_exact_message_after_code() {
        let d = descriptor(ExceptionTable::new().exact(&[("Invalid signature", ErrorKind::AuthenticationError)]));
        let err = classify(&d, None, &report(400, Some("999"), Some("Invalid signature")), "u", "b");
        assert_eq!(err.kind, ErrorKind::AuthenticationError);
    }

    #[test]
    fn test_status_then_generic_fallback() {
        let d = descriptor(ExceptionTable::new());
        assert_eq!(classify(&d, None, &report(429, None, None), "u", "slow down").kind, ErrorKind::RateLimitExceeded);
        let generic = classify(&d, None, &report(418, None, None), "u", "<html>teapot</html>");
        assert_eq!(generic.kind, ErrorKind::ExchangeError);
        assert_eq!(generic.message, "<html>teapot</html>");
    }

    #[test]
    fn test_http_status_kind_table() {
        assert_eq!(http_status_kind(401), Some(ErrorKind::AuthenticationError));
        assert_eq!(http_status_kind(403), Some(ErrorKind::AuthenticationError));
        assert_eq!(http_status_kind(404), Some(ErrorKind::BadRequest));
        assert_eq!(http_status_kind(503), Some(ErrorKind::ExchangeNotAvailable));
        assert_eq!(http_status_kind(400), None);
        assert_eq!(http_status_kind(200), None);
    }
}
