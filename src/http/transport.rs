//! The transport seam between the client and the network.

use futures_util::future::BoxFuture;

use crate::error::HttpError;
use crate::sign::HttpRequest;

/// Raw response as received. Non-2xx statuses are not errors here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one signed request.
///
/// Implementations own timeouts and retries; the client only sees the final
/// response or a transport failure.
pub trait Transport: Send + Sync {
    fn execute<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, Result<HttpResponse, HttpError>>;
}
