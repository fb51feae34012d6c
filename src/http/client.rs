//! `reqwest`-backed [`Transport`] with per-verb retry policies.

use futures_util::future::BoxFuture;
use reqwest::Client;
use std::time::Duration;

use crate::describe::Verb;
use crate::error::HttpError;
use crate::http::retry::RetryPolicy;
use crate::http::transport::{HttpResponse, Transport};
use crate::sign::HttpRequest;

pub struct ReqwestTransport {
    client: Client,
    /// Policy for `GET`; other verbs never retry.
    idempotent: RetryPolicy,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, idempotent: RetryPolicy) -> Result<Self, HttpError> {
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(timeout).pool_max_idle_per_host(10);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;

        Ok(Self {
            client: builder.build()?,
            idempotent,
        })
    }

    async fn request_with_retry(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let Some(config) = RetryPolicy::for_verb(request.method, &self.idempotent).config() else {
            return self.do_request(request).await;
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            let can_retry = attempt < config.max_retries;
            match self.do_request(request).await {
                Ok(resp) if can_retry && config.is_retryable_status(resp.status) => {
                    last_error = Some(format!("HTTP {}", resp.status));
                }
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let retryable = match &e {
                        HttpError::Timeout => true,
                        HttpError::Reqwest(re) => {
                            #[cfg(not(target_arch = "wasm32"))]
                            let retryable = re.is_connect() || re.is_timeout() || re.is_request();
                            #[cfg(target_arch = "wasm32")]
                            let retryable = re.is_timeout() || re.is_request();
                            retryable
                        }
                        _ => false,
                    };
                    if !retryable {
                        return Err(e);
                    }
                    last_error = Some(e.to_string());
                }
            }

            if can_retry {
                let delay = config.delay_for_attempt(attempt);
                tracing::debug!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request to {}",
                    request.url
                );
                futures_timer::Delay::new(delay).await;
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error.unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = match request.method {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
        };
        let mut req = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    fn execute<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(self.request_with_retry(request))
    }
}

impl Clone for ReqwestTransport {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            idempotent: self.idempotent.clone(),
        }
    }
}
