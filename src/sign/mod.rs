//! Request construction and authentication.
//!
//! An adapter turns each unified operation into an [`ApiCall`]: one route
//! from its table plus a parameter bag. [`prepare`] substitutes the path
//! placeholders and splits the leftover parameters into a query string or a
//! JSON body. The adapter's `sign` then attaches whatever its exchange's
//! authentication scheme demands and returns the final [`HttpRequest`].

pub mod credentials;

pub use credentials::{Credentials, NonceSource};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::{Sha256, Sha384};

use crate::describe::routes::{implode_params, omit_path_params};
use crate::describe::{Api, Urls, Verb};
use crate::error::SdkError;
use crate::shared::safe;

/// One route-table entry plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub api: Api,
    pub verb: Verb,
    /// Path template as declared in the route table.
    pub path: &'static str,
    pub params: Map<String, Value>,
}

impl ApiCall {
    pub fn new(api: Api, verb: Verb, path: &'static str) -> Self {
        Self {
            api,
            verb,
            path,
            params: Map::new(),
        }
    }

    pub fn public_get(path: &'static str) -> Self {
        Self::new(Api::Public, Verb::Get, path)
    }

    pub fn private_get(path: &'static str) -> Self {
        Self::new(Api::Private, Verb::Get, path)
    }

    pub fn private_post(path: &'static str) -> Self {
        Self::new(Api::Private, Verb::Post, path)
    }

    pub fn private_delete(path: &'static str) -> Self {
        Self::new(Api::Private, Verb::Delete, path)
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Set `key` only when `value` is present.
    pub fn param_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Merge caller-supplied extras; existing keys are overwritten.
    pub fn extend(mut self, extra: &Map<String, Value>) -> Self {
        for (k, v) in extra {
            self.params.insert(k.clone(), v.clone());
        }
        self
    }

    pub fn is_private(&self) -> bool {
        self.api == Api::Private
    }
}

/// A fully built request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub method: Verb,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Verb, url: String) -> Self {
        Self {
            url,
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Inputs to an adapter's signer, read once per request.
#[derive(Debug, Clone, Copy)]
pub struct SignContext<'a> {
    pub credentials: &'a Credentials,
    /// Milliseconds, from the credential set's [`NonceSource`].
    pub nonce: i64,
    pub urls: &'a Urls,
}

/// A call with its path imploded and parameters placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    /// Path with placeholders substituted, no leading slash.
    pub path: String,
    /// Parameters left after substitution.
    pub rest: Map<String, Value>,
    /// Encoded query string without `?`; empty when there is none.
    pub query: String,
    /// JSON body for non-GET calls with parameters.
    pub body: Option<String>,
}

impl Prepared {
    /// `base/path` with the query appended.
    pub fn url(&self, base: &str) -> String {
        let url = join(base, &self.path);
        with_query(url, &self.query)
    }
}

/// Substitute placeholders and place the leftover parameters: the query
/// string for `GET`, a JSON body otherwise.
pub fn prepare(call: &ApiCall) -> Result<Prepared, SdkError> {
    let path = implode_params(call.path, &call.params)
        .map_err(|name| SdkError::Validation(format!("missing path parameter {}", name)))?;
    let rest = omit_path_params(call.path, &call.params);
    let (query, body) = match call.verb {
        Verb::Get => (urlencode(&rest), None),
        _ if rest.is_empty() => (String::new(), None),
        _ => (String::new(), Some(serde_json::to_string(&Value::Object(rest.clone()))?)),
    };
    Ok(Prepared { path, rest, query, body })
}

pub fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub fn with_query(url: String, query: &str) -> String {
    if query.is_empty() {
        url
    } else if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

/// `k=v&k2=v2` in key order. Arrays become comma-separated values.
pub fn urlencode(params: &Map<String, Value>) -> String {
    params
        .iter()
        .filter_map(|(k, v)| {
            let value = match v {
                Value::Array(items) => items
                    .iter()
                    .filter_map(safe::value_to_string)
                    .collect::<Vec<_>>()
                    .join(","),
                other => safe::value_to_string(other)?,
            };
            Some(format!("{}={}", urlencoding::encode(k), urlencoding::encode(&value)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

// ─── Schemes ─────────────────────────────────────────────────────────────────

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;

fn key_error(e: hmac::digest::InvalidLength) -> SdkError {
    SdkError::Validation(format!("invalid HMAC key: {}", e))
}

fn hmac_sha256(secret: &str, message: &str) -> Result<Vec<u8>, SdkError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(key_error)?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, SdkError> {
    Ok(hex::encode(hmac_sha256(secret, message)?))
}

pub fn hmac_sha256_base64(secret: &str, message: &str) -> Result<String, SdkError> {
    Ok(BASE64.encode(hmac_sha256(secret, message)?))
}

pub fn hmac_sha384_hex(secret: &str, message: &str) -> Result<String, SdkError> {
    let mut mac = HmacSha384::new_from_slice(secret.as_bytes()).map_err(key_error)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// `Basic base64(key:secret)`.
pub fn basic_auth(api_key: &str, secret: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{}:{}", api_key, secret)))
}

pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}
