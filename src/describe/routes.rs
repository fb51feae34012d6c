//! Endpoint route table: `(api, verb, path template) -> cost`.
//!
//! Path templates use `{name}` placeholders substituted from call parameters.
//! The cost is the relative weight the rate limiter charges for one call.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::shared::safe;

/// API namespace a route belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Api {
    Public,
    Private,
}

impl Api {
    pub fn as_str(&self) -> &'static str {
        match self {
            Api::Public => "public",
            Api::Private => "private",
        }
    }
}

/// HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route weights keyed by namespace, verb and path template.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<(Api, Verb, &'static str), u32>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register several paths with their costs under one namespace and verb.
    pub fn routes(mut self, api: Api, verb: Verb, paths: &[(&'static str, u32)]) -> Self {
        for (path, cost) in paths {
            self.routes.insert((api, verb, *path), *cost);
        }
        self
    }

    /// Cost of a declared route; undeclared routes cost 1.
    pub fn cost(&self, api: Api, verb: Verb, path: &str) -> u32 {
        self.routes
            .iter()
            .find(|((a, v, p), _)| *a == api && *v == verb && *p == path)
            .map(|(_, cost)| *cost)
            .unwrap_or(1)
    }

    pub fn contains(&self, api: Api, verb: Verb, path: &str) -> bool {
        self.routes
            .keys()
            .any(|(a, v, p)| *a == api && *v == verb && *p == path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Placeholder names in template order: `"orders/{id}"` gives `["id"]`.
pub fn extract_params(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        names.push(after[..end].to_string());
        rest = &after[end + 1..];
    }
    names
}

/// Substitute every `{name}` in `path` from `params`.
///
/// Returns the name of the first placeholder with no usable value.
pub fn implode_params(path: &str, params: &Map<String, Value>) -> Result<String, String> {
    let mut result = path.to_string();
    for name in extract_params(path) {
        let value = params
            .get(&name)
            .and_then(safe::value_to_string)
            .ok_or_else(|| name.clone())?;
        result = result.replace(&format!("{{{}}}", name), &value);
    }
    Ok(result)
}

/// `params` without the keys consumed by `path`'s placeholders.
pub fn omit_path_params(path: &str, params: &Map<String, Value>) -> Map<String, Value> {
    let consumed = extract_params(path);
    params
        .iter()
        .filter(|(k, _)| !consumed.iter().any(|c| c == *k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_extract_params() {
        assert_eq!(extract_params("orders/{id}"), vec!["id"]);
        assert_eq!(
            extract_params("order/details/{id}?withTrades={withTrades}"),
            vec!["id", "withTrades"]
        );
        assert!(extract_params("markets/getAll").is_empty());
    }

    #[test]
    fn test_implode_params() {
        let params = bag(json!({"pairs": "BTC_USDT", "level": 5}));
        assert_eq!(
            implode_params("order/book/{pairs}", &params).unwrap(),
            "order/book/BTC_USDT"
        );
        assert_eq!(implode_params("getorder/{orderId}", &params), Err("orderId".to_string()));
    }

    #[test]
    fn test_omit_path_params() {
        let params = bag(json!({"pairs": "BTC_USDT", "level": 5}));
        let rest = omit_path_params("order/book/{pairs}", &params);
        assert_eq!(rest.len(), 1);
        assert!(rest.contains_key("level"));
    }

    #[test]
    fn test_route_cost_defaults_to_one() {
        let table = RouteTable::new()
            .routes(Api::Public, Verb::Get, &[("market/candles", 2), ("tickers", 1)]);
        assert_eq!(table.cost(Api::Public, Verb::Get, "market/candles"), 2);
        assert_eq!(table.cost(Api::Private, Verb::Get, "market/candles"), 1);
        assert!(table.contains(Api::Public, Verb::Get, "tickers"));
        assert_eq!(table.len(), 2);
    }
}
