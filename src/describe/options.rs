//! Immutable adapter tunables.
//!
//! An adapter receives its [`Options`] at construction. Call sites that need a
//! different value build an override set and [`Options::merge`] it, which
//! returns a new value and leaves the original untouched.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::shared::{MarginMode, MarketType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub default_type: Option<MarketType>,
    pub default_margin_mode: Option<MarginMode>,
    /// Unified network code to exchange network id (`"TRC20" -> "TRX"`).
    pub networks: BTreeMap<String, String>,
    pub default_network: Option<String>,
    /// Account the adapter targets when an endpoint distinguishes several.
    pub account_type: Option<String>,
    /// Adapter-specific keys with no dedicated field.
    pub extra: Map<String, Value>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// `other` layered over `self`: present scalars replace, maps are unioned
    /// with `other`'s entries winning.
    pub fn merge(&self, other: &Options) -> Options {
        let mut networks = self.networks.clone();
        networks.extend(other.networks.iter().map(|(k, v)| (k.clone(), v.clone())));
        let mut extra = self.extra.clone();
        extra.extend(other.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Options {
            default_type: other.default_type.or(self.default_type),
            default_margin_mode: other.default_margin_mode.or(self.default_margin_mode),
            networks,
            default_network: other
                .default_network
                .clone()
                .or_else(|| self.default_network.clone()),
            account_type: other
                .account_type
                .clone()
                .or_else(|| self.account_type.clone()),
            extra,
        }
    }

    pub fn with_default_type(mut self, market_type: MarketType) -> Self {
        self.default_type = Some(market_type);
        self
    }

    pub fn with_default_margin_mode(mut self, mode: MarginMode) -> Self {
        self.default_margin_mode = Some(mode);
        self
    }

    pub fn with_network(mut self, code: &str, id: &str) -> Self {
        self.networks.insert(code.to_string(), id.to_string());
        self
    }

    pub fn with_default_network(mut self, code: &str) -> Self {
        self.default_network = Some(code.to_string());
        self
    }

    pub fn with_account_type(mut self, account: &str) -> Self {
        self.account_type = Some(account.to_string());
        self
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Exchange network id for a unified code; unknown codes pass through.
    pub fn network_code_to_id(&self, code: &str) -> String {
        let upper = code.to_uppercase();
        self.networks.get(&upper).cloned().unwrap_or(upper)
    }

    /// Unified network code for an exchange network id; unknown ids pass through.
    pub fn network_id_to_code(&self, id: &str) -> String {
        self.networks
            .iter()
            .find(|(_, v)| v.eq_ignore_ascii_case(id))
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| id.to_uppercase())
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key)?.as_str()
    }
}
