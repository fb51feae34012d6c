//! Exact and broad error-code tables.

use std::collections::HashMap;

use crate::error::ErrorKind;

/// Native error code/message to taxonomy kind.
///
/// `exact` matches the whole code or message. `broad` matches substrings of the
/// message in declaration order; the first hit wins.
#[derive(Debug, Clone, Default)]
pub struct ExceptionTable {
    exact: HashMap<String, ErrorKind>,
    broad: Vec<(String, ErrorKind)>,
}

impl ExceptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact(mut self, entries: &[(&str, ErrorKind)]) -> Self {
        for (key, kind) in entries {
            self.exact.insert(key.to_string(), *kind);
        }
        self
    }

    pub fn broad(mut self, entries: &[(&str, ErrorKind)]) -> Self {
        self.broad
            .extend(entries.iter().map(|(needle, kind)| (needle.to_string(), *kind)));
        self
    }

    pub fn match_exact(&self, key: &str) -> Option<ErrorKind> {
        self.exact.get(key).copied()
    }

    pub fn match_broad(&self, message: &str) -> Option<ErrorKind> {
        self.broad
            .iter()
            .find(|(needle, _)| message.contains(needle.as_str()))
            .map(|(_, kind)| *kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broad_first_match_wins() {
        let table = ExceptionTable::new().broad(&[
            ("Order already canceled", ErrorKind::InvalidOrder),
            ("already", ErrorKind::ExchangeError),
        ]);
        assert_eq!(
            table.match_broad("Order already canceled by user"),
            Some(ErrorKind::InvalidOrder)
        );
        assert_eq!(table.match_broad("already done"), Some(ErrorKind::ExchangeError));
        assert_eq!(table.match_broad("nothing"), None);
    }

    #[test]
    fn test_exact_requires_whole_key() {
        let table = ExceptionTable::new().exact(&[("152002", ErrorKind::BadRequest)]);
        assert_eq!(table.match_exact("152002"), Some(ErrorKind::BadRequest));
        assert_eq!(table.match_exact("1520"), None);
    }
}
