//! Per-operation capability flags.

use std::collections::BTreeMap;

/// Whether an adapter implements a unified operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Has {
    Supported,
    Unsupported,
    /// Implemented client-side by composing other calls.
    Emulated,
}

impl Has {
    pub fn is_available(&self) -> bool {
        !matches!(self, Has::Unsupported)
    }
}

impl From<bool> for Has {
    fn from(value: bool) -> Self {
        if value {
            Has::Supported
        } else {
            Has::Unsupported
        }
    }
}

/// Operation name (`"fetchTicker"`) to [`Has`]. Absent names are unsupported.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    flags: BTreeMap<&'static str, Has>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every listed operation as supported.
    pub fn supported(mut self, operations: &[&'static str]) -> Self {
        for op in operations {
            self.flags.insert(op, Has::Supported);
        }
        self
    }

    pub fn emulated(mut self, operations: &[&'static str]) -> Self {
        for op in operations {
            self.flags.insert(op, Has::Emulated);
        }
        self
    }

    pub fn set(mut self, operation: &'static str, has: Has) -> Self {
        self.flags.insert(operation, has);
        self
    }

    pub fn get(&self, operation: &str) -> Has {
        self.flags
            .get(operation)
            .copied()
            .unwrap_or(Has::Unsupported)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Has)> + '_ {
        self.flags.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_operation_is_unsupported() {
        let has = Capabilities::new()
            .supported(&["fetchTicker"])
            .emulated(&["fetchTradingFees"])
            .set("fetchPositions", false.into());
        assert_eq!(has.get("fetchTicker"), Has::Supported);
        assert_eq!(has.get("fetchTradingFees"), Has::Emulated);
        assert!(has.get("fetchTradingFees").is_available());
        assert_eq!(has.get("fetchPositions"), Has::Unsupported);
        assert_eq!(has.get("fetchOHLCV"), Has::Unsupported);
    }
}
