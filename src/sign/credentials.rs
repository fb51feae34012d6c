//! API credentials and the per-credential nonce source.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::describe::RequiredCredentials;
use crate::error::{ErrorKind, ExchangeError};
use crate::shared::time::Clock;

/// Keys for private endpoints. `Debug` never prints the secrets.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub secret: Option<String>,
    /// Passphrase, for exchanges that issue one with the key.
    pub password: Option<String>,
    pub uid: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            secret: Some(secret.into()),
            password: None,
            uid: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Read `<PREFIX>_API_KEY`, `<PREFIX>_SECRET`, `<PREFIX>_PASSWORD` and
    /// `<PREFIX>_UID`. Unset variables stay `None`.
    pub fn from_env(prefix: &str) -> Self {
        let var = |name: &str| {
            std::env::var(format!("{}_{}", prefix, name))
                .ok()
                .filter(|v| !v.is_empty())
        };
        Self {
            api_key: var("API_KEY"),
            secret: var("SECRET"),
            password: var("PASSWORD"),
            uid: var("UID"),
        }
    }

    /// Fail with `AuthenticationError` when a required field is missing.
    pub fn require(&self, required: &RequiredCredentials, exchange: &str) -> Result<(), ExchangeError> {
        let checks = [
            (required.api_key, &self.api_key, "apiKey"),
            (required.secret, &self.secret, "secret"),
            (required.password, &self.password, "password"),
        ];
        for (needed, value, name) in checks {
            if needed && value.as_deref().map_or(true, str::is_empty) {
                return Err(ExchangeError::new(
                    ErrorKind::AuthenticationError,
                    exchange,
                    format!("requires \"{}\" credential", name),
                ));
            }
        }
        Ok(())
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    pub fn secret(&self) -> &str {
        self.secret.as_deref().unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &redact(&self.secret))
            .field("password", &redact(&self.password))
            .field("uid", &self.uid)
            .finish()
    }
}

/// Millisecond nonces that never go backwards for one credential set.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicI64,
}

impl NonceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the clock once and return `max(now, last issued)`.
    pub fn next(&self, clock: &dyn Clock) -> i64 {
        let now = clock.milliseconds();
        let previous = self.last.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::time::FixedClock;

    #[test]
    fn test_require_reports_missing_field() {
        let required = RequiredCredentials { api_key: true, secret: true, password: true };
        let creds = Credentials::new("key", "secret");
        let err = creds.require(&required, "blofin").unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationError);
        assert!(err.message.contains("password"));
        assert!(creds.clone().with_password("pw").require(&required, "blofin").is_ok());
        assert!(Credentials::new("", "s")
            .require(&RequiredCredentials::key_and_secret(), "kuna")
            .is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let printed = format!("{:?}", Credentials::new("key", "hunter2"));
        assert!(printed.contains("key"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_nonce_never_decreases() {
        let nonces = NonceSource::new();
        assert_eq!(nonces.next(&FixedClock(1000)), 1000);
        assert_eq!(nonces.next(&FixedClock(900)), 1000);
        assert_eq!(nonces.next(&FixedClock(1001)), 1001);
    }

    #[test]
    fn test_from_env_reads_prefixed_vars() {
        std::env::set_var("NORMALIZER_TEST_API_KEY", "k");
        std::env::set_var("NORMALIZER_TEST_SECRET", "s");
        let creds = Credentials::from_env("NORMALIZER_TEST");
        assert_eq!(creds.api_key(), "k");
        assert_eq!(creds.secret(), "s");
        assert_eq!(creds.password, None);
    }
}
