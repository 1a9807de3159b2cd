//! Runtime settings for rate acquisition.

use crate::error::{KonvertError, Result};
use std::time::Duration;

pub const DEFAULT_CRYPTO_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_FOREX_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";
pub const DEFAULT_REFRESH_SECS: u64 = 5 * 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSettings {
    /// Crypto price endpoint; coin ids and the quote currency are appended as a query.
    pub crypto_url: String,
    /// Forex endpoint returning every rate relative to USD.
    pub forex_url: String,
    pub refresh_interval: Duration,
    /// Per-request timeout for both services.
    pub timeout: Duration,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            crypto_url: DEFAULT_CRYPTO_URL.to_string(),
            forex_url: DEFAULT_FOREX_URL.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RateSettings {
    pub fn validate(&self) -> Result<()> {
        for url in [&self.crypto_url, &self.forex_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(KonvertError::ValidationError(format!(
                    "'{url}' is not an http(s) URL"
                )));
            }
        }
        if self.refresh_interval.is_zero() {
            return Err(KonvertError::ValidationError(
                "refresh interval must be positive".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(KonvertError::ValidationError(
                "request timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
