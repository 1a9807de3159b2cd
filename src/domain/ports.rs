use super::currency::CurrencyCode;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Supplies fiat exchange rates relative to USD, keyed by currency code.
#[async_trait]
pub trait ForexSource: Send + Sync {
    async fn usd_rates(&self) -> Result<HashMap<String, Decimal>>;
}

/// Supplies the USD price of each requested cryptocurrency.
#[async_trait]
pub trait CryptoPriceSource: Send + Sync {
    async fn usd_prices(&self, coins: &[CurrencyCode]) -> Result<HashMap<CurrencyCode, Decimal>>;
}

pub type ForexSourceBox = Box<dyn ForexSource>;
pub type CryptoPriceSourceBox = Box<dyn CryptoPriceSource>;
