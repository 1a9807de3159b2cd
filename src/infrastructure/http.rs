use crate::config::RateSettings;
use crate::domain::currency::CurrencyCode;
use crate::domain::ports::{CryptoPriceSource, ForexSource};
use crate::error::{KonvertError, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Builds the HTTP client shared by both rate sources.
pub fn build_client(settings: &RateSettings) -> Result<Client> {
    Client::builder()
        .timeout(settings.timeout)
        .user_agent(concat!("konvert/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(KonvertError::from)
}

#[derive(Debug, Deserialize)]
struct ForexResponse {
    rates: HashMap<String, Decimal>,
}

#[derive(Debug, Deserialize)]
struct CoinPrice {
    usd: Decimal,
}

/// Forex rates from an exchangerate-api style endpoint (`{ "rates": { .. } }`).
#[derive(Debug, Clone)]
pub struct HttpForexSource {
    client: Client,
    url: String,
}

impl HttpForexSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ForexSource for HttpForexSource {
    async fn usd_rates(&self) -> Result<HashMap<String, Decimal>> {
        debug!(url = %self.url, "fetching forex rates");
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_forex(&body)
    }
}

/// Crypto USD prices from a CoinGecko style `simple/price` endpoint.
#[derive(Debug, Clone)]
pub struct HttpCryptoPriceSource {
    client: Client,
    url: String,
}

impl HttpCryptoPriceSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    fn request_url(&self, coins: &[CurrencyCode]) -> String {
        let ids: Vec<&str> = coins.iter().filter_map(|coin| coin.info().coin_id).collect();
        format!("{}?ids={}&vs_currencies=usd", self.url, ids.join(","))
    }
}

#[async_trait]
impl CryptoPriceSource for HttpCryptoPriceSource {
    async fn usd_prices(&self, coins: &[CurrencyCode]) -> Result<HashMap<CurrencyCode, Decimal>> {
        let url = self.request_url(coins);
        debug!(%url, "fetching crypto prices");
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_prices(&body)
    }
}

fn parse_forex(body: &str) -> Result<HashMap<String, Decimal>> {
    let response: ForexResponse = serde_json::from_str(body)
        .map_err(|e| KonvertError::MalformedResponse(format!("forex body: {e}")))?;
    Ok(response.rates)
}

/// Coin ids outside the catalog are dropped.
fn parse_prices(body: &str) -> Result<HashMap<CurrencyCode, Decimal>> {
    let response: HashMap<String, CoinPrice> = serde_json::from_str(body)
        .map_err(|e| KonvertError::MalformedResponse(format!("crypto body: {e}")))?;
    Ok(response
        .into_iter()
        .filter_map(|(id, price)| CurrencyCode::from_coin_id(&id).map(|code| (code, price.usd)))
        .collect())
}
