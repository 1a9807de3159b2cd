use crate::domain::currency::CurrencyCode;
use crate::domain::ports::{CryptoPriceSource, ForexSource};
use crate::domain::rates::RateTable;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Rate sources answering from fixed in-memory quotes.
///
/// Serves both ports, so one value (or two clones of it) can stand in for the
/// HTTP services when running offline or under test.
#[derive(Debug, Default, Clone)]
pub struct FixedRates {
    forex: HashMap<String, Decimal>,
    prices: HashMap<CurrencyCode, Decimal>,
}

impl FixedRates {
    /// Creates a source from forex rates (code -> units per USD) and crypto USD prices.
    pub fn new(forex: HashMap<String, Decimal>, prices: HashMap<CurrencyCode, Decimal>) -> Self {
        Self { forex, prices }
    }

    /// Quotes that reproduce `table` once merged again.
    pub fn from_table(table: &RateTable) -> Self {
        let mut forex = HashMap::new();
        let mut prices = HashMap::new();
        for (code, rate) in table.iter() {
            if code.is_crypto() {
                if let Some(price) = Decimal::ONE.checked_div(rate) {
                    prices.insert(code, price);
                }
            } else {
                forex.insert(code.as_str().to_string(), rate);
            }
        }
        Self { forex, prices }
    }
}

#[async_trait]
impl ForexSource for FixedRates {
    async fn usd_rates(&self) -> Result<HashMap<String, Decimal>> {
        Ok(self.forex.clone())
    }
}

#[async_trait]
impl CryptoPriceSource for FixedRates {
    async fn usd_prices(&self, coins: &[CurrencyCode]) -> Result<HashMap<CurrencyCode, Decimal>> {
        Ok(coins
            .iter()
            .filter_map(|coin| self.prices.get(coin).map(|price| (*coin, *price)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rates::convert;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fixed_rates_answer_both_ports() {
        let source = FixedRates::new(
            HashMap::from([("EUR".to_string(), dec!(0.9))]),
            HashMap::from([(CurrencyCode::Btc, dec!(40000))]),
        );

        let forex = source.usd_rates().await.unwrap();
        assert_eq!(forex.get("EUR"), Some(&dec!(0.9)));

        let prices = source
            .usd_prices(&[CurrencyCode::Btc, CurrencyCode::Eth])
            .await
            .unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get(&CurrencyCode::Btc), Some(&dec!(40000)));
    }

    #[tokio::test]
    async fn test_from_table_round_trips_fallback() {
        let fallback = RateTable::fallback();
        let source = FixedRates::from_table(&fallback);

        let forex = source.usd_rates().await.unwrap();
        let prices = source
            .usd_prices(&CurrencyCode::crypto().collect::<Vec<_>>())
            .await
            .unwrap();
        let merged = RateTable::from_quotes(&forex, &prices).unwrap();

        for code in CurrencyCode::all() {
            assert_eq!(
                convert(dec!(1000), CurrencyCode::Usd, code, &merged),
                convert(dec!(1000), CurrencyCode::Usd, code, &fallback),
                "{code}"
            );
        }
    }
}
