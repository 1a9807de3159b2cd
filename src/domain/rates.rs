use crate::domain::currency::CurrencyCode;
use crate::error::{ConversionError, KonvertError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Where a rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateOrigin {
    Live,
    Fallback,
}

/// Units of each currency per 1 USD.
///
/// `USD` is always present with a rate of exactly 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<CurrencyCode, Decimal>,
    origin: RateOrigin,
    fetched_at: DateTime<Utc>,
}

impl RateTable {
    pub fn new(
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
        origin: RateOrigin,
    ) -> Self {
        let mut rates: BTreeMap<_, _> = rates.into_iter().collect();
        rates.insert(CurrencyCode::Usd, Decimal::ONE);
        Self {
            rates,
            origin,
            fetched_at: Utc::now(),
        }
    }

    /// Static table used whenever live rates cannot be fetched.
    pub fn fallback() -> Self {
        Self::new(
            [
                (CurrencyCode::Eur, dec!(0.92)),
                (CurrencyCode::Gbp, dec!(0.79)),
                (CurrencyCode::Jpy, dec!(148.41)),
                (CurrencyCode::Hkd, dec!(7.82)),
                (CurrencyCode::Php, dec!(55.67)),
                (CurrencyCode::Btc, dec!(0.000023)),
                (CurrencyCode::Eth, dec!(0.00037)),
                (CurrencyCode::Sol, dec!(0.0137)),
                (CurrencyCode::Aud, dec!(1.52)),
                (CurrencyCode::Cad, dec!(1.35)),
                (CurrencyCode::Chf, dec!(0.88)),
            ],
            RateOrigin::Fallback,
        )
    }

    /// Merge a forex quote (code -> units per USD) with crypto USD prices.
    ///
    /// Codes outside the catalog are skipped. Crypto entries are stored as
    /// `1 / price`; a non-positive price or forex rate makes the response
    /// malformed.
    pub fn from_quotes(
        forex: &HashMap<String, Decimal>,
        crypto_prices: &HashMap<CurrencyCode, Decimal>,
    ) -> Result<Self> {
        let mut rates = BTreeMap::new();

        for (code, rate) in forex {
            let Ok(code) = code.parse::<CurrencyCode>() else {
                continue;
            };
            if code.is_crypto() {
                continue;
            }
            if *rate <= Decimal::ZERO {
                return Err(KonvertError::MalformedResponse(format!(
                    "non-positive forex rate {rate} for {code}"
                )));
            }
            rates.insert(code, *rate);
        }

        for code in CurrencyCode::crypto() {
            let price = crypto_prices.get(&code).ok_or_else(|| {
                KonvertError::MalformedResponse(format!("missing USD price for {code}"))
            })?;
            if *price <= Decimal::ZERO {
                return Err(KonvertError::MalformedResponse(format!(
                    "non-positive USD price {price} for {code}"
                )));
            }
            let rate = Decimal::ONE.checked_div(*price).ok_or_else(|| {
                KonvertError::MalformedResponse(format!(
                    "USD price {price} for {code} out of range"
                ))
            })?;
            rates.insert(code, rate);
        }

        debug!(currencies = rates.len(), "merged rate quotes");
        Ok(Self::new(rates, RateOrigin::Live))
    }

    /// The same rates, relabelled with another origin.
    pub fn with_origin(mut self, origin: RateOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn get(&self, code: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&code).copied()
    }

    pub fn origin(&self) -> RateOrigin {
        self.origin
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CurrencyCode, Decimal)> + '_ {
        self.rates.iter().map(|(code, rate)| (*code, *rate))
    }

    fn rate(&self, code: CurrencyCode) -> std::result::Result<Decimal, ConversionError> {
        match self.rates.get(&code) {
            Some(rate) if rate.is_zero() => Err(ConversionError::ZeroRate(code)),
            Some(rate) => Ok(*rate),
            None => Err(ConversionError::MissingRate(code)),
        }
    }
}

/// Convert `amount` from one currency to another through USD, rounded to the
/// target currency's precision.
pub fn convert(
    amount: Decimal,
    from: CurrencyCode,
    to: CurrencyCode,
    rates: &RateTable,
) -> std::result::Result<Decimal, ConversionError> {
    let from_rate = rates.rate(from)?;
    let to_rate = rates.rate(to)?;
    let usd = amount
        .checked_div(from_rate)
        .ok_or(ConversionError::Overflow)?;
    let converted = usd.checked_mul(to_rate).ok_or(ConversionError::Overflow)?;
    Ok(converted.round_dp_with_strategy(to.precision(), RoundingStrategy::MidpointAwayFromZero))
}
