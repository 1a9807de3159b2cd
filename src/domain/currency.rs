use crate::error::{KonvertError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies the converter knows about, fiat and crypto alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Hkd,
    Php,
    Btc,
    Eth,
    Sol,
    Aud,
    Cad,
    Chf,
}

/// Static metadata attached to a currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: CurrencyCode,
    pub label: &'static str,
    pub is_crypto: bool,
    /// Identifier used by the crypto price service, if any.
    pub coin_id: Option<&'static str>,
    pub aliases: &'static [&'static str],
}

/// The catalog, in the order rows are offered when one is added.
pub const CATALOG: [CurrencyInfo; 12] = [
    CurrencyInfo {
        code: CurrencyCode::Usd,
        label: "US Dollar (USD)",
        is_crypto: false,
        coin_id: None,
        aliases: &["dollar", "$", "greenback"],
    },
    CurrencyInfo {
        code: CurrencyCode::Eur,
        label: "Euro (EUR)",
        is_crypto: false,
        coin_id: None,
        aliases: &["euro", "€"],
    },
    CurrencyInfo {
        code: CurrencyCode::Gbp,
        label: "British Pound (GBP)",
        is_crypto: false,
        coin_id: None,
        aliases: &["pound", "sterling", "£"],
    },
    CurrencyInfo {
        code: CurrencyCode::Jpy,
        label: "Japanese Yen (JPY)",
        is_crypto: false,
        coin_id: None,
        aliases: &["yen", "¥"],
    },
    CurrencyInfo {
        code: CurrencyCode::Hkd,
        label: "Hong Kong Dollar (HKD)",
        is_crypto: false,
        coin_id: None,
        aliases: &["hong kong"],
    },
    CurrencyInfo {
        code: CurrencyCode::Php,
        label: "Philippine Peso (PHP)",
        is_crypto: false,
        coin_id: None,
        aliases: &["peso", "₱"],
    },
    CurrencyInfo {
        code: CurrencyCode::Btc,
        label: "Bitcoin (BTC)",
        is_crypto: true,
        coin_id: Some("bitcoin"),
        aliases: &["bitcoin", "xbt", "₿"],
    },
    CurrencyInfo {
        code: CurrencyCode::Eth,
        label: "Ethereum (ETH)",
        is_crypto: true,
        coin_id: Some("ethereum"),
        aliases: &["ethereum", "ether"],
    },
    CurrencyInfo {
        code: CurrencyCode::Sol,
        label: "Solana (SOL)",
        is_crypto: true,
        coin_id: Some("solana"),
        aliases: &["solana"],
    },
    CurrencyInfo {
        code: CurrencyCode::Aud,
        label: "Australian Dollar (AUD)",
        is_crypto: false,
        coin_id: None,
        aliases: &["aussie"],
    },
    CurrencyInfo {
        code: CurrencyCode::Cad,
        label: "Canadian Dollar (CAD)",
        is_crypto: false,
        coin_id: None,
        aliases: &["loonie"],
    },
    CurrencyInfo {
        code: CurrencyCode::Chf,
        label: "Swiss Franc (CHF)",
        is_crypto: false,
        coin_id: None,
        aliases: &["franc"],
    },
];

impl CurrencyCode {
    pub fn info(self) -> &'static CurrencyInfo {
        // CATALOG is declared in the same order as the enum variants.
        &CATALOG[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Hkd => "HKD",
            Self::Php => "PHP",
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Sol => "SOL",
            Self::Aud => "AUD",
            Self::Cad => "CAD",
            Self::Chf => "CHF",
        }
    }

    pub fn is_crypto(self) -> bool {
        self.info().is_crypto
    }

    /// Decimal places amounts in this currency are rounded to.
    pub fn precision(self) -> u32 {
        if self.is_crypto() { 8 } else { 2 }
    }

    pub fn from_coin_id(id: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|info| info.coin_id == Some(id))
            .map(|info| info.code)
    }

    pub fn all() -> impl Iterator<Item = CurrencyCode> {
        CATALOG.iter().map(|info| info.code)
    }

    pub fn crypto() -> impl Iterator<Item = CurrencyCode> {
        CATALOG
            .iter()
            .filter(|info| info.is_crypto)
            .map(|info| info.code)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts a code or one of its aliases, ignoring ASCII case.
impl FromStr for CurrencyCode {
    type Err = KonvertError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        CATALOG
            .iter()
            .find(|info| info.code.as_str().eq_ignore_ascii_case(wanted))
            .or_else(|| {
                CATALOG.iter().find(|info| {
                    info.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(wanted))
                })
            })
            .map(|info| info.code)
            .ok_or_else(|| KonvertError::ValidationError(format!("unknown currency code '{s}'")))
    }
}

/// Case-insensitive search over codes, labels and aliases.
///
/// An empty query matches the whole catalog.
pub fn search(query: &str) -> Vec<&'static CurrencyInfo> {
    let needle = query.trim().to_lowercase();
    CATALOG
        .iter()
        .filter(|info| {
            needle.is_empty()
                || info.code.as_str().to_lowercase().contains(&needle)
                || info.label.to_lowercase().contains(&needle)
                || info.aliases.iter().any(|alias| alias.contains(needle.as_str()))
        })
        .collect()
}
