//! Multi-currency converter state.
//!
//! A converter is an ordered list of [`CurrencyRow`]s. Row 0 is the base row;
//! every other row is derived from it through the current [`RateTable`].

use crate::domain::currency::{CATALOG, CurrencyCode, CurrencyInfo};
use crate::domain::format::strip_separators;
use crate::domain::rates::{RateTable, convert};
use crate::error::ConverterError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Maximum number of rows a converter holds, base row included.
pub const DEFAULT_MAX_ROWS: usize = 10;

pub const BASE_ROW: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RowId(String);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyRow {
    pub id: RowId,
    pub currency: CurrencyCode,
    pub amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct Converter {
    rows: Vec<CurrencyRow>,
    rates: RateTable,
    next_id: u64,
    max_rows: usize,
}

impl Converter {
    /// A converter showing 1 USD in EUR, the initial state of the widget.
    pub fn new(rates: RateTable) -> Self {
        Self::with_rows(CurrencyCode::Usd, Decimal::ONE, &[CurrencyCode::Eur], rates)
    }

    /// Build a converter from a base row and derived currencies.
    ///
    /// Targets repeating the base currency or each other are skipped, as are
    /// targets beyond [`DEFAULT_MAX_ROWS`].
    pub fn with_rows(
        base: CurrencyCode,
        amount: Decimal,
        targets: &[CurrencyCode],
        rates: RateTable,
    ) -> Self {
        let mut converter = Self {
            rows: Vec::new(),
            rates,
            next_id: 0,
            max_rows: DEFAULT_MAX_ROWS,
        };
        converter.push_row(base, amount);
        for &target in targets {
            if converter.rows.len() < converter.max_rows && !converter.contains(target) {
                converter.push_row(target, Decimal::ZERO);
            }
        }
        converter.recompute_derived(None);
        converter
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    pub fn rows(&self) -> &[CurrencyRow] {
        &self.rows
    }

    pub fn base(&self) -> &CurrencyRow {
        &self.rows[BASE_ROW]
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn contains(&self, code: CurrencyCode) -> bool {
        self.rows.iter().any(|row| row.currency == code)
    }

    /// Set the base amount and recompute every derived row.
    pub fn set_base_amount(&mut self, amount: Decimal) -> Result<(), ConverterError> {
        if amount < Decimal::ZERO {
            return Err(ConverterError::NegativeAmount);
        }
        self.rows[BASE_ROW].amount = amount;
        self.recompute_derived(None);
        Ok(())
    }

    /// Parse user text (thousands separators allowed) as the new base amount.
    ///
    /// Unparsable text leaves the converter untouched.
    pub fn set_base_amount_str(&mut self, text: &str) -> Result<(), ConverterError> {
        let amount = parse_amount(text)?;
        self.set_base_amount(amount)
    }

    /// Edit a derived row directly; the base is reverse-computed from it and
    /// the remaining derived rows follow the new base.
    ///
    /// The edited row keeps the amount exactly as entered.
    pub fn set_derived_amount(
        &mut self,
        index: usize,
        amount: Decimal,
    ) -> Result<(), ConverterError> {
        if index == BASE_ROW {
            return Err(ConverterError::BaseRowNotDerived);
        }
        let row = self.rows.get(index).ok_or(ConverterError::NoSuchRow(index))?;
        if amount < Decimal::ZERO {
            return Err(ConverterError::NegativeAmount);
        }

        let base_amount = convert(amount, row.currency, self.base().currency, &self.rates)?;
        self.rows[index].amount = amount;
        self.rows[BASE_ROW].amount = base_amount;
        self.recompute_derived(Some(index));
        Ok(())
    }

    /// Change the currency of a row.
    ///
    /// Changing the base currency recomputes all derived rows from the
    /// unchanged base amount. Changing a derived row's currency keeps its
    /// amount until the next recomputation.
    pub fn set_currency(&mut self, index: usize, code: CurrencyCode) -> Result<(), ConverterError> {
        let current = self
            .rows
            .get(index)
            .ok_or(ConverterError::NoSuchRow(index))?
            .currency;
        if current == code {
            return Ok(());
        }
        if self.contains(code) {
            return Err(ConverterError::DuplicateCurrency(code));
        }

        self.rows[index].currency = code;
        if index == BASE_ROW {
            self.recompute_derived(None);
        }
        Ok(())
    }

    /// Append a row for the first catalog currency not shown yet.
    ///
    /// Returns `None` when every currency is shown or the row limit is reached.
    pub fn add_row(&mut self) -> Option<&CurrencyRow> {
        if self.rows.len() >= self.max_rows {
            return None;
        }
        let code = CurrencyCode::all().find(|code| !self.contains(*code))?;
        self.push_row(code, Decimal::ZERO);

        let index = self.rows.len() - 1;
        self.recompute_row(index);
        self.rows.last()
    }

    pub fn remove_row(&mut self, index: usize) -> Result<CurrencyRow, ConverterError> {
        if index == BASE_ROW {
            return Err(ConverterError::BaseRowLocked);
        }
        if index >= self.rows.len() {
            return Err(ConverterError::NoSuchRow(index));
        }
        Ok(self.rows.remove(index))
    }

    /// Swap in a fresh rate table and recompute every derived row.
    pub fn apply_rates(&mut self, rates: RateTable) {
        self.rates = rates;
        self.recompute_derived(None);
    }

    /// Currencies a row may switch to: the whole catalog for the base row,
    /// everything but the base currency for derived rows.
    pub fn available_currencies(&self, index: usize) -> Vec<&'static CurrencyInfo> {
        let base = self.base().currency;
        CATALOG
            .iter()
            .filter(|info| index == BASE_ROW || info.code != base)
            .collect()
    }

    fn push_row(&mut self, currency: CurrencyCode, amount: Decimal) {
        self.next_id += 1;
        self.rows.push(CurrencyRow {
            id: RowId(format!("row-{}", self.next_id)),
            currency,
            amount,
        });
    }

    fn recompute_derived(&mut self, skip: Option<usize>) {
        for index in 1..self.rows.len() {
            if Some(index) != skip {
                self.recompute_row(index);
            }
        }
    }

    /// A row whose conversion fails keeps its previous amount.
    fn recompute_row(&mut self, index: usize) {
        let base = &self.rows[BASE_ROW];
        let target = self.rows[index].currency;
        match convert(base.amount, base.currency, target, &self.rates) {
            Ok(amount) => self.rows[index].amount = amount,
            Err(err) => warn!(%err, row = index, currency = %target, "keeping stale amount"),
        }
    }
}

/// Parse an amount as typed by a user: separators allowed, surrounding
/// whitespace ignored.
pub fn parse_amount(text: &str) -> Result<Decimal, ConverterError> {
    let cleaned = strip_separators(text.trim());
    Decimal::from_str(&cleaned).map_err(|_| ConverterError::InvalidAmount(text.to_string()))
}
