use crate::domain::currency::CurrencyCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KonvertError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Malformed rate response: {0}")]
    MalformedResponse(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, KonvertError>;

/// Reasons an arithmetic expression could not be reduced to a number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },
    #[error("expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("expression nested too deeply")]
    TooDeep,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result out of range")]
    Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("no rate for {0}")]
    MissingRate(CurrencyCode),
    #[error("rate for {0} is zero")]
    ZeroRate(CurrencyCode),
    #[error("converted amount out of range")]
    Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConverterError {
    #[error("row {0} does not exist")]
    NoSuchRow(usize),
    #[error("the base row cannot be removed")]
    BaseRowLocked,
    #[error("the base amount is set through the base row, not as a derived amount")]
    BaseRowNotDerived,
    #[error("{0} is already shown in another row")]
    DuplicateCurrency(CurrencyCode),
    #[error("amount must not be negative")]
    NegativeAmount,
    #[error("'{0}' is not a valid amount")]
    InvalidAmount(String),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}
