//! Pure, in-memory state of the calculator and the converter.

pub mod calculator;
pub mod converter;
pub mod currency;
pub mod expression;
pub mod format;
pub mod history;
pub mod ports;
pub mod rates;
