#![allow(dead_code)]

use konvert::domain::calculator::{Calculator, Input};
use konvert::domain::currency::CurrencyCode;
use konvert::infrastructure::fixed::FixedRates;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Quotes that merge into a table with round numbers.
pub fn fixed_rates() -> FixedRates {
    FixedRates::new(
        HashMap::from([
            ("EUR".to_string(), dec!(0.5)),
            ("JPY".to_string(), dec!(150)),
        ]),
        HashMap::from([
            (CurrencyCode::Btc, dec!(50000)),
            (CurrencyCode::Eth, dec!(2000)),
            (CurrencyCode::Sol, dec!(100)),
        ]),
    )
}

/// Type `text` into a fresh calculator one key at a time.
pub fn typed(text: &str) -> Calculator {
    let mut calculator = Calculator::new();
    press(&mut calculator, text);
    calculator
}

pub fn press(calculator: &mut Calculator, text: &str) {
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        let input = Input::from_key(c.encode_utf8(&mut [0; 4])).unwrap();
        calculator.apply(input);
    }
}

/// The numeric value shown on the display.
pub fn display_value(calculator: &Calculator) -> Decimal {
    calculator.display().replace(',', "").parse().unwrap()
}
