//! Four-function calculator driven by key presses.
//!
//! The calculator owns a single display string built up by [`Input`]s. The
//! display always reads like `1,234 + 5.6 × 7`: operators are padded with
//! spaces, the number being typed carries thousands separators re-derived
//! after every keystroke, and two operators never follow each other.

use crate::domain::expression;
use crate::domain::format::{format_display, format_result, regroup, strip_separators};
use crate::domain::history::{History, HistoryItem};
use crate::error::EvalError;
use tracing::debug;

pub const INITIAL_DISPLAY: &str = "0";
pub const ERROR_DISPLAY: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

const OPERATORS: [Operator; 4] = [
    Operator::Add,
    Operator::Subtract,
    Operator::Multiply,
    Operator::Divide,
];

impl Operator {
    /// The operator as it appears on the display, padded with spaces.
    fn token(self) -> &'static str {
        match self {
            Self::Add => " + ",
            Self::Subtract => " - ",
            Self::Multiply => " × ",
            Self::Divide => " ÷ ",
        }
    }
}

/// A key press understood by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Digit(u8),
    DecimalPoint,
    Operator(Operator),
    Backspace,
    Clear,
    Evaluate,
    /// Load a history entry's expression back into the display.
    Recall(usize),
}

impl Input {
    /// Map a keyboard key name to an input.
    pub fn from_key(key: &str) -> Option<Self> {
        let input = match key {
            "Enter" | "Return" | "=" => Self::Evaluate,
            "Backspace" => Self::Backspace,
            "c" | "C" | "Clear" => Self::Clear,
            "." | "," => Self::DecimalPoint,
            "+" => Self::Operator(Operator::Add),
            "-" => Self::Operator(Operator::Subtract),
            "*" | "x" | "×" => Self::Operator(Operator::Multiply),
            "/" | "÷" => Self::Operator(Operator::Divide),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => Self::Digit(c as u8 - b'0'),
                    _ => return None,
                }
            }
        };
        Some(input)
    }
}

/// What an input did to the calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Updated,
    Ignored,
    Evaluated(HistoryItem),
    Failed(EvalError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calculator {
    display: String,
    last_operation: Option<String>,
    history: History,
    errored: bool,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            display: INITIAL_DISPLAY.to_string(),
            last_operation: None,
            history: History::new(),
            errored: false,
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// `"<expression> = <result>"` of the latest evaluation since the last clear.
    pub fn last_operation(&self) -> Option<&str> {
        self.last_operation.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_error(&self) -> bool {
        self.errored
    }

    /// Reducer form of [`Calculator::apply`].
    pub fn reduce(mut self, input: Input) -> Self {
        self.apply(input);
        self
    }

    pub fn apply(&mut self, input: Input) -> Transition {
        match input {
            Input::Digit(digit) => self.push_digit(digit),
            Input::DecimalPoint => self.push_decimal_point(),
            Input::Operator(op) => self.push_operator(op),
            Input::Backspace => self.backspace(),
            Input::Clear => {
                self.reset();
                self.last_operation = None;
                Transition::Updated
            }
            Input::Evaluate => self.evaluate(),
            Input::Recall(index) => self.recall(index),
        }
    }

    fn reset(&mut self) {
        self.display = INITIAL_DISPLAY.to_string();
        self.errored = false;
    }

    fn push_digit(&mut self, digit: u8) -> Transition {
        if digit > 9 {
            return Transition::Ignored;
        }
        let digit = char::from(b'0' + digit);

        if self.errored || self.display == INITIAL_DISPLAY {
            self.errored = false;
            self.display = digit.to_string();
            return Transition::Updated;
        }

        let start = current_number_start(&self.display);
        let raw = strip_separators(&self.display[start..]);
        let typed = if raw == "0" {
            digit.to_string()
        } else {
            format!("{raw}{digit}")
        };
        self.replace_current(start, &typed);
        Transition::Updated
    }

    fn push_decimal_point(&mut self) -> Transition {
        if self.errored {
            self.errored = false;
            self.display = "0.".to_string();
            return Transition::Updated;
        }

        let current = &self.display[current_number_start(&self.display)..];
        if current.contains('.') {
            return Transition::Ignored;
        }
        if current.is_empty() {
            self.display.push_str("0.");
        } else {
            self.display.push('.');
        }
        Transition::Updated
    }

    fn push_operator(&mut self, op: Operator) -> Transition {
        if self.errored || trailing_operator(&self.display).is_some() {
            return Transition::Ignored;
        }
        self.display.push_str(op.token());
        Transition::Updated
    }

    fn backspace(&mut self) -> Transition {
        if self.errored {
            self.reset();
            return Transition::Updated;
        }

        if let Some(op) = trailing_operator(&self.display) {
            let len = self.display.len() - op.token().len();
            self.display.truncate(len);
        } else {
            self.display.pop();
            let start = current_number_start(&self.display);
            let typed = self.display[start..].to_string();
            self.replace_current(start, &typed);
        }

        if self.display.is_empty() || self.display == "-" {
            self.reset();
        }
        Transition::Updated
    }

    fn evaluate(&mut self) -> Transition {
        if self.errored || !has_operator(&self.display) {
            return Transition::Ignored;
        }

        let expression = match trailing_operator(&self.display) {
            Some(op) => &self.display[..self.display.len() - op.token().len()],
            None => self.display.as_str(),
        }
        .to_string();
        let sanitized = sanitize(&expression);
        debug!(expression = %sanitized, "evaluating");

        match expression::evaluate(&sanitized) {
            Ok(value) => {
                let item = HistoryItem::new(expression, format_result(value));
                debug!(result = %item.result, "evaluated");
                self.last_operation = Some(item.to_string());
                self.display = format_display(value);
                self.history.push(item.clone());
                Transition::Evaluated(item)
            }
            Err(EvalError::DivisionByZero) => {
                self.display = ERROR_DISPLAY.to_string();
                self.errored = true;
                Transition::Failed(EvalError::DivisionByZero)
            }
            Err(err) => {
                debug!(%err, "evaluation abandoned");
                Transition::Ignored
            }
        }
    }

    fn recall(&mut self, index: usize) -> Transition {
        match self.history.get(index) {
            Some(item) => {
                self.display = item.expression.clone();
                self.errored = false;
                Transition::Updated
            }
            None => Transition::Ignored,
        }
    }

    fn replace_current(&mut self, start: usize, typed: &str) {
        let grouped = regroup(typed);
        self.display.truncate(start);
        self.display.push_str(&grouped);
    }
}

fn trailing_operator(display: &str) -> Option<Operator> {
    OPERATORS
        .into_iter()
        .find(|op| display.ends_with(op.token()))
}

fn has_operator(display: &str) -> bool {
    OPERATORS.iter().any(|op| display.contains(op.token()))
}

/// Byte offset where the number currently being typed begins.
fn current_number_start(display: &str) -> usize {
    OPERATORS
        .iter()
        .filter_map(|op| display.rfind(op.token()).map(|i| i + op.token().len()))
        .max()
        .unwrap_or(0)
}

/// Strip whitespace and separators and map the display glyphs to ASCII operators.
pub fn sanitize(expression: &str) -> String {
    expression
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c {
            '×' => '*',
            '÷' => '/',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(calc: &mut Calculator, keys: &str) {
        for key in keys.chars() {
            let input = Input::from_key(&key.to_string()).unwrap();
            calc.apply(input);
        }
    }

    fn typed(keys: &str) -> Calculator {
        let mut calc = Calculator::new();
        press(&mut calc, keys);
        calc
    }

    #[test]
    fn test_digit_replaces_initial_zero() {
        let calc = typed("7");
        assert_eq!(calc.display(), "7");

        let calc = typed("007");
        assert_eq!(calc.display(), "7");
    }

    #[test]
    fn test_thousands_separators_follow_typing() {
        let calc = typed("1234567");
        assert_eq!(calc.display(), "1,234,567");

        let calc = typed("1234.5678");
        assert_eq!(calc.display(), "1,234.5678");

        let calc = typed("12+34567");
        assert_eq!(calc.display(), "12 + 34,567");
    }

    #[test]
    fn test_decimal_point() {
        assert_eq!(typed(".").display(), "0.");
        assert_eq!(typed("1..5").display(), "1.5");
        assert_eq!(typed("1+.").display(), "1 + 0.");
        assert_eq!(typed("1.5+2.5").display(), "1.5 + 2.5");
    }

    #[test]
    fn test_double_operator_rejected() {
        let mut calc = typed("5+");
        assert_eq!(
            calc.apply(Input::Operator(Operator::Add)),
            Transition::Ignored
        );
        assert_eq!(calc.display(), "5 + ");
        assert_eq!(calc.display().matches(" + ").count(), 1);

        press(&mut calc, "*");
        assert_eq!(calc.display(), "5 + ");
    }

    #[test]
    fn test_backspace() {
        let mut calc = typed("12+");
        calc.apply(Input::Backspace);
        assert_eq!(calc.display(), "12");

        calc.apply(Input::Backspace);
        assert_eq!(calc.display(), "1");

        calc.apply(Input::Backspace);
        assert_eq!(calc.display(), "0");

        let mut calc = typed("12345");
        calc.apply(Input::Backspace);
        assert_eq!(calc.display(), "1,234");
        calc.apply(Input::Backspace);
        assert_eq!(calc.display(), "123");
    }

    #[test]
    fn test_clear_keeps_history() {
        let mut calc = typed("7+3=");
        assert!(calc.last_operation().is_some());

        calc.apply(Input::Clear);
        assert_eq!(calc.display(), INITIAL_DISPLAY);
        assert_eq!(calc.last_operation(), None);
        assert_eq!(calc.history().len(), 1);
    }

    #[test]
    fn test_evaluate_records_history() {
        let mut calc = typed("7+3");
        let transition = calc.apply(Input::Evaluate);

        let item = match transition {
            Transition::Evaluated(item) => item,
            other => panic!("unexpected transition {other:?}"),
        };
        assert_eq!(item.expression, "7 + 3");
        assert_eq!(item.result, "10");
        assert_eq!(calc.display(), "10");
        assert_eq!(calc.last_operation(), Some("7 + 3 = 10"));
        assert_eq!(calc.history().latest(), Some(&item));
    }

    #[test]
    fn test_evaluate_without_operator_is_noop() {
        let mut calc = typed("12345");
        assert_eq!(calc.apply(Input::Evaluate), Transition::Ignored);
        assert_eq!(calc.display(), "12,345");
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_evaluate_strips_trailing_operator() {
        let calc = typed("8*2-=");
        assert_eq!(calc.display(), "16");
        assert_eq!(calc.history().latest().unwrap().expression, "8 × 2");
    }

    #[test]
    fn test_evaluate_uses_precedence() {
        let calc = typed("2+3*4=");
        assert_eq!(calc.display(), "14");
    }

    #[test]
    fn test_evaluate_strips_separators() {
        let calc = typed("1500*1000=");
        assert_eq!(calc.history().latest().unwrap().expression, "1,500 × 1,000");
        assert_eq!(calc.history().latest().unwrap().result, "1500000");
        assert_eq!(calc.display(), "1,500,000");
    }

    #[test]
    fn test_negative_result_can_continue() {
        let mut calc = typed("3-5=");
        assert_eq!(calc.display(), "-2");

        press(&mut calc, "*4=");
        assert_eq!(calc.display(), "-8");
        assert_eq!(calc.history().latest().unwrap().expression, "-2 × 4");
    }

    #[test]
    fn test_division_by_zero_enters_error_state() {
        let mut calc = typed("5/0");
        assert_eq!(
            calc.apply(Input::Evaluate),
            Transition::Failed(EvalError::DivisionByZero)
        );
        assert_eq!(calc.display(), ERROR_DISPLAY);
        assert!(calc.is_error());
        assert!(calc.history().is_empty());

        assert_eq!(
            calc.apply(Input::Operator(Operator::Add)),
            Transition::Ignored
        );
        assert_eq!(calc.apply(Input::Evaluate), Transition::Ignored);
        assert_eq!(calc.display(), ERROR_DISPLAY);

        press(&mut calc, "4");
        assert_eq!(calc.display(), "4");
        assert!(!calc.is_error());
    }

    #[test]
    fn test_backspace_leaves_error_state() {
        let mut calc = typed("1/0=");
        calc.apply(Input::Backspace);
        assert_eq!(calc.display(), INITIAL_DISPLAY);
        assert!(!calc.is_error());
    }

    #[test]
    fn test_overflow_is_silent() {
        let mut calc = typed("99999999999999999999*99999999999");
        let before = calc.clone();
        assert_eq!(calc.apply(Input::Evaluate), Transition::Ignored);
        assert_eq!(calc, before);
    }

    #[test]
    fn test_recall_history_entry() {
        let mut calc = typed("7+3=");
        press(&mut calc, "c");

        assert_eq!(calc.apply(Input::Recall(0)), Transition::Updated);
        assert_eq!(calc.display(), "7 + 3");
        assert_eq!(calc.apply(Input::Recall(5)), Transition::Ignored);
    }

    #[test]
    fn test_reduce() {
        let calc = [
            Input::Digit(6),
            Input::Operator(Operator::Divide),
            Input::Digit(4),
            Input::Evaluate,
        ]
        .into_iter()
        .fold(Calculator::new(), Calculator::reduce);
        assert_eq!(calc.display(), "1.5");
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Input::from_key("Enter"), Some(Input::Evaluate));
        assert_eq!(Input::from_key("="), Some(Input::Evaluate));
        assert_eq!(Input::from_key(","), Some(Input::DecimalPoint));
        assert_eq!(
            Input::from_key("x"),
            Some(Input::Operator(Operator::Multiply))
        );
        assert_eq!(Input::from_key("÷"), Some(Input::Operator(Operator::Divide)));
        assert_eq!(Input::from_key("C"), Some(Input::Clear));
        assert_eq!(Input::from_key("9"), Some(Input::Digit(9)));
        assert_eq!(Input::from_key("99"), None);
        assert_eq!(Input::from_key("q"), None);
    }
}
