//! Translating command-line key arguments into calculator inputs.

use crate::domain::calculator::Input;
use crate::error::{KonvertError, Result};

/// Parse one argument: either a named key (`Enter`, `Backspace`, `Clear`, ...)
/// or a run of single-character keys such as `12+3=`. Spaces are ignored.
pub fn parse_keys(arg: &str) -> Result<Vec<Input>> {
    if let Some(input) = named_key(arg) {
        return Ok(vec![input]);
    }

    arg.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            Input::from_key(c.encode_utf8(&mut [0; 4])).ok_or_else(|| {
                KonvertError::ValidationError(format!("unknown key '{c}' in '{arg}'"))
            })
        })
        .collect()
}

fn named_key(arg: &str) -> Option<Input> {
    if arg.chars().count() == 1 {
        return None;
    }
    if let Some(index) = arg.strip_prefix('@') {
        return index.parse().ok().map(Input::Recall);
    }
    Input::from_key(arg)
}
