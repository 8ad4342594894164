use serde::Deserialize;

use crate::error::ValidationError;

/// Numeric request field sent either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    /// Blank text reads as absent; text that is not a finite number is rejected.
    pub fn value(&self) -> Result<Option<f64>, ValidationError> {
        let v = match self {
            NumberInput::Number(n) => *n,
            NumberInput::Text(s) if s.trim().is_empty() => return Ok(None),
            NumberInput::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ValidationError::InvalidAmount)?,
        };
        if v.is_finite() {
            Ok(Some(v))
        } else {
            Err(ValidationError::InvalidAmount)
        }
    }
}

pub fn read_number(input: Option<&NumberInput>) -> Result<Option<f64>, ValidationError> {
    input.map_or(Ok(None), NumberInput::value)
}
