use mdpack::core::volume::radii::RadiiSet;
use mdpack::engine::config::{ControlValue, ScalarValue};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Empty key in '{0}'.")]
    EmptyKey(String),

    #[error(
        "Invalid radii source '{0}'. Expected 'pymatgen', 'bondi', or a path to a '.csv' file."
    )]
    InvalidRadiiSource(String),

    #[error("Control option '{0}' has no value.")]
    EmptyControlValue(String),
}

/// Where the radii used for box estimation come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadiiSource {
    Builtin(RadiiSet),
    CsvFile(PathBuf),
}

impl FromStr for RadiiSource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(set) = s.parse::<RadiiSet>() {
            return Ok(RadiiSource::Builtin(set));
        }
        let is_csv = PathBuf::from(s)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Ok(RadiiSource::CsvFile(PathBuf::from(s)))
        } else {
            Err(ParseError::InvalidRadiiSource(s.to_string()))
        }
    }
}

pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    Ok((key, value.trim()))
}

fn parse_scalar(token: &str) -> ScalarValue {
    if let Ok(int) = token.parse::<i64>() {
        ScalarValue::Int(int)
    } else if let Ok(float) = token.parse::<f64>() {
        ScalarValue::Float(float)
    } else {
        ScalarValue::Text(token.to_string())
    }
}

/// Parses a control value given on the command line.
///
/// Whitespace-separated tokens become a list; a single token becomes a scalar, typed
/// as an integer, then a float, then text.
pub fn parse_control_value(key: &str, raw: &str) -> Result<ControlValue, ParseError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Err(ParseError::EmptyControlValue(key.to_string())),
        [single] => Ok(ControlValue::Scalar(parse_scalar(single))),
        many => Ok(ControlValue::List(
            many.iter().map(|token| parse_scalar(token)).collect(),
        )),
    }
}
