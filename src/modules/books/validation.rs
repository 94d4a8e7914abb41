//! Presence and bounds checks shared by the create and update endpoints.

use std::ops::RangeInclusive;

use bookshelf_http::error::AppError;
use serde_json::{json, Number, Value};
use thiserror::Error;

use super::models::BookPayload;

/// Allowed `name` length in characters.
pub const NAME_LENGTH: RangeInclusive<usize> = 4..=65;
/// Allowed `author` length in characters.
pub const AUTHOR_LENGTH: RangeInclusive<usize> = 4..=25;
/// Allowed integer part of `price`.
pub const PRICE_RANGE: RangeInclusive<i64> = 1..=9999;

/// A payload that passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBook {
    pub name: String,
    pub author: String,
    /// Price exactly as submitted; the store decides how to persist it.
    pub price: Value,
}

/// Why a payload was refused, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing required fields")]
    MissingFields,

    /// Carries the submitted name, which may not be text at all.
    #[error("invalid name length")]
    NameLength(Value),

    #[error("invalid author length")]
    AuthorLength(Value),

    /// Carries the parsed price, `None` when nothing parsed.
    #[error("invalid price")]
    Price(Option<Number>),
}

impl Rejection {
    /// The offending value echoed back to the client.
    pub fn data(&self) -> Option<Value> {
        match self {
            Rejection::MissingFields => None,
            Rejection::NameLength(name) => Some(name.clone()),
            Rejection::AuthorLength(author) => Some(author.clone()),
            Rejection::Price(parsed) => Some(json!(parsed)),
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        AppError::validation(rejection.to_string(), rejection.data())
    }
}

/// Check a candidate book.
///
/// Order matters: missing fields, then name, then author, then price.
pub fn validate(payload: &BookPayload) -> Result<ValidatedBook, Rejection> {
    let (Some(name), Some(author), Some(price)) = (
        present(&payload.name),
        present(&payload.author),
        present(&payload.price),
    ) else {
        return Err(Rejection::MissingFields);
    };

    let name = text_within(name, &NAME_LENGTH).ok_or_else(|| Rejection::NameLength(name.clone()))?;
    let author =
        text_within(author, &AUTHOR_LENGTH).ok_or_else(|| Rejection::AuthorLength(author.clone()))?;

    let parsed = parse_leading_number(price);
    match parsed.as_ref().and_then(Number::as_i64) {
        Some(integer) if PRICE_RANGE.contains(&integer) => Ok(ValidatedBook {
            name: name.to_string(),
            author: author.to_string(),
            price: price.clone(),
        }),
        _ => Err(Rejection::Price(parsed)),
    }
}

fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !is_falsy(v))
}

/// The string inside `value` when its length in characters is within `bounds`.
///
/// Non-text values never satisfy a length bound.
fn text_within<'a>(value: &'a Value, bounds: &RangeInclusive<usize>) -> Option<&'a str> {
    value
        .as_str()
        .filter(|text| bounds.contains(&text.chars().count()))
}

/// `null`, `false`, zero and the empty string count as absent.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Integer value of a price: numbers truncate toward zero, strings use their
/// leading run of digits after optional whitespace and sign.
///
/// Values outside the `i64` range come back as a truncated float.
pub fn parse_leading_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => n.as_i64().map(Number::from).or_else(|| {
            let truncated = n.as_f64()?.trunc();
            if truncated.abs() < i64::MAX as f64 {
                Some(Number::from(truncated as i64))
            } else {
                Number::from_f64(truncated)
            }
        }),
        Value::String(s) => parse_leading_digits(s),
        _ => None,
    }
}

fn parse_leading_digits(raw: &str) -> Option<Number> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    let literal = format!("{sign}{}", &rest[..digits_end]);
    match literal.parse::<i64>() {
        Ok(integer) => Some(Number::from(integer)),
        Err(_) => literal.parse::<f64>().ok().and_then(Number::from_f64),
    }
}
