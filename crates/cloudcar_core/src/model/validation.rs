//! Field-level validation shared by every dealership record.
//!
//! Field names in messages use the wire (JSON) names, since these messages
//! are surfaced to API callers unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Fractional digits kept for money columns (DECIMAL(10,2)).
pub const MONEY_SCALE: u32 = 2;
const MONEY_LIMIT: i64 = 100_000_000;

/// Validation failure for a single input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is missing or blank.
    Required(&'static str),
    InvalidEmail(String),
    /// Tax ID must be exactly 11 ASCII digits.
    InvalidTaxId(String),
    InvalidStateCode(String),
    InvalidInstallments(u32),
    InvalidMoney {
        field: &'static str,
        reason: &'static str,
    },
    InvalidDate(String),
    InvalidTime(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "{field} is required"),
            Self::InvalidEmail(value) => write!(f, "email `{value}` is not a valid address"),
            Self::InvalidTaxId(value) => {
                write!(f, "cpf `{value}` must contain exactly 11 digits")
            }
            Self::InvalidStateCode(value) => {
                write!(f, "estado `{value}` is not a valid state code")
            }
            Self::InvalidInstallments(value) => write!(
                f,
                "parcelas `{value}` is not allowed; expected 12|24|36|48|60|72"
            ),
            Self::InvalidMoney { field, reason } => write!(f, "{field} {reason}"),
            Self::InvalidDate(value) => write!(f, "data `{value}` must be YYYY-MM-DD"),
            Self::InvalidTime(value) => write!(f, "horario `{value}` must be HH:MM or HH:MM:SS"),
        }
    }
}

impl Error for ValidationError {}

/// Sign rule applied to a money field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyRule {
    NonNegative,
    Positive,
}

/// Trims a required text field, rejecting blank input.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank input is treated as absent.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

pub(crate) fn validate_email(value: &str) -> Result<String, ValidationError> {
    let email = require_text("email", value)?;
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}

pub(crate) fn validate_tax_id(value: &str) -> Result<String, ValidationError> {
    let tax_id = require_text("cpf", value)?;
    if tax_id.len() != 11 || !tax_id.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidTaxId(tax_id));
    }
    Ok(tax_id)
}

/// Rounds a money value to two fractional digits, half away from zero, and
/// checks its range.
pub fn normalize_money(
    field: &'static str,
    value: Decimal,
    rule: MoneyRule,
) -> Result<Decimal, ValidationError> {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);

    if rounded.abs() >= Decimal::from(MONEY_LIMIT) {
        return Err(ValidationError::InvalidMoney {
            field,
            reason: "exceeds 99999999.99",
        });
    }
    match rule {
        MoneyRule::NonNegative if rounded < Decimal::ZERO => Err(ValidationError::InvalidMoney {
            field,
            reason: "must not be negative",
        }),
        MoneyRule::Positive if rounded <= Decimal::ZERO => Err(ValidationError::InvalidMoney {
            field,
            reason: "must be greater than zero",
        }),
        _ => Ok(rounded),
    }
}

/// Deserializes a present field as `Some(value)`, so `null` becomes
/// `Some(None)` and an absent field stays `None` via `#[serde(default)]`.
pub(crate) fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerInput {
    Number(i64),
    Text(String),
}

/// Deserializes an optional integer sent either as a JSON number or as a
/// numeric string (`48` or `"48"`); `null` reads as `None`.
pub(crate) fn deserialize_integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let number = match Option::<IntegerInput>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(IntegerInput::Number(number)) => number,
        Some(IntegerInput::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("`{text}` is not an integer")))?,
    };
    T::try_from(number)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("{number} is out of range")))
}
