//! Test-drive booking model.
//!
//! # Invariants
//! - Every booking belongs to exactly one existing customer.
//! - Bookings are read-only after creation and disappear with their customer.

use crate::model::customer::{Customer, CustomerId};
use crate::model::validation::{deserialize_integer, optional_text, ValidationError};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub type TestDriveId = i64;

/// Persisted test-drive booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDrive {
    pub id: TestDriveId,
    #[serde(rename = "clienteId")]
    pub customer_id: CustomerId,
    /// Calendar day, serialized as `YYYY-MM-DD`.
    #[serde(rename = "data")]
    pub date: NaiveDate,
    /// Time of day, serialized as `HH:MM:SS`.
    #[serde(rename = "horario")]
    pub time: NaiveTime,
    #[serde(rename = "mensagem")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking with its owning customer inlined, as returned by list reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDriveWithCustomer {
    #[serde(flatten)]
    pub test_drive: TestDrive,
    #[serde(rename = "Cliente")]
    pub customer: Customer,
}

/// Raw booking payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewTestDrive {
    #[serde(deserialize_with = "deserialize_integer")]
    pub cliente_id: Option<CustomerId>,
    pub data: String,
    pub horario: String,
    pub mensagem: Option<String>,
}

impl NewTestDrive {
    pub fn validate(&self) -> Result<TestDriveDraft, ValidationError> {
        let customer_id = self.cliente_id.ok_or(ValidationError::Required("clienteId"))?;
        Ok(TestDriveDraft {
            customer_id,
            date: parse_date(&self.data)?,
            time: parse_time(&self.horario)?,
            message: optional_text(self.mensagem.as_deref()),
        })
    }
}

/// Validated booking ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDriveDraft {
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub message: Option<String>,
}

fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required("data"));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}

fn parse_time(value: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required("horario"));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| ValidationError::InvalidTime(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::NewTestDrive;
    use crate::model::validation::ValidationError;
    use chrono::NaiveTime;

    #[test]
    fn accepts_minutes_only_time() {
        let input = NewTestDrive {
            cliente_id: Some(1),
            data: "2025-03-10".to_string(),
            horario: "14:30".to_string(),
            mensagem: Some("  ".to_string()),
        };
        let draft = input.validate().unwrap();
        assert_eq!(draft.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(draft.message, None);
    }

    #[test]
    fn rejects_malformed_date_and_missing_customer() {
        let mut input = NewTestDrive {
            cliente_id: Some(1),
            data: "10/03/2025".to_string(),
            horario: "09:00:00".to_string(),
            mensagem: None,
        };
        assert!(matches!(
            input.validate(),
            Err(ValidationError::InvalidDate(_))
        ));

        input.data = "2025-03-10".to_string();
        input.cliente_id = None;
        assert_eq!(
            input.validate(),
            Err(ValidationError::Required("clienteId"))
        );
    }
}
