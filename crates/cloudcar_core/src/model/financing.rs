//! Financing request model.
//!
//! # Invariants
//! - `installments` is one of the fixed terms in [`InstallmentTerm::ALL`].
//! - Money fields carry exactly two fractional digits.
//! - A financing request backs at most one sale.

use crate::model::customer::{Customer, CustomerId};
use crate::model::validation::{
    deserialize_integer, normalize_money, MoneyRule, ValidationError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type FinancingId = i64;

/// Allowed installment terms, in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstallmentTerm {
    Months12,
    Months24,
    Months36,
    Months48,
    Months60,
    Months72,
}

impl InstallmentTerm {
    pub const ALL: [InstallmentTerm; 6] = [
        Self::Months12,
        Self::Months24,
        Self::Months36,
        Self::Months48,
        Self::Months60,
        Self::Months72,
    ];

    pub fn months(self) -> u32 {
        match self {
            Self::Months12 => 12,
            Self::Months24 => 24,
            Self::Months36 => 36,
            Self::Months48 => 48,
            Self::Months60 => 60,
            Self::Months72 => 72,
        }
    }

    pub fn from_months(months: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|term| term.months() == months)
    }
}

impl Serialize for InstallmentTerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.months())
    }
}

impl<'de> Deserialize<'de> for InstallmentTerm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let months = u32::deserialize(deserializer)?;
        Self::from_months(months).ok_or_else(|| {
            serde::de::Error::custom(ValidationError::InvalidInstallments(months))
        })
    }
}

/// Persisted financing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingRequest {
    pub id: FinancingId,
    #[serde(rename = "clienteId")]
    pub customer_id: CustomerId,
    #[serde(rename = "valorVeiculo")]
    pub vehicle_price: Decimal,
    #[serde(rename = "valorEntrada")]
    pub down_payment: Decimal,
    #[serde(rename = "parcelas")]
    pub installments: InstallmentTerm,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Financing request with its owning customer inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingWithCustomer {
    #[serde(flatten)]
    pub financing: FinancingRequest,
    #[serde(rename = "Cliente")]
    pub customer: Customer,
}

/// Raw financing payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewFinancingRequest {
    #[serde(deserialize_with = "deserialize_integer")]
    pub cliente_id: Option<CustomerId>,
    pub valor_veiculo: Option<Decimal>,
    pub valor_entrada: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_integer")]
    pub parcelas: Option<u32>,
}

impl NewFinancingRequest {
    pub fn validate(&self) -> Result<FinancingDraft, ValidationError> {
        let customer_id = self.cliente_id.ok_or(ValidationError::Required("clienteId"))?;
        let vehicle_price = self
            .valor_veiculo
            .ok_or(ValidationError::Required("valorVeiculo"))?;
        let down_payment = self
            .valor_entrada
            .ok_or(ValidationError::Required("valorEntrada"))?;
        let months = self.parcelas.ok_or(ValidationError::Required("parcelas"))?;

        Ok(FinancingDraft {
            customer_id,
            vehicle_price: normalize_money("valorVeiculo", vehicle_price, MoneyRule::Positive)?,
            down_payment: normalize_money("valorEntrada", down_payment, MoneyRule::NonNegative)?,
            installments: InstallmentTerm::from_months(months)
                .ok_or(ValidationError::InvalidInstallments(months))?,
        })
    }
}

/// Validated financing request ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancingDraft {
    pub customer_id: CustomerId,
    pub vehicle_price: Decimal,
    pub down_payment: Decimal,
    pub installments: InstallmentTerm,
}

#[cfg(test)]
mod tests {
    use super::{InstallmentTerm, NewFinancingRequest};
    use crate::model::validation::ValidationError;
    use rust_decimal::Decimal;

    #[test]
    fn only_fixed_terms_are_accepted() {
        let months: Vec<u32> = InstallmentTerm::ALL.iter().map(|t| t.months()).collect();
        assert_eq!(months, vec![12, 24, 36, 48, 60, 72]);
        assert_eq!(InstallmentTerm::from_months(18), None);
    }

    #[test]
    fn validate_rejects_unlisted_installments() {
        let input = NewFinancingRequest {
            cliente_id: Some(1),
            valor_veiculo: Some(Decimal::from(50_000)),
            valor_entrada: Some(Decimal::from(10_000)),
            parcelas: Some(30),
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::InvalidInstallments(30))
        );
    }

    #[test]
    fn payload_accepts_numbers_and_numeric_strings() {
        let input: NewFinancingRequest = serde_json::from_str(
            r#"{"clienteId":3,"valorVeiculo":"85000.5","valorEntrada":15000,"parcelas":48}"#,
        )
        .unwrap();
        let draft = input.validate().unwrap();
        assert_eq!(draft.vehicle_price.to_string(), "85000.50");
        assert_eq!(draft.down_payment.to_string(), "15000.00");
        assert_eq!(draft.installments, InstallmentTerm::Months48);
    }

    #[test]
    fn integer_fields_accept_numeric_strings() {
        let input: NewFinancingRequest = serde_json::from_str(
            r#"{"clienteId":"3","valorVeiculo":50000,"valorEntrada":0,"parcelas":" 48 "}"#,
        )
        .unwrap();
        assert_eq!(input.cliente_id, Some(3));
        assert_eq!(input.parcelas, Some(48));

        let cleared: NewFinancingRequest =
            serde_json::from_str(r#"{"clienteId":null,"parcelas":null}"#).unwrap();
        assert_eq!(cleared.cliente_id, None);
        assert_eq!(cleared.parcelas, None);

        assert!(serde_json::from_str::<NewFinancingRequest>(r#"{"parcelas":"abc"}"#).is_err());
        assert!(serde_json::from_str::<NewFinancingRequest>(r#"{"parcelas":-12}"#).is_err());
    }
}
