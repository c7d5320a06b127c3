//! Sale model.
//!
//! # Invariants
//! - Every sale belongs to one existing customer, which cannot be deleted
//!   while the sale exists.
//! - `financing_id` is optional (cash sales) and unique across sales.

use crate::model::customer::{Customer, CustomerId};
use crate::model::financing::{FinancingId, FinancingRequest};
use crate::model::validation::{
    deserialize_integer, normalize_money, optional_text, require_text, MoneyRule,
    ValidationError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type SaleId = i64;

/// Persisted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    #[serde(rename = "clienteId")]
    pub customer_id: CustomerId,
    #[serde(rename = "financiamentoId")]
    pub financing_id: Option<FinancingId>,
    #[serde(rename = "dataVenda")]
    pub sold_at: DateTime<Utc>,
    #[serde(rename = "valorTotal")]
    pub total_value: Decimal,
    /// Free-form label such as "À vista" or "Financiado".
    #[serde(rename = "formaPagamento")]
    pub payment_method: String,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sale with its customer and (when linked) financing request inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetails {
    #[serde(flatten)]
    pub sale: Sale,
    #[serde(rename = "Cliente")]
    pub customer: Customer,
    #[serde(rename = "Financiamento")]
    pub financing: Option<FinancingRequest>,
}

/// Raw sale payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewSale {
    #[serde(deserialize_with = "deserialize_integer")]
    pub cliente_id: Option<CustomerId>,
    #[serde(deserialize_with = "deserialize_integer")]
    pub financiamento_id: Option<FinancingId>,
    pub valor_total: Option<Decimal>,
    pub forma_pagamento: String,
    pub observacoes: Option<String>,
    /// Defaults to the creation time when absent.
    pub data_venda: Option<DateTime<Utc>>,
}

impl NewSale {
    /// Validates the payload; `now` fills a missing sale timestamp.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<SaleDraft, ValidationError> {
        let customer_id = self.cliente_id.ok_or(ValidationError::Required("clienteId"))?;
        let total_value = self
            .valor_total
            .ok_or(ValidationError::Required("valorTotal"))?;

        Ok(SaleDraft {
            customer_id,
            financing_id: self.financiamento_id,
            sold_at: self.data_venda.unwrap_or(now),
            total_value: normalize_money("valorTotal", total_value, MoneyRule::Positive)?,
            payment_method: require_text("formaPagamento", &self.forma_pagamento)?,
            notes: optional_text(self.observacoes.as_deref()),
        })
    }
}

/// Validated sale ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub customer_id: CustomerId,
    pub financing_id: Option<FinancingId>,
    pub sold_at: DateTime<Utc>,
    pub total_value: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::NewSale;
    use crate::model::validation::ValidationError;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    #[test]
    fn sale_timestamp_defaults_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap();
        let input = NewSale {
            cliente_id: Some(7),
            valor_total: Some(Decimal::from(42_000)),
            forma_pagamento: "À vista".to_string(),
            ..NewSale::default()
        };
        let draft = input.validate(now).unwrap();
        assert_eq!(draft.sold_at, now);
        assert_eq!(draft.financing_id, None);
        assert_eq!(draft.total_value.to_string(), "42000.00");
    }

    #[test]
    fn payment_method_is_required() {
        let input = NewSale {
            cliente_id: Some(7),
            valor_total: Some(Decimal::from(42_000)),
            forma_pagamento: " ".to_string(),
            ..NewSale::default()
        };
        assert_eq!(
            input.validate(Utc::now()),
            Err(ValidationError::Required("formaPagamento"))
        );
    }

    #[test]
    fn customer_and_financing_ids_accept_numeric_strings() {
        let input: NewSale = serde_json::from_str(
            r#"{"clienteId":"7","financiamentoId":"5","valorTotal":"42000","formaPagamento":"Financiado"}"#,
        )
        .unwrap();
        assert_eq!(input.cliente_id, Some(7));
        assert_eq!(input.financiamento_id, Some(5));
    }
}
