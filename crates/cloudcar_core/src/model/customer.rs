//! Customer domain model.
//!
//! # Responsibility
//! - Define the persisted customer record and its wire shape.
//! - Turn raw create/update payloads into validated drafts.
//!
//! # Invariants
//! - `email` (ignoring ASCII case) and `tax_id` are unique across all
//!   customers (enforced by storage).
//! - `tax_id` is exactly 11 ASCII digits.
//! - `state`, when set, is one of the 27 Brazilian region codes.

use crate::model::validation::{
    deserialize_some, normalize_money, optional_text, require_text, validate_email,
    validate_tax_id, MoneyRule, ValidationError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Storage-assigned customer identifier.
pub type CustomerId = i64;

/// Brazilian region (UF) code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateCode {
    #[serde(rename = "AC")]
    Acre,
    #[serde(rename = "AL")]
    Alagoas,
    #[serde(rename = "AP")]
    Amapa,
    #[serde(rename = "AM")]
    Amazonas,
    #[serde(rename = "BA")]
    Bahia,
    #[serde(rename = "CE")]
    Ceara,
    #[serde(rename = "DF")]
    DistritoFederal,
    #[serde(rename = "ES")]
    EspiritoSanto,
    #[serde(rename = "GO")]
    Goias,
    #[serde(rename = "MA")]
    Maranhao,
    #[serde(rename = "MT")]
    MatoGrosso,
    #[serde(rename = "MS")]
    MatoGrossoDoSul,
    #[serde(rename = "MG")]
    MinasGerais,
    #[serde(rename = "PA")]
    Para,
    #[serde(rename = "PB")]
    Paraiba,
    #[serde(rename = "PR")]
    Parana,
    #[serde(rename = "PE")]
    Pernambuco,
    #[serde(rename = "PI")]
    Piaui,
    #[serde(rename = "RJ")]
    RioDeJaneiro,
    #[serde(rename = "RN")]
    RioGrandeDoNorte,
    #[serde(rename = "RS")]
    RioGrandeDoSul,
    #[serde(rename = "RO")]
    Rondonia,
    #[serde(rename = "RR")]
    Roraima,
    #[serde(rename = "SC")]
    SantaCatarina,
    #[serde(rename = "SP")]
    SaoPaulo,
    #[serde(rename = "SE")]
    Sergipe,
    #[serde(rename = "TO")]
    Tocantins,
}

impl StateCode {
    pub const ALL: [StateCode; 27] = [
        Self::Acre,
        Self::Alagoas,
        Self::Amapa,
        Self::Amazonas,
        Self::Bahia,
        Self::Ceara,
        Self::DistritoFederal,
        Self::EspiritoSanto,
        Self::Goias,
        Self::Maranhao,
        Self::MatoGrosso,
        Self::MatoGrossoDoSul,
        Self::MinasGerais,
        Self::Para,
        Self::Paraiba,
        Self::Parana,
        Self::Pernambuco,
        Self::Piaui,
        Self::RioDeJaneiro,
        Self::RioGrandeDoNorte,
        Self::RioGrandeDoSul,
        Self::Rondonia,
        Self::Roraima,
        Self::SantaCatarina,
        Self::SaoPaulo,
        Self::Sergipe,
        Self::Tocantins,
    ];

    /// Two-letter code as stored and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acre => "AC",
            Self::Alagoas => "AL",
            Self::Amapa => "AP",
            Self::Amazonas => "AM",
            Self::Bahia => "BA",
            Self::Ceara => "CE",
            Self::DistritoFederal => "DF",
            Self::EspiritoSanto => "ES",
            Self::Goias => "GO",
            Self::Maranhao => "MA",
            Self::MatoGrosso => "MT",
            Self::MatoGrossoDoSul => "MS",
            Self::MinasGerais => "MG",
            Self::Para => "PA",
            Self::Paraiba => "PB",
            Self::Parana => "PR",
            Self::Pernambuco => "PE",
            Self::Piaui => "PI",
            Self::RioDeJaneiro => "RJ",
            Self::RioGrandeDoNorte => "RN",
            Self::RioGrandeDoSul => "RS",
            Self::Rondonia => "RO",
            Self::Roraima => "RR",
            Self::SantaCatarina => "SC",
            Self::SaoPaulo => "SP",
            Self::Sergipe => "SE",
            Self::Tocantins => "TO",
        }
    }

    /// Parses an exact (case-sensitive) two-letter code.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == value)
    }
}

/// Persisted customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    /// National tax ID (CPF).
    #[serde(rename = "cpf")]
    pub tax_id: String,
    #[serde(rename = "cidade")]
    pub city: Option<String>,
    #[serde(rename = "estado")]
    pub state: Option<StateCode>,
    #[serde(rename = "renda")]
    pub income: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw create payload, as submitted by API callers.
///
/// Every field defaults so that missing values surface as validation errors
/// naming the field, not as opaque decode failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewCustomer {
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub cpf: String,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub renda: Option<Decimal>,
}

impl NewCustomer {
    /// Validates every field and returns a write-ready draft.
    pub fn validate(&self) -> Result<CustomerDraft, ValidationError> {
        Ok(CustomerDraft {
            name: require_text("nome", &self.nome)?,
            email: validate_email(&self.email)?,
            phone: require_text("telefone", &self.telefone)?,
            tax_id: validate_tax_id(&self.cpf)?,
            city: optional_text(self.cidade.as_deref()),
            state: parse_state(self.estado.as_deref())?,
            income: self
                .renda
                .map(|value| normalize_money("renda", value, MoneyRule::NonNegative))
                .transpose()?,
        })
    }
}

/// Partial update payload.
///
/// Absent fields keep the stored value. For optional columns an explicit
/// `null` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CustomerPatch {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub cpf: Option<String>,
    #[serde(deserialize_with = "deserialize_some")]
    pub cidade: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some")]
    pub estado: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some")]
    pub renda: Option<Option<Decimal>>,
}

impl CustomerPatch {
    /// Merges this patch over `current` and validates the result.
    pub fn apply_to(&self, current: &Customer) -> Result<CustomerDraft, ValidationError> {
        let merged = NewCustomer {
            nome: self.nome.clone().unwrap_or_else(|| current.name.clone()),
            email: self.email.clone().unwrap_or_else(|| current.email.clone()),
            telefone: self.telefone.clone().unwrap_or_else(|| current.phone.clone()),
            cpf: self.cpf.clone().unwrap_or_else(|| current.tax_id.clone()),
            cidade: match &self.cidade {
                Some(value) => value.clone(),
                None => current.city.clone(),
            },
            estado: match &self.estado {
                Some(value) => value.clone(),
                None => current.state.map(|code| code.as_str().to_string()),
            },
            renda: match self.renda {
                Some(value) => value,
                None => current.income,
            },
        };
        merged.validate()
    }
}

/// Validated customer fields ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub tax_id: String,
    pub city: Option<String>,
    pub state: Option<StateCode>,
    pub income: Option<Decimal>,
}

fn parse_state(value: Option<&str>) -> Result<Option<StateCode>, ValidationError> {
    match optional_text(value) {
        Some(code) => StateCode::parse(&code)
            .map(Some)
            .ok_or(ValidationError::InvalidStateCode(code)),
        None => Ok(None),
    }
}
