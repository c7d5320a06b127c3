//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Enforce referential actions (cascade, restrict, nullify) explicitly in
//!   transactions instead of relying on storage-engine declarations.
//! - Translate SQLite constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths validate payloads before any SQL mutation.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`, ...)
//!   in addition to DB transport errors.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::validation::ValidationError;
use rusqlite::{ffi, Connection, ErrorCode, Row};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod customer_repo;
pub mod financing_repo;
pub mod sale_repo;
pub mod test_drive_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persisted aggregate kinds, used to label semantic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customer,
    TestDrive,
    Financing,
    Sale,
}

impl Entity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::TestDrive => "test drive",
            Self::Financing => "financing request",
            Self::Sale => "sale",
        }
    }
}

/// Coarse classification callers map to transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The addressed record does not exist.
    NotFound,
    /// The request violates a constraint and must not be retried unchanged.
    Validation,
    /// Storage failed or returned data the model cannot represent.
    Storage,
}

/// Repository error shared by every aggregate.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound {
        entity: Entity,
        id: i64,
    },
    /// A write referenced a record that does not exist.
    MissingReference {
        entity: Entity,
        id: i64,
    },
    /// A unique column already holds this value; `field` is the wire name.
    Duplicate {
        field: &'static str,
    },
    FinancingAlreadyLinked {
        financing_id: i64,
        sale_id: i64,
    },
    /// Customer still owns sales and cannot be deleted.
    DeleteRestricted {
        customer_id: i64,
        sales: i64,
    },
    Constraint(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_)
            | Self::MissingReference { .. }
            | Self::Duplicate { .. }
            | Self::FinancingAlreadyLinked { .. }
            | Self::DeleteRestricted { .. }
            | Self::Constraint(_) => ErrorKind::Validation,
            Self::Db(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => ErrorKind::Storage,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{} not found: {id}", entity.label()),
            Self::MissingReference { entity, id } => {
                write!(f, "referenced {} does not exist: {id}", entity.label())
            }
            Self::Duplicate { field } => write!(f, "{field} is already registered"),
            Self::FinancingAlreadyLinked {
                financing_id,
                sale_id,
            } => write!(
                f,
                "financing request {financing_id} already backs sale {sale_id}"
            ),
            Self::DeleteRestricted { customer_id, sales } => write!(
                f,
                "customer {customer_id} has {sales} sale(s) and cannot be deleted"
            ),
            Self::Constraint(message) => write!(f, "constraint violated: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            if failure.code == ErrorCode::ConstraintViolation {
                let detail = message
                    .clone()
                    .unwrap_or_else(|| "constraint failed".to_string());
                if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
                    if let Some(field) = duplicate_field(&detail) {
                        return Self::Duplicate { field };
                    }
                }
                return Self::Constraint(detail);
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps `UNIQUE constraint failed: <table>.<column>` to the wire field name.
fn duplicate_field(message: &str) -> Option<&'static str> {
    let column = message.rsplit(": ").next()?;
    match column.trim() {
        "customers.email" => Some("email"),
        "customers.tax_id" => Some("cpf"),
        "sales.financing_id" => Some("financiamentoId"),
        _ => None,
    }
}

/// Rejects connections that were not bootstrapped through `crate::db`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables.iter().copied() {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn record_exists(conn: &Connection, table: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn decimal_column(row: &Row<'_>, column: &str) -> RepoResult<Decimal> {
    let text: String = row.get(column)?;
    parse_decimal(&text, column)
}

pub(crate) fn optional_decimal_column(row: &Row<'_>, column: &str) -> RepoResult<Option<Decimal>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => parse_decimal(&text, column).map(Some),
        None => Ok(None),
    }
}

fn parse_decimal(text: &str, column: &str) -> RepoResult<Decimal> {
    Decimal::from_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid decimal `{text}` in {column}")))
}

#[cfg(test)]
mod tests {
    use super::{duplicate_field, Entity, ErrorKind, RepoError};
    use crate::model::validation::ValidationError;

    #[test]
    fn duplicate_field_maps_known_unique_columns() {
        assert_eq!(
            duplicate_field("UNIQUE constraint failed: customers.tax_id"),
            Some("cpf")
        );
        assert_eq!(
            duplicate_field("UNIQUE constraint failed: customers.email"),
            Some("email")
        );
        assert_eq!(duplicate_field("UNIQUE constraint failed: other.x"), None);
    }

    #[test]
    fn kinds_follow_error_taxonomy() {
        let not_found = RepoError::NotFound {
            entity: Entity::Customer,
            id: 1,
        };
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(
            RepoError::Validation(ValidationError::Required("nome")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RepoError::DeleteRestricted {
                customer_id: 1,
                sales: 2
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RepoError::InvalidData("x".to_string()).kind(),
            ErrorKind::Storage
        );
    }
}
