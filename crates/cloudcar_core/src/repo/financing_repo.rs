//! Financing request repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, list (with customer inlined), fetch and delete financing rows.
//! - Own the nullify-on-delete rule for sales backed by a financing request.
//!
//! # Invariants
//! - Deleting a financing request never deletes or blocks on a sale; the
//!   sale's `financing_id` is cleared in the same transaction.

use crate::model::financing::{
    FinancingId, FinancingRequest, FinancingWithCustomer, InstallmentTerm, NewFinancingRequest,
};
use crate::repo::customer_repo::{customer_columns, parse_customer_row};
use crate::repo::{
    decimal_column, ensure_connection_ready, record_exists, Entity, RepoError, RepoResult,
};
use chrono::Utc;
use rusqlite::{params, Connection, Row, TransactionBehavior};

const FINANCING_FIELDS: [&str; 7] = [
    "id",
    "customer_id",
    "vehicle_price",
    "down_payment",
    "installments",
    "created_at",
    "updated_at",
];

/// Rows touched by a financing deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinancingDeletion {
    /// Sales whose financing reference was cleared.
    pub sales_unlinked: usize,
}

/// Repository interface for financing requests.
pub trait FinancingRepository {
    fn list_financing(&self) -> RepoResult<Vec<FinancingWithCustomer>>;
    fn get_financing(&self, id: FinancingId) -> RepoResult<Option<FinancingRequest>>;
    fn create_financing(&self, input: &NewFinancingRequest) -> RepoResult<FinancingRequest>;
    fn delete_financing(&mut self, id: FinancingId) -> RepoResult<FinancingDeletion>;
}

/// SQLite-backed financing repository.
pub struct SqliteFinancingRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteFinancingRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["financing_requests", "customers", "sales"])?;
        Ok(Self { conn })
    }
}

impl FinancingRepository for SqliteFinancingRepository<'_> {
    fn list_financing(&self) -> RepoResult<Vec<FinancingWithCustomer>> {
        let sql = format!(
            "SELECT {}, {}
             FROM financing_requests f
             INNER JOIN customers c ON c.id = f.customer_id
             ORDER BY f.id ASC;",
            financing_columns("f", ""),
            customer_columns("c", "c_")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next()? {
            requests.push(FinancingWithCustomer {
                financing: parse_financing_row(row, "")?,
                customer: parse_customer_row(row, "c_")?,
            });
        }
        Ok(requests)
    }

    fn get_financing(&self, id: FinancingId) -> RepoResult<Option<FinancingRequest>> {
        let sql = format!(
            "SELECT {} FROM financing_requests f WHERE f.id = ?1;",
            financing_columns("f", "")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_financing_row(row, "")?)),
            None => Ok(None),
        }
    }

    fn create_financing(&self, input: &NewFinancingRequest) -> RepoResult<FinancingRequest> {
        let draft = input.validate()?;
        if !record_exists(self.conn, "customers", draft.customer_id)? {
            return Err(RepoError::MissingReference {
                entity: Entity::Customer,
                id: draft.customer_id,
            });
        }

        self.conn.execute(
            "INSERT INTO financing_requests (
                customer_id,
                vehicle_price,
                down_payment,
                installments,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![
                draft.customer_id,
                draft.vehicle_price.to_string(),
                draft.down_payment.to_string(),
                draft.installments.months(),
                Utc::now(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_financing(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Financing,
            id,
        })
    }

    fn delete_financing(&mut self, id: FinancingId) -> RepoResult<FinancingDeletion> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !record_exists(&tx, "financing_requests", id)? {
            return Err(RepoError::NotFound {
                entity: Entity::Financing,
                id,
            });
        }

        let sales_unlinked = tx.execute(
            "UPDATE sales SET financing_id = NULL, updated_at = ?2 WHERE financing_id = ?1;",
            params![id, Utc::now()],
        )?;
        tx.execute("DELETE FROM financing_requests WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(FinancingDeletion { sales_unlinked })
    }
}

/// Builds a select list for `financing_requests` aliased as `table`.
pub(crate) fn financing_columns(table: &str, prefix: &str) -> String {
    FINANCING_FIELDS
        .iter()
        .map(|column| format!("{table}.{column} AS {prefix}{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses a financing request from columns produced by [`financing_columns`].
pub(crate) fn parse_financing_row(row: &Row<'_>, prefix: &str) -> RepoResult<FinancingRequest> {
    let column = |name: &str| format!("{prefix}{name}");

    let months: u32 = row.get(column("installments").as_str())?;
    let installments = InstallmentTerm::from_months(months).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid installment count `{months}` in financing_requests.installments"
        ))
    })?;

    Ok(FinancingRequest {
        id: row.get(column("id").as_str())?,
        customer_id: row.get(column("customer_id").as_str())?,
        vehicle_price: decimal_column(row, column("vehicle_price").as_str())?,
        down_payment: decimal_column(row, column("down_payment").as_str())?,
        installments,
        created_at: row.get(column("created_at").as_str())?,
        updated_at: row.get(column("updated_at").as_str())?,
    })
}
