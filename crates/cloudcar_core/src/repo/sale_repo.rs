//! Sale repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A financing request backs at most one sale: the link check and insert
//!   share one immediate transaction, and a partial unique index on
//!   `sales(financing_id)` rejects anything that slips past it.
//! - List reads inline the customer (INNER JOIN) and the financing request
//!   (LEFT JOIN, `None` for cash sales).

use crate::model::sale::{NewSale, Sale, SaleDetails, SaleId};
use crate::repo::customer_repo::{customer_columns, parse_customer_row};
use crate::repo::financing_repo::{financing_columns, parse_financing_row};
use crate::repo::{
    decimal_column, ensure_connection_ready, record_exists, Entity, RepoError, RepoResult,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const SALE_SELECT_SQL: &str = "SELECT
    s.id AS id,
    s.customer_id AS customer_id,
    s.financing_id AS financing_id,
    s.sold_at AS sold_at,
    s.total_value AS total_value,
    s.payment_method AS payment_method,
    s.notes AS notes,
    s.created_at AS created_at,
    s.updated_at AS updated_at";

/// Repository interface for sales.
pub trait SaleRepository {
    fn list_sales(&self) -> RepoResult<Vec<SaleDetails>>;
    fn get_sale(&self, id: SaleId) -> RepoResult<Option<Sale>>;
    fn create_sale(&mut self, input: &NewSale) -> RepoResult<Sale>;
}

/// SQLite-backed sale repository.
pub struct SqliteSaleRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSaleRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["sales", "customers", "financing_requests"])?;
        Ok(Self { conn })
    }
}

impl SaleRepository for SqliteSaleRepository<'_> {
    fn list_sales(&self) -> RepoResult<Vec<SaleDetails>> {
        let sql = format!(
            "{SALE_SELECT_SQL}, {}, {}
             FROM sales s
             INNER JOIN customers c ON c.id = s.customer_id
             LEFT JOIN financing_requests f ON f.id = s.financing_id
             ORDER BY s.id ASC;",
            customer_columns("c", "c_"),
            financing_columns("f", "f_")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut sales = Vec::new();
        while let Some(row) = rows.next()? {
            let financing = match row.get::<_, Option<i64>>("f_id")? {
                Some(_) => Some(parse_financing_row(row, "f_")?),
                None => None,
            };
            sales.push(SaleDetails {
                sale: parse_sale_row(row)?,
                customer: parse_customer_row(row, "c_")?,
                financing,
            });
        }
        Ok(sales)
    }

    fn get_sale(&self, id: SaleId) -> RepoResult<Option<Sale>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SALE_SELECT_SQL} FROM sales s WHERE s.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_sale_row(row)?)),
            None => Ok(None),
        }
    }

    fn create_sale(&mut self, input: &NewSale) -> RepoResult<Sale> {
        let now = Utc::now();
        let draft = input.validate(now)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !record_exists(&tx, "customers", draft.customer_id)? {
            return Err(RepoError::MissingReference {
                entity: Entity::Customer,
                id: draft.customer_id,
            });
        }

        if let Some(financing_id) = draft.financing_id {
            if !record_exists(&tx, "financing_requests", financing_id)? {
                return Err(RepoError::MissingReference {
                    entity: Entity::Financing,
                    id: financing_id,
                });
            }
            let linked_sale: Option<i64> = tx
                .query_row(
                    "SELECT id FROM sales WHERE financing_id = ?1;",
                    [financing_id],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(sale_id) = linked_sale {
                return Err(RepoError::FinancingAlreadyLinked {
                    financing_id,
                    sale_id,
                });
            }
        }

        tx.execute(
            "INSERT INTO sales (
                customer_id,
                financing_id,
                sold_at,
                total_value,
                payment_method,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
            params![
                draft.customer_id,
                draft.financing_id,
                draft.sold_at,
                draft.total_value.to_string(),
                draft.payment_method.as_str(),
                draft.notes.as_deref(),
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        self.get_sale(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Sale,
            id,
        })
    }
}

fn parse_sale_row(row: &Row<'_>) -> RepoResult<Sale> {
    Ok(Sale {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        financing_id: row.get("financing_id")?,
        sold_at: row.get("sold_at")?,
        total_value: decimal_column(row, "total_value")?,
        payment_method: row.get("payment_method")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
