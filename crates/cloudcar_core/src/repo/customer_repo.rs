//! Customer repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and find-or-create over `customers`.
//! - Own the customer delete rules: restrict on sales, cascade to test
//!   drives and financing requests, unlink sales backed by that financing.
//!
//! # Invariants
//! - At most one row per tax ID, guaranteed by the unique index rather than
//!   by application-level check-then-act.
//! - Update and deletion each run in one immediate transaction; any
//!   failure rolls back.

use crate::model::customer::{
    Customer, CustomerDraft, CustomerId, CustomerPatch, NewCustomer, StateCode,
};
use crate::repo::{
    ensure_connection_ready, optional_decimal_column, Entity, RepoError, RepoResult,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const CUSTOMER_FIELDS: [&str; 10] = [
    "id",
    "name",
    "email",
    "phone",
    "tax_id",
    "city",
    "state",
    "income",
    "created_at",
    "updated_at",
];

/// Result of a find-or-create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOrCreate {
    pub customer: Customer,
    /// `true` when this call inserted the row.
    pub created: bool,
}

/// Rows touched by a customer deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomerDeletion {
    pub test_drives_removed: usize,
    pub financing_removed: usize,
    pub sales_unlinked: usize,
}

/// Repository interface for customer operations.
pub trait CustomerRepository {
    fn list_customers(&self) -> RepoResult<Vec<Customer>>;
    fn get_customer(&self, id: CustomerId) -> RepoResult<Option<Customer>>;
    fn create_customer(&self, input: &NewCustomer) -> RepoResult<Customer>;
    /// Returns the customer with the candidate's tax ID, creating it first
    /// when absent.
    fn find_or_create_customer(&self, input: &NewCustomer) -> RepoResult<FindOrCreate>;
    fn update_customer(&mut self, id: CustomerId, patch: &CustomerPatch) -> RepoResult<Customer>;
    fn delete_customer(&mut self, id: CustomerId) -> RepoResult<CustomerDeletion>;
}

/// SQLite-backed customer repository.
pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["customers", "sales"])?;
        Ok(Self { conn })
    }

    fn select_one(&self, filter: &str, value: &dyn rusqlite::ToSql) -> RepoResult<Option<Customer>> {
        select_customer(self.conn, filter, value)
    }

    fn insert(&self, draft: &CustomerDraft, on_conflict: &str) -> RepoResult<usize> {
        let now = Utc::now();
        let changed = self.conn.execute(
            &format!(
                "INSERT INTO customers (
                    name,
                    email,
                    phone,
                    tax_id,
                    city,
                    state,
                    income,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8){on_conflict};"
            ),
            params![
                draft.name.as_str(),
                draft.email.as_str(),
                draft.phone.as_str(),
                draft.tax_id.as_str(),
                draft.city.as_deref(),
                draft.state.map(StateCode::as_str),
                draft.income.map(|value| value.to_string()),
                now,
            ],
        )?;
        Ok(changed)
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn list_customers(&self) -> RepoResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers ORDER BY id ASC;",
            customer_columns("customers", "")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row, "")?);
        }
        Ok(customers)
    }

    fn get_customer(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        self.select_one("id", &id)
    }

    fn create_customer(&self, input: &NewCustomer) -> RepoResult<Customer> {
        let draft = input.validate()?;
        self.insert(&draft, "")?;
        let id = self.conn.last_insert_rowid();
        self.get_customer(id)?
            .ok_or(RepoError::NotFound {
                entity: Entity::Customer,
                id,
            })
    }

    fn find_or_create_customer(&self, input: &NewCustomer) -> RepoResult<FindOrCreate> {
        let draft = input.validate()?;

        if let Some(customer) = self.select_one("tax_id", &draft.tax_id)? {
            return Ok(FindOrCreate {
                customer,
                created: false,
            });
        }

        // A concurrent writer may insert the same tax ID between the read
        // above and this insert; the conflict clause turns that into a no-op.
        let inserted = self.insert(&draft, " ON CONFLICT(tax_id) DO NOTHING")?;
        let customer = self.select_one("tax_id", &draft.tax_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "customer with cpf `{}` vanished during find-or-create",
                draft.tax_id
            ))
        })?;

        Ok(FindOrCreate {
            customer,
            created: inserted == 1,
        })
    }

    fn update_customer(&mut self, id: CustomerId, patch: &CustomerPatch) -> RepoResult<Customer> {
        let not_found = || RepoError::NotFound {
            entity: Entity::Customer,
            id,
        };
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = select_customer(&tx, "id", &id)?.ok_or_else(not_found)?;
        let draft = patch.apply_to(&current)?;

        let changed = tx.execute(
            "UPDATE customers
             SET
                name = ?2,
                email = ?3,
                phone = ?4,
                tax_id = ?5,
                city = ?6,
                state = ?7,
                income = ?8,
                updated_at = ?9
             WHERE id = ?1;",
            params![
                id,
                draft.name.as_str(),
                draft.email.as_str(),
                draft.phone.as_str(),
                draft.tax_id.as_str(),
                draft.city.as_deref(),
                draft.state.map(StateCode::as_str),
                draft.income.map(|value| value.to_string()),
                Utc::now(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found());
        }

        let updated = select_customer(&tx, "id", &id)?.ok_or_else(not_found)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_customer(&mut self, id: CustomerId) -> RepoResult<CustomerDeletion> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row("SELECT 1 FROM customers WHERE id = ?1;", [id], |_| Ok(()))
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::NotFound {
                entity: Entity::Customer,
                id,
            });
        }

        let sales: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sales WHERE customer_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        if sales > 0 {
            return Err(RepoError::DeleteRestricted {
                customer_id: id,
                sales,
            });
        }

        // Sales of other customers may be backed by this customer's financing.
        let sales_unlinked = tx.execute(
            "UPDATE sales
             SET financing_id = NULL, updated_at = ?2
             WHERE financing_id IN (
                SELECT id FROM financing_requests WHERE customer_id = ?1
             );",
            params![id, Utc::now()],
        )?;
        let test_drives_removed =
            tx.execute("DELETE FROM test_drives WHERE customer_id = ?1;", [id])?;
        let financing_removed =
            tx.execute("DELETE FROM financing_requests WHERE customer_id = ?1;", [id])?;
        tx.execute("DELETE FROM customers WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(CustomerDeletion {
            test_drives_removed,
            financing_removed,
            sales_unlinked,
        })
    }
}

fn select_customer(
    conn: &Connection,
    filter: &str,
    value: &dyn rusqlite::ToSql,
) -> RepoResult<Option<Customer>> {
    let sql = format!(
        "SELECT {} FROM customers WHERE {filter} = ?1;",
        customer_columns("customers", "")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([value])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_customer_row(row, "")?)),
        None => Ok(None),
    }
}

/// Builds a select list for `customers` aliased as `table`, naming every
/// output column `<prefix><column>`.
pub(crate) fn customer_columns(table: &str, prefix: &str) -> String {
    CUSTOMER_FIELDS
        .iter()
        .map(|column| format!("{table}.{column} AS {prefix}{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses a customer from columns produced by [`customer_columns`].
pub(crate) fn parse_customer_row(row: &Row<'_>, prefix: &str) -> RepoResult<Customer> {
    let column = |name: &str| format!("{prefix}{name}");

    let state = match row.get::<_, Option<String>>(column("state").as_str())? {
        Some(code) => Some(StateCode::parse(&code).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid state code `{code}` in customers.state"))
        })?),
        None => None,
    };

    Ok(Customer {
        id: row.get(column("id").as_str())?,
        name: row.get(column("name").as_str())?,
        email: row.get(column("email").as_str())?,
        phone: row.get(column("phone").as_str())?,
        tax_id: row.get(column("tax_id").as_str())?,
        city: row.get(column("city").as_str())?,
        state,
        income: optional_decimal_column(row, column("income").as_str())?,
        created_at: row.get(column("created_at").as_str())?,
        updated_at: row.get(column("updated_at").as_str())?,
    })
}
