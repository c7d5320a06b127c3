//! Test-drive repository contracts and SQLite implementation.
//!
//! # Invariants
//! - List reads inline the owning customer through a single JOIN.
//! - Create rejects unresolved customer references before inserting; the
//!   foreign key remains as a backstop.

use crate::model::test_drive::{NewTestDrive, TestDrive, TestDriveId, TestDriveWithCustomer};
use crate::repo::customer_repo::{customer_columns, parse_customer_row};
use crate::repo::{ensure_connection_ready, record_exists, Entity, RepoError, RepoResult};
use chrono::Utc;
use rusqlite::{params, Connection, Row};

const TEST_DRIVE_SELECT_SQL: &str = "SELECT
    t.id AS id,
    t.customer_id AS customer_id,
    t.scheduled_date AS scheduled_date,
    t.scheduled_time AS scheduled_time,
    t.message AS message,
    t.created_at AS created_at,
    t.updated_at AS updated_at";

/// Repository interface for test-drive bookings.
pub trait TestDriveRepository {
    fn list_test_drives(&self) -> RepoResult<Vec<TestDriveWithCustomer>>;
    fn get_test_drive(&self, id: TestDriveId) -> RepoResult<Option<TestDrive>>;
    fn create_test_drive(&self, input: &NewTestDrive) -> RepoResult<TestDrive>;
}

/// SQLite-backed test-drive repository.
pub struct SqliteTestDriveRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTestDriveRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["test_drives", "customers"])?;
        Ok(Self { conn })
    }
}

impl TestDriveRepository for SqliteTestDriveRepository<'_> {
    fn list_test_drives(&self) -> RepoResult<Vec<TestDriveWithCustomer>> {
        let sql = format!(
            "{TEST_DRIVE_SELECT_SQL}, {}
             FROM test_drives t
             INNER JOIN customers c ON c.id = t.customer_id
             ORDER BY t.id ASC;",
            customer_columns("c", "c_")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut bookings = Vec::new();
        while let Some(row) = rows.next()? {
            bookings.push(TestDriveWithCustomer {
                test_drive: parse_test_drive_row(row)?,
                customer: parse_customer_row(row, "c_")?,
            });
        }
        Ok(bookings)
    }

    fn get_test_drive(&self, id: TestDriveId) -> RepoResult<Option<TestDrive>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TEST_DRIVE_SELECT_SQL}
             FROM test_drives t
             WHERE t.id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_test_drive_row(row)?)),
            None => Ok(None),
        }
    }

    fn create_test_drive(&self, input: &NewTestDrive) -> RepoResult<TestDrive> {
        let draft = input.validate()?;
        if !record_exists(self.conn, "customers", draft.customer_id)? {
            return Err(RepoError::MissingReference {
                entity: Entity::Customer,
                id: draft.customer_id,
            });
        }

        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO test_drives (
                customer_id,
                scheduled_date,
                scheduled_time,
                message,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![
                draft.customer_id,
                draft.date,
                draft.time,
                draft.message.as_deref(),
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_test_drive(id)?.ok_or(RepoError::NotFound {
            entity: Entity::TestDrive,
            id,
        })
    }
}

fn parse_test_drive_row(row: &Row<'_>) -> RepoResult<TestDrive> {
    Ok(TestDrive {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        date: row.get("scheduled_date")?,
        time: row.get("scheduled_time")?,
        message: row.get("message")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
