//! # Table Repository
//!
//! Database operations for dining tables.
//!
//! ## Table Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Table Lifecycle                                   │
//! │                                                                         │
//! │  1. REGISTER                                                           │
//! │     └── insert() → Table { status: Available }                         │
//! │     └── (Also inserts the table's bill row in the same transaction)    │
//! │                                                                         │
//! │  2. SEAT GUESTS                                                        │
//! │     └── transition(available → occupied)                               │
//! │                                                                         │
//! │  3. BILL REQUESTED                                                     │
//! │     └── transition(occupied → bill_requested)                          │
//! │                                                                         │
//! │  4. FREE / RECLAIM                                                     │
//! │     └── transition(bill_requested → available)  after payment          │
//! │     └── transition(occupied → closed)           abandoned reclaim      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition is a conditional UPDATE guarded on the expected current
//! status. A lost race surfaces as `DbError::StaleState`, never as a silent
//! overwrite.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::{BillStatus, Table, TableStatus};

/// Repository for dining table database operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

const SELECT_TABLE: &str = "SELECT id, table_number, seating_capacity, status, \
     created_at, updated_at FROM dining_tables";

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Registers a new dining table.
    ///
    /// Inserts the table (status `available`) and its one-to-one bill row
    /// (status `not_generated`) in a single transaction. Every table has a
    /// bill from the moment it exists; generation only fills in amounts.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the table number is already taken.
    pub async fn insert(
        &self,
        table_number: i64,
        seating_capacity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Table> {
        let table = Table {
            id: Uuid::new_v4().to_string(),
            table_number,
            seating_capacity,
            status: TableStatus::Available,
            created_at: now,
            updated_at: now,
        };
        let bill_id = Uuid::new_v4().to_string();

        debug!(id = %table.id, table_number, "Registering dining table");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO dining_tables (id, table_number, seating_capacity, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&table.id)
        .bind(table.table_number)
        .bind(table.seating_capacity)
        .bind(table.status)
        .bind(table.created_at)
        .bind(table.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO bills (id, table_id, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&bill_id)
        .bind(&table.id)
        .bind(BillStatus::NotGenerated)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(table)
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Table>> {
        let table = sqlx::query_as::<_, Table>(&format!("{SELECT_TABLE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(table)
    }

    /// Gets a table by its business number.
    pub async fn get_by_number(&self, table_number: i64) -> DbResult<Option<Table>> {
        let table = sqlx::query_as::<_, Table>(&format!("{SELECT_TABLE} WHERE table_number = ?1"))
            .bind(table_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(table)
    }

    /// Lists all tables ordered by table number.
    pub async fn list(&self) -> DbResult<Vec<Table>> {
        let tables = sqlx::query_as::<_, Table>(&format!("{SELECT_TABLE} ORDER BY table_number"))
            .fetch_all(&self.pool)
            .await?;

        Ok(tables)
    }

    /// Lists tables in a given status, ordered by table number.
    pub async fn list_by_status(&self, status: TableStatus) -> DbResult<Vec<Table>> {
        let tables = sqlx::query_as::<_, Table>(&format!(
            "{SELECT_TABLE} WHERE status = ?1 ORDER BY table_number"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    /// Transitions a table from an expected status to a new one.
    ///
    /// The UPDATE is guarded on the expected current status; if another
    /// writer got there first, no row matches and `StaleState` is returned.
    /// Legality of the `from → to` edge is checked by the caller against
    /// `TableStatus::can_transition_to`.
    pub async fn transition(
        &self,
        id: &str,
        from: TableStatus,
        to: TableStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id, from = from.as_str(), to = to.as_str(), "Table transition");

        let result = sqlx::query(
            r#"
            UPDATE dining_tables
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status = ?4
            "#,
        )
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Either the table vanished or a concurrent writer moved it
            return match self.get_by_id(id).await? {
                Some(_) => Err(DbError::stale("table", id, from.as_str())),
                None => Err(DbError::not_found("table", id)),
            };
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
