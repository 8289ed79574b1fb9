//! # Bill Repository
//!
//! Database operations for bills.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bill Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATED WITH THE TABLE                                             │
//! │     └── TableRepository::insert() → Bill { status: NotGenerated }      │
//! │                                                                         │
//! │  2. GENERATE                                                           │
//! │     └── write_generation() → amounts snapshot, status Pending          │
//! │     └── (Re-generation fully replaces amounts, never accumulates)      │
//! │                                                                         │
//! │  3. ESCALATE (scheduler, while Pending)                                │
//! │     └── claim_escalation() → atomic last_escalated_at claim            │
//! │                                                                         │
//! │  4. SETTLE                                                             │
//! │     └── mark_paid_and_free_table() → bill Paid + table Available,      │
//! │         one transaction, both or neither                               │
//! │     └── mark_cancelled() → Pending → Cancelled                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing leaves `paid`. Amounts are written only by generation and frozen
//! thereafter; a paid bill never re-reads menu prices.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mesa_core::{Bill, BillStatus, BillTotals, TableStatus};

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

const SELECT_BILL: &str = "SELECT id, table_id, order_id, subtotal_cents, tax_rate_bps, \
     tax_cents, total_cents, status, created_at, updated_at, paid_at, last_escalated_at \
     FROM bills";

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Gets a bill by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(&format!("{SELECT_BILL} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(bill)
    }

    /// Gets the bill owned by a table.
    pub async fn get_by_table(&self, table_id: &str) -> DbResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(&format!("{SELECT_BILL} WHERE table_id = ?1"))
            .bind(table_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(bill)
    }

    /// Writes a generation snapshot: order reference, amounts, status
    /// `pending`.
    ///
    /// Full replacement, never accumulation: re-generating after item edits
    /// (or from a different order) overwrites every amount column. Guarded
    /// so a paid or cancelled bill is never rewritten.
    pub async fn write_generation(
        &self,
        id: &str,
        order_id: &str,
        totals: &BillTotals,
        tax_rate_bps: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(
            id,
            order_id,
            subtotal = totals.subtotal.cents(),
            total = totals.total.cents(),
            "Writing bill generation"
        );

        let result = sqlx::query(
            r#"
            UPDATE bills
            SET order_id = ?1,
                subtotal_cents = ?2,
                tax_rate_bps = ?3,
                tax_cents = ?4,
                total_cents = ?5,
                status = ?6,
                updated_at = ?7
            WHERE id = ?8 AND status IN ('not_generated', 'pending')
            "#,
        )
        .bind(order_id)
        .bind(totals.subtotal.cents())
        .bind(tax_rate_bps)
        .bind(totals.tax.cents())
        .bind(totals.total.cents())
        .bind(BillStatus::Pending)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(bill) => Err(DbError::stale("bill", id, bill.status.as_str())),
                None => Err(DbError::not_found("bill", id)),
            };
        }

        Ok(())
    }

    /// Marks a bill paid and frees its table, in one transaction.
    ///
    /// Both writes land or neither does: the bill goes `pending → paid` with
    /// `paid_at` set once, and the table goes back to `available`. The bill
    /// UPDATE is guarded on `status = 'pending'`; a second payment attempt
    /// matches no row and surfaces as `StaleState` for the caller to map to
    /// an already-paid error.
    pub async fn mark_paid_and_free_table(
        &self,
        bill_id: &str,
        table_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(bill_id, table_id, "Marking bill paid");

        let mut tx = self.pool.begin().await?;

        let bill_result = sqlx::query(
            r#"
            UPDATE bills
            SET status = ?1, paid_at = ?2, updated_at = ?2
            WHERE id = ?3 AND status = 'pending'
            "#,
        )
        .bind(BillStatus::Paid)
        .bind(now)
        .bind(bill_id)
        .execute(&mut *tx)
        .await?;

        if bill_result.rows_affected() == 0 {
            tx.rollback().await?;
            return match self.get_by_id(bill_id).await? {
                Some(bill) => Err(DbError::stale("bill", bill_id, bill.status.as_str())),
                None => Err(DbError::not_found("bill", bill_id)),
            };
        }

        // The table may have been reclaimed meanwhile; freeing is
        // best-effort within the same transaction
        sqlx::query(
            r#"
            UPDATE dining_tables
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status IN ('occupied', 'bill_requested')
            "#,
        )
        .bind(TableStatus::Available)
        .bind(now)
        .bind(table_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Cancels a pending bill.
    pub async fn mark_cancelled(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bills
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status = 'pending'
            "#,
        )
        .bind(BillStatus::Cancelled)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(bill) => Err(DbError::stale("bill", id, bill.status.as_str())),
                None => Err(DbError::not_found("bill", id)),
            };
        }

        Ok(())
    }

    /// Lists pending bills last updated at or before the cutoff.
    ///
    /// "Pending since" is measured from `updated_at`, which generation (and
    /// re-generation) refreshes.
    pub async fn pending_older_than(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "{SELECT_BILL} WHERE status = 'pending' AND updated_at <= ?1 ORDER BY updated_at"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// Atomically claims the right to escalate a bill.
    ///
    /// Sets `last_escalated_at = now` only when the bill is still pending
    /// and was not escalated after `repeat_cutoff`. Returns whether this
    /// caller won the claim; only the winner dispatches notifications, so
    /// escalation stays exactly-once per window across restarts and
    /// concurrent scheduler instances.
    pub async fn claim_escalation(
        &self,
        id: &str,
        now: DateTime<Utc>,
        repeat_cutoff: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bills
            SET last_escalated_at = ?1
            WHERE id = ?2
              AND status = 'pending'
              AND (last_escalated_at IS NULL OR last_escalated_at <= ?3)
            "#,
        )
        .bind(now)
        .bind(id)
        .bind(repeat_cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sums paid-bill revenue over a time window.
    ///
    /// Returns `(revenue_cents, bill_count, tables_used)` for bills paid in
    /// `[start, end)`.
    pub async fn revenue_paid_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<(i64, i64, i64)> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_cents), 0), COUNT(*), COUNT(DISTINCT table_id)
            FROM bills
            WHERE status = 'paid' AND paid_at >= ?1 AND paid_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mesa_core::{Money, TaxRate};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn totals(subtotal_cents: i64) -> BillTotals {
        BillTotals::compute(Money::from_cents(subtotal_cents), TaxRate::from_bps(500))
    }

    async fn seeded_bill(db: &Database) -> (Bill, String, String) {
        let now = Utc::now();
        let table = db.tables().insert(1, 4, now).await.unwrap();
        let order = db.orders().insert(&table.id, None, now).await.unwrap();
        let bill = db.bills().get_by_table(&table.id).await.unwrap().unwrap();
        (bill, table.id, order.id)
    }

    #[tokio::test]
    async fn test_write_generation_snapshots_amounts() {
        let db = test_db().await;
        let (bill, _, order_id) = seeded_bill(&db).await;
        let now = Utc::now();

        db.bills()
            .write_generation(&bill.id, &order_id, &totals(32000), 500, now)
            .await
            .unwrap();

        let loaded = db.bills().get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, BillStatus::Pending);
        assert_eq!(loaded.subtotal_cents, 32000);
        assert_eq!(loaded.tax_cents, 1600);
        assert_eq!(loaded.total_cents, 33600);
        assert_eq!(loaded.order_id.as_deref(), Some(order_id.as_str()));
    }

    #[tokio::test]
    async fn test_regeneration_replaces_not_accumulates() {
        let db = test_db().await;
        let (bill, _, order_id) = seeded_bill(&db).await;
        let now = Utc::now();
        let repo = db.bills();

        repo.write_generation(&bill.id, &order_id, &totals(32000), 500, now)
            .await
            .unwrap();
        repo.write_generation(&bill.id, &order_id, &totals(10000), 500, now)
            .await
            .unwrap();

        let loaded = repo.get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(loaded.subtotal_cents, 10000);
        assert_eq!(loaded.total_cents, 10500);
    }

    #[tokio::test]
    async fn test_pay_frees_table_and_is_unrepeatable() {
        let db = test_db().await;
        let (bill, table_id, order_id) = seeded_bill(&db).await;
        let now = Utc::now();

        db.tables()
            .transition(&table_id, TableStatus::Available, TableStatus::Occupied, now)
            .await
            .unwrap();
        db.bills()
            .write_generation(&bill.id, &order_id, &totals(32000), 500, now)
            .await
            .unwrap();

        db.bills()
            .mark_paid_and_free_table(&bill.id, &table_id, now)
            .await
            .unwrap();

        let paid = db.bills().get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(paid.status, BillStatus::Paid);
        assert!(paid.paid_at.is_some());

        let table = db.tables().get_by_id(&table_id).await.unwrap().unwrap();
        assert_eq!(table.status, TableStatus::Available);

        // Second payment matches no row
        let err = db
            .bills()
            .mark_paid_and_free_table(&bill.id, &table_id, now)
            .await
            .unwrap_err();
        assert!(err.is_stale());

        let unchanged = db.bills().get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(unchanged.paid_at, paid.paid_at);
        assert_eq!(unchanged.total_cents, paid.total_cents);
    }

    #[tokio::test]
    async fn test_generation_rejected_after_payment() {
        let db = test_db().await;
        let (bill, table_id, order_id) = seeded_bill(&db).await;
        let now = Utc::now();
        let repo = db.bills();

        repo.write_generation(&bill.id, &order_id, &totals(5000), 500, now)
            .await
            .unwrap();
        repo.mark_paid_and_free_table(&bill.id, &table_id, now)
            .await
            .unwrap();

        let err = repo
            .write_generation(&bill.id, &order_id, &totals(9999), 500, now)
            .await
            .unwrap_err();
        assert!(err.is_stale());
    }

    #[tokio::test]
    async fn test_claim_escalation_once_per_window() {
        let db = test_db().await;
        let (bill, _, order_id) = seeded_bill(&db).await;
        let repo = db.bills();
        let t0 = Utc::now();

        repo.write_generation(&bill.id, &order_id, &totals(5000), 500, t0)
            .await
            .unwrap();

        let window = chrono::Duration::hours(2);

        // First claim at T+2h wins
        let t1 = t0 + window;
        assert!(repo.claim_escalation(&bill.id, t1, t1 - window).await.unwrap());

        // Retry five minutes later loses
        let t2 = t1 + chrono::Duration::minutes(5);
        assert!(!repo.claim_escalation(&bill.id, t2, t2 - window).await.unwrap());

        // A full window later it wins again
        let t3 = t1 + window;
        assert!(repo.claim_escalation(&bill.id, t3, t3 - window).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_older_than() {
        let db = test_db().await;
        let (bill, _, order_id) = seeded_bill(&db).await;
        let repo = db.bills();
        let t0 = Utc::now();

        repo.write_generation(&bill.id, &order_id, &totals(5000), 500, t0)
            .await
            .unwrap();

        let stale = repo.pending_older_than(t0 - chrono::Duration::hours(2)).await.unwrap();
        assert!(stale.is_empty());

        let due = repo.pending_older_than(t0 + chrono::Duration::hours(2)).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, bill.id);
    }

    #[tokio::test]
    async fn test_revenue_paid_between() {
        let db = test_db().await;
        let now = Utc::now();

        for n in 1..=2 {
            let table = db.tables().insert(n, 4, now).await.unwrap();
            let order = db.orders().insert(&table.id, None, now).await.unwrap();
            let bill = db.bills().get_by_table(&table.id).await.unwrap().unwrap();
            db.bills()
                .write_generation(&bill.id, &order.id, &totals(10000), 500, now)
                .await
                .unwrap();
            db.bills()
                .mark_paid_and_free_table(&bill.id, &table.id, now)
                .await
                .unwrap();
        }

        let start = now - chrono::Duration::hours(1);
        let end = now + chrono::Duration::hours(1);
        let (revenue, count, tables_used) =
            db.bills().revenue_paid_between(start, end).await.unwrap();
        assert_eq!(revenue, 21000);
        assert_eq!(count, 2);
        assert_eq!(tables_used, 2);

        let (r2, c2, _) = db.bills().revenue_paid_between(end, end + chrono::Duration::hours(1)).await.unwrap();
        assert_eq!((r2, c2), (0, 0));
    }
}
