//! # Order Repository
//!
//! Database operations for orders and their lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. PLACE                                                              │
//! │     └── insert() → Order { status: Placed }                            │
//! │                                                                         │
//! │  2. BUILD                                                              │
//! │     └── upsert_item() → quantity/note overwrite on repeat              │
//! │     └── remove_item()                                                  │
//! │                                                                         │
//! │  3. KITCHEN                                                            │
//! │     └── transition(placed → in_kitchen)   requires ≥ 1 line (caller)   │
//! │     └── transition(in_kitchen → served)                                │
//! │                                                                         │
//! │  4. SETTLE                                                             │
//! │     └── transition(served → completed)    via payment                  │
//! │     └── transition(* → cancelled)         from non-terminal states     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::{Order, OrderItem, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

const SELECT_ORDER: &str =
    "SELECT id, table_id, status, notes, created_at, updated_at FROM orders";

const SELECT_ITEM: &str =
    "SELECT id, order_id, menu_item_id, quantity, note, created_at FROM order_items";

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a new order in `placed` status.
    ///
    /// Table availability is checked by the caller (and enforced by the
    /// table transition that accompanies order creation).
    pub async fn insert(
        &self,
        table_id: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<Order> {
        let order = Order {
            id: Uuid::new_v4().to_string(),
            table_id: table_id.to_string(),
            status: OrderStatus::Placed,
            notes: notes.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.id, table_id, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, table_id, status, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.id)
        .bind(&order.table_id)
        .bind(order.status)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets the latest order for a table, if any.
    pub async fn latest_for_table(&self, table_id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_ORDER} WHERE table_id = ?1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(table_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists an order's lines in insertion order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "{SELECT_ITEM} WHERE order_id = ?1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts an order's lines.
    pub async fn item_count(&self, order_id: &str) -> DbResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE order_id = ?1")
                .bind(order_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Adds a menu item to an order, or overwrites the existing line.
    ///
    /// The `(order_id, menu_item_id)` pair is unique; a repeat add replaces
    /// quantity and note rather than summing or duplicating. Returns the
    /// resulting line.
    pub async fn upsert_item(
        &self,
        order_id: &str,
        menu_item_id: &str,
        quantity: i64,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<OrderItem> {
        let id = Uuid::new_v4().to_string();

        debug!(order_id, menu_item_id, quantity, "Upserting order line");

        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, menu_item_id, quantity, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (order_id, menu_item_id)
            DO UPDATE SET quantity = excluded.quantity, note = excluded.note
            "#,
        )
        .bind(&id)
        .bind(order_id)
        .bind(menu_item_id)
        .bind(quantity)
        .bind(note)
        .bind(now)
        .execute(&self.pool)
        .await?;

        // On conflict the original row (and its id) survives; reload it
        let item = sqlx::query_as::<_, OrderItem>(&format!(
            "{SELECT_ITEM} WHERE order_id = ?1 AND menu_item_id = ?2"
        ))
        .bind(order_id)
        .bind(menu_item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    /// Removes a line from an order.
    pub async fn remove_item(&self, order_id: &str, item_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM order_items WHERE id = ?1 AND order_id = ?2")
            .bind(item_id)
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("order item", item_id));
        }

        Ok(())
    }

    /// Transitions an order from an expected status to a new one.
    ///
    /// Guarded UPDATE; a lost race returns `StaleState`. Edge legality
    /// (`OrderStatus::can_transition_to`) and the non-empty requirement for
    /// `placed → in_kitchen` are checked by the caller.
    pub async fn transition(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id, from = from.as_str(), to = to.as_str(), "Order transition");

        let result = sqlx::query(
            r#"
            UPDATE orders
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
            return match self.get_by_id(id).await? {
                Some(_) => Err(DbError::stale("order", id, from.as_str())),
                None => Err(DbError::not_found("order", id)),
            };
        }

        Ok(())
    }

    /// Counts orders served within a time window.
    ///
    /// An order counts when it reached `served` (or went on to `completed`
    /// via payment) and its last update falls inside `[start, end)`. Used
    /// by the daily report.
    pub async fn count_served_updated_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM orders
            WHERE status IN ('served', 'completed') AND updated_at >= ?1 AND updated_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mesa_core::MenuCategory;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seeded_order(db: &Database) -> (Order, String) {
        let now = Utc::now();
        let table = db.tables().insert(1, 4, now).await.unwrap();
        let item = db
            .menu()
            .insert("Samosa", MenuCategory::Starter, 8000, None, now)
            .await
            .unwrap();
        let order = db.orders().insert(&table.id, None, now).await.unwrap();
        (order, item.id)
    }

    #[tokio::test]
    async fn test_upsert_overwrites_not_duplicates() {
        let db = test_db().await;
        let (order, item_id) = seeded_order(&db).await;
        let now = Utc::now();

        let first = db
            .orders()
            .upsert_item(&order.id, &item_id, 2, None, now)
            .await
            .unwrap();
        assert_eq!(first.quantity, 2);

        let second = db
            .orders()
            .upsert_item(&order.id, &item_id, 5, Some("extra chutney"), now)
            .await
            .unwrap();

        // Same row survives with the new quantity and note
        assert_eq!(second.id, first.id);
        assert_eq!(second.quantity, 5);
        assert_eq!(second.note.as_deref(), Some("extra chutney"));
        assert_eq!(db.orders().item_count(&order.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_item() {
        let db = test_db().await;
        let (order, item_id) = seeded_order(&db).await;
        let now = Utc::now();

        let line = db
            .orders()
            .upsert_item(&order.id, &item_id, 1, None, now)
            .await
            .unwrap();

        db.orders().remove_item(&order.id, &line.id).await.unwrap();
        assert_eq!(db.orders().item_count(&order.id).await.unwrap(), 0);

        let err = db.orders().remove_item(&order.id, &line.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_transition_guarded() {
        let db = test_db().await;
        let (order, _) = seeded_order(&db).await;
        let now = Utc::now();

        db.orders()
            .transition(&order.id, OrderStatus::Placed, OrderStatus::InKitchen, now)
            .await
            .unwrap();

        let err = db
            .orders()
            .transition(&order.id, OrderStatus::Placed, OrderStatus::InKitchen, now)
            .await
            .unwrap_err();
        assert!(err.is_stale());
    }

    #[tokio::test]
    async fn test_latest_for_table() {
        let db = test_db().await;
        let now = Utc::now();
        let table = db.tables().insert(2, 2, now).await.unwrap();

        assert!(db.orders().latest_for_table(&table.id).await.unwrap().is_none());

        db.orders().insert(&table.id, None, now).await.unwrap();
        let newer = db
            .orders()
            .insert(&table.id, None, now + chrono::Duration::seconds(10))
            .await
            .unwrap();

        let latest = db.orders().latest_for_table(&table.id).await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
    }

    #[tokio::test]
    async fn test_count_served_updated_between() {
        let db = test_db().await;
        let (order, _) = seeded_order(&db).await;
        let now = Utc::now();

        db.orders()
            .transition(&order.id, OrderStatus::Placed, OrderStatus::InKitchen, now)
            .await
            .unwrap();
        db.orders()
            .transition(&order.id, OrderStatus::InKitchen, OrderStatus::Served, now)
            .await
            .unwrap();

        let start = now - chrono::Duration::hours(1);
        let end = now + chrono::Duration::hours(1);
        assert_eq!(
            db.orders().count_served_updated_between(start, end).await.unwrap(),
            1
        );
        assert_eq!(
            db.orders().count_served_updated_between(end, end + chrono::Duration::hours(1)).await.unwrap(),
            0
        );
    }
}
