//! # Lifecycle Engine
//!
//! The operational core: every table, order and bill mutation goes through
//! here. The engine loads current state, checks the legal-transition tables
//! from mesa-core, and applies the change through the guarded repository
//! UPDATEs in mesa-db.
//!
//! ## A Table's Day
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Dine-In Service Flow                                │
//! │                                                                         │
//! │  register_table()      table: available          (setup, once)         │
//! │       │                                                                 │
//! │  create_order()        table: available → occupied                      │
//! │       │                order: placed                                    │
//! │  add_order_item() ×N   order items (upsert on repeat)                   │
//! │       │                                                                 │
//! │  advance_order()       order: placed → in_kitchen → served              │
//! │       │                                                                 │
//! │  request_bill()        table: occupied → bill_requested                 │
//! │       │                                                                 │
//! │  generate_bill()       bill: not_generated → pending (amount snapshot)  │
//! │       │                                                                 │
//! │  pay_bill()            bill: pending → paid                             │
//! │                        table: → available    (same transaction)         │
//! │                        order: served → completed                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications are emitted after the state change commits and never
//! affect the operation's outcome.

use chrono::Utc;
use tracing::{debug, info};

use crate::dispatch::NotificationDispatcher;
use crate::error::{EngineError, EngineResult};
use crate::events::LifecycleEvent;
use mesa_core::{
    validation, Bill, BillStatus, BillTotals, CoreError, MenuCategory, MenuItem, Money, Order,
    OrderStatus, Table, TableStatus,
};
use mesa_db::{Database, DbError};

/// Drives the table/order/bill state machines.
#[derive(Debug, Clone)]
pub struct LifecycleEngine {
    db: Database,
    dispatcher: NotificationDispatcher,
}

impl LifecycleEngine {
    /// Creates a new engine over the given database.
    pub fn new(db: Database) -> Self {
        let dispatcher = NotificationDispatcher::new(db.clone());
        LifecycleEngine { db, dispatcher }
    }

    /// Returns the underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Registers a new dining table together with its bill row.
    pub async fn register_table(
        &self,
        table_number: i64,
        seating_capacity: i64,
    ) -> EngineResult<Table> {
        validation::validate_table_number(table_number).map_err(CoreError::from)?;
        validation::validate_seating_capacity(seating_capacity).map_err(CoreError::from)?;

        let table = match self
            .db
            .tables()
            .insert(table_number, seating_capacity, Utc::now())
            .await
        {
            Ok(table) => table,
            Err(DbError::UniqueViolation { .. }) => {
                return Err(CoreError::from(mesa_core::ValidationError::Duplicate {
                    field: "table_number".to_string(),
                    value: table_number.to_string(),
                })
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        info!(table_number, id = %table.id, "Registered dining table");
        Ok(table)
    }

    /// Adds a dish to the menu.
    pub async fn add_menu_item(
        &self,
        name: &str,
        category: MenuCategory,
        price_cents: i64,
        description: Option<&str>,
    ) -> EngineResult<MenuItem> {
        validation::validate_name(name).map_err(CoreError::from)?;
        validation::validate_price_cents(price_cents).map_err(CoreError::from)?;

        let item = self
            .db
            .menu()
            .insert(name, category, price_cents, description, Utc::now())
            .await?;

        info!(name = %item.name, id = %item.id, "Added menu item");
        Ok(item)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Seats a party: creates a `placed` order and occupies the table.
    ///
    /// The table must be `available`. The table transition runs first and
    /// acts as the claim; two waiters racing for the same table produce
    /// exactly one order.
    pub async fn create_order(&self, table_id: &str, notes: Option<&str>) -> EngineResult<Order> {
        validation::validate_note(notes).map_err(CoreError::from)?;

        let table = self.load_table(table_id).await?;
        if table.status != TableStatus::Available {
            return Err(CoreError::TableNotAvailable {
                table_number: table.table_number,
                status: table.status,
            }
            .into());
        }

        let now = Utc::now();
        match self
            .db
            .tables()
            .transition(table_id, TableStatus::Available, TableStatus::Occupied, now)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_stale() => {
                // Someone else seated the table between our read and write
                let current = self.load_table(table_id).await?;
                return Err(CoreError::TableNotAvailable {
                    table_number: current.table_number,
                    status: current.status,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        let order = self.db.orders().insert(table_id, notes, now).await?;
        info!(order_id = %order.id, table_number = table.table_number, "Order placed");

        Ok(order)
    }

    /// Adds a menu item to an order, or overwrites the existing line.
    ///
    /// Repeat adds of the same dish replace quantity and note. The item
    /// must be available at call time; the order must still be open for
    /// edits (placed or in the kitchen).
    pub async fn add_order_item(
        &self,
        order_id: &str,
        menu_item_id: &str,
        quantity: i64,
        note: Option<&str>,
    ) -> EngineResult<mesa_core::OrderItem> {
        validation::validate_quantity(quantity).map_err(CoreError::from)?;
        validation::validate_note(note).map_err(CoreError::from)?;

        let order = self.load_order(order_id).await?;
        self.ensure_order_editable(&order)?;

        let menu_item = self
            .db
            .menu()
            .get_by_id(menu_item_id)
            .await?
            .ok_or_else(|| CoreError::MenuItemNotFound(menu_item_id.to_string()))?;

        if !menu_item.is_available {
            return Err(CoreError::ItemUnavailable {
                name: menu_item.name,
            }
            .into());
        }

        let item = self
            .db
            .orders()
            .upsert_item(order_id, menu_item_id, quantity, note, Utc::now())
            .await?;

        debug!(order_id, menu_item = %menu_item.name, quantity, "Order item upserted");
        Ok(item)
    }

    /// Removes a line from an order.
    pub async fn remove_order_item(&self, order_id: &str, item_id: &str) -> EngineResult<()> {
        let order = self.load_order(order_id).await?;
        self.ensure_order_editable(&order)?;

        match self.db.orders().remove_item(order_id, item_id).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound { .. }) => Err(CoreError::OrderItemNotFound {
                order_id: order_id.to_string(),
                item_id: item_id.to_string(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Advances an order along its state machine.
    ///
    /// `placed → in_kitchen` requires at least one item and notifies
    /// managers of the new kitchen order. Serving notifies waiters and
    /// managers; cancelling notifies managers.
    pub async fn advance_order(&self, order_id: &str, target: OrderStatus) -> EngineResult<Order> {
        let order = self.load_order(order_id).await?;

        if !order.status.can_transition_to(target) {
            return Err(CoreError::InvalidOrderState {
                order_id: order_id.to_string(),
                current: order.status,
                requested: target,
            }
            .into());
        }

        let mut item_count = 0;
        if target == OrderStatus::InKitchen {
            item_count = self.db.orders().item_count(order_id).await?;
            if item_count == 0 {
                return Err(CoreError::EmptyOrder {
                    order_id: order_id.to_string(),
                }
                .into());
            }
        }

        let now = Utc::now();
        match self
            .db
            .orders()
            .transition(order_id, order.status, target, now)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_stale() => {
                let current = self.load_order(order_id).await?;
                return Err(CoreError::InvalidOrderState {
                    order_id: order_id.to_string(),
                    current: current.status,
                    requested: target,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        info!(order_id, from = %order.status, to = %target, "Order advanced");

        let table = self.load_table(&order.table_id).await?;
        match target {
            OrderStatus::InKitchen => {
                // The kitchen-facing "new order" moment: the item set exists
                self.dispatcher
                    .dispatch(&LifecycleEvent::OrderPlaced {
                        order_id: order_id.to_string(),
                        table_id: table.id.clone(),
                        table_number: table.table_number,
                        item_count,
                    })
                    .await;
            }
            OrderStatus::Served => {
                self.dispatcher
                    .dispatch(&LifecycleEvent::OrderReady {
                        order_id: order_id.to_string(),
                        table_id: table.id.clone(),
                        table_number: table.table_number,
                    })
                    .await;
            }
            OrderStatus::Cancelled => {
                self.dispatcher
                    .dispatch(&LifecycleEvent::OrderCancelled {
                        order_id: order_id.to_string(),
                        table_id: table.id.clone(),
                        table_number: table.table_number,
                    })
                    .await;
            }
            _ => {}
        }

        Ok(Order {
            status: target,
            updated_at: now,
            ..order
        })
    }

    // =========================================================================
    // Bills
    // =========================================================================

    /// Marks a table as waiting for its bill.
    pub async fn request_bill(&self, table_id: &str) -> EngineResult<Table> {
        let table = self.load_table(table_id).await?;

        match table.status {
            TableStatus::Available => {
                return Err(CoreError::TableAvailable {
                    table_number: table.table_number,
                }
                .into());
            }
            TableStatus::Occupied => {}
            _ => {
                return Err(CoreError::InvalidTableTransition {
                    table_number: table.table_number,
                    from: table.status,
                    to: TableStatus::BillRequested,
                }
                .into());
            }
        }

        let now = Utc::now();
        self.db
            .tables()
            .transition(table_id, TableStatus::Occupied, TableStatus::BillRequested, now)
            .await
            .map_err(|e| self.map_table_stale(e, &table, TableStatus::BillRequested))?;

        info!(table_number = table.table_number, "Bill requested");

        Ok(Table {
            status: TableStatus::BillRequested,
            updated_at: now,
            ..table
        })
    }

    /// Generates (or re-generates) a bill from an order.
    ///
    /// Recomputes subtotal, tax and total from the order's current items at
    /// the bill's own tax rate, snapshots them onto the bill, and marks it
    /// `pending`. Re-generation fully replaces the amounts. Also moves the
    /// table to `bill_requested` when it is still merely occupied.
    pub async fn generate_bill(&self, bill_id: &str, order_id: &str) -> EngineResult<Bill> {
        let bill = self.load_bill(bill_id).await?;
        let order = self.load_order(order_id).await?;

        // The order must belong to the bill's table
        if order.table_id != bill.table_id {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }

        let items = self.db.orders().items(order_id).await?;
        if items.is_empty() {
            return Err(CoreError::EmptyOrder {
                order_id: order_id.to_string(),
            }
            .into());
        }

        // Live price read: the bill freezes them from here on
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            let menu_item = self
                .db
                .menu()
                .get_by_id(&item.menu_item_id)
                .await?
                .ok_or_else(|| CoreError::MenuItemNotFound(item.menu_item_id.clone()))?;
            lines.push((item.quantity, menu_item.price()));
        }

        let subtotal = mesa_core::billing::order_subtotal(lines);
        let totals = BillTotals::compute(subtotal, bill.tax_rate());

        let now = Utc::now();
        match self
            .db
            .bills()
            .write_generation(bill_id, order_id, &totals, bill.tax_rate_bps, now)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_stale() => {
                let current = self.load_bill(bill_id).await?;
                return Err(CoreError::InvalidBillState {
                    bill_id: bill_id.to_string(),
                    current: current.status,
                    requested: BillStatus::Pending,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        // Mirror of the manual request_bill step; skipped silently if the
        // table already moved on
        let table = self.load_table(&bill.table_id).await?;
        if table.status == TableStatus::Occupied {
            let _ = self
                .db
                .tables()
                .transition(&table.id, TableStatus::Occupied, TableStatus::BillRequested, now)
                .await;
        }

        info!(
            bill_id,
            order_id,
            subtotal = totals.subtotal.cents(),
            tax = totals.tax.cents(),
            total = totals.total.cents(),
            "Bill generated"
        );

        Ok(Bill {
            order_id: Some(order_id.to_string()),
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            status: BillStatus::Pending,
            updated_at: now,
            ..bill
        })
    }

    /// Settles a bill: bill → paid and table → available, atomically.
    ///
    /// The first payment wins; repeats are rejected with `AlreadyPaid` and
    /// change nothing. The served order, if any, completes best-effort.
    pub async fn pay_bill(&self, bill_id: &str) -> EngineResult<Bill> {
        let bill = self.load_bill(bill_id).await?;

        match bill.status {
            BillStatus::Paid => {
                return Err(CoreError::AlreadyPaid {
                    bill_id: bill_id.to_string(),
                }
                .into());
            }
            BillStatus::Pending => {}
            _ => {
                return Err(CoreError::InvalidBillState {
                    bill_id: bill_id.to_string(),
                    current: bill.status,
                    requested: BillStatus::Paid,
                }
                .into());
            }
        }

        let now = Utc::now();
        match self
            .db
            .bills()
            .mark_paid_and_free_table(bill_id, &bill.table_id, now)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_stale() => {
                // Raced with another cashier; report what the bill is now
                let current = self.load_bill(bill_id).await?;
                if current.status == BillStatus::Paid {
                    return Err(CoreError::AlreadyPaid {
                        bill_id: bill_id.to_string(),
                    }
                    .into());
                }
                return Err(CoreError::InvalidBillState {
                    bill_id: bill_id.to_string(),
                    current: current.status,
                    requested: BillStatus::Paid,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        // Complete the served order; a cancelled or missing order is fine
        if let Some(order_id) = &bill.order_id {
            if let Some(order) = self.db.orders().get_by_id(order_id).await? {
                if order.status == OrderStatus::Served {
                    let _ = self
                        .db
                        .orders()
                        .transition(order_id, OrderStatus::Served, OrderStatus::Completed, now)
                        .await;
                }
            }
        }

        let table = self.load_table(&bill.table_id).await?;
        info!(
            bill_id,
            table_number = table.table_number,
            total = bill.total_cents,
            "Bill paid"
        );

        self.dispatcher
            .dispatch(&LifecycleEvent::PaymentReceived {
                bill_id: bill_id.to_string(),
                table_id: table.id.clone(),
                table_number: table.table_number,
                total: Money::from_cents(bill.total_cents),
            })
            .await;

        Ok(Bill {
            status: BillStatus::Paid,
            paid_at: Some(now),
            updated_at: now,
            ..bill
        })
    }

    /// Cancels a pending bill.
    pub async fn cancel_bill(&self, bill_id: &str) -> EngineResult<()> {
        let bill = self.load_bill(bill_id).await?;

        match self.db.bills().mark_cancelled(bill_id, Utc::now()).await {
            Ok(()) => {
                info!(bill_id, "Bill cancelled");
                Ok(())
            }
            Err(e) if e.is_stale() => Err(CoreError::InvalidBillState {
                bill_id: bill_id.to_string(),
                current: bill.status,
                requested: BillStatus::Cancelled,
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Manually reopens a table that reclamation closed.
    pub async fn reset_table(&self, table_id: &str) -> EngineResult<Table> {
        let table = self.load_table(table_id).await?;

        if table.status != TableStatus::Closed {
            return Err(CoreError::InvalidTableTransition {
                table_number: table.table_number,
                from: table.status,
                to: TableStatus::Available,
            }
            .into());
        }

        let now = Utc::now();
        self.db
            .tables()
            .transition(table_id, TableStatus::Closed, TableStatus::Available, now)
            .await
            .map_err(|e| self.map_table_stale(e, &table, TableStatus::Available))?;

        info!(table_number = table.table_number, "Table reset to available");

        Ok(Table {
            status: TableStatus::Available,
            updated_at: now,
            ..table
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load_table(&self, table_id: &str) -> EngineResult<Table> {
        self.db
            .tables()
            .get_by_id(table_id)
            .await?
            .ok_or_else(|| CoreError::TableNotFound(table_id.to_string()).into())
    }

    async fn load_order(&self, order_id: &str) -> EngineResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    async fn load_bill(&self, bill_id: &str) -> EngineResult<Bill> {
        self.db
            .bills()
            .get_by_id(bill_id)
            .await?
            .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()).into())
    }

    fn ensure_order_editable(&self, order: &Order) -> EngineResult<()> {
        match order.status {
            OrderStatus::Placed | OrderStatus::InKitchen => Ok(()),
            status => Err(CoreError::OrderClosed {
                order_id: order.id.clone(),
                status,
            }
            .into()),
        }
    }

    fn map_table_stale(&self, e: DbError, table: &Table, to: TableStatus) -> EngineError {
        if e.is_stale() {
            CoreError::InvalidTableTransition {
                table_number: table.table_number,
                from: table.status,
                to,
            }
            .into()
        } else {
            e.into()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mesa_core::StaffRole;
    use mesa_db::DbConfig;

    async fn test_engine() -> LifecycleEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        LifecycleEngine::new(db)
    }

    async fn seed_menu(engine: &LifecycleEngine) -> (MenuItem, MenuItem) {
        let samosa = engine
            .add_menu_item("Samosa", MenuCategory::Starter, 8000, None)
            .await
            .unwrap();
        let lassi = engine
            .add_menu_item("Mango Lassi", MenuCategory::Drinks, 8000, None)
            .await
            .unwrap();
        (samosa, lassi)
    }

    fn assert_domain(err: EngineError, check: impl Fn(&CoreError) -> bool) {
        match err {
            EngineError::Domain(core) => assert!(check(&core), "unexpected error: {core}"),
            other => panic!("expected domain error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn test_full_service_flow() {
        let engine = test_engine().await;
        let db = engine.db().clone();
        let manager = db
            .staff()
            .insert("Ayesha", StaffRole::Manager, Utc::now())
            .await
            .unwrap();

        let table = engine.register_table(4, 4).await.unwrap();
        let (samosa, lassi) = seed_menu(&engine).await;

        let order = engine.create_order(&table.id, None).await.unwrap();
        engine.add_order_item(&order.id, &samosa.id, 2, None).await.unwrap();
        engine.add_order_item(&order.id, &lassi.id, 2, None).await.unwrap();

        engine.advance_order(&order.id, OrderStatus::InKitchen).await.unwrap();
        engine.advance_order(&order.id, OrderStatus::Served).await.unwrap();

        engine.request_bill(&table.id).await.unwrap();
        let bill = db.bills().get_by_table(&table.id).await.unwrap().unwrap();

        // 2 × 80.00 + 2 × 80.00 = 320.00, 5% tax = 16.00, total 336.00
        let generated = engine.generate_bill(&bill.id, &order.id).await.unwrap();
        assert_eq!(generated.subtotal_cents, 32000);
        assert_eq!(generated.tax_cents, 1600);
        assert_eq!(generated.total_cents, 33600);
        assert_eq!(generated.status, BillStatus::Pending);

        let paid = engine.pay_bill(&bill.id).await.unwrap();
        assert_eq!(paid.status, BillStatus::Paid);
        assert!(paid.paid_at.is_some());

        let freed = db.tables().get_by_id(&table.id).await.unwrap().unwrap();
        assert_eq!(freed.status, TableStatus::Available);

        let completed = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);

        // Manager was told about the kitchen order, the serve, the payment
        let unread = db.notifications().unread_for_staff(&manager.id).await.unwrap();
        assert_eq!(unread.len(), 3);
    }

    #[tokio::test]
    async fn test_create_order_requires_available_table() {
        let engine = test_engine().await;
        let table = engine.register_table(1, 2).await.unwrap();

        engine.create_order(&table.id, None).await.unwrap();

        let err = engine.create_order(&table.id, None).await.unwrap_err();
        assert_domain(err, |e| {
            matches!(
                e,
                CoreError::TableNotAvailable {
                    status: TableStatus::Occupied,
                    ..
                }
            )
        });

        let err = engine.create_order("missing", None).await.unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_order_cannot_reach_kitchen() {
        let engine = test_engine().await;
        let table = engine.register_table(1, 2).await.unwrap();
        let order = engine.create_order(&table.id, None).await.unwrap();

        let err = engine
            .advance_order(&order.id, OrderStatus::InKitchen)
            .await
            .unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::EmptyOrder { .. }));

        // Order stays placed
        let current = engine.db().orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn test_illegal_order_jump_rejected() {
        let engine = test_engine().await;
        let table = engine.register_table(1, 2).await.unwrap();
        let (samosa, _) = seed_menu(&engine).await;
        let order = engine.create_order(&table.id, None).await.unwrap();
        engine.add_order_item(&order.id, &samosa.id, 1, None).await.unwrap();

        let err = engine
            .advance_order(&order.id, OrderStatus::Served)
            .await
            .unwrap_err();
        assert_domain(err, |e| {
            matches!(
                e,
                CoreError::InvalidOrderState {
                    current: OrderStatus::Placed,
                    requested: OrderStatus::Served,
                    ..
                }
            )
        });
    }

    #[tokio::test]
    async fn test_unavailable_item_rejected() {
        let engine = test_engine().await;
        let table = engine.register_table(1, 2).await.unwrap();
        let (samosa, _) = seed_menu(&engine).await;
        engine
            .db()
            .menu()
            .set_availability(&samosa.id, false, Utc::now())
            .await
            .unwrap();

        let order = engine.create_order(&table.id, None).await.unwrap();
        let err = engine
            .add_order_item(&order.id, &samosa.id, 1, None)
            .await
            .unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::ItemUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_item_edits_frozen_after_serving() {
        let engine = test_engine().await;
        let table = engine.register_table(1, 2).await.unwrap();
        let (samosa, lassi) = seed_menu(&engine).await;
        let order = engine.create_order(&table.id, None).await.unwrap();
        engine.add_order_item(&order.id, &samosa.id, 1, None).await.unwrap();

        engine.advance_order(&order.id, OrderStatus::InKitchen).await.unwrap();
        // Still editable in the kitchen
        engine.add_order_item(&order.id, &lassi.id, 1, None).await.unwrap();

        engine.advance_order(&order.id, OrderStatus::Served).await.unwrap();
        let err = engine
            .add_order_item(&order.id, &samosa.id, 3, None)
            .await
            .unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::OrderClosed { .. }));
    }

    #[tokio::test]
    async fn test_generate_is_idempotent_and_recomputes() {
        let engine = test_engine().await;
        let db = engine.db().clone();
        let table = engine.register_table(1, 2).await.unwrap();
        let (samosa, _) = seed_menu(&engine).await;
        let order = engine.create_order(&table.id, None).await.unwrap();
        engine.add_order_item(&order.id, &samosa.id, 2, None).await.unwrap();

        let bill = db.bills().get_by_table(&table.id).await.unwrap().unwrap();

        let first = engine.generate_bill(&bill.id, &order.id).await.unwrap();
        let second = engine.generate_bill(&bill.id, &order.id).await.unwrap();
        assert_eq!(first.subtotal_cents, second.subtotal_cents);
        assert_eq!(first.total_cents, second.total_cents);

        // Item edit then regenerate: full replacement
        engine.add_order_item(&order.id, &samosa.id, 4, None).await.unwrap();
        let third = engine.generate_bill(&bill.id, &order.id).await.unwrap();
        assert_eq!(third.subtotal_cents, 32000);
        assert_eq!(third.total_cents, 33600);
    }

    #[tokio::test]
    async fn test_generate_empty_order_rejected() {
        let engine = test_engine().await;
        let db = engine.db().clone();
        let table = engine.register_table(1, 2).await.unwrap();
        let order = engine.create_order(&table.id, None).await.unwrap();
        let bill = db.bills().get_by_table(&table.id).await.unwrap().unwrap();

        let err = engine.generate_bill(&bill.id, &order.id).await.unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::EmptyOrder { .. }));

        let untouched = db.bills().get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, BillStatus::NotGenerated);
    }

    #[tokio::test]
    async fn test_double_pay_rejected_with_state_unchanged() {
        let engine = test_engine().await;
        let db = engine.db().clone();
        let table = engine.register_table(1, 2).await.unwrap();
        let (samosa, _) = seed_menu(&engine).await;
        let order = engine.create_order(&table.id, None).await.unwrap();
        engine.add_order_item(&order.id, &samosa.id, 1, None).await.unwrap();

        let bill = db.bills().get_by_table(&table.id).await.unwrap().unwrap();
        engine.generate_bill(&bill.id, &order.id).await.unwrap();
        let paid = engine.pay_bill(&bill.id).await.unwrap();

        let err = engine.pay_bill(&bill.id).await.unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::AlreadyPaid { .. }));

        let current = db.bills().get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(current.status, BillStatus::Paid);
        assert_eq!(current.total_cents, paid.total_cents);
    }

    #[tokio::test]
    async fn test_request_bill_guards() {
        let engine = test_engine().await;
        let table = engine.register_table(1, 2).await.unwrap();

        let err = engine.request_bill(&table.id).await.unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::TableAvailable { .. }));

        engine.create_order(&table.id, None).await.unwrap();
        let requested = engine.request_bill(&table.id).await.unwrap();
        assert_eq!(requested.status, TableStatus::BillRequested);

        // Second request: no longer occupied
        let err = engine.request_bill(&table.id).await.unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::InvalidTableTransition { .. }));
    }

    #[tokio::test]
    async fn test_reset_table_only_from_closed() {
        let engine = test_engine().await;
        let db = engine.db().clone();
        let table = engine.register_table(1, 2).await.unwrap();

        let err = engine.reset_table(&table.id).await.unwrap_err();
        assert_domain(err, |e| matches!(e, CoreError::InvalidTableTransition { .. }));

        let now = Utc::now();
        db.tables()
            .transition(&table.id, TableStatus::Available, TableStatus::Occupied, now)
            .await
            .unwrap();
        db.tables()
            .transition(&table.id, TableStatus::Occupied, TableStatus::Closed, now)
            .await
            .unwrap();

        let reset = engine.reset_table(&table.id).await.unwrap();
        assert_eq!(reset.status, TableStatus::Available);
    }
}
