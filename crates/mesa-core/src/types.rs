//! # Domain Types
//!
//! Core domain types used throughout Mesa POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Table       │   │     Order       │   │      Bill       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  table_number   │   │  table_id (FK)  │   │  table_id (1:1) │       │
//! │  │  capacity       │   │  status         │   │  order_id (1:1) │       │
//! │  │  status         │   │  notes          │   │  totals + tax   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    MenuItem     │   │   OrderItem     │   │  Notification   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price_cents    │   │  (order, item)  │   │  staff_id       │       │
//! │  │  category       │   │  UNIQUE pair    │   │  kind + title   │       │
//! │  │  is_available   │   │  quantity ≥ 1   │   │  back-refs only │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (`table_number`) - human-readable
//!
//! ## State Machines
//! The legal transition tables for Table, Order and Bill live here as
//! `can_transition_to` predicates. The lifecycle engine consults these
//! before mutating anything, so there is exactly one place that defines
//! which edges exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5.00% (the default dine-in rate)
/// Integer bps keep tax math exact; percentages only exist for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Table Status
// =============================================================================

/// Occupancy state of a dining table.
///
/// ## State Machine
/// ```text
/// available ──► occupied ──► bill_requested ──► available
///                  │                               ▲
///                  └────────► closed ──────────────┘
///                         (reclamation)      (manual reset)
/// ```
/// No other edges are legal. `bill_requested → available` happens only as
/// the side effect of a bill reaching `paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Ready for the next party.
    Available,
    /// A party is seated and has an open order.
    Occupied,
    /// The party asked for the bill (or a bill was generated).
    BillRequested,
    /// Force-closed by abandonment reclamation; needs a manual reset.
    Closed,
}

impl TableStatus {
    /// Returns true when moving from `self` to `target` is a legal edge.
    pub fn can_transition_to(&self, target: TableStatus) -> bool {
        use TableStatus::*;
        matches!(
            (self, target),
            (Available, Occupied)
                | (Occupied, BillRequested)
                | (BillRequested, Available)
                | (Occupied, Closed)
                | (Closed, Available)
        )
    }

    /// Stable lowercase name, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
            TableStatus::BillRequested => "bill_requested",
            TableStatus::Closed => "closed",
        }
    }
}

impl Default for TableStatus {
    fn default() -> Self {
        TableStatus::Available
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Menu Category
// =============================================================================

/// Menu section a dish belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MenuCategory {
    Starter,
    Main,
    Drinks,
    Dessert,
}

// =============================================================================
// Order Status
// =============================================================================

/// Kitchen-side state of an order.
///
/// ## State Machine
/// ```text
/// placed ──► in_kitchen ──► served ──► completed
///    │            │
///    └────────────┴──► cancelled
/// ```
/// `cancelled` and `completed` are terminal. The `placed → in_kitchen` edge
/// additionally requires at least one order item (enforced by the engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Waiter is still taking the order.
    Placed,
    /// Sent to the kitchen for preparation.
    InKitchen,
    /// Delivered to the table.
    Served,
    /// Abandoned before completion (escape hatch).
    Cancelled,
    /// Billed and paid.
    Completed,
}

impl OrderStatus {
    /// Returns true when moving from `self` to `target` is a legal edge.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Placed, InKitchen)
                | (InKitchen, Served)
                | (Served, Completed)
                | (Placed, Cancelled)
                | (InKitchen, Cancelled)
        )
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Completed)
    }

    /// Stable lowercase name, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::InKitchen => "in_kitchen",
            OrderStatus::Served => "served",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Completed => "completed",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Placed
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Bill Status
// =============================================================================

/// Settlement state of a bill.
///
/// ## State Machine
/// ```text
/// not_generated ──► pending ──► paid
///                      │
///                      └──► cancelled
/// ```
/// No transition leaves `paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Placeholder row created with the table; no amounts yet.
    NotGenerated,
    /// Amounts computed, awaiting payment.
    Pending,
    /// Settled. `paid_at` set exactly once.
    Paid,
    /// Abandoned without payment (escape hatch).
    Cancelled,
}

impl BillStatus {
    /// Returns true when moving from `self` to `target` is a legal edge.
    pub fn can_transition_to(&self, target: BillStatus) -> bool {
        use BillStatus::*;
        matches!(
            (self, target),
            // Re-generation of a pending bill replaces its amounts.
            (NotGenerated, Pending) | (Pending, Pending) | (Pending, Paid) | (Pending, Cancelled)
        )
    }

    /// Stable lowercase name, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::NotGenerated => "not_generated",
            BillStatus::Pending => "pending",
            BillStatus::Paid => "paid",
            BillStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for BillStatus {
    fn default() -> Self {
        BillStatus::NotGenerated
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Staff Role
// =============================================================================

/// Capability role of a staff member.
///
/// Notification audiences are resolved from a static event-kind → role-set
/// mapping; no dynamic permission objects exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Waiter,
    Cashier,
    Manager,
}

impl StaffRole {
    /// Stable lowercase name, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Waiter => "waiter",
            StaffRole::Cashier => "cashier",
            StaffRole::Manager => "manager",
        }
    }
}

// =============================================================================
// Notification Kind
// =============================================================================

/// Type tag carried by every notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderPlaced,
    OrderReady,
    OrderCancelled,
    BillPending,
    TableAbandoned,
    PaymentReceived,
}

impl NotificationKind {
    /// Returns the database representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderPlaced => "order_placed",
            NotificationKind::OrderReady => "order_ready",
            NotificationKind::OrderCancelled => "order_cancelled",
            NotificationKind::BillPending => "bill_pending",
            NotificationKind::TableAbandoned => "table_abandoned",
            NotificationKind::PaymentReceived => "payment_received",
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A physical seating unit with an occupancy state.
///
/// Created at setup time, mutated only by lifecycle transitions, never
/// deleted in normal operation. Exactly one bill row references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Table {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier painted on the table.
    pub table_number: i64,

    /// Number of seats (≥ 1).
    pub seating_capacity: i64,

    /// Current occupancy state.
    pub status: TableStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A dish or drink available for ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to waiters and on the bill.
    pub name: String,

    /// Menu section.
    pub category: MenuCategory,

    /// Price in the smallest currency unit (> 0).
    ///
    /// Prices are read live at billing time; edits do not rewrite
    /// historical bills because the bill snapshots its amounts.
    pub price_cents: i64,

    /// Optional description.
    pub description: Option<String>,

    /// Items flagged unavailable cannot be added to orders.
    pub is_available: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// The set of items requested for one dining episode at a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning table.
    pub table_id: String,

    /// Kitchen-side state.
    pub status: OrderStatus,

    /// Free-text instructions for the whole order.
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A quantified line referencing a menu item within an order.
///
/// The `(order_id, menu_item_id)` pair is unique: adding the same dish
/// twice overwrites quantity and note rather than duplicating the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub order_id: String,
    pub menu_item_id: String,

    /// Quantity ordered (≥ 1).
    pub quantity: i64,

    /// Optional per-line note ("no onions").
    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// The computed, snapshotted financial settlement for a table's order.
///
/// One-to-one with its table; optionally one-to-one with the order it was
/// generated from. Amounts are derived, recomputed only by generation, and
/// frozen thereafter; a paid bill never re-reads menu prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning table (unique, at most one bill per table).
    pub table_id: String,

    /// Order the amounts were generated from, once generated.
    pub order_id: Option<String>,

    /// Σ(quantity × unit price) at generation time.
    pub subtotal_cents: i64,

    /// Tax rate in basis points (500 = 5%), configurable per bill.
    pub tax_rate_bps: i64,

    /// round(subtotal × rate) at generation time.
    pub tax_cents: i64,

    /// subtotal + tax.
    pub total_cents: i64,

    /// Settlement state.
    pub status: BillStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set exactly once, on the transition to `paid`.
    pub paid_at: Option<DateTime<Utc>>,

    /// Persisted escalation marker. Replaces any in-process "already
    /// notified" flag so escalation stays exactly-once across restarts
    /// and multiple scheduler instances.
    pub last_escalated_at: Option<DateTime<Utc>>,
}

impl Bill {
    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Returns the tax amount as Money.
    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the bill's own tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps as u32)
    }
}

/// A staff member, the audience target for notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Staff {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,

    /// Capability role used for audience resolution.
    pub role: StaffRole,

    /// Inactive staff receive no notifications.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// An in-app notification addressed to one staff member.
///
/// Carries denormalized title/message plus optional back-references to the
/// table/order/bill that caused it. Back-references are plain values, not
/// foreign keys: deleting the referenced entity must not delete the
/// notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Addressee.
    pub staff_id: String,

    pub kind: NotificationKind,
    pub title: String,
    pub message: String,

    /// Back-reference only (no ownership).
    pub table_id: Option<String>,
    /// Back-reference only (no ownership).
    pub order_id: Option<String>,
    /// Back-reference only (no ownership).
    pub bill_id: Option<String>,

    pub is_read: bool,
    pub created_at: DateTime<Utc>,

    /// Set exactly once, when the notification is first read.
    pub read_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(500);
        assert_eq!(rate.bps(), 500);
        assert!((rate.percentage() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(5.0);
        assert_eq!(rate.bps(), 500);
    }

    #[test]
    fn test_tax_rate_default_is_five_percent() {
        assert_eq!(TaxRate::default().bps(), 500);
    }

    #[test]
    fn test_table_transitions() {
        use TableStatus::*;

        assert!(Available.can_transition_to(Occupied));
        assert!(Occupied.can_transition_to(BillRequested));
        assert!(BillRequested.can_transition_to(Available));
        assert!(Occupied.can_transition_to(Closed));
        assert!(Closed.can_transition_to(Available));

        // No other edges exist.
        assert!(!Available.can_transition_to(BillRequested));
        assert!(!Available.can_transition_to(Closed));
        assert!(!BillRequested.can_transition_to(Occupied));
        assert!(!BillRequested.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Occupied));
        assert!(!Occupied.can_transition_to(Available));
    }

    #[test]
    fn test_order_transitions() {
        use OrderStatus::*;

        assert!(Placed.can_transition_to(InKitchen));
        assert!(InKitchen.can_transition_to(Served));
        assert!(Served.can_transition_to(Completed));
        assert!(Placed.can_transition_to(Cancelled));
        assert!(InKitchen.can_transition_to(Cancelled));

        assert!(!Served.can_transition_to(Cancelled));
        assert!(!Placed.can_transition_to(Served));
        assert!(!Cancelled.can_transition_to(Placed));
        assert!(!Completed.can_transition_to(Placed));

        assert!(Cancelled.is_terminal());
        assert!(Completed.is_terminal());
        assert!(!Served.is_terminal());
    }

    #[test]
    fn test_bill_transitions_nothing_leaves_paid() {
        use BillStatus::*;

        assert!(NotGenerated.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Pending)); // re-generation
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));

        assert!(!Paid.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Paid.can_transition_to(NotGenerated));
        assert!(!NotGenerated.can_transition_to(Paid));
    }

    #[test]
    fn test_status_strings_match_db_representation() {
        assert_eq!(TableStatus::BillRequested.as_str(), "bill_requested");
        assert_eq!(OrderStatus::InKitchen.as_str(), "in_kitchen");
        assert_eq!(BillStatus::NotGenerated.as_str(), "not_generated");
        assert_eq!(StaffRole::Manager.as_str(), "manager");
    }
}
