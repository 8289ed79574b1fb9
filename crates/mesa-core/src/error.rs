//! # Error Types
//!
//! Domain-specific error types for mesa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mesa-core errors (this file)                                          │
//! │  ├── CoreError        - State-machine and domain rule violations       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mesa-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  mesa-engine errors                                                    │
//! │  └── EngineError      - Core ∪ Db, what callers of the engine see      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (table number, current state)
//! 3. Errors are enum variants, never String; clients match on the kind
//! 4. Illegal transitions name the current state so the client can render
//!    an actionable message ("Table is occupied", "Order has no items")

use thiserror::Error;

use crate::types::{BillStatus, OrderStatus, TableStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent state-machine violations and domain rule failures. Every
/// variant is a stable kind: the request layer maps them to responses
/// without parsing message strings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Table id does not exist.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// An order was requested for a table that is not available.
    ///
    /// ## When This Occurs
    /// - Party already seated (occupied / bill_requested)
    /// - Table force-closed by reclamation and not yet reset
    #[error("Table {table_number} is {status}, cannot seat a new order")]
    TableNotAvailable {
        table_number: i64,
        status: TableStatus,
    },

    /// A bill was requested for a table with nobody at it.
    #[error("Table {table_number} is available, nothing to bill")]
    TableAvailable { table_number: i64 },

    /// Illegal table transition attempted.
    ///
    /// Covers every edge not present in the state machine, e.g. resetting
    /// a table that was never closed.
    #[error("Table {table_number}: illegal transition {from} -> {to}")]
    InvalidTableTransition {
        table_number: i64,
        from: TableStatus,
        to: TableStatus,
    },

    /// Order id does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Sending an order to the kitchen twice
    /// - Marking a placed order served
    /// - Touching a cancelled or completed order
    #[error("Order {order_id} is {current}, cannot move to {requested}")]
    InvalidOrderState {
        order_id: String,
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// An order with zero items cannot be sent to the kitchen or billed.
    #[error("Order {order_id} has no items")]
    EmptyOrder { order_id: String },

    /// Item edits on an order that is past the point of change.
    ///
    /// Items may change while the order is placed or in the kitchen;
    /// served, cancelled and completed orders are frozen.
    #[error("Order {order_id} is {status}, items can no longer be changed")]
    OrderClosed {
        order_id: String,
        status: OrderStatus,
    },

    /// Menu item id does not exist.
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    /// The menu item's availability flag is off right now.
    #[error("\"{name}\" is not available")]
    ItemUnavailable { name: String },

    /// The order item does not belong to the specified order.
    #[error("Order item {item_id} not found on order {order_id}")]
    OrderItemNotFound { order_id: String, item_id: String },

    /// Bill id does not exist.
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// Bill is not in a state that allows the requested transition.
    #[error("Bill {bill_id} is {current}, cannot move to {requested}")]
    InvalidBillState {
        bill_id: String,
        current: BillStatus,
        requested: BillStatus,
    },

    /// `pay` was applied to a bill that is already paid.
    ///
    /// The first payment wins; this rejection leaves all state unchanged.
    #[error("Bill {bill_id} is already paid")]
    AlreadyPaid { bill_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when input doesn't meet requirements, before any business
/// logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate table number).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
