//! # Lifecycle Events
//!
//! Events emitted by lifecycle operations and scheduler jobs, consumed by
//! the notification dispatcher. Each event carries the denormalized fields
//! needed to render its title and message; the dispatcher never re-reads
//! the entities.

use serde::{Deserialize, Serialize};

use mesa_core::{Money, NotificationKind};

/// Something notification-worthy happened in the restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A new order was placed at a table.
    OrderPlaced {
        order_id: String,
        table_id: String,
        table_number: i64,
        item_count: i64,
    },

    /// An order was marked served.
    OrderReady {
        order_id: String,
        table_id: String,
        table_number: i64,
    },

    /// An order was cancelled.
    OrderCancelled {
        order_id: String,
        table_id: String,
        table_number: i64,
    },

    /// A bill has been pending past the escalation threshold.
    BillPending {
        bill_id: String,
        table_id: String,
        table_number: i64,
        total: Money,
        hours_pending: i64,
    },

    /// A bill was paid.
    PaymentReceived {
        bill_id: String,
        table_id: String,
        table_number: i64,
        total: Money,
    },

    /// The scheduler reclaimed an abandoned table.
    TableAutoClosed {
        table_id: String,
        table_number: i64,
    },
}

impl LifecycleEvent {
    /// The notification kind this event produces.
    pub fn kind(&self) -> NotificationKind {
        match self {
            LifecycleEvent::OrderPlaced { .. } => NotificationKind::OrderPlaced,
            LifecycleEvent::OrderReady { .. } => NotificationKind::OrderReady,
            LifecycleEvent::OrderCancelled { .. } => NotificationKind::OrderCancelled,
            LifecycleEvent::BillPending { .. } => NotificationKind::BillPending,
            LifecycleEvent::PaymentReceived { .. } => NotificationKind::PaymentReceived,
            LifecycleEvent::TableAutoClosed { .. } => NotificationKind::TableAbandoned,
        }
    }

    /// Short title for the notification.
    pub fn title(&self) -> String {
        match self {
            LifecycleEvent::OrderPlaced { table_number, .. } => {
                format!("New order at table {table_number}")
            }
            LifecycleEvent::OrderReady { table_number, .. } => {
                format!("Order ready for table {table_number}")
            }
            LifecycleEvent::OrderCancelled { table_number, .. } => {
                format!("Order cancelled at table {table_number}")
            }
            LifecycleEvent::BillPending { table_number, .. } => {
                format!("Bill pending at table {table_number}")
            }
            LifecycleEvent::PaymentReceived { table_number, .. } => {
                format!("Payment received for table {table_number}")
            }
            LifecycleEvent::TableAutoClosed { table_number, .. } => {
                format!("Table {table_number} auto-closed")
            }
        }
    }

    /// Full message body for the notification.
    pub fn message(&self) -> String {
        match self {
            LifecycleEvent::OrderPlaced {
                table_number,
                item_count,
                ..
            } => format!("Table {table_number} placed an order with {item_count} item(s)."),
            LifecycleEvent::OrderReady { table_number, .. } => {
                format!("The order for table {table_number} has been served.")
            }
            LifecycleEvent::OrderCancelled { table_number, .. } => {
                format!("The order for table {table_number} was cancelled.")
            }
            LifecycleEvent::BillPending {
                table_number,
                total,
                hours_pending,
                ..
            } => format!(
                "The bill for table {table_number} ({total}) has been pending for {hours_pending} hour(s)."
            ),
            LifecycleEvent::PaymentReceived {
                table_number,
                total,
                ..
            } => format!("Table {table_number} settled its bill of {total}."),
            LifecycleEvent::TableAutoClosed { table_number, .. } => format!(
                "Table {table_number} was closed automatically after prolonged inactivity."
            ),
        }
    }

    /// Back-reference to the table.
    pub fn table_id(&self) -> &str {
        match self {
            LifecycleEvent::OrderPlaced { table_id, .. }
            | LifecycleEvent::OrderReady { table_id, .. }
            | LifecycleEvent::OrderCancelled { table_id, .. }
            | LifecycleEvent::BillPending { table_id, .. }
            | LifecycleEvent::PaymentReceived { table_id, .. }
            | LifecycleEvent::TableAutoClosed { table_id, .. } => table_id,
        }
    }

    /// Back-reference to the order, when the event has one.
    pub fn order_id(&self) -> Option<&str> {
        match self {
            LifecycleEvent::OrderPlaced { order_id, .. }
            | LifecycleEvent::OrderReady { order_id, .. }
            | LifecycleEvent::OrderCancelled { order_id, .. } => Some(order_id),
            _ => None,
        }
    }

    /// Back-reference to the bill, when the event has one.
    pub fn bill_id(&self) -> Option<&str> {
        match self {
            LifecycleEvent::BillPending { bill_id, .. }
            | LifecycleEvent::PaymentReceived { bill_id, .. } => Some(bill_id),
            _ => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let event = LifecycleEvent::TableAutoClosed {
            table_id: "t-9".to_string(),
            table_number: 9,
        };
        assert_eq!(event.kind(), NotificationKind::TableAbandoned);
        assert_eq!(event.table_id(), "t-9");
    }

    #[test]
    fn test_bill_pending_rendering() {
        let event = LifecycleEvent::BillPending {
            bill_id: "b-1".to_string(),
            table_id: "t-4".to_string(),
            table_number: 4,
            total: Money::from_cents(33600),
            hours_pending: 2,
        };
        assert_eq!(event.title(), "Bill pending at table 4");
        assert!(event.message().contains("336.00"));
        assert!(event.message().contains("2 hour(s)"));
        assert_eq!(event.bill_id(), Some("b-1"));
        assert_eq!(event.order_id(), None);
    }
}
