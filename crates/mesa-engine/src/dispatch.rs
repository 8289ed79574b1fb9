//! # Notification Dispatcher
//!
//! Routes lifecycle events to staff by role.
//!
//! ## Audience Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Event → Audience Roles                              │
//! │                                                                         │
//! │  OrderPlaced      → Manager                                            │
//! │  OrderReady       → Waiter, Manager                                    │
//! │  OrderCancelled   → Manager                                            │
//! │  BillPending      → Manager                                            │
//! │  PaymentReceived  → Cashier, Manager                                   │
//! │  TableAutoClosed  → Manager                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dispatch is best-effort by contract: a failed insert is logged at warn
//! and swallowed. The lifecycle operation that emitted the event has
//! already committed; a notification hiccup must never roll it back.

use tracing::{debug, warn};

use crate::events::LifecycleEvent;
use mesa_core::StaffRole;
use mesa_db::{Database, NewNotification};

/// Resolves audiences and writes one notification row per recipient.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    db: Database,
}

/// Roles addressed by an event.
fn audience(event: &LifecycleEvent) -> &'static [StaffRole] {
    match event {
        LifecycleEvent::OrderPlaced { .. } => &[StaffRole::Manager],
        LifecycleEvent::OrderReady { .. } => &[StaffRole::Waiter, StaffRole::Manager],
        LifecycleEvent::OrderCancelled { .. } => &[StaffRole::Manager],
        LifecycleEvent::BillPending { .. } => &[StaffRole::Manager],
        LifecycleEvent::PaymentReceived { .. } => &[StaffRole::Cashier, StaffRole::Manager],
        LifecycleEvent::TableAutoClosed { .. } => &[StaffRole::Manager],
    }
}

impl NotificationDispatcher {
    /// Creates a new dispatcher over the given database.
    pub fn new(db: Database) -> Self {
        NotificationDispatcher { db }
    }

    /// Dispatches an event: one notification per active staff member in the
    /// audience roles. Returns the number of notifications created.
    ///
    /// Never fails. Audience-resolution or insert errors are logged and
    /// counted as zero recipients.
    pub async fn dispatch(&self, event: &LifecycleEvent) -> usize {
        let roles = audience(event);

        let recipients = match self.db.staff().by_roles(roles).await {
            Ok(staff) => staff,
            Err(e) => {
                warn!(error = %e, kind = event.kind().as_str(), "Audience resolution failed");
                return 0;
            }
        };

        if recipients.is_empty() {
            debug!(kind = event.kind().as_str(), "No active staff for audience");
            return 0;
        }

        let title = event.title();
        let message = event.message();
        let now = chrono::Utc::now();
        let mut created = 0;

        for staff in &recipients {
            let new = NewNotification {
                staff_id: &staff.id,
                kind: event.kind(),
                title: &title,
                message: &message,
                table_id: Some(event.table_id()),
                order_id: event.order_id(),
                bill_id: event.bill_id(),
            };

            match self.db.notifications().insert(new, now).await {
                Ok(_) => created += 1,
                Err(e) => {
                    warn!(
                        error = %e,
                        staff_id = %staff.id,
                        kind = event.kind().as_str(),
                        "Failed to insert notification"
                    );
                }
            }
        }

        debug!(
            kind = event.kind().as_str(),
            created,
            "Dispatched lifecycle event"
        );

        created
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mesa_core::NotificationKind;
    use mesa_db::DbConfig;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn payment_event() -> LifecycleEvent {
        LifecycleEvent::PaymentReceived {
            bill_id: "b-1".to_string(),
            table_id: "t-1".to_string(),
            table_number: 1,
            total: mesa_core::Money::from_cents(33600),
        }
    }

    #[tokio::test]
    async fn test_dispatch_hits_cashiers_and_managers() {
        let db = test_db().await;
        let now = Utc::now();
        let manager = db.staff().insert("Ayesha", StaffRole::Manager, now).await.unwrap();
        let cashier = db.staff().insert("Sana", StaffRole::Cashier, now).await.unwrap();
        db.staff().insert("Hamza", StaffRole::Waiter, now).await.unwrap();

        let dispatcher = NotificationDispatcher::new(db.clone());
        let created = dispatcher.dispatch(&payment_event()).await;
        assert_eq!(created, 2);

        for staff_id in [&manager.id, &cashier.id] {
            let unread = db.notifications().unread_for_staff(staff_id).await.unwrap();
            assert_eq!(unread.len(), 1);
            assert_eq!(unread[0].kind, NotificationKind::PaymentReceived);
            assert_eq!(unread[0].bill_id.as_deref(), Some("b-1"));
        }
    }

    #[tokio::test]
    async fn test_dispatch_skips_inactive_staff() {
        let db = test_db().await;
        let now = Utc::now();
        let former = db.staff().insert("Bilal", StaffRole::Manager, now).await.unwrap();
        db.staff().deactivate(&former.id).await.unwrap();

        let dispatcher = NotificationDispatcher::new(db.clone());
        let created = dispatcher
            .dispatch(&LifecycleEvent::TableAutoClosed {
                table_id: "t-2".to_string(),
                table_number: 2,
            })
            .await;
        assert_eq!(created, 0);
    }
}
