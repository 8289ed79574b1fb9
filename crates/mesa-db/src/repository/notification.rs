//! # Notification Repository
//!
//! Database operations for role-addressed in-app notifications. Rows carry
//! denormalized title/message plus plain back-references; deleting a table,
//! order or bill never deletes its notifications.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::{Notification, NotificationKind};

/// Repository for notification database operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

const SELECT_NOTIFICATION: &str = "SELECT id, staff_id, kind, title, message, \
     table_id, order_id, bill_id, is_read, created_at, read_at FROM notifications";

/// Parameters for inserting a notification.
#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub staff_id: &'a str,
    pub kind: NotificationKind,
    pub title: &'a str,
    pub message: &'a str,
    pub table_id: Option<&'a str>,
    pub order_id: Option<&'a str>,
    pub bill_id: Option<&'a str>,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Inserts a notification addressed to one staff member.
    pub async fn insert(&self, new: NewNotification<'_>, now: DateTime<Utc>) -> DbResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            staff_id: new.staff_id.to_string(),
            kind: new.kind,
            title: new.title.to_string(),
            message: new.message.to_string(),
            table_id: new.table_id.map(str::to_string),
            order_id: new.order_id.map(str::to_string),
            bill_id: new.bill_id.map(str::to_string),
            is_read: false,
            created_at: now,
            read_at: None,
        };

        debug!(
            id = %notification.id,
            staff_id = %notification.staff_id,
            kind = notification.kind.as_str(),
            "Inserting notification"
        );

        sqlx::query(
            r#"
            INSERT INTO notifications (id, staff_id, kind, title, message, table_id, order_id, bill_id, is_read, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.staff_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.table_id)
        .bind(&notification.order_id)
        .bind(&notification.bill_id)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Lists a staff member's unread notifications, newest first.
    pub async fn unread_for_staff(&self, staff_id: &str) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "{SELECT_NOTIFICATION} WHERE staff_id = ?1 AND is_read = 0 ORDER BY created_at DESC"
        ))
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Marks a notification read, setting `read_at` once.
    ///
    /// Already-read notifications keep their original `read_at`.
    pub async fn mark_read(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = ?1 WHERE id = ?2 AND is_read = 0",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish missing from already read
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM notifications WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            if exists.is_none() {
                return Err(DbError::not_found("notification", id));
            }
        }

        Ok(())
    }

    /// Deletes read notifications whose `read_at` is at or before the
    /// cutoff. Returns the number of rows deleted. Unread notifications are
    /// kept regardless of age.
    pub async fn prune_read_older_than(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE is_read = 1 AND read_at <= ?1")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mesa_core::StaffRole;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_note<'a>(staff_id: &'a str) -> NewNotification<'a> {
        NewNotification {
            staff_id,
            kind: NotificationKind::BillPending,
            title: "Bill pending",
            message: "Table 4 bill pending for 2 hours",
            table_id: None,
            order_id: None,
            bill_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_unread() {
        let db = test_db().await;
        let now = Utc::now();
        let staff = db.staff().insert("Ali", StaffRole::Manager, now).await.unwrap();

        db.notifications().insert(new_note(&staff.id), now).await.unwrap();
        db.notifications().insert(new_note(&staff.id), now).await.unwrap();

        let unread = db.notifications().unread_for_staff(&staff.id).await.unwrap();
        assert_eq!(unread.len(), 2);
        assert!(unread.iter().all(|n| !n.is_read && n.read_at.is_none()));
    }

    #[tokio::test]
    async fn test_mark_read_sets_read_at_once() {
        let db = test_db().await;
        let now = Utc::now();
        let staff = db.staff().insert("Ali", StaffRole::Manager, now).await.unwrap();
        let note = db.notifications().insert(new_note(&staff.id), now).await.unwrap();

        db.notifications().mark_read(&note.id, now).await.unwrap();

        // Second read keeps the original timestamp
        let later = now + chrono::Duration::hours(1);
        db.notifications().mark_read(&note.id, later).await.unwrap();

        let unread = db.notifications().unread_for_staff(&staff.id).await.unwrap();
        assert!(unread.is_empty());
    }

    #[tokio::test]
    async fn test_prune_keeps_unread_and_recent() {
        let db = test_db().await;
        let now = Utc::now();
        let staff = db.staff().insert("Ali", StaffRole::Manager, now).await.unwrap();
        let repo = db.notifications();

        let old_read = repo.insert(new_note(&staff.id), now).await.unwrap();
        let fresh_read = repo.insert(new_note(&staff.id), now).await.unwrap();
        repo.insert(new_note(&staff.id), now).await.unwrap(); // stays unread

        repo.mark_read(&old_read.id, now - chrono::Duration::days(40)).await.unwrap();
        repo.mark_read(&fresh_read.id, now).await.unwrap();

        let pruned = repo
            .prune_read_older_than(now - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(pruned, 1);

        // One unread left, fresh read row still present
        let unread = repo.unread_for_staff(&staff.id).await.unwrap();
        assert_eq!(unread.len(), 1);
    }
}
