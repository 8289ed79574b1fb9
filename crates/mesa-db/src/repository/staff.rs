//! # Staff Repository
//!
//! Database operations for staff members. The dispatcher resolves
//! notification audiences here by role; inactive staff are never selected.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::{Staff, StaffRole};

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

const SELECT_STAFF: &str = "SELECT id, name, role, is_active, created_at FROM staff";

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Inserts a new active staff member.
    pub async fn insert(
        &self,
        name: &str,
        role: StaffRole,
        now: DateTime<Utc>,
    ) -> DbResult<Staff> {
        let staff = Staff {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role,
            is_active: true,
            created_at: now,
        };

        debug!(id = %staff.id, name = %staff.name, role = role.as_str(), "Inserting staff");

        sqlx::query(
            "INSERT INTO staff (id, name, role, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(staff.role)
        .bind(staff.is_active)
        .bind(staff.created_at)
        .execute(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Gets a staff member by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!("{SELECT_STAFF} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(staff)
    }

    /// Lists all staff ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!("{SELECT_STAFF} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        Ok(staff)
    }

    /// Lists active staff holding any of the given roles.
    ///
    /// The audience-resolution query: one row per person even when they
    /// match several requested roles.
    pub async fn by_roles(&self, roles: &[StaffRole]) -> DbResult<Vec<Staff>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        // sqlx has no array binding for SQLite; build the placeholder list
        let placeholders = (1..=roles.len())
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "{SELECT_STAFF} WHERE is_active = 1 AND role IN ({placeholders}) ORDER BY name"
        );

        let mut query = sqlx::query_as::<_, Staff>(&sql);
        for role in roles {
            query = query.bind(*role);
        }

        let staff = query.fetch_all(&self.pool).await?;
        Ok(staff)
    }

    /// Marks a staff member inactive. They stop receiving notifications.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE staff SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("staff", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_by_roles_selects_active_only() {
        let db = test_db().await;
        let repo = db.staff();
        let now = Utc::now();

        repo.insert("Ayesha", StaffRole::Manager, now).await.unwrap();
        let former = repo.insert("Bilal", StaffRole::Manager, now).await.unwrap();
        repo.insert("Hamza", StaffRole::Waiter, now).await.unwrap();
        repo.insert("Sana", StaffRole::Cashier, now).await.unwrap();

        repo.deactivate(&former.id).await.unwrap();

        let managers = repo.by_roles(&[StaffRole::Manager]).await.unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].name, "Ayesha");

        let front = repo
            .by_roles(&[StaffRole::Cashier, StaffRole::Manager])
            .await
            .unwrap();
        assert_eq!(front.len(), 2);

        assert!(repo.by_roles(&[]).await.unwrap().is_empty());
    }
}
