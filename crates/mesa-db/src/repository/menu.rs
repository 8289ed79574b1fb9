//! # Menu Repository
//!
//! Database operations for menu items. Price and availability edits never
//! rewrite historical bills; bills snapshot their amounts at generation
//! time.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::{MenuCategory, MenuItem};

/// Repository for menu item database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

const SELECT_ITEM: &str = "SELECT id, name, category, price_cents, description, \
     is_available, created_at, updated_at FROM menu_items";

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Inserts a new menu item.
    pub async fn insert(
        &self,
        name: &str,
        category: MenuCategory,
        price_cents: i64,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<MenuItem> {
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category,
            price_cents,
            description: description.map(str::to_string),
            is_available: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, "Inserting menu item");

        sqlx::query(
            r#"
            INSERT INTO menu_items (id, name, category, price_cents, description, is_available, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.category)
        .bind(item.price_cents)
        .bind(&item.description)
        .bind(item.is_available)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets a menu item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!("{SELECT_ITEM} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists all menu items ordered by category then name.
    pub async fn list(&self) -> DbResult<Vec<MenuItem>> {
        let items =
            sqlx::query_as::<_, MenuItem>(&format!("{SELECT_ITEM} ORDER BY category, name"))
                .fetch_all(&self.pool)
                .await?;

        Ok(items)
    }

    /// Lists available items in a category, ordered by name.
    pub async fn list_available(&self, category: MenuCategory) -> DbResult<Vec<MenuItem>> {
        let items = sqlx::query_as::<_, MenuItem>(&format!(
            "{SELECT_ITEM} WHERE category = ?1 AND is_available = 1 ORDER BY name"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Flags an item available or unavailable.
    ///
    /// Unavailable items cannot be added to orders; existing order lines
    /// referencing them are untouched.
    pub async fn set_availability(
        &self,
        id: &str,
        is_available: bool,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE menu_items SET is_available = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(is_available)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("menu item", id));
        }

        Ok(())
    }

    /// Updates an item's price.
    pub async fn set_price(&self, id: &str, price_cents: i64, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id, price_cents, "Updating menu item price");

        let result =
            sqlx::query("UPDATE menu_items SET price_cents = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(price_cents)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("menu item", id));
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
    async fn test_insert_and_get() {
        let db = test_db().await;
        let now = Utc::now();

        let item = db
            .menu()
            .insert("Chicken Karahi", MenuCategory::Main, 85000, None, now)
            .await
            .unwrap();

        let loaded = db.menu().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Chicken Karahi");
        assert_eq!(loaded.price_cents, 85000);
        assert!(loaded.is_available);
    }

    #[tokio::test]
    async fn test_list_available_excludes_flagged_items() {
        let db = test_db().await;
        let repo = db.menu();
        let now = Utc::now();

        let samosa = repo
            .insert("Samosa", MenuCategory::Starter, 8000, None, now)
            .await
            .unwrap();
        repo.insert("Pakora", MenuCategory::Starter, 6000, None, now)
            .await
            .unwrap();

        repo.set_availability(&samosa.id, false, now).await.unwrap();

        let available = repo.list_available(MenuCategory::Starter).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name, "Pakora");
    }

    #[tokio::test]
    async fn test_set_price_missing_item() {
        let db = test_db().await;
        let err = db
            .menu()
            .set_price("missing", 100, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
