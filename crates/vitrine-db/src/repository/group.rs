//! # Product Group Repository
//!
//! Groups are upserted by the first reconciler pass and never deleted:
//! a stale group simply stops being referenced.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use vitrine_core::ProductGroup;

/// Repository for product group operations.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: SqlitePool,
}

impl GroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        GroupRepository { pool }
    }

    /// Inserts or overwrites groups by code, in one transaction.
    pub async fn upsert_batch(&self, groups: &[ProductGroup]) -> DbResult<u64> {
        if groups.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for group in groups {
            let result = sqlx::query(
                r#"
                INSERT INTO product_groups (code, description) VALUES (?1, ?2)
                ON CONFLICT(code) DO UPDATE SET description = excluded.description
                "#,
            )
            .bind(&group.code)
            .bind(&group.description)
            .execute(&mut *tx)
            .await?;

            written += result.rows_affected();
        }

        tx.commit().await?;

        debug!(count = written, "Upserted group batch");
        Ok(written)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_groups")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_upsert_overwrites_description() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.groups();

        repo.upsert_batch(&[ProductGroup::new("1", "Banho"), ProductGroup::new("2", "Cozinha")])
            .await
            .unwrap();
        repo.upsert_batch(&[ProductGroup::new("1", "Cama, Mesa e Banho")])
            .await
            .unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);

        let description: String =
            sqlx::query_scalar("SELECT description FROM product_groups WHERE code = '1'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(description, "Cama, Mesa e Banho");
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.groups().upsert_batch(&[]).await.unwrap(), 0);
    }
}
