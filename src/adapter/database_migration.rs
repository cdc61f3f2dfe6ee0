use crate::adapter::database_error::DatabaseError;
use sqlx::{MySql, Pool};
use tracing::info;

/// 実行順に並べたマイグレーション
const MIGRATIONS: [(&str, &str); 6] = [
    (
        "001_create_members_table",
        include_str!("../../migrations/001_create_members_table.sql"),
    ),
    (
        "002_create_items_table",
        include_str!("../../migrations/002_create_items_table.sql"),
    ),
    (
        "003_create_item_categories_table",
        include_str!("../../migrations/003_create_item_categories_table.sql"),
    ),
    (
        "004_create_deliveries_table",
        include_str!("../../migrations/004_create_deliveries_table.sql"),
    ),
    (
        "005_create_orders_table",
        include_str!("../../migrations/005_create_orders_table.sql"),
    ),
    (
        "006_create_order_items_table",
        include_str!("../../migrations/006_create_order_items_table.sql"),
    ),
];

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        for (name, migration_sql) in MIGRATIONS.iter() {
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::MigrationError(format!("{} failed: {}", name, e)))?;
            info!(migration = *name, "マイグレーションを実行しました");
        }

        info!(count = MIGRATIONS.len(), "すべてのマイグレーションが完了しました");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_and_idempotent() {
        let names: Vec<&str> = MIGRATIONS.iter().map(|(name, _)| *name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        for (name, sql) in MIGRATIONS.iter() {
            assert!(
                sql.contains("CREATE TABLE IF NOT EXISTS"),
                "{} must be idempotent",
                name
            );
        }
    }
}
