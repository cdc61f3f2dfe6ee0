use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::item_repository::write_item;
use crate::domain::model::{
    Address, Delivery, DeliveryId, DeliveryStatus, ItemId, MemberId, Money, Order, OrderId,
    OrderItem, OrderItemId, OrderStatus,
};
use crate::domain::port::{ChangeSet, OrderRepository, RepositoryError, UnitOfWork};
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use tracing::debug;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row, Transaction};

/// MySQL注文リポジトリ
/// 注文集約（配送・注文商品）の読み込みと、在庫変更を含む作業単位のコミットを担う
#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    ///
    /// # Returns
    /// * MySqlOrderRepositoryのインスタンス
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// 注文・配送・注文商品を書き込む
    /// 既存の注文は読み込んだ時点のバージョンが一致する場合のみ状態を更新する
    /// 注文商品は作成後に変わらないため、新規の注文でのみ書き込む
    async fn write_order(
        tx: &mut Transaction<'_, MySql>,
        order: &Order,
    ) -> Result<(), RepositoryError> {
        let delivery = order.delivery();

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(order.status().to_string())
        .bind(order.id().to_string())
        .bind(order.version())
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)
        .map_err(RepositoryError::from)?
        .rows_affected();

        if updated > 0 {
            sqlx::query("UPDATE deliveries SET status = ? WHERE id = ?")
                .bind(delivery.status().to_string())
                .bind(delivery.id().to_string())
                .execute(&mut **tx)
                .await
                .map_err(DatabaseError::from)
                .map_err(RepositoryError::from)?;
            return Ok(());
        }

        let exists = sqlx::query("SELECT 1 FROM orders WHERE id = ?")
            .bind(order.id().to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?
            .is_some();
        if exists {
            return Err(RepositoryError::Conflict(format!(
                "注文が他の処理で更新されています: {}",
                order.id()
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO deliveries (id, city, street, zipcode, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(delivery.id().to_string())
        .bind(delivery.address().city())
        .bind(delivery.address().street())
        .bind(delivery.address().zipcode())
        .bind(delivery.status().to_string())
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)
        .map_err(RepositoryError::from)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, member_id, delivery_id, order_date, status, version)
            VALUES (?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.member_id().to_string())
        .bind(delivery.id().to_string())
        .bind(order.order_date().naive_utc())
        .bind(order.status().to_string())
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)
        .map_err(RepositoryError::from)?;

        for order_item in order.order_items() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, item_id, order_price, count)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(order_item.id().to_string())
            .bind(order.id().to_string())
            .bind(order_item.item_id().to_string())
            .bind(order_item.order_price().amount())
            .bind(order_item.count())
            .execute(&mut **tx)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;
        }

        Ok(())
    }
}

fn fetch_failed(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::FetchFailed(format!("{}の解析に失敗しました: {}", what, e))
}

fn order_item_from_row(row: &MySqlRow) -> Result<OrderItem, RepositoryError> {
    let order_item_id = OrderItemId::from_string(row.get("order_item_id"))
        .map_err(|e| fetch_failed("注文商品ID", e))?;
    let item_id =
        ItemId::from_string(row.get("item_id")).map_err(|e| fetch_failed("商品ID", e))?;
    let order_price =
        Money::new(row.get("order_price")).map_err(|e| fetch_failed("注文価格", e))?;
    Ok(OrderItem::reconstruct(
        order_item_id,
        item_id,
        order_price,
        row.get::<u32, _>("count"),
    ))
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        // 注文・配送・注文商品を結合して1件の集約を取得
        let rows = sqlx::query(
            r#"
            SELECT
                o.id, o.member_id, o.order_date, o.status, o.version,
                d.id AS delivery_id, d.city, d.street, d.zipcode, d.status AS delivery_status,
                oi.id AS order_item_id, oi.item_id, oi.order_price, oi.count
            FROM orders o
            JOIN deliveries d ON d.id = o.delivery_id
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.id = ?
            ORDER BY oi.seq
            "#,
        )
        .bind(order_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)
        .map_err(RepositoryError::from)?;

        let Some(first_row) = rows.first() else {
            return Ok(None);
        };

        let member_id = MemberId::from_string(first_row.get("member_id"))
            .map_err(|e| fetch_failed("会員ID", e))?;
        let status = OrderStatus::from_string(first_row.get("status"))
            .map_err(|e| fetch_failed("注文ステータス", e))?;
        let order_date: NaiveDateTime = first_row.get("order_date");

        let delivery_id = DeliveryId::from_string(first_row.get("delivery_id"))
            .map_err(|e| fetch_failed("配送ID", e))?;
        let address = Address::new(
            first_row.get("city"),
            first_row.get("street"),
            first_row.get("zipcode"),
        )
        .map_err(|e| fetch_failed("配送先住所", e))?;
        let delivery_status = DeliveryStatus::from_string(first_row.get("delivery_status"))
            .map_err(|e| fetch_failed("配送ステータス", e))?;

        let order_items = rows
            .iter()
            .map(order_item_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Order::reconstruct(
            order_id,
            member_id,
            Delivery::reconstruct(delivery_id, address, delivery_status),
            order_items,
            Utc.from_utc_datetime(&order_date),
            status,
            first_row.get::<u64, _>("version"),
        )))
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

#[async_trait]
impl UnitOfWork for MySqlOrderRepository {
    async fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        // エラー時はtxがドロップされてロールバックされる
        for item in &changes.items {
            write_item(&mut tx, item).await?;
        }
        for order in &changes.orders {
            Self::write_order(&mut tx, order).await?;
        }

        tx.commit()
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        debug!(
            orders = changes.orders.len(),
            items = changes.items.len(),
            "作業単位をコミットしました"
        );
        Ok(())
    }
}
