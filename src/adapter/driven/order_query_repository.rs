use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    Address, DeliveryId, DeliveryStatus, ItemId, MemberId, Money, OrderId, OrderItemId,
    OrderStatus, Relation,
};
use crate::domain::port::{OrderQueryRepository, RepositoryError};
use crate::domain::query::{
    DeliveryRow, MemberRow, OrderLineRow, OrderRootRow, OrderRow, OrderSearch, Page, RelationSet,
};
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use tracing::debug;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQL注文クエリリポジトリ
/// 要求された関連に合わせてJOIN句を組み立て、1回の呼び出しで1クエリを発行する
#[derive(Clone)]
pub struct MySqlOrderQueryRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderQueryRepository {
    /// 新しいMySQL注文クエリリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// バインドする値
enum Param {
    Text(String),
    Unsigned(u64),
}

/// 注文一覧のSELECT文を組み立てる
fn build_order_rows_sql(
    search: &OrderSearch,
    joins: RelationSet,
    page: Option<Page>,
) -> (String, Vec<Param>) {
    let mut columns = vec!["o.id AS order_id", "o.member_id", "o.order_date", "o.status"];
    // 会員は名前での絞り込みにも使うため常に結合する（対一なので行は増えない）
    let mut from = vec!["FROM orders o", "JOIN members m ON m.id = o.member_id"];

    if joins.contains(Relation::Member) {
        columns.extend([
            "m.name AS member_name",
            "m.city AS member_city",
            "m.street AS member_street",
            "m.zipcode AS member_zipcode",
        ]);
    }
    if joins.contains(Relation::Delivery) {
        columns.extend([
            "d.id AS delivery_id",
            "d.city AS delivery_city",
            "d.street AS delivery_street",
            "d.zipcode AS delivery_zipcode",
            "d.status AS delivery_status",
        ]);
        from.push("JOIN deliveries d ON d.id = o.delivery_id");
    }
    if joins.contains(Relation::Items) {
        columns.extend([
            "oi.id AS order_item_id",
            "oi.item_id",
            "i.name AS item_name",
            "oi.order_price",
            "oi.count",
        ]);
        from.push("JOIN order_items oi ON oi.order_id = o.id");
        from.push("JOIN items i ON i.id = oi.item_id");
    }

    let mut conditions = Vec::new();
    let mut params = Vec::new();
    if let Some(order_id) = search.order_id {
        conditions.push("o.id = ?");
        params.push(Param::Text(order_id.to_string()));
    }
    if let Some(member_id) = search.member_id {
        conditions.push("o.member_id = ?");
        params.push(Param::Text(member_id.to_string()));
    }
    if let Some(status) = search.status {
        conditions.push("o.status = ?");
        params.push(Param::Text(status.to_string()));
    }
    if let Some(member_name) = &search.member_name {
        conditions.push("m.name LIKE CONCAT('%', ?, '%')");
        params.push(Param::Text(escape_like(member_name)));
    }

    let mut sql = format!("SELECT {} {}", columns.join(", "), from.join(" "));
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY o.seq");
    if joins.contains(Relation::Items) {
        sql.push_str(", oi.seq");
    }
    if let Some(page) = page {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Param::Unsigned(page.limit() as u64));
        params.push(Param::Unsigned(page.offset() as u64));
    }

    (sql, params)
}

/// LIKEのワイルドカードをエスケープする
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn fetch_failed(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::FetchFailed(format!("{}の解析に失敗しました: {}", what, e))
}

fn line_from_row(row: &MySqlRow) -> Result<OrderLineRow, RepositoryError> {
    Ok(OrderLineRow {
        order_item_id: OrderItemId::from_string(row.get("order_item_id"))
            .map_err(|e| fetch_failed("注文商品ID", e))?,
        order_id: OrderId::from_string(row.get("order_id"))
            .map_err(|e| fetch_failed("注文ID", e))?,
        item_id: ItemId::from_string(row.get("item_id")).map_err(|e| fetch_failed("商品ID", e))?,
        item_name: row.get("item_name"),
        order_price: Money::new(row.get("order_price"))
            .map_err(|e| fetch_failed("注文価格", e))?,
        count: row.get::<u32, _>("count"),
    })
}

fn order_row_from_row(row: &MySqlRow, joins: RelationSet) -> Result<OrderRow, RepositoryError> {
    let order_date: NaiveDateTime = row.get("order_date");
    let member_id = MemberId::from_string(row.get("member_id"))
        .map_err(|e| fetch_failed("会員ID", e))?;
    let root = OrderRootRow {
        order_id: OrderId::from_string(row.get("order_id"))
            .map_err(|e| fetch_failed("注文ID", e))?,
        member_id,
        order_date: Utc.from_utc_datetime(&order_date),
        status: OrderStatus::from_string(row.get("status"))
            .map_err(|e| fetch_failed("注文ステータス", e))?,
    };

    let member = if joins.contains(Relation::Member) {
        Some(MemberRow {
            member_id,
            name: row.get("member_name"),
            address: Address::new(
                row.get("member_city"),
                row.get("member_street"),
                row.get("member_zipcode"),
            )
            .map_err(|e| fetch_failed("会員住所", e))?,
        })
    } else {
        None
    };

    let delivery = if joins.contains(Relation::Delivery) {
        Some(DeliveryRow {
            delivery_id: DeliveryId::from_string(row.get("delivery_id"))
                .map_err(|e| fetch_failed("配送ID", e))?,
            address: Address::new(
                row.get("delivery_city"),
                row.get("delivery_street"),
                row.get("delivery_zipcode"),
            )
            .map_err(|e| fetch_failed("配送先住所", e))?,
            status: DeliveryStatus::from_string(row.get("delivery_status"))
                .map_err(|e| fetch_failed("配送ステータス", e))?,
        })
    } else {
        None
    };

    let line = if joins.contains(Relation::Items) {
        Some(line_from_row(row)?)
    } else {
        None
    };

    Ok(OrderRow {
        root,
        member,
        delivery,
        line,
    })
}

#[async_trait]
impl OrderQueryRepository for MySqlOrderQueryRepository {
    async fn find_order_rows(
        &self,
        search: &OrderSearch,
        joins: RelationSet,
        page: Option<Page>,
    ) -> Result<Vec<OrderRow>, RepositoryError> {
        let (sql, params) = build_order_rows_sql(search, joins, page);
        debug!(sql = %sql, "注文一覧のクエリを発行します");

        let mut query = sqlx::query(&sql);
        for param in params {
            query = match param {
                Param::Text(value) => query.bind(value),
                Param::Unsigned(value) => query.bind(value),
            };
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        rows.iter()
            .map(|row| order_row_from_row(row, joins))
            .collect()
    }

    async fn find_order_lines_by_order_ids(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderLineRow>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; order_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT oi.id AS order_item_id, oi.order_id, oi.item_id, i.name AS item_name,
                   oi.order_price, oi.count
            FROM order_items oi
            JOIN items i ON i.id = oi.item_id
            WHERE oi.order_id IN ({})
            ORDER BY oi.seq
            "#,
            placeholders
        );
        debug!(order_ids = order_ids.len(), "注文商品をIN句で取得します");

        let mut query = sqlx::query(&sql);
        for order_id in order_ids {
            query = query.bind(order_id.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        rows.iter().map(line_from_row).collect()
    }
}
