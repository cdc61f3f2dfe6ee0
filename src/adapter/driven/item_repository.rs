use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{CategoryId, Item, ItemId, ItemKind, Money};
use crate::domain::port::{ItemRepository, RepositoryError};
use async_trait::async_trait;
use std::collections::HashMap;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row, Transaction};

const SELECT_ITEMS: &str = r#"
    SELECT id, dtype, name, price, stock_quantity,
           author, isbn, artist, etc, director, actor, version
    FROM items
"#;

/// MySQL商品リポジトリ
/// 商品の種類は1つのテーブルに判別子（dtype）付きで格納する
#[derive(Clone)]
pub struct MySqlItemRepository {
    pool: Pool<MySql>,
}

impl MySqlItemRepository {
    /// 新しいMySQL商品リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn find_categories(
        &self,
        item_ids: &[String],
    ) -> Result<HashMap<String, Vec<CategoryId>>, RepositoryError> {
        let mut categories: HashMap<String, Vec<CategoryId>> = HashMap::new();
        if item_ids.is_empty() {
            return Ok(categories);
        }

        let placeholders = vec!["?"; item_ids.len()].join(", ");
        let sql = format!(
            "SELECT item_id, category_id FROM item_categories WHERE item_id IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql);
        for item_id in item_ids {
            query = query.bind(item_id.as_str());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        for row in rows {
            let category_id = CategoryId::from_string(row.get("category_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("カテゴリーIDの解析に失敗しました: {}", e))
            })?;
            categories
                .entry(row.get("item_id"))
                .or_default()
                .push(category_id);
        }
        Ok(categories)
    }

    async fn build_items(&self, rows: Vec<MySqlRow>) -> Result<Vec<Item>, RepositoryError> {
        let ids: Vec<String> = rows.iter().map(|row| row.get("id")).collect();
        let mut categories = self.find_categories(&ids).await?;
        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                item_from_row(row, categories.remove(&id).unwrap_or_default())
            })
            .collect()
    }
}

/// 種類ごとの固有カラムを (author, isbn, artist, etc, director, actor) の順で並べる
fn kind_columns(kind: &ItemKind) -> [Option<&str>; 6] {
    match kind {
        ItemKind::Book { author, isbn } => [
            Some(author.as_str()),
            Some(isbn.as_str()),
            None,
            None,
            None,
            None,
        ],
        ItemKind::Album { artist, etc } => [
            None,
            None,
            Some(artist.as_str()),
            Some(etc.as_str()),
            None,
            None,
        ],
        ItemKind::Movie { director, actor } => [
            None,
            None,
            None,
            None,
            Some(director.as_str()),
            Some(actor.as_str()),
        ],
    }
}

fn item_from_row(row: &MySqlRow, category_ids: Vec<CategoryId>) -> Result<Item, RepositoryError> {
    let item_id = ItemId::from_string(row.get("id"))
        .map_err(|e| RepositoryError::FetchFailed(format!("商品IDの解析に失敗しました: {}", e)))?;

    let dtype: String = row.get("dtype");
    let (first, second) = match dtype.as_str() {
        "B" => ("author", "isbn"),
        "A" => ("artist", "etc"),
        _ => ("director", "actor"),
    };
    let kind = ItemKind::from_discriminator(
        &dtype,
        row.get::<Option<String>, _>(first).unwrap_or_default(),
        row.get::<Option<String>, _>(second).unwrap_or_default(),
    )
    .map_err(|e| RepositoryError::FetchFailed(format!("商品種類の解析に失敗しました: {}", e)))?;

    let price = Money::new(row.get("price"))
        .map_err(|e| RepositoryError::FetchFailed(format!("価格の構築に失敗しました: {}", e)))?;

    Ok(Item::reconstruct(
        item_id,
        row.get("name"),
        price,
        row.get::<u32, _>("stock_quantity"),
        category_ids,
        kind,
        row.get::<u64, _>("version"),
    ))
}

/// 商品をトランザクション内で書き込む
/// 新規はINSERT、既存は読み込んだ時点のバージョンが一致する場合のみUPDATEする
pub(crate) async fn write_item(
    tx: &mut Transaction<'_, MySql>,
    item: &Item,
) -> Result<(), RepositoryError> {
    let columns = kind_columns(item.kind());

    let updated = sqlx::query(
        r#"
        UPDATE items
        SET name = ?, price = ?, stock_quantity = ?,
            author = ?, isbn = ?, artist = ?, etc = ?, director = ?, actor = ?,
            version = version + 1
        WHERE id = ? AND version = ?
        "#,
    )
    .bind(item.name())
    .bind(item.price().amount())
    .bind(item.stock_quantity())
    .bind(columns[0])
    .bind(columns[1])
    .bind(columns[2])
    .bind(columns[3])
    .bind(columns[4])
    .bind(columns[5])
    .bind(item.id().to_string())
    .bind(item.version())
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)
    .map_err(RepositoryError::from)?
    .rows_affected();

    if updated == 0 {
        let exists = sqlx::query("SELECT 1 FROM items WHERE id = ?")
            .bind(item.id().to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?
            .is_some();
        if exists {
            return Err(RepositoryError::Conflict(format!(
                "商品が他の処理で更新されています: {}",
                item.id()
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO items (id, dtype, name, price, stock_quantity,
                               author, isbn, artist, etc, director, actor, version)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(item.id().to_string())
        .bind(item.kind().discriminator())
        .bind(item.name())
        .bind(item.price().amount())
        .bind(item.stock_quantity())
        .bind(columns[0])
        .bind(columns[1])
        .bind(columns[2])
        .bind(columns[3])
        .bind(columns[4])
        .bind(columns[5])
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)
        .map_err(RepositoryError::from)?;
    }

    sqlx::query("DELETE FROM item_categories WHERE item_id = ?")
        .bind(item.id().to_string())
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)
        .map_err(RepositoryError::from)?;
    for category_id in item.category_ids() {
        sqlx::query("INSERT INTO item_categories (item_id, category_id) VALUES (?, ?)")
            .bind(item.id().to_string())
            .bind(category_id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;
    }

    Ok(())
}

#[async_trait]
impl ItemRepository for MySqlItemRepository {
    async fn save(&self, item: &Item) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        write_item(&mut tx, item).await?;

        tx.commit()
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, item_id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let sql = format!("{} WHERE id = ?", SELECT_ITEMS);
        let rows = sqlx::query(&sql)
            .bind(item_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        Ok(self.build_items(rows).await?.into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let sql = format!("{} ORDER BY seq", SELECT_ITEMS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        self.build_items(rows).await
    }

    fn next_identity(&self) -> ItemId {
        ItemId::new()
    }
}
