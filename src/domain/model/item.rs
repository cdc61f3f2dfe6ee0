use crate::domain::error::DomainError;
use crate::domain::model::{CategoryId, ItemId, Money};

/// 商品の種類ごとの固有情報
/// 永続化時は1つのテーブルに格納し、判別子で区別する
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// 書籍
    Book { author: String, isbn: String },
    /// アルバム
    Album { artist: String, etc: String },
    /// 映画
    Movie { director: String, actor: String },
}

impl ItemKind {
    /// 判別子を取得
    pub fn discriminator(&self) -> &'static str {
        match self {
            ItemKind::Book { .. } => "B",
            ItemKind::Album { .. } => "A",
            ItemKind::Movie { .. } => "M",
        }
    }

    /// 判別子と2つの固有カラムから種類を復元する
    pub fn from_discriminator(
        dtype: &str,
        first: String,
        second: String,
    ) -> Result<Self, DomainError> {
        match dtype {
            "B" => Ok(ItemKind::Book {
                author: first,
                isbn: second,
            }),
            "A" => Ok(ItemKind::Album {
                artist: first,
                etc: second,
            }),
            "M" => Ok(ItemKind::Movie {
                director: first,
                actor: second,
            }),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な商品判別子: {}",
                dtype
            ))),
        }
    }

    /// 固有カラムの値を (1番目, 2番目) の順で取得
    pub fn columns(&self) -> (&str, &str) {
        match self {
            ItemKind::Book { author, isbn } => (author, isbn),
            ItemKind::Album { artist, etc } => (artist, etc),
            ItemKind::Movie { director, actor } => (director, actor),
        }
    }
}

/// 商品エンティティ
/// 在庫数は常に0以上に保たれる
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: ItemId,
    name: String,
    price: Money,
    stock_quantity: u32,
    category_ids: Vec<CategoryId>,
    kind: ItemKind,
    version: u64,
}

impl Item {
    /// 新しい商品を作成
    ///
    /// # Arguments
    /// * `id` - 商品ID
    /// * `name` - 商品名
    /// * `price` - 価格
    /// * `stock_quantity` - 在庫数
    /// * `kind` - 商品の種類
    pub fn new(
        id: ItemId,
        name: String,
        price: Money,
        stock_quantity: u32,
        kind: ItemKind,
    ) -> Result<Self, DomainError> {
        Self::validate_name(&name)?;
        Ok(Self {
            id,
            name,
            price,
            stock_quantity,
            category_ids: Vec::new(),
            kind,
            version: 0,
        })
    }

    /// データベースから取得したデータで商品を再構築
    pub fn reconstruct(
        id: ItemId,
        name: String,
        price: Money,
        stock_quantity: u32,
        category_ids: Vec<CategoryId>,
        kind: ItemKind,
        version: u64,
    ) -> Self {
        Self {
            id,
            name,
            price,
            stock_quantity,
            category_ids,
            kind,
            version,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }

    pub fn category_ids(&self) -> &[CategoryId] {
        &self.category_ids
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// 楽観的ロック用のバージョン
    pub fn version(&self) -> u64 {
        self.version
    }

    /// カテゴリーを関連付ける（重複は無視）
    pub fn add_category(&mut self, category_id: CategoryId) {
        if !self.category_ids.contains(&category_id) {
            self.category_ids.push(category_id);
        }
    }

    /// 在庫を増やす（注文キャンセル時など）
    /// 上限を超える場合はエラー（在庫は変更されない）
    pub fn add_stock(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.stock_quantity = self.stock_quantity.checked_add(quantity).ok_or_else(|| {
            DomainError::InvalidValue(format!(
                "在庫数が上限を超えます: {} + {}",
                self.stock_quantity, quantity
            ))
        })?;
        Ok(())
    }

    /// 在庫を減らす
    ///
    /// # Returns
    /// * `Ok(())` - 減少成功
    /// * `Err(DomainError::OutOfStock)` - 在庫不足（在庫は変更されない）
    pub fn remove_stock(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let remaining = self
            .stock_quantity
            .checked_sub(quantity)
            .ok_or(DomainError::OutOfStock {
                item_id: self.id,
                requested: quantity,
                available: self.stock_quantity,
            })?;
        self.stock_quantity = remaining;
        Ok(())
    }

    /// 商品情報をまとめて変更する
    /// 種類（判別子）は変更できない
    pub fn update(
        &mut self,
        name: String,
        price: Money,
        stock_quantity: u32,
        kind: ItemKind,
    ) -> Result<(), DomainError> {
        Self::validate_name(&name)?;
        if kind.discriminator() != self.kind.discriminator() {
            return Err(DomainError::InvalidValue(format!(
                "商品の種類は変更できません: {} -> {}",
                self.kind.discriminator(),
                kind.discriminator()
            )));
        }
        self.name = name;
        self.price = price;
        self.stock_quantity = stock_quantity;
        self.kind = kind;
        Ok(())
    }

    fn validate_name(name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "商品名は空にできません".to_string(),
            ));
        }
        Ok(())
    }
}
