use crate::domain::error::DomainError;
use crate::domain::model::{Address, ItemId, ItemKind, OrderStatus};
use crate::domain::query::{
    CollectionLoading, OrderLoadRequest, OrderSearch, PageRequest, RelationSet,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ページング指定がoffsetのみの場合の既定件数
const DEFAULT_LIMIT: i64 = 100;

/// 会員登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl CreateMemberRequest {
    pub fn address(&self) -> Result<Address, DomainError> {
        Address::new(
            self.city.clone(),
            self.street.clone(),
            self.zipcode.clone(),
        )
    }
}

/// 会員名変更用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub name: String,
}

/// 商品の種類ごとの固有フィールド
/// dtypeで種類を判別する（B: 書籍, A: アルバム, M: 映画）
#[derive(Serialize, Deserialize)]
#[serde(tag = "dtype")]
pub enum ItemKindRequest {
    #[serde(rename = "B")]
    Book { author: String, isbn: String },
    #[serde(rename = "A")]
    Album { artist: String, etc: String },
    #[serde(rename = "M")]
    Movie { director: String, actor: String },
}

impl From<ItemKindRequest> for ItemKind {
    fn from(kind: ItemKindRequest) -> Self {
        match kind {
            ItemKindRequest::Book { author, isbn } => ItemKind::Book { author, isbn },
            ItemKindRequest::Album { artist, etc } => ItemKind::Album { artist, etc },
            ItemKindRequest::Movie { director, actor } => ItemKind::Movie { director, actor },
        }
    }
}

/// 商品登録・更新用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub price: i64,
    pub stock_quantity: u32,
    #[serde(flatten)]
    pub kind: ItemKindRequest,
}

/// 注文する商品1行
#[derive(Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub item_id: Uuid,
    pub count: u32,
}

/// 注文用のリクエストDTO
/// 単一商品（item_id, count）と複数行（lines）のどちらでも指定できる
#[derive(Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub member_id: Uuid,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub lines: Vec<OrderLineRequest>,
}

impl CreateOrderRequest {
    /// 注文行を（商品ID, 数量）のリストにする
    pub fn order_lines(&self) -> Vec<(ItemId, u32)> {
        self.item_id
            .map(|item_id| (ItemId::from_uuid(item_id), self.count))
            .into_iter()
            .chain(
                self.lines
                    .iter()
                    .map(|line| (ItemId::from_uuid(line.item_id), line.count)),
            )
            .collect()
    }
}

/// 注文一覧取得用のクエリパラメータ
#[derive(Default, Deserialize)]
pub struct OrdersQueryParams {
    pub status: Option<String>,
    pub member_name: Option<String>,
    /// "member,delivery,items" 形式
    pub include: Option<String>,
    /// "fetch_join" | "batched" | "per_root"
    pub loading: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl OrdersQueryParams {
    /// 検索条件を組み立てる
    pub fn search(&self) -> Result<OrderSearch, DomainError> {
        let mut search = OrderSearch::new();
        if let Some(status) = &self.status {
            search = search.with_status(OrderStatus::from_string(status)?);
        }
        if let Some(member_name) = &self.member_name {
            search = search.with_member_name(member_name.as_str());
        }
        Ok(search)
    }

    /// 読み込む関連（未指定なら関連なし）
    pub fn relations(&self) -> Result<RelationSet, DomainError> {
        self.include
            .as_deref()
            .map_or(Ok(RelationSet::empty()), RelationSet::parse)
    }

    /// offsetとlimitのどちらかが指定された場合のみページングする
    pub fn page(&self) -> Option<PageRequest> {
        match (self.offset, self.limit) {
            (None, None) => None,
            (offset, limit) => Some(PageRequest {
                offset: offset.unwrap_or(0),
                limit: limit.unwrap_or(DEFAULT_LIMIT),
            }),
        }
    }

    /// 注文一覧の読み込み要求を組み立てる
    pub fn load_request(&self) -> Result<OrderLoadRequest, DomainError> {
        let loading = self
            .loading
            .as_deref()
            .map_or(Ok(CollectionLoading::default()), CollectionLoading::from_string)?;

        let mut request =
            OrderLoadRequest::new(self.search()?, self.relations()?).with_loading(loading);
        if let Some(page) = self.page() {
            request = request.with_page(page.offset, page.limit);
        }
        Ok(request)
    }
}

/// 注文1件取得用のクエリパラメータ
#[derive(Default, Deserialize)]
pub struct OrderQueryParams {
    pub include: Option<String>,
}

impl OrderQueryParams {
    pub fn relations(&self) -> Result<RelationSet, DomainError> {
        self.include
            .as_deref()
            .map_or(Ok(RelationSet::empty()), RelationSet::parse)
    }
}
