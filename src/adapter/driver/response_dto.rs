use crate::application::projection::AddressView;
use crate::application::service::LoadedOrders;
use crate::domain::model::{Item, ItemKind, Member};
use serde::Serialize;

/// コレクションの応答エンベロープ
#[derive(Serialize)]
pub struct DataWrapper<T> {
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> DataWrapper<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

/// 注文一覧の応答
/// 選ばれた読み込み戦略と発行したクエリ数を添える
#[derive(Serialize)]
pub struct OrderListResponse<T> {
    pub count: usize,
    pub data: Vec<T>,
    pub strategy: String,
    pub query_count: usize,
}

impl<T> OrderListResponse<T> {
    pub fn new(data: Vec<T>, loaded: &LoadedOrders) -> Self {
        Self {
            count: data.len(),
            data,
            strategy: loaded.strategy.name().to_string(),
            query_count: loaded.query_count,
        }
    }
}

/// ID返却用のレスポンスDTO
#[derive(Serialize)]
pub struct IdResponse {
    pub id: String,
}

/// 会員用のレスポンスDTO
#[derive(Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub name: String,
    pub address: AddressView,
}

impl MemberResponse {
    /// ドメインオブジェクトからMemberResponseを作成
    pub fn from_member(member: &Member) -> Self {
        Self {
            id: member.id().to_string(),
            name: member.name().to_string(),
            address: AddressView::from(member.address()),
        }
    }
}

/// 商品用のレスポンスDTO
/// 種類ごとの固有フィールドはその種類の場合のみ出力する
#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub dtype: String,
    pub name: String,
    pub price: i64,
    pub stock_quantity: u32,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl ItemResponse {
    /// ドメインオブジェクトからItemResponseを作成
    pub fn from_item(item: &Item) -> Self {
        let mut response = Self {
            id: item.id().to_string(),
            dtype: item.kind().discriminator().to_string(),
            name: item.name().to_string(),
            price: item.price().amount(),
            stock_quantity: item.stock_quantity(),
            version: item.version(),
            author: None,
            isbn: None,
            artist: None,
            etc: None,
            director: None,
            actor: None,
        };
        match item.kind() {
            ItemKind::Book { author, isbn } => {
                response.author = Some(author.clone());
                response.isbn = Some(isbn.clone());
            }
            ItemKind::Album { artist, etc } => {
                response.artist = Some(artist.clone());
                response.etc = Some(etc.clone());
            }
            ItemKind::Movie { director, actor } => {
                response.director = Some(director.clone());
                response.actor = Some(actor.clone());
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ItemId, Money};

    #[test]
    fn test_data_wrapper_counts_data() {
        let json = serde_json::to_value(DataWrapper::new(vec!["a", "b"])).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["data"][1], "b");
    }

    #[test]
    fn test_item_response_only_outputs_own_kind_fields() {
        let item = Item::new(
            ItemId::new(),
            "Movie".to_string(),
            Money::new(5000).unwrap(),
            3,
            ItemKind::Movie {
                director: "director".to_string(),
                actor: "actor".to_string(),
            },
        )
        .unwrap();

        let json = serde_json::to_value(ItemResponse::from_item(&item)).unwrap();

        assert_eq!(json["dtype"], "M");
        assert_eq!(json["director"], "director");
        assert!(json.get("author").is_none());
        assert!(json.get("artist").is_none());
    }
}
