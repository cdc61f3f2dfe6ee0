use crate::domain::error::DomainError;
use crate::domain::model::{MemberId, OrderId, OrderStatus, Relation};
use crate::domain::query::PageRequest;

/// 注文の検索条件
/// すべての条件は省略可能で、指定された条件はAND結合される
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSearch {
    pub order_id: Option<OrderId>,
    pub member_id: Option<MemberId>,
    pub status: Option<OrderStatus>,
    /// 会員名の部分一致
    pub member_name: Option<String>,
}

impl OrderSearch {
    /// 条件なしの検索
    pub fn new() -> Self {
        Self::default()
    }

    /// 注文IDで1件を検索
    pub fn by_id(order_id: OrderId) -> Self {
        Self {
            order_id: Some(order_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_member_id(mut self, member_id: MemberId) -> Self {
        self.member_id = Some(member_id);
        self
    }

    /// 会員名の部分一致条件を設定
    /// 空文字は条件なしとして扱う
    pub fn with_member_name(mut self, member_name: impl Into<String>) -> Self {
        let member_name = member_name.into();
        self.member_name = if member_name.is_empty() {
            None
        } else {
            Some(member_name)
        };
        self
    }

    /// 注文の各属性が条件に一致するか判定する
    pub fn matches(
        &self,
        order_id: OrderId,
        member_id: MemberId,
        status: OrderStatus,
        member_name: &str,
    ) -> bool {
        self.order_id.map_or(true, |id| id == order_id)
            && self.member_id.map_or(true, |id| id == member_id)
            && self.status.map_or(true, |s| s == status)
            && self
                .member_name
                .as_deref()
                .map_or(true, |name| member_name.contains(name))
    }
}

/// 読み込む関連の集合
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelationSet {
    member: bool,
    delivery: bool,
    items: bool,
}

impl RelationSet {
    /// 関連なし（注文のみ）
    pub fn empty() -> Self {
        Self::default()
    }

    /// すべての関連
    pub fn all() -> Self {
        Self {
            member: true,
            delivery: true,
            items: true,
        }
    }

    /// 関連を追加した集合を返す
    pub fn with(mut self, relation: Relation) -> Self {
        match relation {
            Relation::Member => self.member = true,
            Relation::Delivery => self.delivery = true,
            Relation::Items => self.items = true,
        }
        self
    }

    pub fn contains(&self, relation: Relation) -> bool {
        match relation {
            Relation::Member => self.member,
            Relation::Delivery => self.delivery,
            Relation::Items => self.items,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.member && !self.delivery && !self.items
    }

    /// 行数を増やす関連（対多）を含むか
    pub fn multiplies_rows(&self) -> bool {
        self.iter().any(|relation| relation.multiplies_rows())
    }

    /// 対一の関連だけを残した集合
    pub fn to_one_only(&self) -> Self {
        self.iter()
            .filter(|relation| !relation.multiplies_rows())
            .collect()
    }

    /// 含まれる関連を宣言順に列挙
    pub fn iter(&self) -> impl Iterator<Item = Relation> + '_ {
        Relation::ALL
            .into_iter()
            .filter(move |relation| self.contains(*relation))
    }

    /// "member,delivery,items" 形式の文字列を解析する
    /// 空文字は関連なし
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .try_fold(Self::empty(), |set, part| {
                Ok(set.with(Relation::from_string(part)?))
            })
    }
}

impl FromIterator<Relation> for RelationSet {
    fn from_iter<I: IntoIterator<Item = Relation>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, relation| set.with(relation))
    }
}

/// 対多の関連（注文商品）をどう読み込むか
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CollectionLoading {
    /// 結合して1クエリで取得し、注文IDで集約する
    #[default]
    FetchJoin,
    /// 注文をページングしてから、IN句でまとめて取得する
    Batched,
    /// 注文ごとに1クエリずつ取得する
    PerRoot,
}

impl CollectionLoading {
    /// 文字列からCollectionLoadingを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "fetch_join" => Ok(CollectionLoading::FetchJoin),
            "batched" => Ok(CollectionLoading::Batched),
            "per_root" => Ok(CollectionLoading::PerRoot),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な読み込み方式: {}",
                s
            ))),
        }
    }
}

/// 注文一覧の読み込み要求
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderLoadRequest {
    pub search: OrderSearch,
    pub relations: RelationSet,
    pub loading: CollectionLoading,
    pub page: Option<PageRequest>,
}

impl OrderLoadRequest {
    pub fn new(search: OrderSearch, relations: RelationSet) -> Self {
        Self {
            search,
            relations,
            loading: CollectionLoading::default(),
            page: None,
        }
    }

    pub fn with_loading(mut self, loading: CollectionLoading) -> Self {
        self.loading = loading;
        self
    }

    pub fn with_page(mut self, offset: i64, limit: i64) -> Self {
        self.page = Some(PageRequest { offset, limit });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_set_parse() {
        let set = RelationSet::parse("member, items").unwrap();
        assert!(set.contains(Relation::Member));
        assert!(!set.contains(Relation::Delivery));
        assert!(set.contains(Relation::Items));
        assert!(set.multiplies_rows());

        assert!(RelationSet::parse("").unwrap().is_empty());
        assert!(RelationSet::parse("member,unknown").is_err());
    }

    #[test]
    fn test_to_one_only_drops_collections() {
        let set = RelationSet::all().to_one_only();
        assert!(set.contains(Relation::Member));
        assert!(set.contains(Relation::Delivery));
        assert!(!set.contains(Relation::Items));
        assert!(!set.multiplies_rows());
    }

    #[test]
    fn test_search_matches_member_name_substring() {
        let search = OrderSearch::new()
            .with_status(OrderStatus::Order)
            .with_member_name("ser");
        let order_id = OrderId::new();
        let member_id = MemberId::new();

        assert!(search.matches(order_id, member_id, OrderStatus::Order, "userA"));
        assert!(!search.matches(order_id, member_id, OrderStatus::Cancel, "userA"));
        assert!(!search.matches(order_id, member_id, OrderStatus::Order, "kim"));
    }

    #[test]
    fn test_empty_member_name_means_no_filter() {
        let search = OrderSearch::new().with_member_name("");
        assert!(search.member_name.is_none());
    }

    #[test]
    fn test_collection_loading_from_string() {
        assert_eq!(
            CollectionLoading::from_string("batched").unwrap(),
            CollectionLoading::Batched
        );
        assert!(CollectionLoading::from_string("eager").is_err());
    }
}
