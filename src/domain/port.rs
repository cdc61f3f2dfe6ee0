// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{Item, ItemId, Member, MemberId, Order, OrderId};
use crate::domain::query::{OrderLineRow, OrderRow, OrderSearch, Page, RelationSet};
use async_trait::async_trait;
use thiserror::Error;

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// 楽観的ロックの競合（他の処理が先に更新した）
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// 会員リポジトリトレイト
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// 会員を保存する（存在すれば更新）
    ///
    /// # Arguments
    /// * `member` - 保存する会員
    ///
    /// # Returns
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError)` - 保存失敗
    async fn save(&self, member: &Member) -> Result<(), RepositoryError>;

    /// 会員IDで会員を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Member))` - 会員が見つかった
    /// * `Ok(None)` - 会員が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<Member>, RepositoryError>;

    /// 名前が完全一致する会員を検索する
    async fn find_by_name(&self, name: &str) -> Result<Vec<Member>, RepositoryError>;

    /// すべての会員を登録順に取得する
    async fn find_all(&self) -> Result<Vec<Member>, RepositoryError>;

    /// 新しい一意の会員IDを生成する
    fn next_identity(&self) -> MemberId;
}

/// 商品リポジトリトレイト
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// 商品を保存する
    /// 既存の商品は保持しているバージョンが一致する場合のみ更新し、バージョンを1つ進める
    ///
    /// # Returns
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError::Conflict)` - バージョン不一致
    /// * `Err(RepositoryError)` - 保存失敗
    async fn save(&self, item: &Item) -> Result<(), RepositoryError>;

    /// 商品IDで商品を検索する
    async fn find_by_id(&self, item_id: ItemId) -> Result<Option<Item>, RepositoryError>;

    /// すべての商品を登録順に取得する
    async fn find_all(&self) -> Result<Vec<Item>, RepositoryError>;

    /// 新しい一意の商品IDを生成する
    fn next_identity(&self) -> ItemId;
}

/// 注文リポジトリトレイト
/// 注文集約（配送と注文商品を含む）を丸ごと読み込む
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 注文IDで注文を検索する
    ///
    /// # Arguments
    /// * `order_id` - 検索する注文ID
    ///
    /// # Returns
    /// * `Ok(Some(Order))` - 注文が見つかった
    /// * `Ok(None)` - 注文が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// 新しい一意の注文IDを生成する
    fn next_identity(&self) -> OrderId;
}

/// 注文の読み取り専用クエリ
/// 各メソッドの1回の呼び出しが1クエリに相当する
#[async_trait]
pub trait OrderQueryRepository: Send + Sync {
    /// 条件に一致する注文を、指定された関連を結合して取得する
    /// 注文商品を結合した場合は注文商品ごとに1行となり、ページングは結合後の行に適用される
    ///
    /// # Arguments
    /// * `search` - 検索条件
    /// * `joins` - 結合する関連
    /// * `page` - 行に適用するページ範囲
    ///
    /// # Returns
    /// * `Ok(Vec<OrderRow>)` - 注文の登録順、同じ注文内は注文商品の登録順
    /// * `Err(RepositoryError)` - 取得失敗
    async fn find_order_rows(
        &self,
        search: &OrderSearch,
        joins: RelationSet,
        page: Option<Page>,
    ) -> Result<Vec<OrderRow>, RepositoryError>;

    /// 注文IDのリストに属する注文商品をIN句で取得する
    ///
    /// # Arguments
    /// * `order_ids` - 注文IDのリスト
    ///
    /// # Returns
    /// * `Ok(Vec<OrderLineRow>)` - 注文商品の登録順
    /// * `Err(RepositoryError)` - 取得失敗
    async fn find_order_lines_by_order_ids(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderLineRow>, RepositoryError>;
}

/// 1つの作業単位で書き込む変更
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub orders: Vec<Order>,
    pub items: Vec<Item>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items.extend(items);
        self
    }
}

/// 作業単位トレイト
/// 注文とその在庫変更をすべて書き込むか、何も書き込まないかのどちらかにする
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 変更をまとめてコミットする
    /// 商品はバージョンが一致しなければ全体をロールバックする
    ///
    /// # Returns
    /// * `Ok(())` - コミット成功
    /// * `Err(RepositoryError::Conflict)` - 他の処理が先に商品を更新した
    /// * `Err(RepositoryError)` - 書き込み失敗
    async fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError>;
}
