use crate::application::projection::{
    attach_lines, group_lines_by_order, project_flat, OrderFlatView,
};
use crate::application::ApplicationError;
use crate::domain::model::{OrderId, Relation};
use crate::domain::port::OrderQueryRepository;
use crate::domain::query::{
    collapse_by_root, BatchSize, LoadStrategy, LoadedOrder, OrderLoadRequest, OrderSearch, Page,
    PageRequest, PaginationGuard, RelationSet,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 注文一覧の読み込み結果
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOrders {
    pub orders: Vec<LoadedOrder>,
    /// 選択された戦略
    pub strategy: LoadStrategy,
    /// 実際に発行したクエリ数
    pub query_count: usize,
}

/// 注文クエリサービス
/// 要求された関連とページングから読み込み戦略を選び、読み取り専用のクエリを発行する
pub struct OrderQueryService {
    order_query_repository: Arc<dyn OrderQueryRepository>,
    batch_size: BatchSize,
}

impl OrderQueryService {
    /// 新しい注文クエリサービスを作成
    ///
    /// # Arguments
    /// * `order_query_repository` - 注文クエリリポジトリ
    /// * `batch_size` - IN句でまとめて取得する際の最大件数
    pub fn new(
        order_query_repository: Arc<dyn OrderQueryRepository>,
        batch_size: BatchSize,
    ) -> Self {
        Self {
            order_query_repository,
            batch_size,
        }
    }

    /// 条件に一致する注文を読み込む
    ///
    /// # Arguments
    /// * `request` - 検索条件、読み込む関連、読み込み方式、ページング
    ///
    /// # Returns
    /// * `Ok(LoadedOrders)` - 注文IDで集約済みの注文と発行したクエリ数
    /// * `Err(ApplicationError)` - 対多の結合とページングの組み合わせなど
    pub async fn load_orders(
        &self,
        request: &OrderLoadRequest,
    ) -> Result<LoadedOrders, ApplicationError> {
        let strategy = LoadStrategy::select(&request.relations, request.loading, self.batch_size);
        let page = PaginationGuard::validate_request(strategy, request.page).map_err(|err| {
            warn!(strategy = %strategy, error = %err, "ページング指定を拒否しました");
            err
        })?;

        let (orders, query_count) = self
            .execute(strategy, &request.search, request.relations, page)
            .await?;

        info!(
            strategy = %strategy,
            query_count,
            roots = orders.len(),
            "注文を読み込みました"
        );
        Ok(LoadedOrders {
            orders,
            strategy,
            query_count,
        })
    }

    /// 注文IDで1件の注文を読み込む
    /// 要求された関連はすべて1クエリで結合する
    ///
    /// # Returns
    /// * `Ok(LoadedOrder)` - 注文が見つかった
    /// * `Err(ApplicationError::NotFound)` - 注文が見つからなかった
    pub async fn load_order(
        &self,
        order_id: OrderId,
        relations: RelationSet,
    ) -> Result<LoadedOrder, ApplicationError> {
        let (orders, _) = self
            .execute(
                LoadStrategy::SingleEntity,
                &OrderSearch::by_id(order_id),
                relations,
                None,
            )
            .await?;

        orders
            .into_iter()
            .next()
            .ok_or_else(|| ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id)))
    }

    /// すべての関連を結合した平坦な行を読み込む
    /// 注文商品ごとに1件となるため、ページングは受け付けない
    pub async fn load_flat_orders(
        &self,
        search: &OrderSearch,
        page: Option<PageRequest>,
    ) -> Result<Vec<OrderFlatView>, ApplicationError> {
        PaginationGuard::validate_request(LoadStrategy::FlatProjection, page)?;

        let rows = self
            .order_query_repository
            .find_order_rows(search, RelationSet::all(), None)
            .await?;

        info!(
            strategy = %LoadStrategy::FlatProjection,
            query_count = 1,
            rows = rows.len(),
            "注文を平坦な行で読み込みました"
        );
        Ok(project_flat(&rows))
    }

    async fn execute(
        &self,
        strategy: LoadStrategy,
        search: &OrderSearch,
        relations: RelationSet,
        page: Option<Page>,
    ) -> Result<(Vec<LoadedOrder>, usize), ApplicationError> {
        let collect_lines = relations.contains(Relation::Items);

        match strategy {
            LoadStrategy::SingleEntity
            | LoadStrategy::ToOneFetchJoin
            | LoadStrategy::CollectionFetchJoin
            | LoadStrategy::FlatProjection => {
                let rows = self
                    .order_query_repository
                    .find_order_rows(search, relations, page)
                    .await?;
                debug!(strategy = %strategy, rows = rows.len(), "結合した行を集約します");
                Ok((collapse_by_root(rows, collect_lines), 1))
            }
            LoadStrategy::BatchFetch { batch_size } => {
                let mut orders = self.load_roots(search, relations, page).await?;
                let order_ids: Vec<OrderId> = orders.iter().map(LoadedOrder::order_id).collect();

                let mut query_count = 1;
                let mut lines = Vec::new();
                for chunk in order_ids.chunks(batch_size.get()) {
                    lines.extend(
                        self.order_query_repository
                            .find_order_lines_by_order_ids(chunk)
                            .await?,
                    );
                    query_count += 1;
                }
                attach_lines(&mut orders, group_lines_by_order(lines));

                Ok((orders, query_count))
            }
            LoadStrategy::LazyPerRoot => {
                let mut orders = self.load_roots(search, relations, page).await?;

                let mut query_count = 1;
                for order in orders.iter_mut() {
                    let lines = self
                        .order_query_repository
                        .find_order_lines_by_order_ids(&[order.order_id()])
                        .await?;
                    order.lines = Some(lines);
                    query_count += 1;
                }

                Ok((orders, query_count))
            }
        }
    }

    /// 対一の関連だけを結合して注文を取得する（ページングは注文単位で正しく効く）
    async fn load_roots(
        &self,
        search: &OrderSearch,
        relations: RelationSet,
        page: Option<Page>,
    ) -> Result<Vec<LoadedOrder>, ApplicationError> {
        let rows = self
            .order_query_repository
            .find_order_rows(search, relations.to_one_only(), page)
            .await?;
        Ok(collapse_by_root(rows, false))
    }
}
