use crate::domain::model::Relation;
use crate::domain::query::{BatchSize, CollectionLoading, RelationSet};
use std::fmt;

/// 注文集約の読み込み戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStrategy {
    /// 注文IDで1件を取得（要求された関連はすべて結合）
    SingleEntity,
    /// 対一の関連のみ結合した1クエリ
    ToOneFetchJoin,
    /// 対多の関連も結合した1クエリ、注文IDで集約
    CollectionFetchJoin,
    /// 注文を対一の結合で取得後、注文商品をIN句でまとめて取得
    BatchFetch { batch_size: BatchSize },
    /// 注文を対一の結合で取得後、注文ごとに注文商品を取得（1+N）
    LazyPerRoot,
    /// すべてを結合した平坦な行をそのまま返す
    FlatProjection,
}

impl LoadStrategy {
    /// 要求された関連と読み込み方式から戦略を決定する
    /// ページングとの整合性はPaginationGuardで検証する
    pub fn select(
        relations: &RelationSet,
        loading: CollectionLoading,
        batch_size: BatchSize,
    ) -> Self {
        if !relations.contains(Relation::Items) {
            return LoadStrategy::ToOneFetchJoin;
        }
        match loading {
            CollectionLoading::FetchJoin => LoadStrategy::CollectionFetchJoin,
            CollectionLoading::Batched => LoadStrategy::BatchFetch { batch_size },
            CollectionLoading::PerRoot => LoadStrategy::LazyPerRoot,
        }
    }

    /// ページングと組み合わせられるか
    /// 対多を結合する戦略は行数が増えてページ範囲が壊れるため不可
    pub fn supports_paging(&self) -> bool {
        match self {
            LoadStrategy::ToOneFetchJoin
            | LoadStrategy::BatchFetch { .. }
            | LoadStrategy::LazyPerRoot => true,
            LoadStrategy::SingleEntity
            | LoadStrategy::CollectionFetchJoin
            | LoadStrategy::FlatProjection => false,
        }
    }

    /// 注文がroots件のときに発行されるクエリ数
    pub fn expected_query_count(&self, roots: usize) -> usize {
        match self {
            LoadStrategy::SingleEntity
            | LoadStrategy::ToOneFetchJoin
            | LoadStrategy::CollectionFetchJoin
            | LoadStrategy::FlatProjection => 1,
            LoadStrategy::BatchFetch { batch_size } => 1 + roots.div_ceil(batch_size.get()),
            LoadStrategy::LazyPerRoot => 1 + roots,
        }
    }

    /// 戦略名
    pub fn name(&self) -> &'static str {
        match self {
            LoadStrategy::SingleEntity => "single_entity",
            LoadStrategy::ToOneFetchJoin => "to_one_fetch_join",
            LoadStrategy::CollectionFetchJoin => "collection_fetch_join",
            LoadStrategy::BatchFetch { .. } => "batch_fetch",
            LoadStrategy::LazyPerRoot => "lazy_per_root",
            LoadStrategy::FlatProjection => "flat_projection",
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
