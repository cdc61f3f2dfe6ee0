// 読み取り側のモデル
// 注文一覧の検索条件、読み込み戦略、ページング検証、読み込み結果の行を定義する

mod criteria;
mod pagination;
mod row;
mod strategy;

pub use criteria::{CollectionLoading, OrderLoadRequest, OrderSearch, RelationSet};
pub use pagination::{BatchSize, Page, PageRequest, PaginationGuard};
pub use row::{
    collapse_by_root, DeliveryRow, LoadedOrder, MemberRow, OrderLineRow, OrderRootRow, OrderRow,
};
pub use strategy::LoadStrategy;
