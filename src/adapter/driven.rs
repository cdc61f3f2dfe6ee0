// 駆動される側アダプター（リポジトリ実装など）

mod in_memory_store;
pub(crate) mod item_repository;
mod member_repository;
mod order_query_repository;
mod order_repository;

pub use in_memory_store::InMemoryStore;
pub use item_repository::MySqlItemRepository;
pub use member_repository::MySqlMemberRepository;
pub use order_query_repository::MySqlOrderQueryRepository;
pub use order_repository::MySqlOrderRepository;
