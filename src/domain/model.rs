// ドメインモデル（エンティティと値オブジェクト）

mod delivery;
mod graph;
mod item;
mod member;
mod order;
mod order_item;
mod value_objects;

pub use value_objects::{
    Address, CategoryId, DeliveryId, DeliveryStatus, ItemId, MemberId, Money, OrderId,
    OrderItemId, OrderStatus,
};

pub use delivery::Delivery;
pub use graph::{
    Cardinality, EntityKind, Ownership, Relation, RelationDescriptor, ORDER_GRAPH,
};
pub use item::{Item, ItemKind};
pub use member::Member;
pub use order::{CancelOutcome, Order};
pub use order_item::OrderItem;
