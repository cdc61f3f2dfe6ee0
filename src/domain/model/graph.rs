// エンティティグラフのメタデータ
// 読み込み戦略の選択で関連の多重度と所有側を参照する

use crate::domain::error::DomainError;
use std::fmt;

/// グラフ上のエンティティ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Order,
    Member,
    Delivery,
    OrderItem,
    Item,
    Category,
}

/// 関連の多重度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// 関連の所有側
/// Owningは外部キーを保持する側、Inverseは参照される側
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    Owning,
    Inverse,
}

/// 1つの関連の記述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub source: EntityKind,
    pub target: EntityKind,
    pub name: &'static str,
    pub cardinality: Cardinality,
    pub ownership: Ownership,
}

impl RelationDescriptor {
    /// この関連を結合すると結果の行数が増えるか
    /// 対多の結合のみが行を増やす
    pub fn multiplies_rows(&self) -> bool {
        self.cardinality == Cardinality::ToMany
    }
}

const fn relation(
    source: EntityKind,
    target: EntityKind,
    name: &'static str,
    cardinality: Cardinality,
    ownership: Ownership,
) -> RelationDescriptor {
    RelationDescriptor {
        source,
        target,
        name,
        cardinality,
        ownership,
    }
}

/// 注文集約周辺の全関連
pub const ORDER_GRAPH: [RelationDescriptor; 7] = [
    relation(
        EntityKind::Order,
        EntityKind::Member,
        "member",
        Cardinality::ToOne,
        Ownership::Owning,
    ),
    relation(
        EntityKind::Order,
        EntityKind::Delivery,
        "delivery",
        Cardinality::ToOne,
        Ownership::Owning,
    ),
    relation(
        EntityKind::Order,
        EntityKind::OrderItem,
        "orderItems",
        Cardinality::ToMany,
        Ownership::Inverse,
    ),
    relation(
        EntityKind::OrderItem,
        EntityKind::Item,
        "item",
        Cardinality::ToOne,
        Ownership::Owning,
    ),
    relation(
        EntityKind::Member,
        EntityKind::Order,
        "orders",
        Cardinality::ToMany,
        Ownership::Inverse,
    ),
    relation(
        EntityKind::Item,
        EntityKind::Category,
        "categories",
        Cardinality::ToMany,
        Ownership::Inverse,
    ),
    relation(
        EntityKind::Category,
        EntityKind::Item,
        "items",
        Cardinality::ToMany,
        Ownership::Owning,
    ),
];

/// 注文を起点に読み込みを要求できる関連
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Member,
    Delivery,
    /// 注文商品とその商品
    Items,
}

impl Relation {
    pub const ALL: [Relation; 3] = [Relation::Member, Relation::Delivery, Relation::Items];

    /// 対応する関連の記述を取得
    pub fn descriptor(&self) -> &'static RelationDescriptor {
        match self {
            Relation::Member => &ORDER_GRAPH[0],
            Relation::Delivery => &ORDER_GRAPH[1],
            Relation::Items => &ORDER_GRAPH[2],
        }
    }

    /// 結合時に行が増えるか
    pub fn multiplies_rows(&self) -> bool {
        self.descriptor().multiplies_rows()
    }

    /// 文字列からRelationを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s.trim() {
            "member" => Ok(Relation::Member),
            "delivery" => Ok(Relation::Delivery),
            "items" => Ok(Relation::Items),
            other => Err(DomainError::InvalidValue(format!(
                "無効な関連名: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Relation::Member => "member",
            Relation::Delivery => "delivery",
            Relation::Items => "items",
        };
        write!(f, "{}", name)
    }
}
