use crate::domain::error::DomainError;
use crate::domain::model::{
    Address, DeliveryId, DeliveryStatus, ItemId, MemberId, Money, OrderId, OrderItemId,
    OrderStatus,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// 注文テーブル由来の列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRootRow {
    pub order_id: OrderId,
    pub member_id: MemberId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

/// 会員を結合した場合の列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub member_id: MemberId,
    pub name: String,
    pub address: Address,
}

/// 配送を結合した場合の列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRow {
    pub delivery_id: DeliveryId,
    pub address: Address,
    pub status: DeliveryStatus,
}

/// 注文商品（と商品名）の列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRow {
    pub order_item_id: OrderItemId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub item_name: String,
    pub order_price: Money,
    pub count: u32,
}

/// 1回のクエリが返す1行
/// 注文商品を結合した場合、注文は注文商品の数だけ繰り返し現れる
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub root: OrderRootRow,
    pub member: Option<MemberRow>,
    pub delivery: Option<DeliveryRow>,
    pub line: Option<OrderLineRow>,
}

/// 注文1件分に集約された読み込み結果
/// 要求されなかった関連はNoneのまま（未読み込みと空は区別する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedOrder {
    pub root: OrderRootRow,
    pub member: Option<MemberRow>,
    pub delivery: Option<DeliveryRow>,
    pub lines: Option<Vec<OrderLineRow>>,
}

impl LoadedOrder {
    pub fn order_id(&self) -> OrderId {
        self.root.order_id
    }

    /// 合計金額（注文商品を読み込んだ場合のみ）
    pub fn total_price(&self) -> Result<Option<Money>, DomainError> {
        self.lines
            .as_ref()
            .map(|lines| line_total(lines))
            .transpose()
    }
}

/// 注文商品の行から合計金額を計算する
fn line_total(lines: &[OrderLineRow]) -> Result<Money, DomainError> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        total.add(&line.order_price.multiply(line.count)?)
    })
}

/// 結合で増えた行を注文IDで1件にまとめる
/// 行全体ではなく主キーで重複を判定し、最初に現れた順序を保つ
///
/// # Arguments
/// * `rows` - クエリ結果の行
/// * `collect_lines` - 注文商品を集める場合はtrue（結合していない場合はfalse）
pub fn collapse_by_root(rows: Vec<OrderRow>, collect_lines: bool) -> Vec<LoadedOrder> {
    let mut orders: Vec<LoadedOrder> = Vec::new();
    let mut positions: HashMap<OrderId, usize> = HashMap::new();

    for row in rows {
        let position = match positions.get(&row.root.order_id).copied() {
            Some(position) => position,
            None => {
                positions.insert(row.root.order_id, orders.len());
                orders.push(LoadedOrder {
                    root: row.root,
                    member: row.member,
                    delivery: row.delivery,
                    lines: collect_lines.then(Vec::new),
                });
                orders.len() - 1
            }
        };

        if let (Some(lines), Some(line)) = (orders[position].lines.as_mut(), row.line) {
            lines.push(line);
        }
    }

    orders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(order_id: OrderId) -> OrderRootRow {
        OrderRootRow {
            order_id,
            member_id: MemberId::new(),
            order_date: Utc::now(),
            status: OrderStatus::Order,
        }
    }

    fn line(order_id: OrderId, name: &str) -> OrderLineRow {
        OrderLineRow {
            order_item_id: OrderItemId::new(),
            order_id,
            item_id: ItemId::new(),
            item_name: name.to_string(),
            order_price: Money::new(10000).unwrap(),
            count: 2,
        }
    }

    #[test]
    fn test_collapse_groups_by_order_and_keeps_first_seen_order() {
        let first = root(OrderId::new());
        let second = root(OrderId::new());
        let rows = vec![
            OrderRow {
                root: second.clone(),
                member: None,
                delivery: None,
                line: Some(line(second.order_id, "JPA1")),
            },
            OrderRow {
                root: first.clone(),
                member: None,
                delivery: None,
                line: Some(line(first.order_id, "SPRING1")),
            },
            OrderRow {
                root: second.clone(),
                member: None,
                delivery: None,
                line: Some(line(second.order_id, "JPA2")),
            },
        ];

        let orders = collapse_by_root(rows, true);

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id(), second.order_id);
        assert_eq!(orders[1].order_id(), first.order_id);
        let names: Vec<&str> = orders[0]
            .lines
            .as_ref()
            .unwrap()
            .iter()
            .map(|line| line.item_name.as_str())
            .collect();
        assert_eq!(names, vec!["JPA1", "JPA2"]);
        assert_eq!(orders[0].total_price().unwrap().unwrap().amount(), 40000);
    }

    #[test]
    fn test_collapse_keeps_identical_lines_of_same_order() {
        let order = root(OrderId::new());
        let same = line(order.order_id, "JPA1");
        let rows = vec![
            OrderRow {
                root: order.clone(),
                member: None,
                delivery: None,
                line: Some(same.clone()),
            },
            OrderRow {
                root: order.clone(),
                member: None,
                delivery: None,
                line: Some(same),
            },
        ];

        let orders = collapse_by_root(rows, true);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].lines.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_collapse_without_lines_leaves_them_unloaded() {
        let order = root(OrderId::new());
        let rows = vec![OrderRow {
            root: order,
            member: None,
            delivery: None,
            line: None,
        }];

        let orders = collapse_by_root(rows, false);
        assert!(orders[0].lines.is_none());
        assert!(orders[0].total_price().unwrap().is_none());
    }
}
