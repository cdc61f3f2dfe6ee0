// 読み込み結果を応答用の形に変換する
// ストレージ層の型は外に出さず、必要な値をすべてコピーする

use crate::domain::error::DomainError;
use crate::domain::model::{Address, Money, OrderId, Relation};
use crate::domain::query::{LoadedOrder, OrderLineRow, OrderRow, RelationSet};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// 住所の応答形
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressView {
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            city: address.city().to_string(),
            street: address.street().to_string(),
            zipcode: address.zipcode().to_string(),
        }
    }
}

/// 注文商品の応答形
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemView {
    pub item_name: String,
    pub order_price: i64,
    pub count: u32,
}

impl From<&OrderLineRow> for OrderItemView {
    fn from(line: &OrderLineRow) -> Self {
        Self {
            item_name: line.item_name.clone(),
            order_price: line.order_price.amount(),
            count: line.count,
        }
    }
}

/// 注文の応答形
/// 読み込まなかった関連のフィールドは出力しない
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_name: Option<String>,
    pub order_date: DateTime<Utc>,
    pub order_status: String,
    /// 配送先住所
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_items: Option<Vec<OrderItemView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<i64>,
}

/// 平坦な応答形（注文商品ごとに1件）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderFlatView {
    pub order_id: OrderId,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: String,
    pub address: AddressView,
    pub delivery_status: String,
    pub item_name: String,
    pub order_price: i64,
    pub count: u32,
}

/// 読み込んだ注文を応答形に変換する
///
/// # Arguments
/// * `orders` - 注文IDで集約済みの読み込み結果
/// * `shape` - 出力する関連
///
/// # Returns
/// * `Err(DomainError::InvalidValue)` - 合計金額が表現できない注文がある
pub fn project(
    orders: &[LoadedOrder],
    shape: &RelationSet,
) -> Result<Vec<OrderView>, DomainError> {
    orders.iter().map(|order| project_one(order, shape)).collect()
}

fn project_one(order: &LoadedOrder, shape: &RelationSet) -> Result<OrderView, DomainError> {
    let member = order
        .member
        .as_ref()
        .filter(|_| shape.contains(Relation::Member));
    let delivery = order
        .delivery
        .as_ref()
        .filter(|_| shape.contains(Relation::Delivery));
    let lines = order
        .lines
        .as_ref()
        .filter(|_| shape.contains(Relation::Items));

    let total_price = match lines {
        Some(_) => order.total_price()?.map(|price| price.amount()),
        None => None,
    };

    Ok(OrderView {
        order_id: order.root.order_id,
        member_name: member.map(|member| member.name.clone()),
        order_date: order.root.order_date,
        order_status: order.root.status.to_string(),
        address: delivery.map(|delivery| AddressView::from(&delivery.address)),
        delivery_status: delivery.map(|delivery| delivery.status.to_string()),
        order_items: lines.map(|lines| lines.iter().map(OrderItemView::from).collect()),
        total_price,
    })
}

/// 注文商品を注文IDごとにまとめる
/// 注文商品の出現順を保った多重マップをO(n)で作る
pub fn group_lines_by_order(lines: Vec<OrderLineRow>) -> HashMap<OrderId, Vec<OrderLineRow>> {
    let mut grouped: HashMap<OrderId, Vec<OrderLineRow>> = HashMap::new();
    for line in lines {
        grouped.entry(line.order_id).or_default().push(line);
    }
    grouped
}

/// まとめた注文商品を注文に取り付ける
/// 注文商品を持たない注文には空のリストを付ける
pub fn attach_lines(orders: &mut [LoadedOrder], mut grouped: HashMap<OrderId, Vec<OrderLineRow>>) {
    for order in orders.iter_mut() {
        order.lines = Some(grouped.remove(&order.root.order_id).unwrap_or_default());
    }
}

/// すべての関連を結合した行を平坦な応答形に変換する
/// 関連が欠けている行は出力しない
pub fn project_flat(rows: &[OrderRow]) -> Vec<OrderFlatView> {
    rows.iter()
        .filter_map(|row| {
            let member = row.member.as_ref()?;
            let delivery = row.delivery.as_ref()?;
            let line = row.line.as_ref()?;
            Some(OrderFlatView {
                order_id: row.root.order_id,
                member_name: member.name.clone(),
                order_date: row.root.order_date,
                order_status: row.root.status.to_string(),
                address: AddressView::from(&delivery.address),
                delivery_status: delivery.status.to_string(),
                item_name: line.item_name.clone(),
                order_price: line.order_price.amount(),
                count: line.count,
            })
        })
        .collect()
}

/// 平坦な応答形を注文ごとの入れ子の形に組み直す
/// 最初に現れた順序を保つ
pub fn group_flat(flat: &[OrderFlatView]) -> Result<Vec<OrderView>, DomainError> {
    let mut views: Vec<OrderView> = Vec::new();
    let mut positions: HashMap<OrderId, usize> = HashMap::new();

    for row in flat {
        let position = match positions.get(&row.order_id).copied() {
            Some(position) => position,
            None => {
                positions.insert(row.order_id, views.len());
                views.push(OrderView {
                    order_id: row.order_id,
                    member_name: Some(row.member_name.clone()),
                    order_date: row.order_date,
                    order_status: row.order_status.clone(),
                    address: Some(row.address.clone()),
                    delivery_status: Some(row.delivery_status.clone()),
                    order_items: Some(Vec::new()),
                    total_price: Some(0),
                });
                views.len() - 1
            }
        };

        let view = &mut views[position];
        if let Some(items) = view.order_items.as_mut() {
            items.push(OrderItemView {
                item_name: row.item_name.clone(),
                order_price: row.order_price,
                count: row.count,
            });
        }
        let line_total = Money::new(row.order_price)?.multiply(row.count)?;
        if let Some(total) = view.total_price.as_mut() {
            *total = Money::new(*total)?.add(&line_total)?.amount();
        }
    }

    Ok(views)
}
