// ドメインサービス
// 複数の集約にまたがるビジネスロジックを実装

use crate::domain::error::DomainError;
use crate::domain::model::{
    Delivery, DeliveryId, Item, Member, Order, OrderId, OrderItem, OrderItemId,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// 注文確定に必要な識別子
#[derive(Debug, Clone)]
pub struct PlacementIds {
    pub order_id: OrderId,
    pub delivery_id: DeliveryId,
}

/// 注文の作成結果
/// 在庫を減らした後の商品も含めて、1つの作業単位で書き込む
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<Item>,
}

/// 注文作成サービス
/// 配送・注文商品・注文の作成と在庫の減少を1つの単位として扱う
pub struct OrderPlacementService;

impl OrderPlacementService {
    /// 注文を作成する
    ///
    /// # Arguments
    /// * `member` - 注文する会員（住所を配送にコピーする）
    /// * `lines` - 商品と数量の組（商品は呼び出し側のコピーを受け取る）
    /// * `ids` - 新しい注文と配送の識別子
    /// * `order_date` - 注文日時
    ///
    /// # Returns
    /// * `Ok(PlacedOrder)` - 作成された注文と在庫を減らした商品
    /// * `Err(DomainError)` - 在庫不足、数量不正、商品の重複など（何も変更されない）
    pub fn place(
        member: &Member,
        lines: Vec<(Item, u32)>,
        ids: PlacementIds,
        order_date: DateTime<Utc>,
    ) -> Result<PlacedOrder, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::InvalidValue(
                "注文する商品が指定されていません".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some((duplicate, _)) = lines.iter().find(|(item, _)| !seen.insert(item.id())) {
            return Err(DomainError::InvalidValue(format!(
                "同じ商品が複数回指定されています: {}",
                duplicate.id()
            )));
        }

        let mut order_items = Vec::with_capacity(lines.len());
        let mut items = Vec::with_capacity(lines.len());
        for (mut item, count) in lines {
            // 価格は在庫を減らす前にスナップショットする
            let order_item = OrderItem::create(OrderItemId::new(), &item, count)?;
            item.remove_stock(count)?;
            order_items.push(order_item);
            items.push(item);
        }

        let delivery = Delivery::ready(ids.delivery_id, member.address().clone());
        let order = Order::create(ids.order_id, member.id(), delivery, order_items, order_date)?;

        Ok(PlacedOrder { order, items })
    }

    /// キャンセルされた注文の在庫を商品に戻す
    /// 注文に含まれない商品はそのまま返す
    /// 在庫数が上限を超える商品があればエラー（何も変更されない）
    pub fn restore_stock(order: &Order, items: Vec<Item>) -> Result<Vec<Item>, DomainError> {
        items
            .into_iter()
            .map(|mut item| {
                for order_item in order.order_items() {
                    if order_item.item_id() == item.id() {
                        item.add_stock(order_item.count())?;
                    }
                }
                Ok(item)
            })
            .collect()
    }
}
