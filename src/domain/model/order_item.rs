use crate::domain::error::DomainError;
use crate::domain::model::{Item, ItemId, Money, OrderItemId};

/// 注文商品エンティティ
/// 注文時点の価格と数量を保持し、作成後に商品の現在価格を再参照しない
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    id: OrderItemId,
    item_id: ItemId,
    order_price: Money,
    count: u32,
}

impl OrderItem {
    /// 商品の現在価格をスナップショットして注文商品を作成
    /// 数量は1以上で、小計が金額として表現できる必要がある
    pub fn create(id: OrderItemId, item: &Item, count: u32) -> Result<Self, DomainError> {
        if count == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        item.price().multiply(count)?;
        Ok(Self {
            id,
            item_id: item.id(),
            order_price: item.price(),
            count,
        })
    }

    /// データベースから取得したデータで注文商品を再構築
    pub fn reconstruct(id: OrderItemId, item_id: ItemId, order_price: Money, count: u32) -> Self {
        Self {
            id,
            item_id,
            order_price,
            count,
        }
    }

    pub fn id(&self) -> OrderItemId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// 注文時点の価格
    pub fn order_price(&self) -> Money {
        self.order_price
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// 小計を計算（注文価格 × 数量）
    pub fn total_price(&self) -> Result<Money, DomainError> {
        self.order_price.multiply(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ItemKind;

    fn album(price: i64) -> Item {
        Item::new(
            ItemId::new(),
            "album".to_string(),
            Money::new(price).unwrap(),
            10,
            ItemKind::Album {
                artist: "artist".to_string(),
                etc: String::new(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_order_item_snapshots_price() {
        let mut item = album(10000);
        let order_item = OrderItem::create(OrderItemId::new(), &item, 2).unwrap();

        item.update(
            "album".to_string(),
            Money::new(99999).unwrap(),
            10,
            item.kind().clone(),
        )
        .unwrap();

        assert_eq!(order_item.order_price().amount(), 10000);
        assert_eq!(order_item.total_price().unwrap().amount(), 20000);
        assert_eq!(order_item.item_id(), item.id());
    }

    #[test]
    fn test_order_item_with_zero_count_fails() {
        let item = album(1000);
        let result = OrderItem::create(OrderItemId::new(), &item, 0);
        assert_eq!(result, Err(DomainError::InvalidQuantity));
    }

    #[test]
    fn test_order_item_rejects_overflowing_line_total() {
        let item = album(i64::MAX / 2 + 1);

        let result = OrderItem::create(OrderItemId::new(), &item, 2);
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
        assert!(OrderItem::create(OrderItemId::new(), &item, 1).is_ok());
    }
}
