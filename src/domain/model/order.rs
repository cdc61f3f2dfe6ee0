use crate::domain::error::DomainError;
use crate::domain::model::{
    Delivery, DeliveryStatus, MemberId, Money, OrderId, OrderItem, OrderStatus,
};
use chrono::{DateTime, Utc};

/// キャンセル操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// 今回の操作でキャンセルされた（在庫の戻しが必要）
    Cancelled,
    /// 既にキャンセル済みだった（何も変更していない）
    AlreadyCancelled,
}

/// Order集約
/// 配送と注文商品を排他的に所有し、会員はIDでのみ参照する
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    member_id: MemberId,
    delivery: Delivery,
    order_items: Vec<OrderItem>,
    order_date: DateTime<Utc>,
    status: OrderStatus,
    // 楽観ロック用。保存のたびにリポジトリが進める
    version: u64,
}

impl Order {
    /// 新しい注文を作成
    /// 初期ステータスはORDER、注文商品は1つ以上必要
    /// 合計金額が金額として表現できない注文は作成できない
    pub fn create(
        id: OrderId,
        member_id: MemberId,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
        order_date: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if order_items.is_empty() {
            return Err(DomainError::InvalidValue(
                "注文商品が空です。少なくとも1つの商品が必要です".to_string(),
            ));
        }
        total_of(&order_items)?;
        Ok(Self {
            id,
            member_id,
            delivery,
            order_items,
            order_date,
            status: OrderStatus::Order,
            version: 0,
        })
    }

    /// データベースから取得したデータで注文を再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(
        id: OrderId,
        member_id: MemberId,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
        order_date: DateTime<Utc>,
        status: OrderStatus,
        version: u64,
    ) -> Self {
        Self {
            id,
            member_id,
            delivery,
            order_items,
            order_date,
            status,
            version,
        }
    }

    /// 注文IDを取得
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// 会員IDを取得
    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    /// 配送を取得
    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// 注文商品のリストを取得
    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    /// 注文日時を取得
    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    /// 注文ステータスを取得
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// 読み込んだ時点のバージョンを取得
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 合計金額を計算
    /// 保持せず、毎回注文商品から再計算する
    pub fn total_price(&self) -> Result<Money, DomainError> {
        total_of(&self.order_items)
    }

    /// 注文をキャンセル
    /// 事前条件:
    /// - 配送が完了していない
    ///
    /// 既にキャンセル済みの場合は何もしない
    pub fn cancel(&mut self) -> Result<CancelOutcome, DomainError> {
        if self.status == OrderStatus::Cancel {
            return Ok(CancelOutcome::AlreadyCancelled);
        }
        if self.delivery.status() == DeliveryStatus::Completed {
            return Err(DomainError::InvalidOrderState(
                "既に配送完了した商品はキャンセルできません".to_string(),
            ));
        }

        self.status = OrderStatus::Cancel;
        Ok(CancelOutcome::Cancelled)
    }

    /// 配送を完了にする
    /// キャンセル済みの注文は配送できない
    pub fn complete_delivery(&mut self) -> Result<(), DomainError> {
        if self.status == OrderStatus::Cancel {
            return Err(DomainError::InvalidOrderState(
                "キャンセル済みの注文は配送完了にできません".to_string(),
            ));
        }
        self.delivery.complete()
    }
}

fn total_of(order_items: &[OrderItem]) -> Result<Money, DomainError> {
    order_items
        .iter()
        .try_fold(Money::zero(), |total, order_item| total.add(&order_item.total_price()?))
}
