use crate::application::ApplicationError;
use crate::domain::model::{
    Address, CancelOutcome, DeliveryId, Item, ItemId, ItemKind, Member, MemberId, Money, Order,
    OrderId,
};
use crate::domain::port::{
    ChangeSet, ItemRepository, MemberRepository, OrderRepository, UnitOfWork,
};
use crate::domain::service::{OrderPlacementService, PlacementIds};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

mod order_query_service;

pub use order_query_service::{LoadedOrders, OrderQueryService};

/// 会員アプリケーションサービス
pub struct MemberApplicationService {
    member_repository: Arc<dyn MemberRepository>,
}

impl MemberApplicationService {
    /// 新しい会員アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `member_repository` - 会員リポジトリ
    pub fn new(member_repository: Arc<dyn MemberRepository>) -> Self {
        Self { member_repository }
    }

    /// 会員登録
    /// 同じ名前の会員が既に存在する場合は書き込む前に失敗する
    ///
    /// # Arguments
    /// * `name` - 会員名
    /// * `address` - 住所
    ///
    /// # Returns
    /// * `Ok(MemberId)` - 登録された会員のID
    /// * `Err(ApplicationError::DuplicateMember)` - 同名の会員が存在する
    pub async fn join(&self, name: String, address: Address) -> Result<MemberId, ApplicationError> {
        if !self.member_repository.find_by_name(&name).await?.is_empty() {
            warn!(member_name = %name, "既に存在する会員名で登録しようとしました");
            return Err(ApplicationError::DuplicateMember(format!(
                "既に存在する会員です: {}",
                name
            )));
        }

        let member_id = self.member_repository.next_identity();
        let member = Member::new(member_id, name, address)?;
        self.member_repository.save(&member).await?;

        info!(member_id = %member_id, "会員を登録しました");
        Ok(member_id)
    }

    /// すべての会員を取得
    pub async fn find_members(&self) -> Result<Vec<Member>, ApplicationError> {
        self.member_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }

    /// 会員IDで会員を取得
    ///
    /// # Returns
    /// * `Ok(Member)` - 会員が見つかった
    /// * `Err(ApplicationError::NotFound)` - 会員が見つからなかった
    pub async fn find_member(&self, member_id: MemberId) -> Result<Member, ApplicationError> {
        self.member_repository
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("会員が見つかりません: {}", member_id))
            })
    }

    /// 会員名を変更
    ///
    /// # Arguments
    /// * `member_id` - 会員ID
    /// * `name` - 新しい会員名
    pub async fn update_member_name(
        &self,
        member_id: MemberId,
        name: String,
    ) -> Result<Member, ApplicationError> {
        let mut member = self.find_member(member_id).await?;
        member.change_name(name)?;
        self.member_repository.save(&member).await?;

        info!(member_id = %member_id, "会員名を変更しました");
        Ok(member)
    }
}

/// 商品アプリケーションサービス
pub struct ItemApplicationService {
    item_repository: Arc<dyn ItemRepository>,
}

impl ItemApplicationService {
    /// 新しい商品アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `item_repository` - 商品リポジトリ
    pub fn new(item_repository: Arc<dyn ItemRepository>) -> Self {
        Self { item_repository }
    }

    /// 新しい商品を登録
    ///
    /// # Arguments
    /// * `name` - 商品名
    /// * `price` - 価格
    /// * `stock_quantity` - 初期在庫数
    /// * `kind` - 商品の種類と固有情報
    ///
    /// # Returns
    /// * `Ok(ItemId)` - 登録された商品のID
    /// * `Err(ApplicationError)` - 登録失敗
    pub async fn save_item(
        &self,
        name: String,
        price: i64,
        stock_quantity: u32,
        kind: ItemKind,
    ) -> Result<ItemId, ApplicationError> {
        let item_id = self.item_repository.next_identity();
        let item = Item::new(item_id, name, Money::new(price)?, stock_quantity, kind)?;
        self.item_repository.save(&item).await?;

        info!(item_id = %item_id, dtype = item.kind().discriminator(), "商品を登録しました");
        Ok(item_id)
    }

    /// 商品IDで商品を取得
    pub async fn find_item(&self, item_id: ItemId) -> Result<Item, ApplicationError> {
        self.item_repository
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("商品が見つかりません: {}", item_id)))
    }

    /// すべての商品を取得
    pub async fn find_items(&self) -> Result<Vec<Item>, ApplicationError> {
        self.item_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }

    /// 商品情報を変更
    /// 読み込んだ時点のバージョンで更新するため、同時に在庫が変わった場合は競合になる
    pub async fn update_item(
        &self,
        item_id: ItemId,
        name: String,
        price: i64,
        stock_quantity: u32,
        kind: ItemKind,
    ) -> Result<Item, ApplicationError> {
        let mut item = self.find_item(item_id).await?;
        item.update(name, Money::new(price)?, stock_quantity, kind)?;
        self.item_repository.save(&item).await?;

        info!(item_id = %item_id, "商品を変更しました");
        // 保存でバージョンが進むため読み直す
        self.find_item(item_id).await
    }
}

/// 注文アプリケーションサービス
pub struct OrderApplicationService {
    member_repository: Arc<dyn MemberRepository>,
    item_repository: Arc<dyn ItemRepository>,
    order_repository: Arc<dyn OrderRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl OrderApplicationService {
    /// 新しい注文アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `member_repository` - 会員リポジトリ
    /// * `item_repository` - 商品リポジトリ
    /// * `order_repository` - 注文リポジトリ
    /// * `unit_of_work` - 注文と在庫をまとめて書き込む作業単位
    pub fn new(
        member_repository: Arc<dyn MemberRepository>,
        item_repository: Arc<dyn ItemRepository>,
        order_repository: Arc<dyn OrderRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            member_repository,
            item_repository,
            order_repository,
            unit_of_work,
        }
    }

    /// 1つの商品を注文
    ///
    /// # Arguments
    /// * `member_id` - 会員ID
    /// * `item_id` - 商品ID
    /// * `count` - 数量
    ///
    /// # Returns
    /// * `Ok(OrderId)` - 作成された注文のID
    /// * `Err(ApplicationError)` - 在庫不足など（在庫は変更されない）
    pub async fn place_order(
        &self,
        member_id: MemberId,
        item_id: ItemId,
        count: u32,
    ) -> Result<OrderId, ApplicationError> {
        self.place_order_lines(member_id, vec![(item_id, count)])
            .await
    }

    /// 複数の商品をまとめて注文
    /// 注文・配送・注文商品の作成と在庫の減少は1つの作業単位でコミットする
    ///
    /// # Arguments
    /// * `member_id` - 会員ID
    /// * `lines` - 商品IDと数量の組
    ///
    /// # Returns
    /// * `Ok(OrderId)` - 作成された注文のID
    /// * `Err(ApplicationError)` - 作成失敗（何も書き込まれない）
    pub async fn place_order_lines(
        &self,
        member_id: MemberId,
        lines: Vec<(ItemId, u32)>,
    ) -> Result<OrderId, ApplicationError> {
        let member = self
            .member_repository
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("会員が見つかりません: {}", member_id))
            })?;

        let mut loaded = Vec::with_capacity(lines.len());
        for (item_id, count) in lines {
            let item = self
                .item_repository
                .find_by_id(item_id)
                .await?
                .ok_or_else(|| {
                    ApplicationError::NotFound(format!("商品が見つかりません: {}", item_id))
                })?;
            loaded.push((item, count));
        }

        let ids = PlacementIds {
            order_id: self.order_repository.next_identity(),
            delivery_id: DeliveryId::new(),
        };
        let placed = OrderPlacementService::place(&member, loaded, ids, Utc::now()).map_err(
            |err| {
                warn!(member_id = %member_id, error = %err, "注文を作成できませんでした");
                err
            },
        )?;

        let order_id = placed.order.id();
        let total_price = placed.order.total_price()?;
        self.unit_of_work
            .commit(
                ChangeSet::new()
                    .with_order(placed.order)
                    .with_items(placed.items),
            )
            .await?;

        info!(
            order_id = %order_id,
            member_id = %member_id,
            total_price = %total_price,
            "注文を作成しました"
        );
        Ok(order_id)
    }

    /// 注文をキャンセル
    /// 在庫を注文商品の数量分戻す。既にキャンセル済みの場合は何もしない
    /// 読み込んだ後に注文が他の処理で更新されていた場合は競合として何も書き込まない
    ///
    /// # Arguments
    /// * `order_id` - 注文ID
    ///
    /// # Returns
    /// * `Ok(())` - キャンセル成功（またはキャンセル済み）
    /// * `Err(ApplicationError)` - 注文が見つからない、配送完了済みなど
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id).await?;

        if order.cancel()? == CancelOutcome::AlreadyCancelled {
            info!(order_id = %order_id, "既にキャンセル済みの注文です");
            return Ok(());
        }

        let mut items = Vec::with_capacity(order.order_items().len());
        for order_item in order.order_items() {
            let item_id = order_item.item_id();
            if items.iter().any(|item: &Item| item.id() == item_id) {
                continue;
            }
            let item = self.item_repository.find_by_id(item_id).await?.ok_or_else(|| {
                ApplicationError::NotFound(format!("商品が見つかりません: {}", item_id))
            })?;
            items.push(item);
        }
        let items = OrderPlacementService::restore_stock(&order, items)?;

        self.unit_of_work
            .commit(ChangeSet::new().with_order(order).with_items(items))
            .await?;

        info!(order_id = %order_id, "注文をキャンセルしました");
        Ok(())
    }

    /// 配送を完了にする
    pub async fn complete_delivery(&self, order_id: OrderId) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id).await?;
        order.complete_delivery()?;
        self.unit_of_work
            .commit(ChangeSet::new().with_order(order))
            .await?;

        info!(order_id = %order_id, "配送を完了しました");
        Ok(())
    }

    /// 注文IDで注文集約を取得
    ///
    /// # Returns
    /// * `Ok(Order)` - 注文が見つかった
    /// * `Err(ApplicationError::NotFound)` - 注文が見つからなかった
    pub async fn find_order(&self, order_id: OrderId) -> Result<Order, ApplicationError> {
        self.order_repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id))
            })
    }
}
