use crate::domain::model::{Item, ItemId, Member, MemberId, Order, OrderId, Relation};
use crate::domain::port::{
    ChangeSet, ItemRepository, MemberRepository, OrderQueryRepository, OrderRepository,
    RepositoryError, UnitOfWork,
};
use crate::domain::query::{
    DeliveryRow, MemberRow, OrderLineRow, OrderRootRow, OrderRow, OrderSearch, Page, RelationSet,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    // Vecで保持して登録順を保つ
    members: Vec<Member>,
    items: Vec<Item>,
    orders: Vec<Order>,
}

impl State {
    fn member(&self, member_id: MemberId) -> Option<&Member> {
        self.members.iter().find(|member| member.id() == member_id)
    }

    fn item(&self, item_id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == item_id)
    }

    /// 保持しているバージョンが一致する場合のみ置き換え、バージョンを進めた商品を返す
    fn checked_item(&self, item: &Item) -> Result<(Option<usize>, Item), RepositoryError> {
        let position = self.items.iter().position(|stored| stored.id() == item.id());
        let next_version = match position {
            Some(index) if self.items[index].version() != item.version() => {
                return Err(RepositoryError::Conflict(format!(
                    "商品が他の処理で更新されています: {}",
                    item.id()
                )));
            }
            Some(_) => item.version() + 1,
            None => 0,
        };
        let stored = Item::reconstruct(
            item.id(),
            item.name().to_string(),
            item.price(),
            item.stock_quantity(),
            item.category_ids().to_vec(),
            item.kind().clone(),
            next_version,
        );
        Ok((position, stored))
    }

    fn put_item(&mut self, position: Option<usize>, item: Item) {
        match position {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    /// 商品と同じく、読み込んだ時点のバージョンが一致する注文だけを書き込める
    fn checked_order(&self, order: &Order) -> Result<(Option<usize>, Order), RepositoryError> {
        let position = self.orders.iter().position(|stored| stored.id() == order.id());
        let next_version = match position {
            Some(index) if self.orders[index].version() != order.version() => {
                return Err(RepositoryError::Conflict(format!(
                    "注文が他の処理で更新されています: {}",
                    order.id()
                )));
            }
            Some(_) => order.version() + 1,
            None => 0,
        };
        let stored = Order::reconstruct(
            order.id(),
            order.member_id(),
            order.delivery().clone(),
            order.order_items().to_vec(),
            order.order_date(),
            order.status(),
            next_version,
        );
        Ok((position, stored))
    }

    fn put_order(&mut self, position: Option<usize>, order: Order) {
        match position {
            Some(index) => self.orders[index] = order,
            None => self.orders.push(order),
        }
    }

    fn line_rows(&self, order: &Order) -> Vec<OrderLineRow> {
        order
            .order_items()
            .iter()
            .map(|order_item| OrderLineRow {
                order_item_id: order_item.id(),
                order_id: order.id(),
                item_id: order_item.item_id(),
                item_name: self
                    .item(order_item.item_id())
                    .map(|item| item.name().to_string())
                    .unwrap_or_default(),
                order_price: order_item.order_price(),
                count: order_item.count(),
            })
            .collect()
    }
}

/// インメモリストア
/// すべてのポートを1つの状態で実装する。テストやデータベースなしの起動で使う
///
/// 注文クエリはMySQL実装と同じ形の行を返す
/// （注文商品を結合すると注文商品ごとに1行、ページングは結合後の行に適用）
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    query_statements: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでに発行された注文クエリの数
    pub fn query_statements(&self) -> usize {
        self.query_statements.load(Ordering::SeqCst)
    }

    /// 注文クエリの計数をリセットする
    pub fn reset_query_statements(&self) {
        self.query_statements.store(0, Ordering::SeqCst);
    }

    fn count_statement(&self) {
        self.query_statements.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn save(&self, member: &Member) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        match state.members.iter_mut().find(|stored| stored.id() == member.id()) {
            Some(stored) => *stored = member.clone(),
            None => state.members.push(member.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<Member>, RepositoryError> {
        Ok(self.state.lock().await.member(member_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Member>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .members
            .iter()
            .filter(|member| member.name() == name)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Member>, RepositoryError> {
        Ok(self.state.lock().await.members.clone())
    }

    fn next_identity(&self) -> MemberId {
        MemberId::new()
    }
}

#[async_trait]
impl ItemRepository for InMemoryStore {
    async fn save(&self, item: &Item) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let (position, stored) = state.checked_item(item)?;
        state.put_item(position, stored);
        Ok(())
    }

    async fn find_by_id(&self, item_id: ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self.state.lock().await.item(item_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Item>, RepositoryError> {
        Ok(self.state.lock().await.items.clone())
    }

    fn next_identity(&self) -> ItemId {
        ItemId::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|order| order.id() == order_id)
            .cloned())
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    async fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;

        // 先にすべての商品と注文を検証し、競合があれば何も書き込まない
        let checked_items = changes
            .items
            .iter()
            .map(|item| state.checked_item(item))
            .collect::<Result<Vec<_>, _>>()?;
        let checked_orders = changes
            .orders
            .iter()
            .map(|order| state.checked_order(order))
            .collect::<Result<Vec<_>, _>>()?;

        for (position, item) in checked_items {
            state.put_item(position, item);
        }
        for (position, order) in checked_orders {
            state.put_order(position, order);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderQueryRepository for InMemoryStore {
    async fn find_order_rows(
        &self,
        search: &OrderSearch,
        joins: RelationSet,
        page: Option<Page>,
    ) -> Result<Vec<OrderRow>, RepositoryError> {
        self.count_statement();
        let state = self.state.lock().await;

        let mut rows = Vec::new();
        for order in &state.orders {
            // 会員は常に内部結合する
            let Some(member) = state.member(order.member_id()) else {
                continue;
            };
            if !search.matches(order.id(), member.id(), order.status(), member.name()) {
                continue;
            }

            let root = OrderRootRow {
                order_id: order.id(),
                member_id: member.id(),
                order_date: order.order_date(),
                status: order.status(),
            };
            let member_row = joins.contains(Relation::Member).then(|| MemberRow {
                member_id: member.id(),
                name: member.name().to_string(),
                address: member.address().clone(),
            });
            let delivery_row = joins.contains(Relation::Delivery).then(|| DeliveryRow {
                delivery_id: order.delivery().id(),
                address: order.delivery().address().clone(),
                status: order.delivery().status(),
            });

            if joins.contains(Relation::Items) {
                for line in state.line_rows(order) {
                    rows.push(OrderRow {
                        root: root.clone(),
                        member: member_row.clone(),
                        delivery: delivery_row.clone(),
                        line: Some(line),
                    });
                }
            } else {
                rows.push(OrderRow {
                    root,
                    member: member_row,
                    delivery: delivery_row,
                    line: None,
                });
            }
        }

        let rows: Vec<OrderRow> = match page {
            Some(page) => rows
                .into_iter()
                .skip(page.offset())
                .take(page.limit())
                .collect(),
            None => rows,
        };
        debug!(rows = rows.len(), "インメモリで注文の行を返します");
        Ok(rows)
    }

    async fn find_order_lines_by_order_ids(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderLineRow>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.count_statement();
        let state = self.state.lock().await;

        Ok(state
            .orders
            .iter()
            .filter(|order| order_ids.contains(&order.id()))
            .flat_map(|order| state.line_rows(order))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        Address, Delivery, DeliveryId, DeliveryStatus, ItemKind, Money, OrderItem, OrderItemId,
        OrderStatus,
    };
    use chrono::Utc;

    fn book(name: &str, stock: u32) -> Item {
        Item::new(
            ItemId::new(),
            name.to_string(),
            Money::new(10000).unwrap(),
            stock,
            ItemKind::Book {
                author: "author".to_string(),
                isbn: "isbn".to_string(),
            },
        )
        .unwrap()
    }

    fn address() -> Address {
        Address::new("Seoul".to_string(), "1".to_string(), "1111".to_string()).unwrap()
    }

    async fn seed_order(store: &InMemoryStore, member_name: &str, items: &[&Item]) -> OrderId {
        let member = Member::new(MemberId::new(), member_name.to_string(), address()).unwrap();
        MemberRepository::save(store, &member).await.unwrap();
        let order_items = items
            .iter()
            .map(|item| OrderItem::create(OrderItemId::new(), item, 1).unwrap())
            .collect();
        let order = Order::create(
            OrderId::new(),
            member.id(),
            Delivery::ready(DeliveryId::new(), address()),
            order_items,
            Utc::now(),
        )
        .unwrap();
        let order_id = order.id();
        store.commit(ChangeSet::new().with_order(order)).await.unwrap();
        order_id
    }

    #[tokio::test]
    async fn test_items_join_multiplies_rows_and_paging_applies_to_rows() {
        let store = InMemoryStore::new();
        let jpa1 = book("JPA1 BOOK", 100);
        let jpa2 = book("JPA2 BOOK", 100);
        store.commit(ChangeSet::new().with_items([jpa1.clone(), jpa2.clone()])).await.unwrap();
        seed_order(&store, "userA", &[&jpa1, &jpa2]).await;
        seed_order(&store, "userB", &[&jpa1, &jpa2]).await;

        let rows = store
            .find_order_rows(&OrderSearch::new(), RelationSet::all(), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].line.as_ref().unwrap().item_name, "JPA1 BOOK");

        let page = crate::domain::query::PaginationGuard::validate(
            crate::domain::query::LoadStrategy::ToOneFetchJoin,
            1,
            2,
        )
        .unwrap();
        let paged = store
            .find_order_rows(&OrderSearch::new(), RelationSet::all(), Some(page))
            .await
            .unwrap();
        assert_eq!(paged.len(), 2);
        assert_eq!(store.query_statements(), 2);
    }

    #[tokio::test]
    async fn test_stale_item_version_is_rejected_without_partial_writes() {
        let store = InMemoryStore::new();
        let item = book("JPA1 BOOK", 10);
        ItemRepository::save(&store, &item).await.unwrap();

        let mut first = ItemRepository::find_by_id(&store, item.id()).await.unwrap().unwrap();
        let mut second = first.clone();
        first.remove_stock(1).unwrap();
        ItemRepository::save(&store, &first).await.unwrap();

        second.remove_stock(2).unwrap();
        let other = book("JPA2 BOOK", 5);
        let result = store
            .commit(ChangeSet::new().with_items([other.clone(), second]))
            .await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        let stored = ItemRepository::find_by_id(&store, item.id()).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity(), 9);
        assert_eq!(stored.version(), 1);
        assert!(ItemRepository::find_by_id(&store, other.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_order_write_is_rejected_without_partial_writes() {
        let store = InMemoryStore::new();
        let item = book("JPA1 BOOK", 10);
        ItemRepository::save(&store, &item).await.unwrap();
        let order_id = seed_order(&store, "userA", &[&item]).await;

        let stored = OrderRepository::find_by_id(&store, order_id).await.unwrap().unwrap();
        assert_eq!(stored.version(), 0);
        let mut first = stored.clone();
        let mut stale = stored;

        first.complete_delivery().unwrap();
        store.commit(ChangeSet::new().with_order(first)).await.unwrap();

        stale.cancel().unwrap();
        let mut restocked = ItemRepository::find_by_id(&store, item.id()).await.unwrap().unwrap();
        restocked.add_stock(1).unwrap();
        let result = store
            .commit(ChangeSet::new().with_order(stale).with_items([restocked]))
            .await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        let order = OrderRepository::find_by_id(&store, order_id).await.unwrap().unwrap();
        assert_eq!(order.status(), OrderStatus::Order);
        assert_eq!(order.delivery().status(), DeliveryStatus::Completed);
        assert_eq!(order.version(), 1);
        let item = ItemRepository::find_by_id(&store, item.id()).await.unwrap().unwrap();
        assert_eq!(item.stock_quantity(), 10);
    }
}
