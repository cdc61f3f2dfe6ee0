use shop_order_management::adapter::driven::InMemoryStore;
use shop_order_management::application::projection::{group_flat, project};
use shop_order_management::application::service::{
    ItemApplicationService, MemberApplicationService, OrderApplicationService, OrderQueryService,
};
use shop_order_management::application::ApplicationError;
use shop_order_management::domain::error::DomainError;
use shop_order_management::domain::model::{
    Address, DeliveryStatus, ItemId, ItemKind, MemberId, OrderId, OrderStatus, Relation,
};
use shop_order_management::domain::port::{ChangeSet, ItemRepository, RepositoryError, UnitOfWork};
use shop_order_management::domain::service::OrderPlacementService;
use shop_order_management::domain::query::{
    BatchSize, CollectionLoading, LoadStrategy, OrderLoadRequest, OrderSearch, PageRequest,
    RelationSet,
};

use std::sync::Arc;

// テスト用のサービス一式
struct Fixture {
    store: Arc<InMemoryStore>,
    members: MemberApplicationService,
    items: ItemApplicationService,
    orders: OrderApplicationService,
    queries: OrderQueryService,
}

impl Fixture {
    fn new(batch_size: usize) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            members: MemberApplicationService::new(store.clone()),
            items: ItemApplicationService::new(store.clone()),
            orders: OrderApplicationService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            ),
            queries: OrderQueryService::new(store.clone(), BatchSize::new(batch_size).unwrap()),
            store,
        }
    }

    async fn join(&self, name: &str, city: &str) -> MemberId {
        let address = Address::new(city.to_string(), "1".to_string(), "1111".to_string()).unwrap();
        self.members.join(name.to_string(), address).await.unwrap()
    }

    async fn book(&self, name: &str, price: i64, stock: u32) -> ItemId {
        self.items
            .save_item(
                name.to_string(),
                price,
                stock,
                ItemKind::Book {
                    author: "kim".to_string(),
                    isbn: "1111".to_string(),
                },
            )
            .await
            .unwrap()
    }

    /// 同じ会員の注文2件、それぞれ異なる商品2つ
    async fn seed_two_orders(&self) -> (MemberId, Vec<OrderId>) {
        let member_id = self.join("userA", "Seoul").await;
        let jpa1 = self.book("JPA1 BOOK", 10000, 100).await;
        let jpa2 = self.book("JPA2 BOOK", 20000, 100).await;
        let spring1 = self.book("SPRING1 BOOK", 20000, 200).await;
        let spring2 = self.book("SPRING2 BOOK", 40000, 300).await;

        let first = self
            .orders
            .place_order_lines(member_id, vec![(jpa1, 1), (jpa2, 2)])
            .await
            .unwrap();
        let second = self
            .orders
            .place_order_lines(member_id, vec![(spring1, 3), (spring2, 4)])
            .await
            .unwrap();
        self.store.reset_query_statements();
        (member_id, vec![first, second])
    }
}

#[tokio::test]
async fn test_collection_fetch_join_collapses_duplicates_in_one_query() {
    let fixture = Fixture::new(100);
    let (_, order_ids) = fixture.seed_two_orders().await;

    let request = OrderLoadRequest::new(OrderSearch::new(), RelationSet::all());
    let loaded = fixture.queries.load_orders(&request).await.unwrap();

    assert_eq!(loaded.strategy, LoadStrategy::CollectionFetchJoin);
    assert_eq!(loaded.query_count, 1);
    assert_eq!(fixture.store.query_statements(), 1);
    assert_eq!(
        loaded.orders.iter().map(|order| order.order_id()).collect::<Vec<_>>(),
        order_ids
    );
    for order in &loaded.orders {
        assert_eq!(order.lines.as_ref().map(Vec::len), Some(2));
        assert_eq!(order.member.as_ref().map(|member| member.name.as_str()), Some("userA"));
        assert!(order.delivery.is_some());
    }

    let views = project(&loaded.orders, &request.relations).unwrap();
    assert_eq!(views[0].total_price, Some(10000 + 20000 * 2));
    assert_eq!(views[1].total_price, Some(20000 * 3 + 40000 * 4));
}

#[tokio::test]
async fn test_paging_with_collection_fetch_join_is_a_configuration_error() {
    let fixture = Fixture::new(100);
    fixture.seed_two_orders().await;

    let request =
        OrderLoadRequest::new(OrderSearch::new(), RelationSet::empty().with(Relation::Items))
            .with_page(0, 1);
    let result = fixture.queries.load_orders(&request).await;

    let err = result.unwrap_err();
    assert_eq!(err.code(), "CONFIGURATION_ERROR");
    assert_eq!(fixture.store.query_statements(), 0);
}

#[tokio::test]
async fn test_batched_loading_pages_roots_and_matches_fetch_join() {
    let fixture = Fixture::new(100);
    fixture.seed_two_orders().await;
    let relations = RelationSet::all();

    let fetch_join = fixture
        .queries
        .load_orders(&OrderLoadRequest::new(OrderSearch::new(), relations))
        .await
        .unwrap();
    let batched = fixture
        .queries
        .load_orders(
            &OrderLoadRequest::new(OrderSearch::new(), relations)
                .with_loading(CollectionLoading::Batched),
        )
        .await
        .unwrap();

    assert_eq!(batched.query_count, 2);
    assert_eq!(
        project(&fetch_join.orders, &relations).unwrap(),
        project(&batched.orders, &relations).unwrap()
    );

    // 注文単位でページングされる
    let paged = fixture
        .queries
        .load_orders(
            &OrderLoadRequest::new(OrderSearch::new(), relations)
                .with_loading(CollectionLoading::Batched)
                .with_page(1, 100),
        )
        .await
        .unwrap();
    assert_eq!(paged.orders.len(), 1);
    assert_eq!(paged.orders[0].lines.as_ref().map(Vec::len), Some(2));
    assert_eq!(paged.orders[0].order_id(), batched.orders[1].order_id());
}

#[tokio::test]
async fn test_small_batch_size_splits_in_clause() {
    let fixture = Fixture::new(1);
    fixture.seed_two_orders().await;

    let loaded = fixture
        .queries
        .load_orders(
            &OrderLoadRequest::new(OrderSearch::new(), RelationSet::all())
                .with_loading(CollectionLoading::Batched),
        )
        .await
        .unwrap();

    assert_eq!(loaded.query_count, 3);
    assert_eq!(fixture.store.query_statements(), 3);
}

#[tokio::test]
async fn test_per_root_loading_issues_one_query_per_order() {
    let fixture = Fixture::new(100);
    fixture.seed_two_orders().await;

    let loaded = fixture
        .queries
        .load_orders(
            &OrderLoadRequest::new(OrderSearch::new(), RelationSet::all())
                .with_loading(CollectionLoading::PerRoot),
        )
        .await
        .unwrap();

    assert_eq!(loaded.strategy, LoadStrategy::LazyPerRoot);
    assert_eq!(loaded.query_count, 3);
    assert_eq!(fixture.store.query_statements(), 3);
}

#[tokio::test]
async fn test_flat_projection_regroups_to_nested_shape() {
    let fixture = Fixture::new(100);
    fixture.seed_two_orders().await;

    let flat = fixture
        .queries
        .load_flat_orders(&OrderSearch::new(), None)
        .await
        .unwrap();
    assert_eq!(flat.len(), 4);

    let nested = fixture
        .queries
        .load_orders(&OrderLoadRequest::new(OrderSearch::new(), RelationSet::all()))
        .await
        .unwrap();
    assert_eq!(
        group_flat(&flat).unwrap(),
        project(&nested.orders, &RelationSet::all()).unwrap()
    );

    let paged = fixture
        .queries
        .load_flat_orders(&OrderSearch::new(), Some(PageRequest { offset: 0, limit: 10 }))
        .await;
    assert_eq!(paged.unwrap_err().code(), "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_filters_by_status_and_member_name() {
    let fixture = Fixture::new(100);
    let (_, order_ids) = fixture.seed_two_orders().await;
    let member_b = fixture.join("userB", "Busan").await;
    let item = fixture.book("JPA3 BOOK", 5000, 10).await;
    fixture.orders.place_order(member_b, item, 1).await.unwrap();
    fixture.orders.cancel_order(order_ids[0]).await.unwrap();

    let cancelled = fixture
        .queries
        .load_orders(&OrderLoadRequest::new(
            OrderSearch::new().with_status(OrderStatus::Cancel),
            RelationSet::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(cancelled.strategy, LoadStrategy::ToOneFetchJoin);
    assert_eq!(cancelled.orders.len(), 1);
    assert_eq!(cancelled.orders[0].order_id(), order_ids[0]);

    let by_name = fixture
        .queries
        .load_orders(&OrderLoadRequest::new(
            OrderSearch::new().with_member_name("B"),
            RelationSet::empty().with(Relation::Member),
        ))
        .await
        .unwrap();
    assert_eq!(by_name.orders.len(), 1);
    assert_eq!(
        by_name.orders[0].member.as_ref().map(|member| member.name.as_str()),
        Some("userB")
    );
}

#[tokio::test]
async fn test_load_single_order_and_not_found() {
    let fixture = Fixture::new(100);
    let (_, order_ids) = fixture.seed_two_orders().await;

    let order = fixture
        .queries
        .load_order(order_ids[1], RelationSet::all())
        .await
        .unwrap();
    assert_eq!(order.order_id(), order_ids[1]);
    assert_eq!(order.lines.as_ref().map(Vec::len), Some(2));

    let missing = fixture
        .queries
        .load_order(OrderId::new(), RelationSet::all())
        .await;
    assert!(matches!(missing, Err(ApplicationError::NotFound(_))));
}

#[tokio::test]
async fn test_place_and_cancel_restores_stock() {
    let fixture = Fixture::new(100);
    let member_id = fixture.join("userA", "Seoul").await;
    let item_id = fixture.book("JPA1 BOOK", 10000, 100).await;

    let order_id = fixture.orders.place_order(member_id, item_id, 3).await.unwrap();

    let order = fixture.orders.find_order(order_id).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Order);
    assert_eq!(order.total_price().unwrap().amount(), 30000);
    assert_eq!(fixture.items.find_item(item_id).await.unwrap().stock_quantity(), 97);

    fixture.orders.cancel_order(order_id).await.unwrap();
    assert_eq!(fixture.items.find_item(item_id).await.unwrap().stock_quantity(), 100);
    assert_eq!(
        fixture.orders.find_order(order_id).await.unwrap().status(),
        OrderStatus::Cancel
    );

    // 2回目のキャンセルは在庫を変えない
    fixture.orders.cancel_order(order_id).await.unwrap();
    assert_eq!(fixture.items.find_item(item_id).await.unwrap().stock_quantity(), 100);
}

#[tokio::test]
async fn test_out_of_stock_leaves_every_item_untouched() {
    let fixture = Fixture::new(100);
    let member_id = fixture.join("userA", "Seoul").await;
    let plenty = fixture.book("JPA1 BOOK", 10000, 100).await;
    let scarce = fixture.book("JPA2 BOOK", 20000, 1).await;

    let result = fixture
        .orders
        .place_order_lines(member_id, vec![(plenty, 5), (scarce, 2)])
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.code(), "OUT_OF_STOCK");
    assert_eq!(fixture.items.find_item(plenty).await.unwrap().stock_quantity(), 100);
    assert_eq!(fixture.items.find_item(scarce).await.unwrap().stock_quantity(), 1);
    let loaded = fixture
        .queries
        .load_orders(&OrderLoadRequest::new(OrderSearch::new(), RelationSet::empty()))
        .await
        .unwrap();
    assert!(loaded.orders.is_empty());
}

#[tokio::test]
async fn test_cancel_after_delivery_completed_is_rejected() {
    let fixture = Fixture::new(100);
    let member_id = fixture.join("userA", "Seoul").await;
    let item_id = fixture.book("JPA1 BOOK", 10000, 100).await;
    let order_id = fixture.orders.place_order(member_id, item_id, 2).await.unwrap();

    fixture.orders.complete_delivery(order_id).await.unwrap();
    let result = fixture.orders.cancel_order(order_id).await;

    assert!(matches!(
        result,
        Err(ApplicationError::DomainError(DomainError::InvalidOrderState(_)))
    ));
    assert_eq!(fixture.items.find_item(item_id).await.unwrap().stock_quantity(), 98);
}

#[tokio::test]
async fn test_duplicate_member_name_is_rejected() {
    let fixture = Fixture::new(100);
    fixture.join("userA", "Seoul").await;

    let address = Address::new("Busan".to_string(), "2".to_string(), "2222".to_string()).unwrap();
    let result = fixture.members.join("userA".to_string(), address).await;

    assert_eq!(result.unwrap_err().code(), "DUPLICATE_MEMBER");
    assert_eq!(fixture.members.find_members().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_item_write_is_a_conflict() {
    let fixture = Fixture::new(100);
    let member_id = fixture.join("userA", "Seoul").await;
    let item_id = fixture.book("JPA1 BOOK", 10000, 10).await;

    // 注文前に読み込んだ商品を、注文後に書き戻そうとする
    let mut stale = fixture.items.find_item(item_id).await.unwrap();
    fixture.orders.place_order(member_id, item_id, 1).await.unwrap();
    stale.add_stock(5).unwrap();
    let result = ItemRepository::save(fixture.store.as_ref(), &stale).await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    assert_eq!(fixture.items.find_item(item_id).await.unwrap().stock_quantity(), 9);
}

#[tokio::test]
async fn test_stale_order_cancel_is_a_conflict() {
    let fixture = Fixture::new(100);
    let member_id = fixture.join("userA", "Seoul").await;
    let item_id = fixture.book("JPA1 BOOK", 10000, 100).await;
    let order_id = fixture.orders.place_order(member_id, item_id, 3).await.unwrap();

    // キャンセル前に読み込んだ注文で、もう一度キャンセルを書き込もうとする
    let mut stale = fixture.orders.find_order(order_id).await.unwrap();
    fixture.orders.cancel_order(order_id).await.unwrap();

    stale.cancel().unwrap();
    let item = fixture.items.find_item(item_id).await.unwrap();
    let items = OrderPlacementService::restore_stock(&stale, vec![item]).unwrap();
    let result = fixture
        .store
        .commit(ChangeSet::new().with_order(stale).with_items(items))
        .await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    assert_eq!(fixture.items.find_item(item_id).await.unwrap().stock_quantity(), 100);
}

#[tokio::test]
async fn test_stale_cancel_does_not_overwrite_completed_delivery() {
    let fixture = Fixture::new(100);
    let member_id = fixture.join("userA", "Seoul").await;
    let item_id = fixture.book("JPA1 BOOK", 10000, 100).await;
    let order_id = fixture.orders.place_order(member_id, item_id, 3).await.unwrap();

    let mut stale = fixture.orders.find_order(order_id).await.unwrap();
    fixture.orders.complete_delivery(order_id).await.unwrap();

    stale.cancel().unwrap();
    let result = fixture.store.commit(ChangeSet::new().with_order(stale)).await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    let order = fixture.orders.find_order(order_id).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Order);
    assert_eq!(order.delivery().status(), DeliveryStatus::Completed);
    assert_eq!(fixture.items.find_item(item_id).await.unwrap().stock_quantity(), 97);
}

#[tokio::test]
async fn test_order_total_beyond_money_range_is_rejected() {
    let fixture = Fixture::new(100);
    let member_id = fixture.join("userA", "Seoul").await;
    let item_id = fixture.book("Expensive", i64::MAX / 2 + 1, 10).await;

    let result = fixture.orders.place_order(member_id, item_id, 2).await;

    assert_eq!(result.unwrap_err().code(), "INVALID_VALUE");
    assert_eq!(fixture.items.find_item(item_id).await.unwrap().stock_quantity(), 10);
}

#[tokio::test]
async fn test_cancel_that_would_overflow_stock_is_rejected() {
    let fixture = Fixture::new(100);
    let member_id = fixture.join("userA", "Seoul").await;
    let item_id = fixture.book("JPA1 BOOK", 10000, 100).await;
    let order_id = fixture.orders.place_order(member_id, item_id, 3).await.unwrap();

    fixture
        .items
        .update_item(
            item_id,
            "JPA1 BOOK".to_string(),
            10000,
            u32::MAX - 1,
            ItemKind::Book {
                author: "kim".to_string(),
                isbn: "1111".to_string(),
            },
        )
        .await
        .unwrap();

    let result = fixture.orders.cancel_order(order_id).await;

    assert_eq!(result.unwrap_err().code(), "INVALID_VALUE");
    assert_eq!(
        fixture.orders.find_order(order_id).await.unwrap().status(),
        OrderStatus::Order
    );
    assert_eq!(
        fixture.items.find_item(item_id).await.unwrap().stock_quantity(),
        u32::MAX - 1
    );
}
