use shop_order_management::adapter::driven::{
    MySqlItemRepository, MySqlMemberRepository, MySqlOrderQueryRepository, MySqlOrderRepository,
};
use shop_order_management::adapter::driver::rest_api::{create_router, AppState};
use shop_order_management::adapter::{DatabaseConfig, DatabaseMigration};
use shop_order_management::application::service::{
    ItemApplicationService, MemberApplicationService, OrderApplicationService, OrderQueryService,
};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shop_order_management=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // データベース設定を読み込む
    let config = DatabaseConfig::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        batch_fetch_size = config.default_batch_fetch_size.get(),
        "データベース設定を読み込みました"
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;

    // マイグレーションを実行
    DatabaseMigration::new(pool.clone()).run().await?;
    info!("データベースマイグレーションを実行しました");

    // MySQLリポジトリを作成
    let member_repository = Arc::new(MySqlMemberRepository::new(pool.clone()));
    let item_repository = Arc::new(MySqlItemRepository::new(pool.clone()));
    let order_repository = Arc::new(MySqlOrderRepository::new(pool.clone()));
    let order_query_repository = Arc::new(MySqlOrderQueryRepository::new(pool));

    // アプリケーション状態を作成
    let app_state = AppState {
        member_service: Arc::new(MemberApplicationService::new(member_repository.clone())),
        item_service: Arc::new(ItemApplicationService::new(item_repository.clone())),
        order_service: Arc::new(OrderApplicationService::new(
            member_repository,
            item_repository,
            order_repository.clone(),
            order_repository,
        )),
        order_query_service: Arc::new(OrderQueryService::new(
            order_query_repository,
            config.default_batch_fetch_size,
        )),
    };

    // REST APIルーターを作成
    let app = create_router().with_state(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // サーバーを起動
    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "REST APIサーバーが起動しました");

    axum::serve(listener, app).await?;

    Ok(())
}
