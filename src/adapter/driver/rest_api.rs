use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::adapter::driven::InMemoryStore;
use crate::adapter::driver::request_dto::{
    CreateMemberRequest, CreateOrderRequest, ItemRequest, OrderQueryParams, OrdersQueryParams,
    UpdateMemberRequest,
};
use crate::adapter::driver::response_dto::{
    DataWrapper, IdResponse, ItemResponse, MemberResponse, OrderListResponse,
};
use crate::application::projection::{project, OrderFlatView, OrderView};
use crate::application::service::{
    ItemApplicationService, MemberApplicationService, OrderApplicationService, OrderQueryService,
};
use crate::application::ApplicationError;
use crate::domain::model::{ItemId, MemberId, OrderId};
use crate::domain::query::BatchSize;

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub member_service: Arc<MemberApplicationService>,
    pub item_service: Arc<ItemApplicationService>,
    pub order_service: Arc<OrderApplicationService>,
    pub order_query_service: Arc<OrderQueryService>,
}

impl AppState {
    /// インメモリストアですべてのサービスを組み立てる
    pub fn in_memory(store: Arc<InMemoryStore>, batch_size: BatchSize) -> Self {
        Self {
            member_service: Arc::new(MemberApplicationService::new(store.clone())),
            item_service: Arc::new(ItemApplicationService::new(store.clone())),
            order_service: Arc::new(OrderApplicationService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            order_query_service: Arc::new(OrderQueryService::new(store, batch_size)),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/members", get(get_members).post(create_member))
        .route("/api/members/:member_id", get(get_member).put(update_member))
        .route("/api/items", get(get_items).post(create_item))
        .route("/api/items/:item_id", get(get_item).put(update_item))
        .route("/api/orders", get(get_orders).post(create_order))
        .route("/api/orders/flat", get(get_flat_orders))
        .route("/api/orders/:order_id", get(get_order))
        .route("/api/orders/:order_id/cancel", post(cancel_order))
        .route(
            "/api/orders/:order_id/delivery/complete",
            post(complete_delivery),
        )
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "shop-order-management",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// 会員一覧取得エンドポイント
async fn get_members(
    State(state): State<AppState>,
) -> ApiResult<Json<DataWrapper<MemberResponse>>> {
    let members = state
        .member_service
        .find_members()
        .await
        .map_err(map_application_error)?;

    Ok(Json(DataWrapper::new(
        members.iter().map(MemberResponse::from_member).collect(),
    )))
}

// 会員取得エンドポイント
async fn get_member(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
) -> ApiResult<Json<MemberResponse>> {
    let member = state
        .member_service
        .find_member(MemberId::from_uuid(member_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(MemberResponse::from_member(&member)))
}

// 会員登録エンドポイント
async fn create_member(
    State(state): State<AppState>,
    Json(request): Json<CreateMemberRequest>,
) -> ApiResult<(StatusCode, Json<IdResponse>)> {
    let address = request
        .address()
        .map_err(|err| map_application_error(err.into()))?;

    let member_id = state
        .member_service
        .join(request.name, address)
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(IdResponse {
            id: member_id.to_string(),
        }),
    ))
}

// 会員名変更エンドポイント
async fn update_member(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Json(request): Json<UpdateMemberRequest>,
) -> ApiResult<Json<MemberResponse>> {
    let member = state
        .member_service
        .update_member_name(MemberId::from_uuid(member_id), request.name)
        .await
        .map_err(map_application_error)?;

    Ok(Json(MemberResponse::from_member(&member)))
}

// 商品一覧取得エンドポイント
async fn get_items(State(state): State<AppState>) -> ApiResult<Json<DataWrapper<ItemResponse>>> {
    let items = state
        .item_service
        .find_items()
        .await
        .map_err(map_application_error)?;

    Ok(Json(DataWrapper::new(
        items.iter().map(ItemResponse::from_item).collect(),
    )))
}

// 商品取得エンドポイント
async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> ApiResult<Json<ItemResponse>> {
    let item = state
        .item_service
        .find_item(ItemId::from_uuid(item_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(ItemResponse::from_item(&item)))
}

// 商品登録エンドポイント
async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<ItemRequest>,
) -> ApiResult<(StatusCode, Json<IdResponse>)> {
    let item_id = state
        .item_service
        .save_item(
            request.name,
            request.price,
            request.stock_quantity,
            request.kind.into(),
        )
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(IdResponse {
            id: item_id.to_string(),
        }),
    ))
}

// 商品更新エンドポイント
async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<ItemRequest>,
) -> ApiResult<Json<ItemResponse>> {
    let item = state
        .item_service
        .update_item(
            ItemId::from_uuid(item_id),
            request.name,
            request.price,
            request.stock_quantity,
            request.kind.into(),
        )
        .await
        .map_err(map_application_error)?;

    Ok(Json(ItemResponse::from_item(&item)))
}

// 注文エンドポイント
async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<IdResponse>)> {
    let order_id = state
        .order_service
        .place_order_lines(MemberId::from_uuid(request.member_id), request.order_lines())
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(IdResponse {
            id: order_id.to_string(),
        }),
    ))
}

// 注文キャンセルエンドポイント
async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .cancel_order(OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::OK)
}

// 配送完了エンドポイント
async fn complete_delivery(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .complete_delivery(OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::OK)
}

// 注文一覧取得エンドポイント
// include で読み込む関連、loading で注文商品の読み込み方式を指定する
async fn get_orders(
    State(state): State<AppState>,
    query: Result<Query<OrdersQueryParams>, QueryRejection>,
) -> ApiResult<Json<OrderListResponse<OrderView>>> {
    let Query(params) = query.map_err(invalid_parameter)?;
    let request = params
        .load_request()
        .map_err(|err| map_application_error(err.into()))?;

    let loaded = state
        .order_query_service
        .load_orders(&request)
        .await
        .map_err(map_application_error)?;

    let views = project(&loaded.orders, &request.relations)
        .map_err(|err| map_application_error(err.into()))?;
    Ok(Json(OrderListResponse::new(views, &loaded)))
}

// 平坦な注文一覧取得エンドポイント（注文商品ごとに1件）
async fn get_flat_orders(
    State(state): State<AppState>,
    query: Result<Query<OrdersQueryParams>, QueryRejection>,
) -> ApiResult<Json<DataWrapper<OrderFlatView>>> {
    let Query(params) = query.map_err(invalid_parameter)?;
    let search = params
        .search()
        .map_err(|err| map_application_error(err.into()))?;

    let flat = state
        .order_query_service
        .load_flat_orders(&search, params.page())
        .await
        .map_err(map_application_error)?;

    Ok(Json(DataWrapper::new(flat)))
}

// 注文取得エンドポイント
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    query: Result<Query<OrderQueryParams>, QueryRejection>,
) -> ApiResult<Json<OrderView>> {
    let Query(params) = query.map_err(invalid_parameter)?;
    let relations = params
        .relations()
        .map_err(|err| map_application_error(err.into()))?;

    let order = state
        .order_query_service
        .load_order(OrderId::from_uuid(order_id), relations)
        .await
        .map_err(map_application_error)?;

    project(std::slice::from_ref(&order), &relations)
        .map_err(|err| map_application_error(err.into()))?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| {
            map_application_error(ApplicationError::NotFound(format!(
                "注文が見つかりません: {}",
                order_id
            )))
        })
}

fn invalid_parameter(rejection: QueryRejection) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: format!("無効なクエリパラメータです: {}", rejection),
            code: "INVALID_PARAMETER".to_string(),
        }),
    )
}

/// エラーコードに対応するHTTPステータスコード
fn status_for(code: &str) -> StatusCode {
    match code {
        "NOT_FOUND" => StatusCode::NOT_FOUND,
        "CONFLICT" | "DUPLICATE_MEMBER" => StatusCode::CONFLICT,
        "REPOSITORY_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    let code = err.code();
    let status = status_for(code);
    if status.is_server_error() {
        error!(code, error = %err, "リクエストの処理に失敗しました");
    }

    (
        status,
        Json(ApiError {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::port::RepositoryError;

    #[test]
    fn test_map_application_error_not_found() {
        let app_error = ApplicationError::NotFound("リソースが見つかりません".to_string());
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, "NOT_FOUND");
        assert!(api_error.error.contains("リソースが見つかりません"));
    }

    #[test]
    fn test_paging_rejection_is_bad_request() {
        let app_error: ApplicationError =
            DomainError::Configuration("対多の結合とページング".to_string()).into();
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_conflicts_map_to_409() {
        let conflict: ApplicationError = RepositoryError::Conflict("item".to_string()).into();
        assert_eq!(map_application_error(conflict).0, StatusCode::CONFLICT);

        let duplicate = ApplicationError::DuplicateMember("userA".to_string());
        assert_eq!(map_application_error(duplicate).0, StatusCode::CONFLICT);

        let failed: ApplicationError = RepositoryError::FetchFailed("broken".to_string()).into();
        assert_eq!(
            map_application_error(failed).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
