// region:    --- Imports
use crate::catalog::commands::{
    self, AddImageCommand, CreateItemCommand, PlaceBidCommand, UpdateItemCommand,
};
use crate::catalog::money::UsdConverter;
use crate::database::DatabaseManager;
use crate::error::CatalogError;
use crate::query;
use crate::store::PostgresItemStore;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

/// 핸들러 공유 상태
pub type AppState = (Arc<DatabaseManager>, Arc<UsdConverter>);

// region:    --- Router
/// 라우터 설정
pub fn routes(db_manager: Arc<DatabaseManager>, converter: Arc<UsdConverter>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/items", get(handle_get_items).post(handle_create_item))
        .route(
            "/items/:id",
            get(handle_get_item)
                .patch(handle_update_item)
                .delete(handle_delete_item),
        )
        .route(
            "/items/:id/images",
            get(handle_get_item_images).post(handle_add_image),
        )
        .route(
            "/items/:id/bids",
            get(handle_get_item_bids).post(handle_place_bid),
        )
        .route("/items/:id/bids/:bid_id", delete(handle_remove_bid))
        .route(
            "/items/:id/image-blob",
            get(handle_get_image_blob).put(handle_put_image_blob),
        )
        .route(
            "/items/:id/description",
            get(handle_get_description).put(handle_put_description),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20)) // 이미지 BLOB 업로드를 위한 20MB 제한
        .with_state((db_manager, converter))
}

/// 에러 응답 변환
fn error_response(e: CatalogError) -> Response {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if e.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        error!("{:<12} --> 요청 처리 중 오류 발생: {:?}", "Handler", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(serde_json::json!({
            "error": e.to_string(),
            "code": e.code(),
        })),
    )
        .into_response()
}

fn item_store(
    db_manager: &Arc<DatabaseManager>,
    converter: &Arc<UsdConverter>,
) -> PostgresItemStore {
    PostgresItemStore::new(Arc::clone(db_manager), Arc::clone(converter))
}
// endregion: --- Router

// region:    --- Command Handlers

/// 상품 등록
pub async fn handle_create_item(
    State((db_manager, converter)): State<AppState>,
    Json(cmd): Json<CreateItemCommand>,
) -> impl IntoResponse {
    let store = item_store(&db_manager, &converter);
    match commands::handle_create_item(cmd, &store).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => error_response(e),
    }
}

/// 상품 수정
pub async fn handle_update_item(
    State((db_manager, converter)): State<AppState>,
    Path(item_id): Path<i64>,
    Json(cmd): Json<UpdateItemCommand>,
) -> impl IntoResponse {
    let store = item_store(&db_manager, &converter);
    match commands::handle_update_item(item_id, cmd, &store).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => error_response(e),
    }
}

/// 상품 삭제
pub async fn handle_delete_item(
    State((db_manager, converter)): State<AppState>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    let store = item_store(&db_manager, &converter);
    match commands::handle_delete_item(item_id, &store).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// 이미지 추가
pub async fn handle_add_image(
    State((db_manager, converter)): State<AppState>,
    Path(item_id): Path<i64>,
    Json(cmd): Json<AddImageCommand>,
) -> impl IntoResponse {
    let store = item_store(&db_manager, &converter);
    match commands::handle_add_image(item_id, cmd, &store).await {
        Ok(images) => Json(images).into_response(),
        Err(e) => error_response(e),
    }
}

/// 입찰 추가
pub async fn handle_place_bid(
    State((db_manager, converter)): State<AppState>,
    Path(item_id): Path<i64>,
    Json(cmd): Json<PlaceBidCommand>,
) -> impl IntoResponse {
    let store = item_store(&db_manager, &converter);
    match commands::handle_place_bid(item_id, cmd, &store).await {
        Ok(bid) => (StatusCode::CREATED, Json(bid)).into_response(),
        Err(e) => error_response(e),
    }
}

/// 입찰 제거
pub async fn handle_remove_bid(
    State((db_manager, converter)): State<AppState>,
    Path((item_id, bid_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let store = item_store(&db_manager, &converter);
    match commands::handle_remove_bid(item_id, bid_id, &store).await {
        Ok(bid) => Json(bid).into_response(),
        Err(e) => error_response(e),
    }
}

/// 이미지 BLOB 저장
pub async fn handle_put_image_blob(
    State((db_manager, converter)): State<AppState>,
    Path(item_id): Path<i64>,
    body: Bytes,
) -> impl IntoResponse {
    let store = item_store(&db_manager, &converter);
    match commands::handle_attach_image_blob(item_id, body.to_vec(), &store).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// 설명 저장
pub async fn handle_put_description(
    State((db_manager, converter)): State<AppState>,
    Path(item_id): Path<i64>,
    body: String,
) -> impl IntoResponse {
    let store = item_store(&db_manager, &converter);
    match commands::handle_set_description(item_id, body, &store).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 모든 상품 조회
pub async fn handle_get_items(State((db_manager, _)): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 모든 상품 조회", "HandlerQuery");
    match query::handlers::get_all_items(&db_manager).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => error_response(e),
    }
}

/// 상품 조회
pub async fn handle_get_item(
    State((db_manager, _)): State<AppState>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 조회 id: {}", "HandlerQuery", item_id);
    match query::handlers::get_item(&db_manager, item_id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => error_response(e),
    }
}

/// 상품 이미지 조회
pub async fn handle_get_item_images(
    State((db_manager, _)): State<AppState>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 이미지 조회 id: {}", "HandlerQuery", item_id);
    match query::handlers::get_item_images(&db_manager, item_id).await {
        Ok(images) => Json(images).into_response(),
        Err(e) => error_response(e),
    }
}

/// 상품 입찰 조회
pub async fn handle_get_item_bids(
    State((db_manager, _)): State<AppState>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 입찰 조회 id: {}", "HandlerQuery", item_id);
    match query::handlers::get_item_bids(&db_manager, item_id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => error_response(e),
    }
}

/// 이미지 BLOB 조회
pub async fn handle_get_image_blob(
    State((db_manager, _)): State<AppState>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 이미지 BLOB 조회 id: {}", "HandlerQuery", item_id);
    match query::handlers::get_image_blob(&db_manager, item_id).await {
        Ok(Some(data)) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            data,
        )
            .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// 설명 조회
pub async fn handle_get_description(
    State((db_manager, _)): State<AppState>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 설명 조회 id: {}", "HandlerQuery", item_id);
    match query::handlers::get_description(&db_manager, item_id).await {
        Ok(Some(description)) => description.into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Query Handlers
