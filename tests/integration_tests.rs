//! PostgreSQL 연동 테스트
//! DATABASE_URL 이 설정되지 않은 경우 건너뛴다.

use item_catalog::catalog::commands::{
    self, AddImageCommand, CreateItemCommand, ItemWeightInput, NewBid, PlaceBidCommand,
    UpdateItemCommand,
};
use item_catalog::catalog::model::{Dimension, Measurement};
use item_catalog::catalog::money::UsdConverter;
use item_catalog::catalog::units;
use item_catalog::database::DatabaseManager;
use item_catalog::error::CatalogError;
use item_catalog::handlers;
use item_catalog::query;
use item_catalog::store::{ItemStore, PostgresItemStore};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// 트레이싱 초기화
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// 데이터베이스 매니저 설정
async fn setup() -> Option<Arc<DatabaseManager>> {
    init_tracing();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL 미설정: 테스트를 건너뜁니다.");
        return None;
    };
    let db_manager = Arc::new(
        DatabaseManager::connect_url(&database_url, 5)
            .await
            .expect("데이터베이스 연결 실패"),
    );
    SCHEMA
        .get_or_init(|| async {
            db_manager.ensure_schema().await.expect("스키마 생성 실패");
        })
        .await;
    Some(db_manager)
}

fn converter() -> Arc<UsdConverter> {
    Arc::new(UsdConverter::new(HashMap::from([(
        "EUR".to_string(),
        Decimal::from_str("1.08").unwrap(),
    )])))
}

fn store(db_manager: &Arc<DatabaseManager>) -> PostgresItemStore {
    PostgresItemStore::new(Arc::clone(db_manager), converter())
}

fn chair(name: &str) -> CreateItemCommand {
    CreateItemCommand {
        name: Some(name.to_string()),
        dimension: Dimension {
            measurement: Measurement {
                name: "centimetre".to_string(),
                symbol: "cm".to_string(),
            },
            depth: Decimal::new(40, 0),
            height: Decimal::new(90, 0),
            width: Decimal::new(45, 0),
        },
        weight: ItemWeightInput::Metric(5.0),
        images: vec!["front.jpg".to_string()],
        buy_now_price: None,
        verified: false,
    }
}

fn bid(item_id: Option<i64>, amount: &str) -> PlaceBidCommand {
    PlaceBidCommand {
        bid: Some(NewBid {
            item_id,
            bidder_id: 1,
            amount: Decimal::from_str(amount).unwrap(),
        }),
    }
}

/// 삽입 시 DB 기본값 적용 테스트
#[tokio::test]
async fn test_insert_applies_database_defaults() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let loaded = commands::handle_create_item(chair("기본값 테스트 의자"), &store)
        .await
        .unwrap();

    assert_eq!(loaded.projection.initial_price().to_string(), "1.0 USD");
    assert_eq!(loaded.projection.initial_price_usd().currency, "USD");
    assert_eq!(loaded.projection.initial_price_usd().value, Decimal::ONE);
    assert_eq!(loaded.projection.number_of_bids(), 0);
    assert_eq!(loaded.projection.average_bid_amount(), None);
    assert!(!loaded.item.is_verified());
    assert!(loaded.item.images().contains("front.jpg"));
    assert!((loaded.item.metric_weight().unwrap() - 5.0).abs() < 1e-9);
}

/// 무게는 파운드로 저장되는지 테스트
#[tokio::test]
async fn test_metric_weight_stored_in_pounds() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let loaded = commands::handle_create_item(chair("무게 변환 테스트 의자"), &store)
        .await
        .unwrap();
    let item_id = loaded.item.id().unwrap();

    let imperial: f64 = sqlx::query_scalar("SELECT imperial_weight FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_one(db_manager.pool())
        .await
        .unwrap();
    assert!((imperial - units::to_imperial(5.0)).abs() < 1e-9);
}

/// 즉시 구매가의 USD 환산 저장 테스트
#[tokio::test]
async fn test_buy_now_price_usd_projection() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let mut cmd = chair("즉시 구매가 테스트 의자");
    cmd.buy_now_price = Some("20.00 EUR".parse().unwrap());
    let loaded = commands::handle_create_item(cmd, &store).await.unwrap();

    assert_eq!(
        loaded.item.buy_now_price().map(|p| p.to_string()),
        Some("20.00 EUR".to_string())
    );
    let usd = loaded.projection.buy_now_price_usd().unwrap();
    assert_eq!(usd.currency, "USD");
    assert_eq!(usd.value, Decimal::from_str("21.60").unwrap());

    let mut unknown = chair("환율 없는 통화 의자");
    unknown.buy_now_price = Some("1000 JPY".parse().unwrap());
    assert!(matches!(
        commands::handle_create_item(unknown, &store).await,
        Err(CatalogError::UnknownCurrency(_))
    ));
}

/// 입찰 집계 값 테스트
#[tokio::test]
async fn test_bid_aggregates_are_computed() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let item_id = commands::handle_create_item(chair("입찰 집계 테스트 의자"), &store)
        .await
        .unwrap()
        .item
        .id()
        .unwrap();

    let err = commands::handle_place_bid(item_id, bid(None, "10.00"), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::MissingReference(_)));

    commands::handle_place_bid(item_id, bid(Some(item_id), "10.00"), &store)
        .await
        .unwrap();
    commands::handle_place_bid(item_id, bid(Some(item_id), "20.00"), &store)
        .await
        .unwrap();

    let loaded = store.load_item(item_id).await.unwrap();
    assert_eq!(loaded.item.bid_count(), 2);
    assert_eq!(loaded.projection.number_of_bids(), 2);
    assert_eq!(
        loaded.projection.average_bid_amount(),
        Some(Decimal::from_str("15.00").unwrap())
    );

    let bids = query::handlers::get_item_bids(&db_manager, item_id)
        .await
        .unwrap();
    assert_eq!(bids.len(), 2);
    assert!(bids.iter().all(|b| b.item_id == Some(item_id)));
}

/// 최종 수정 시각은 트리거가 관리하는지 테스트
#[tokio::test]
async fn test_last_modified_maintained_by_trigger() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let loaded = commands::handle_create_item(chair("수정 시각 테스트 의자"), &store)
        .await
        .unwrap();
    let item_id = loaded.item.id().unwrap();
    let created = loaded.projection.last_modified();

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let cmd = UpdateItemCommand {
        name: Some("수정된 의자".to_string()),
        ..Default::default()
    };
    let updated = commands::handle_update_item(item_id, cmd, &store)
        .await
        .unwrap();
    assert_eq!(updated.item.name(), "수정된 의자");
    assert!(updated.projection.last_modified() > created);
}

/// 이미지 중복 추가 테스트
#[tokio::test]
async fn test_images_are_unique() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let item_id = commands::handle_create_item(chair("이미지 테스트 의자"), &store)
        .await
        .unwrap()
        .item
        .id()
        .unwrap();
    let cmd = AddImageCommand {
        file_name: Some("side.jpg".to_string()),
    };
    commands::handle_add_image(item_id, cmd.clone(), &store)
        .await
        .unwrap();
    commands::handle_add_image(item_id, cmd, &store)
        .await
        .unwrap();

    let images = query::handlers::get_item_images(&db_manager, item_id)
        .await
        .unwrap();
    assert_eq!(images, vec!["front.jpg".to_string(), "side.jpg".to_string()]);
}

/// 입찰 제거 및 상품 삭제 시 하위 행 삭제 테스트
#[tokio::test]
async fn test_delete_removes_owned_rows() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let item_id = commands::handle_create_item(chair("삭제 테스트 의자"), &store)
        .await
        .unwrap()
        .item
        .id()
        .unwrap();
    let first = commands::handle_place_bid(item_id, bid(Some(item_id), "10.00"), &store)
        .await
        .unwrap();
    commands::handle_place_bid(item_id, bid(Some(item_id), "11.00"), &store)
        .await
        .unwrap();

    commands::handle_remove_bid(item_id, first.id.unwrap(), &store)
        .await
        .unwrap();
    let remaining: i64 = sqlx::query_scalar("SELECT count(*) FROM bids WHERE item_id = $1")
        .bind(item_id)
        .fetch_one(db_manager.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 1);

    commands::handle_delete_item(item_id, &store).await.unwrap();
    for table in ["bids", "images"] {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT count(*) FROM {} WHERE item_id = $1", table))
                .bind(item_id)
                .fetch_one(db_manager.pool())
                .await
                .unwrap();
        assert_eq!(count, 0, "{} 테이블에 남은 행이 있습니다.", table);
    }
    assert!(matches!(
        store.load_item(item_id).await,
        Err(CatalogError::ItemNotFound(_))
    ));
}

/// 대용량 컬럼 저장/조회 테스트
#[tokio::test]
async fn test_large_objects() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let item_id = commands::handle_create_item(chair("대용량 컬럼 테스트 의자"), &store)
        .await
        .unwrap()
        .item
        .id()
        .unwrap();
    assert_eq!(store.load_image_blob(item_id).await.unwrap(), None);
    assert_eq!(store.load_description(item_id).await.unwrap(), None);

    let data = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a];
    commands::handle_attach_image_blob(item_id, data.clone(), &store)
        .await
        .unwrap();
    commands::handle_set_description(item_id, "참나무 의자".to_string(), &store)
        .await
        .unwrap();

    assert_eq!(store.load_image_blob(item_id).await.unwrap(), Some(data));
    assert_eq!(
        store.load_description(item_id).await.unwrap().as_deref(),
        Some("참나무 의자")
    );
    assert!(matches!(
        store.load_image_blob(i64::MAX).await,
        Err(CatalogError::ItemNotFound(_))
    ));
}

/// 컬럼 정밀도를 벗어난 숫자 입력 거부 테스트
#[tokio::test]
async fn test_numeric_input_must_fit_columns() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let item_id = commands::handle_create_item(chair("정밀도 테스트 의자"), &store)
        .await
        .unwrap()
        .item
        .id()
        .unwrap();
    for amount in ["0.004", "100000000000000000000"] {
        assert!(matches!(
            commands::handle_place_bid(item_id, bid(Some(item_id), amount), &store).await,
            Err(CatalogError::InvalidArgument(_))
        ));
    }
    let loaded = store.load_item(item_id).await.unwrap();
    assert_eq!(loaded.projection.number_of_bids(), 0);
    assert_eq!(loaded.projection.average_bid_amount(), None);

    let mut precise = chair("치수 정밀도 의자");
    precise.dimension.depth = Decimal::from_str("40.00001").unwrap();
    assert!(matches!(
        commands::handle_create_item(precise, &store).await,
        Err(CatalogError::InvalidArgument(_))
    ));

    let mut heavy = chair("무한 무게 의자");
    heavy.weight = ItemWeightInput::Metric(1e308);
    assert!(matches!(
        commands::handle_create_item(heavy, &store).await,
        Err(CatalogError::InvalidArgument(_))
    ));
}

/// 삭제된 상품에 대한 변경 저장 테스트
#[tokio::test]
async fn test_save_changes_on_deleted_item_is_not_found() {
    let Some(db_manager) = setup().await else { return };
    let store = store(&db_manager);

    let item_id = commands::handle_create_item(chair("동시 삭제 테스트 의자"), &store)
        .await
        .unwrap()
        .item
        .id()
        .unwrap();
    let mut item = store.load_item(item_id).await.unwrap().item;
    store.delete_item(item_id).await.unwrap();

    item.add_image("late.jpg").unwrap();
    assert!(matches!(
        store.save_changes(&mut item).await,
        Err(CatalogError::ItemNotFound(id)) if id == item_id
    ));
}

/// HTTP 상품 사이클 테스트
#[tokio::test]
async fn test_http_item_lifecycle() {
    let Some(db_manager) = setup().await else { return };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = handlers::routes(Arc::clone(&db_manager), converter());
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    let client = Client::new();

    // 상품 등록
    let response = client
        .post(format!("{}/items", base))
        .json(&json!({
            "name": "HTTP 테스트 의자",
            "dimension": {"name": "centimetre", "symbol": "cm", "depth": "40", "height": "90", "width": "45"},
            "weight": {"metric": 5.0}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    let item_id = created["id"].as_i64().unwrap();
    assert_eq!(created["initial_price"], "1.0 USD");

    // 빈 이미지 파일명
    let response = client
        .post(format!("{}/items/{}/images", base, item_id))
        .json(&json!({"file_name": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_ARGUMENT");

    // 상품 참조가 없는 입찰
    let response = client
        .post(format!("{}/items/{}/bids", base, item_id))
        .json(&json!({"bid": {"bidder_id": 1, "amount": "10.00"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_REFERENCE");

    // 정상 입찰
    let response = client
        .post(format!("{}/items/{}/bids", base, item_id))
        .json(&json!({"bid": {"item_id": item_id, "bidder_id": 1, "amount": "10.00"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let item: Value = client
        .get(format!("{}/items/{}", base, item_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(item["number_of_bids"], 1);

    // 삭제
    let response = client
        .delete(format!("{}/items/{}", base, item_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/items/{}", base, item_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ITEM_NOT_FOUND");
}
