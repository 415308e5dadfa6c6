// region:    --- Imports
use super::projection::{ItemRow, LoadedItem};
use super::queries;
use crate::catalog::model::Bid;
use crate::database::DatabaseManager;
use crate::error::{CatalogError, Result};
use sqlx::Row;
use std::collections::HashMap;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 상품 조회 (이미지, 입찰 포함)
pub async fn get_item(db_manager: &DatabaseManager, item_id: i64) -> Result<LoadedItem> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let row = sqlx::query_as::<_, ItemRow>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(CatalogError::ItemNotFound(item_id))?;

                let images = sqlx::query_scalar::<_, String>(queries::GET_ITEM_IMAGES)
                    .bind(item_id)
                    .fetch_all(&mut **tx)
                    .await?;

                let bids = sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
                    .bind(item_id)
                    .fetch_all(&mut **tx)
                    .await?;

                row.into_loaded(images, bids)
            })
        })
        .await
}

/// 모든 상품 조회
pub async fn get_all_items(db_manager: &DatabaseManager) -> Result<Vec<LoadedItem>> {
    info!("{:<12} --> 모든 상품 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let rows = sqlx::query_as::<_, ItemRow>(queries::GET_ALL_ITEMS)
                    .fetch_all(&mut **tx)
                    .await?;

                let mut images: HashMap<i64, Vec<String>> = HashMap::new();
                for row in sqlx::query(queries::GET_ALL_IMAGES)
                    .fetch_all(&mut **tx)
                    .await?
                {
                    images
                        .entry(row.try_get("item_id")?)
                        .or_default()
                        .push(row.try_get("file_name")?);
                }

                let mut bids: HashMap<i64, Vec<Bid>> = HashMap::new();
                for bid in sqlx::query_as::<_, Bid>(queries::GET_ALL_BIDS)
                    .fetch_all(&mut **tx)
                    .await?
                {
                    if let Some(item_id) = bid.item_id {
                        bids.entry(item_id).or_default().push(bid);
                    }
                }

                rows.into_iter()
                    .map(|row| {
                        let id = row.id;
                        row.into_loaded(
                            images.remove(&id).unwrap_or_default(),
                            bids.remove(&id).unwrap_or_default(),
                        )
                    })
                    .collect()
            })
        })
        .await
}

/// 상품 입찰 조회
pub async fn get_item_bids(db_manager: &DatabaseManager, item_id: i64) -> Result<Vec<Bid>> {
    info!("{:<12} --> 상품 입찰 조회 id: {}", "Query", item_id);
    ensure_item_exists(db_manager, item_id).await?;
    let bids = sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
        .bind(item_id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(bids)
}

/// 상품 이미지 조회
pub async fn get_item_images(db_manager: &DatabaseManager, item_id: i64) -> Result<Vec<String>> {
    info!("{:<12} --> 상품 이미지 조회 id: {}", "Query", item_id);
    ensure_item_exists(db_manager, item_id).await?;
    let images = sqlx::query_scalar::<_, String>(queries::GET_ITEM_IMAGES)
        .bind(item_id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(images)
}

/// 이미지 BLOB 조회
/// 대용량 컬럼은 상품 조회 시 로드하지 않고, 요청 시점에 연결을 통해 읽는다.
pub async fn get_image_blob(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<Vec<u8>>> {
    info!("{:<12} --> 이미지 BLOB 조회 id: {}", "Query", item_id);
    sqlx::query_scalar::<_, Option<Vec<u8>>>(queries::GET_IMAGE_BLOB)
        .bind(item_id)
        .fetch_optional(db_manager.pool())
        .await?
        .ok_or(CatalogError::ItemNotFound(item_id))
}

/// 설명 CLOB 조회
pub async fn get_description(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<String>> {
    info!("{:<12} --> 설명 CLOB 조회 id: {}", "Query", item_id);
    sqlx::query_scalar::<_, Option<String>>(queries::GET_DESCRIPTION)
        .bind(item_id)
        .fetch_optional(db_manager.pool())
        .await?
        .ok_or(CatalogError::ItemNotFound(item_id))
}

async fn ensure_item_exists(db_manager: &DatabaseManager, item_id: i64) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM items WHERE id = $1)")
        .bind(item_id)
        .fetch_one(db_manager.pool())
        .await?;
    if exists {
        Ok(())
    } else {
        Err(CatalogError::ItemNotFound(item_id))
    }
}

// endregion: --- Query Handlers
