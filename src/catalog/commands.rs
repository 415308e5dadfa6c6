//! 상품 관련 커맨드 처리
//! 1. 상품 등록 / 수정 / 삭제
//! 2. 이미지 추가
//! 3. 입찰 추가 / 제거
//! 4. 대용량 컬럼(이미지 BLOB, 설명) 저장
// region:    --- Imports
use super::model::{Bid, Dimension, Item, Weight};
use super::money::MonetaryAmount;
use crate::error::{CatalogError, Result};
use crate::query::projection::LoadedItem;
use crate::store::ItemStore;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 상품 무게 입력 (kg 또는 구조화된 무게 중 하나)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemWeightInput {
    Metric(f64),
    Structured(Weight),
}

/// 상품 등록 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemCommand {
    pub name: Option<String>,
    pub dimension: Dimension,
    pub weight: ItemWeightInput,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub buy_now_price: Option<MonetaryAmount>,
    #[serde(default)]
    pub verified: bool,
}

/// 상품 수정 명령 (지정된 필드만 변경)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemCommand {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub buy_now_price: Option<MonetaryAmount>,
    #[serde(default)]
    pub clear_buy_now_price: bool,
    #[serde(default)]
    pub metric_weight: Option<f64>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub dimension: Option<Dimension>,
    #[serde(default)]
    pub weight: Option<Weight>,
    #[serde(default)]
    pub clear_weight: bool,
}

/// 이미지 추가 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddImageCommand {
    pub file_name: Option<String>,
}

/// 신규 입찰
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBid {
    pub item_id: Option<i64>,
    pub bidder_id: i64,
    pub amount: Decimal,
}

/// 입찰 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidCommand {
    pub bid: Option<NewBid>,
}

/// 1. 상품 등록
pub async fn handle_create_item(
    cmd: CreateItemCommand,
    store: &impl ItemStore,
) -> Result<LoadedItem> {
    info!("{:<12} --> 상품 등록 요청 처리 시작: {:?}", "Command", cmd.name);
    let name = match cmd.name {
        Some(name) if !name.is_empty() => name,
        _ => {
            return Err(CatalogError::InvalidArgument(
                "상품 이름은 필수입니다.".to_string(),
            ))
        }
    };

    let mut item = match cmd.weight {
        ItemWeightInput::Metric(metric_weight) => Item::new(name, cmd.dimension, metric_weight),
        ItemWeightInput::Structured(weight) => Item::with_weight(name, cmd.dimension, weight),
    };
    for file_name in cmd.images {
        item.add_image(file_name)?;
    }
    if cmd.buy_now_price.is_some() {
        item.set_buy_now_price(cmd.buy_now_price);
    }
    if cmd.verified {
        item.set_verified(true);
    }

    let item_id = store.insert_item(&mut item).await?;
    store.load_item(item_id).await
}

/// 1. 상품 수정 (변경된 컬럼만 갱신)
pub async fn handle_update_item(
    item_id: i64,
    cmd: UpdateItemCommand,
    store: &impl ItemStore,
) -> Result<LoadedItem> {
    info!("{:<12} --> 상품 수정 요청 id: {}, {:?}", "Command", item_id, cmd);
    let mut item = store.load_item(item_id).await?.item;

    if let Some(name) = cmd.name {
        item.set_name(name)?;
    }
    if cmd.clear_buy_now_price {
        item.set_buy_now_price(None);
    } else if let Some(price) = cmd.buy_now_price {
        item.set_buy_now_price(Some(price));
    }
    if let Some(metric_weight) = cmd.metric_weight {
        item.set_metric_weight(metric_weight)?;
    }
    if let Some(verified) = cmd.verified {
        item.set_verified(verified);
    }
    if let Some(dimension) = cmd.dimension {
        item.set_dimension(dimension);
    }
    if cmd.clear_weight {
        item.set_weight(None);
    } else if let Some(weight) = cmd.weight {
        item.set_weight(Some(weight));
    }

    store.save_changes(&mut item).await?;
    store.load_item(item_id).await
}

/// 1. 상품 삭제 (입찰, 이미지 포함)
pub async fn handle_delete_item(item_id: i64, store: &impl ItemStore) -> Result<()> {
    info!("{:<12} --> 상품 삭제 요청 id: {}", "Command", item_id);
    store.delete_item(item_id).await
}

/// 2. 이미지 추가
pub async fn handle_add_image(
    item_id: i64,
    cmd: AddImageCommand,
    store: &impl ItemStore,
) -> Result<BTreeSet<String>> {
    info!("{:<12} --> 이미지 추가 요청 id: {}, {:?}", "Command", item_id, cmd);
    let Some(file_name) = cmd.file_name else {
        return Err(CatalogError::InvalidArgument(
            "이미지 파일명이 없습니다.".to_string(),
        ));
    };

    let mut item = store.load_item(item_id).await?.item;
    item.add_image(file_name)?;
    store.save_changes(&mut item).await?;
    Ok(item.images().clone())
}

/// 3. 입찰 추가
pub async fn handle_place_bid(
    item_id: i64,
    cmd: PlaceBidCommand,
    store: &impl ItemStore,
) -> Result<Bid> {
    info!("{:<12} --> 입찰 요청 처리 시작 id: {}, {:?}", "Command", item_id, cmd);
    let Some(new_bid) = cmd.bid else {
        return Err(CatalogError::InvalidArgument(
            "입찰 정보가 없습니다.".to_string(),
        ));
    };
    if new_bid.amount <= Decimal::ZERO {
        return Err(CatalogError::InvalidArgument(format!(
            "입찰 금액은 0보다 커야 합니다: {}",
            new_bid.amount
        )));
    }

    let mut item = store.load_item(item_id).await?.item;
    let bid = Bid {
        id: None,
        item_id: new_bid.item_id,
        bidder_id: new_bid.bidder_id,
        amount: new_bid.amount,
        bid_time: Utc::now(),
    };
    if let Err(e) = item.add_bid(bid.clone()) {
        warn!("{:<12} --> 입찰 거부 id: {}, {}", "Command", item_id, e);
        return Err(e);
    }
    store.save_changes(&mut item).await?;

    let saved = item
        .bids()
        .find(|b| b.id.is_some() && Bid { id: None, ..(*b).clone() } == bid)
        .cloned()
        .unwrap_or(bid);
    Ok(saved)
}

/// 3. 입찰 제거 (고아 입찰 삭제)
pub async fn handle_remove_bid(item_id: i64, bid_id: i64, store: &impl ItemStore) -> Result<Bid> {
    info!("{:<12} --> 입찰 제거 요청 id: {}, bid: {}", "Command", item_id, bid_id);
    let mut item = store.load_item(item_id).await?.item;
    let removed = item.remove_bid(bid_id)?;
    store.save_changes(&mut item).await?;
    Ok(removed)
}

/// 4. 이미지 BLOB 저장
pub async fn handle_attach_image_blob(
    item_id: i64,
    data: Vec<u8>,
    store: &impl ItemStore,
) -> Result<()> {
    info!(
        "{:<12} --> 이미지 BLOB 저장 id: {}, {} bytes",
        "Command",
        item_id,
        data.len()
    );
    if data.is_empty() {
        return Err(CatalogError::InvalidArgument(
            "이미지 데이터가 비어 있습니다.".to_string(),
        ));
    }
    store.store_image_blob(item_id, data).await
}

/// 4. 설명 저장
pub async fn handle_set_description(
    item_id: i64,
    description: String,
    store: &impl ItemStore,
) -> Result<()> {
    info!("{:<12} --> 설명 저장 id: {}", "Command", item_id);
    store.store_description(item_id, description).await
}
// endregion: --- Commands
