// region:    --- Imports
use super::money::MonetaryAmount;
use super::units;
use crate::error::{CatalogError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
// endregion: --- Imports

// region:    --- Embeddables
/// 측정 단위 (이름 + 기호)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub symbol: String,
}

/// 무게 (weight_name, weight_symbol, weight_value 컬럼)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weight {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub value: Decimal,
}

impl Weight {
    /// 단위 기호를 알 수 있는 경우 kg 으로 환산
    pub fn in_kilograms(&self) -> Option<f64> {
        let per_kilogram = units::units_per_kilogram(&self.measurement.symbol)?;
        Some(self.value.to_f64()? / per_kilogram)
    }
}

/// 치수 (dimension_name, dimension_symbol, depth, height, width 컬럼)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub depth: Decimal,
    pub height: Decimal,
    pub width: Decimal,
}
// endregion: --- Embeddables

// region:    --- Bid
/// 입찰 모델
/// 상품(item_id)을 참조해야만 상품에 추가할 수 있다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Option<i64>,
    pub item_id: Option<i64>,
    pub bidder_id: i64,
    pub amount: Decimal,
    pub bid_time: DateTime<Utc>,
}

impl Bid {
    /// 상품에 연결된 새 입찰 생성
    pub fn new(item: &Item, bidder_id: i64, amount: Decimal) -> Self {
        Self {
            id: None,
            item_id: item.id,
            bidder_id,
            amount,
            bid_time: Utc::now(),
        }
    }
}
// endregion: --- Bid

// region:    --- Item
/// 동적 UPDATE 대상 컬럼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemColumn {
    Name,
    BuyNowPrice,
    Verified,
    MetricWeight,
    Dimension,
    Weight,
}

/// 상품 애그리거트
/// 입찰(bids)과 이미지(images)는 상품을 통해서만 변경된다.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub(crate) id: Option<i64>,
    pub(crate) name: String,
    pub(crate) buy_now_price: Option<MonetaryAmount>,
    pub(crate) verified: bool,
    pub(crate) metric_weight: Option<f64>,
    pub(crate) dimension: Dimension,
    pub(crate) weight: Option<Weight>,
    pub(crate) images: BTreeSet<String>,
    #[serde(skip)]
    pub(crate) bids: HashSet<Bid>,
    #[serde(skip)]
    pub(crate) dirty: BTreeSet<ItemColumn>,
    #[serde(skip)]
    pub(crate) pending_images: BTreeSet<String>,
    #[serde(skip)]
    pub(crate) removed_bids: Vec<i64>,
}

impl Item {
    /// kg 무게로 상품 생성
    pub fn new(name: impl Into<String>, dimension: Dimension, metric_weight: f64) -> Self {
        Self::build(name.into(), dimension, Some(metric_weight), None)
    }

    /// 구조화된 무게로 상품 생성
    pub fn with_weight(name: impl Into<String>, dimension: Dimension, weight: Weight) -> Self {
        let metric_weight = weight.in_kilograms();
        Self::build(name.into(), dimension, metric_weight, Some(weight))
    }

    fn build(
        name: String,
        dimension: Dimension,
        metric_weight: Option<f64>,
        weight: Option<Weight>,
    ) -> Self {
        Self {
            id: None,
            name,
            buy_now_price: None,
            verified: false,
            metric_weight,
            dimension,
            weight,
            images: BTreeSet::new(),
            bids: HashSet::new(),
            dirty: BTreeSet::new(),
            pending_images: BTreeSet::new(),
            removed_bids: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buy_now_price(&self) -> Option<&MonetaryAmount> {
        self.buy_now_price.as_ref()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn metric_weight(&self) -> Option<f64> {
        self.metric_weight
    }

    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }

    pub fn weight(&self) -> Option<&Weight> {
        self.weight.as_ref()
    }

    pub fn images(&self) -> &BTreeSet<String> {
        &self.images
    }

    pub fn bids(&self) -> impl Iterator<Item = &Bid> {
        self.bids.iter()
    }

    pub fn bid_count(&self) -> usize {
        self.bids.len()
    }

    pub fn contains_bid(&self, bid: &Bid) -> bool {
        self.bids.contains(bid)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "상품 이름은 비어 있을 수 없습니다.".to_string(),
            ));
        }
        self.name = name;
        self.dirty.insert(ItemColumn::Name);
        Ok(())
    }

    pub fn set_buy_now_price(&mut self, price: Option<MonetaryAmount>) {
        self.buy_now_price = price;
        self.dirty.insert(ItemColumn::BuyNowPrice);
    }

    pub fn set_verified(&mut self, verified: bool) {
        self.verified = verified;
        self.dirty.insert(ItemColumn::Verified);
    }

    pub fn set_metric_weight(&mut self, metric_weight: f64) -> Result<()> {
        check_weight(metric_weight)?;
        self.metric_weight = Some(metric_weight);
        self.dirty.insert(ItemColumn::MetricWeight);
        Ok(())
    }

    pub fn set_dimension(&mut self, dimension: Dimension) {
        self.dimension = dimension;
        self.dirty.insert(ItemColumn::Dimension);
    }

    pub fn set_weight(&mut self, weight: Option<Weight>) {
        self.weight = weight;
        self.dirty.insert(ItemColumn::Weight);
    }

    /// 이미지 파일명 추가 (중복은 무시)
    pub fn add_image(&mut self, file_name: impl Into<String>) -> Result<()> {
        let file_name = file_name.into();
        if file_name.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "이미지 파일명이 비어 있습니다.".to_string(),
            ));
        }
        if self.images.insert(file_name.clone()) {
            self.pending_images.insert(file_name);
        }
        Ok(())
    }

    /// 입찰 추가
    /// 입찰이 이 상품을 참조하지 않으면 거부한다.
    pub fn add_bid(&mut self, bid: Bid) -> Result<()> {
        let Some(item_id) = bid.item_id else {
            return Err(CatalogError::MissingReference(
                "입찰이 상품을 참조하지 않습니다.".to_string(),
            ));
        };
        if self.id != Some(item_id) {
            return Err(CatalogError::InvalidArgument(format!(
                "입찰이 다른 상품({})을 참조합니다.",
                item_id
            )));
        }
        check_numeric("입찰 금액", bid.amount, AMOUNT_SCALE)?;
        self.bids.insert(bid);
        Ok(())
    }

    /// 입찰 제거 (고아 입찰은 저장 시 삭제)
    pub fn remove_bid(&mut self, bid_id: i64) -> Result<Bid> {
        let bid = self
            .bids
            .iter()
            .find(|b| b.id == Some(bid_id))
            .cloned()
            .ok_or(CatalogError::BidNotFound(bid_id))?;
        self.bids.remove(&bid);
        self.removed_bids.push(bid_id);
        Ok(bid)
    }

    /// 저장 전 검증
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "상품 이름은 필수입니다.".to_string(),
            ));
        }
        match self.metric_weight {
            Some(weight) => check_weight(weight)?,
            None => {
                return Err(CatalogError::InvalidArgument(
                    "상품 무게(kg)는 필수입니다.".to_string(),
                ))
            }
        }
        check_numeric("깊이", self.dimension.depth, MEASURE_SCALE)?;
        check_numeric("높이", self.dimension.height, MEASURE_SCALE)?;
        check_numeric("너비", self.dimension.width, MEASURE_SCALE)?;
        if let Some(weight) = &self.weight {
            check_numeric("무게 값", weight.value, MEASURE_SCALE)?;
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
            || !self.pending_images.is_empty()
            || !self.removed_bids.is_empty()
            || self.bids.iter().any(|b| b.id.is_none())
    }

    pub(crate) fn dirty_columns(&self) -> &BTreeSet<ItemColumn> {
        &self.dirty
    }

    /// 아직 저장되지 않은 입찰
    pub(crate) fn unsaved_bids(&self) -> Vec<Bid> {
        self.bids.iter().filter(|b| b.id.is_none()).cloned().collect()
    }

    /// 저장된 입찰에 id 반영
    pub(crate) fn confirm_bid(&mut self, unsaved: &Bid, id: i64) {
        if self.bids.remove(unsaved) {
            self.bids.insert(Bid {
                id: Some(id),
                ..unsaved.clone()
            });
        }
    }

    /// 저장 완료 후 변경 추적 초기화
    pub(crate) fn mark_clean(&mut self) {
        self.dirty.clear();
        self.pending_images.clear();
        self.removed_bids.clear();
    }
}

/// 파운드로 환산한 값도 유한해야 imperial_weight 컬럼에 저장할 수 있다.
fn check_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 || !units::to_imperial(weight).is_finite() {
        return Err(CatalogError::InvalidArgument(format!(
            "무게는 0 이상의 유한한 값이어야 합니다: {}",
            weight
        )));
    }
    Ok(())
}

/// 금액 컬럼 NUMERIC(19, 2)
pub(crate) const AMOUNT_SCALE: u32 = 2;
/// 치수, 무게 컬럼 NUMERIC(19, 4)
pub(crate) const MEASURE_SCALE: u32 = 4;
const NUMERIC_PRECISION: u32 = 19;

/// NUMERIC(19, scale) 컬럼에 반올림 없이 저장할 수 있는 값인지 확인
pub(crate) fn check_numeric(field: &str, value: Decimal, scale: u32) -> Result<()> {
    let limit = Decimal::from(10u64.pow(NUMERIC_PRECISION - scale));
    if value.normalize().scale() > scale || value.abs() >= limit {
        return Err(CatalogError::InvalidArgument(format!(
            "{} 값은 소수점 {}자리 이하, {} 미만이어야 합니다: {}",
            field, scale, limit, value
        )));
    }
    Ok(())
}
// endregion: --- Item
