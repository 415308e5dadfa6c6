//! 조회 모델
//! DB 가 생성/계산하는 값(초기 가격, 최종 수정 시각, 평균 입찰가, 입찰 수)은
//! 애그리거트 필드가 아닌 읽기 전용 프로젝션으로 분리한다.

// region:    --- Imports
use crate::catalog::model::{Bid, Dimension, Item, Measurement, Weight};
use crate::catalog::money::MonetaryAmount;
use crate::catalog::units;
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
// endregion: --- Imports

// region:    --- Projection
/// DB 가 관리하는 읽기 전용 값
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemProjection {
    pub(crate) initial_price: MonetaryAmount,
    pub(crate) initial_price_usd: MonetaryAmount,
    pub(crate) buy_now_price_usd: Option<MonetaryAmount>,
    pub(crate) last_modified: DateTime<Utc>,
    pub(crate) average_bid_amount: Option<Decimal>,
    pub(crate) number_of_bids: i64,
}

impl ItemProjection {
    pub fn initial_price(&self) -> &MonetaryAmount {
        &self.initial_price
    }

    pub fn initial_price_usd(&self) -> &MonetaryAmount {
        &self.initial_price_usd
    }

    pub fn buy_now_price_usd(&self) -> Option<&MonetaryAmount> {
        self.buy_now_price_usd.as_ref()
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn average_bid_amount(&self) -> Option<Decimal> {
        self.average_bid_amount
    }

    pub fn number_of_bids(&self) -> i64 {
        self.number_of_bids
    }
}

/// 애그리거트 + 프로젝션
#[derive(Debug, Clone, Serialize)]
pub struct LoadedItem {
    #[serde(flatten)]
    pub item: Item,
    #[serde(flatten)]
    pub projection: ItemProjection,
}
// endregion: --- Projection

// region:    --- Row Mapping
/// items 테이블 행
#[derive(Debug, sqlx::FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub name: String,
    pub initial_price: String,
    pub initialprice_amount: Decimal,
    pub initialprice_currency: String,
    pub buy_now_price: Option<String>,
    pub buynowprice_amount: Option<Decimal>,
    pub buynowprice_currency: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub verified: bool,
    pub imperial_weight: f64,
    pub dimension_name: String,
    pub dimension_symbol: String,
    pub depth: Decimal,
    pub height: Decimal,
    pub width: Decimal,
    pub weight_name: Option<String>,
    pub weight_symbol: Option<String>,
    pub weight_value: Option<Decimal>,
    pub average_bid_amount: Option<Decimal>,
    pub number_of_bids: i64,
}

impl ItemRow {
    /// 행 -> 도메인 변환 (파운드 -> kg, 문자열 -> 금액)
    pub fn into_loaded(self, images: Vec<String>, bids: Vec<Bid>) -> Result<LoadedItem> {
        let buy_now_price = self
            .buy_now_price
            .as_deref()
            .map(str::parse::<MonetaryAmount>)
            .transpose()?;
        let buy_now_price_usd = match (self.buynowprice_amount, self.buynowprice_currency) {
            (Some(amount), Some(currency)) => Some(MonetaryAmount::new(amount, &currency)?),
            _ => None,
        };
        let weight = self.weight_value.map(|value| Weight {
            measurement: Measurement {
                name: self.weight_name.unwrap_or_default(),
                symbol: self.weight_symbol.unwrap_or_default(),
            },
            value,
        });

        let item = Item {
            id: Some(self.id),
            name: self.name,
            buy_now_price,
            verified: self.verified,
            metric_weight: Some(units::to_metric(self.imperial_weight)),
            dimension: Dimension {
                measurement: Measurement {
                    name: self.dimension_name,
                    symbol: self.dimension_symbol,
                },
                depth: self.depth,
                height: self.height,
                width: self.width,
            },
            weight,
            images: images.into_iter().collect::<BTreeSet<_>>(),
            bids: bids.into_iter().collect::<HashSet<_>>(),
            dirty: BTreeSet::new(),
            pending_images: BTreeSet::new(),
            removed_bids: Vec::new(),
        };

        let projection = ItemProjection {
            initial_price: self.initial_price.parse()?,
            initial_price_usd: MonetaryAmount::new(
                self.initialprice_amount,
                &self.initialprice_currency,
            )?,
            buy_now_price_usd,
            last_modified: self.last_modified,
            average_bid_amount: self.average_bid_amount,
            number_of_bids: self.number_of_bids,
        };

        Ok(LoadedItem { item, projection })
    }
}
// endregion: --- Row Mapping

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use std::str::FromStr;

    fn row() -> ItemRow {
        ItemRow {
            id: 3,
            name: "Chair".to_string(),
            initial_price: "1.0 USD".to_string(),
            initialprice_amount: Decimal::from_str("1.00").unwrap(),
            initialprice_currency: "USD".to_string(),
            buy_now_price: Some("20.00 EUR".to_string()),
            buynowprice_amount: Some(Decimal::from_str("21.60").unwrap()),
            buynowprice_currency: Some("USD".to_string()),
            last_modified: Utc::now(),
            verified: false,
            imperial_weight: units::to_imperial(5.0),
            dimension_name: "centimetre".to_string(),
            dimension_symbol: "cm".to_string(),
            depth: Decimal::new(40, 0),
            height: Decimal::new(90, 0),
            width: Decimal::new(45, 0),
            weight_name: None,
            weight_symbol: None,
            weight_value: None,
            average_bid_amount: Some(Decimal::from_str("11.25").unwrap()),
            number_of_bids: 2,
        }
    }

    #[test]
    fn row_maps_to_aggregate_and_projection() {
        let bid = Bid {
            id: Some(1),
            item_id: Some(3),
            bidder_id: 9,
            amount: Decimal::new(10, 0),
            bid_time: Utc::now(),
        };
        let loaded = row()
            .into_loaded(vec!["a.jpg".to_string()], vec![bid.clone()])
            .unwrap();

        let item = &loaded.item;
        assert_eq!(item.id(), Some(3));
        assert!((item.metric_weight().unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(item.buy_now_price().unwrap().to_string(), "20.00 EUR");
        assert!(item.weight().is_none());
        assert!(item.images().contains("a.jpg"));
        assert!(item.contains_bid(&bid));
        assert!(!item.is_dirty());

        let projection = &loaded.projection;
        assert_eq!(projection.initial_price().to_string(), "1.0 USD");
        assert_eq!(projection.buy_now_price_usd().unwrap().currency, "USD");
        assert_eq!(projection.number_of_bids(), 2);
        assert_eq!(
            projection.average_bid_amount(),
            Some(Decimal::from_str("11.25").unwrap())
        );
    }

    #[test]
    fn embedded_weight_is_restored() {
        let mut row = row();
        row.weight_name = Some("kilogram".to_string());
        row.weight_symbol = Some("kg".to_string());
        row.weight_value = Some(Decimal::new(5, 0));
        let loaded = row.into_loaded(Vec::new(), Vec::new()).unwrap();
        let weight = loaded.item.weight().unwrap();
        assert_eq!(weight.measurement.symbol, "kg");
        assert_eq!(weight.value, Decimal::new(5, 0));
    }

    #[test]
    fn corrupt_price_column_is_reported() {
        let mut row = row();
        row.initial_price = "one dollar".to_string();
        assert!(matches!(
            row.into_loaded(Vec::new(), Vec::new()),
            Err(CatalogError::InvalidMonetaryAmount(_))
        ));
    }

    #[test]
    fn serialized_item_includes_projection() {
        let loaded = row().into_loaded(Vec::new(), Vec::new()).unwrap();
        let json = serde_json::to_value(&loaded).unwrap();
        assert_eq!(json["name"], "Chair");
        assert_eq!(json["initial_price"], "1.0 USD");
        assert_eq!(json["number_of_bids"], 2);
    }
}
