// region:    --- Imports
use crate::catalog::model::{self, Bid, Item, ItemColumn};
use crate::catalog::money::UsdConverter;
use crate::catalog::units;
use crate::database::DatabaseManager;
use crate::error::{CatalogError, Result};
use crate::query::handlers as query_handlers;
use crate::query::projection::LoadedItem;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Item Store Trait
/// 상품 애그리거트 저장소
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// 신규 상품 저장 후 id 반환
    async fn insert_item(&self, item: &mut Item) -> Result<i64>;

    async fn load_item(&self, item_id: i64) -> Result<LoadedItem>;

    /// 변경된 컬럼, 추가된 이미지, 추가/제거된 입찰 반영
    async fn save_changes(&self, item: &mut Item) -> Result<()>;

    /// 상품과 소유한 입찰, 이미지 삭제
    async fn delete_item(&self, item_id: i64) -> Result<()>;

    async fn store_image_blob(&self, item_id: i64, data: Vec<u8>) -> Result<()>;

    async fn load_image_blob(&self, item_id: i64) -> Result<Option<Vec<u8>>>;

    async fn store_description(&self, item_id: i64, description: String) -> Result<()>;

    async fn load_description(&self, item_id: i64) -> Result<Option<String>>;
}
// endregion: --- Item Store Trait

// region:    --- Column Values
/// 동적 INSERT/UPDATE 에 사용하는 컬럼 값
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ColumnValue {
    Text(Option<String>),
    Number(Option<Decimal>),
    Float(f64),
    Bool(bool),
}

impl ColumnValue {
    fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Text(None) | ColumnValue::Number(None))
    }

    fn push_bind(self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            ColumnValue::Text(v) => qb.push_bind(v),
            ColumnValue::Number(v) => qb.push_bind(v),
            ColumnValue::Float(v) => qb.push_bind(v),
            ColumnValue::Bool(v) => qb.push_bind(v),
        };
    }
}

/// 컬럼별 저장 값
fn column_values(
    item: &Item,
    column: ItemColumn,
    converter: &UsdConverter,
) -> Result<Vec<(&'static str, ColumnValue)>> {
    let values = match column {
        ItemColumn::Name => vec![("name", ColumnValue::Text(Some(item.name.clone())))],
        ItemColumn::BuyNowPrice => {
            let usd = item
                .buy_now_price
                .as_ref()
                .map(|price| converter.to_usd(price))
                .transpose()?;
            if let Some(usd) = &usd {
                model::check_numeric("즉시 구매가(USD)", usd.value, model::AMOUNT_SCALE)?;
            }
            vec![
                (
                    "buy_now_price",
                    ColumnValue::Text(item.buy_now_price.as_ref().map(|p| p.to_string())),
                ),
                (
                    "buynowprice_amount",
                    ColumnValue::Number(usd.as_ref().map(|p| p.value)),
                ),
                (
                    "buynowprice_currency",
                    ColumnValue::Text(usd.map(|p| p.currency)),
                ),
            ]
        }
        ItemColumn::Verified => vec![("verified", ColumnValue::Bool(item.verified))],
        ItemColumn::MetricWeight => {
            let metric_weight = item.metric_weight.ok_or_else(|| {
                CatalogError::InvalidArgument("상품 무게(kg)는 필수입니다.".to_string())
            })?;
            vec![(
                "imperial_weight",
                ColumnValue::Float(units::to_imperial(metric_weight)),
            )]
        }
        ItemColumn::Dimension => {
            let dimension = &item.dimension;
            vec![
                (
                    "dimension_name",
                    ColumnValue::Text(Some(dimension.measurement.name.clone())),
                ),
                (
                    "dimension_symbol",
                    ColumnValue::Text(Some(dimension.measurement.symbol.clone())),
                ),
                ("depth", ColumnValue::Number(Some(dimension.depth))),
                ("height", ColumnValue::Number(Some(dimension.height))),
                ("width", ColumnValue::Number(Some(dimension.width))),
            ]
        }
        ItemColumn::Weight => {
            let weight = item.weight.as_ref();
            vec![
                (
                    "weight_name",
                    ColumnValue::Text(weight.map(|w| w.measurement.name.clone())),
                ),
                (
                    "weight_symbol",
                    ColumnValue::Text(weight.map(|w| w.measurement.symbol.clone())),
                ),
                ("weight_value", ColumnValue::Number(weight.map(|w| w.value))),
            ]
        }
    };
    Ok(values)
}

/// 동적 INSERT 컬럼
/// 값이 없는 컬럼과 기본값과 같은 verified 는 제외하여 DB 기본값이 적용되게 한다.
/// initial_price, last_modified 는 애플리케이션에서 쓰지 않는다.
pub(crate) fn insert_columns(
    item: &Item,
    converter: &UsdConverter,
) -> Result<Vec<(&'static str, ColumnValue)>> {
    let mut columns = Vec::new();
    for column in [
        ItemColumn::Name,
        ItemColumn::MetricWeight,
        ItemColumn::Dimension,
        ItemColumn::Weight,
        ItemColumn::BuyNowPrice,
    ] {
        columns.extend(column_values(item, column, converter)?);
    }
    if item.verified {
        columns.push(("verified", ColumnValue::Bool(true)));
    }
    columns.retain(|(_, value)| !value.is_null());
    Ok(columns)
}

/// 동적 UPDATE 컬럼 (변경된 컬럼만)
pub(crate) fn update_columns(
    item: &Item,
    converter: &UsdConverter,
) -> Result<Vec<(&'static str, ColumnValue)>> {
    let mut columns = Vec::new();
    for column in item.dirty_columns() {
        columns.extend(column_values(item, *column, converter)?);
    }
    Ok(columns)
}

fn build_insert(columns: Vec<(&'static str, ColumnValue)>) -> QueryBuilder<'static, Postgres> {
    let names = columns
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
    let mut qb = QueryBuilder::new(format!("INSERT INTO items ({}) VALUES (", names));
    for (i, (_, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        value.push_bind(&mut qb);
    }
    qb.push(") RETURNING id");
    qb
}

fn build_update(
    item_id: i64,
    columns: Vec<(&'static str, ColumnValue)>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE items SET ");
    for (i, (name, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(name).push(" = ");
        value.push_bind(&mut qb);
    }
    qb.push(" WHERE id = ").push_bind(item_id);
    qb
}
// endregion: --- Column Values

// region:    --- Postgres Item Store
/// 상품 저장소 구현체
pub struct PostgresItemStore {
    db_manager: Arc<DatabaseManager>,
    converter: Arc<UsdConverter>,
}

impl PostgresItemStore {
    pub fn new(db_manager: Arc<DatabaseManager>, converter: Arc<UsdConverter>) -> Self {
        Self {
            db_manager,
            converter,
        }
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn insert_item(&self, item: &mut Item) -> Result<i64> {
        if let Some(id) = item.id {
            return Err(CatalogError::InvalidArgument(format!(
                "이미 저장된 상품입니다. id: {}",
                id
            )));
        }
        item.validate()?;

        let columns = insert_columns(item, &self.converter)?;
        let images: Vec<String> = item.images.iter().cloned().collect();

        let item_id = self
            .db_manager
            .transaction::<_, i64, CatalogError>(|tx| {
                Box::pin(async move {
                    let mut qb = build_insert(columns);
                    let item_id: i64 = qb.build_query_scalar().fetch_one(&mut **tx).await?;

                    for file_name in &images {
                        sqlx::query(
                            "INSERT INTO images (item_id, file_name) VALUES ($1, $2)
                             ON CONFLICT DO NOTHING",
                        )
                        .bind(item_id)
                        .bind(file_name)
                        .execute(&mut **tx)
                        .await?;
                    }
                    Ok(item_id)
                })
            })
            .await?;

        item.id = Some(item_id);
        item.mark_clean();
        info!("{:<12} --> 상품 저장 완료 id: {}", "Store", item_id);
        Ok(item_id)
    }

    async fn load_item(&self, item_id: i64) -> Result<LoadedItem> {
        query_handlers::get_item(&self.db_manager, item_id).await
    }

    async fn save_changes(&self, item: &mut Item) -> Result<()> {
        let item_id = item.id.ok_or_else(|| {
            CatalogError::MissingReference("저장되지 않은 상품은 갱신할 수 없습니다.".to_string())
        })?;
        if !item.is_dirty() {
            debug!("{:<12} --> 변경 사항 없음 id: {}", "Store", item_id);
            return Ok(());
        }
        item.validate()?;

        let columns = update_columns(item, &self.converter)?;
        let pending_images: Vec<String> = item.pending_images.iter().cloned().collect();
        let removed_bids = item.removed_bids.clone();
        let unsaved_bids = item.unsaved_bids();

        let confirmed = self
            .db_manager
            .transaction::<_, Vec<(Bid, i64)>, CatalogError>(|tx| {
                Box::pin(async move {
                    // 동시 삭제 시 자식 행 삽입이 외래 키 오류가 되지 않도록 먼저 상품 행을 잠근다.
                    sqlx::query_scalar::<_, i64>("SELECT id FROM items WHERE id = $1 FOR UPDATE")
                        .bind(item_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(CatalogError::ItemNotFound(item_id))?;

                    if !columns.is_empty() {
                        let mut qb = build_update(item_id, columns);
                        let result = qb.build().execute(&mut **tx).await?;
                        if result.rows_affected() == 0 {
                            return Err(CatalogError::ItemNotFound(item_id));
                        }
                    }

                    for file_name in &pending_images {
                        sqlx::query(
                            "INSERT INTO images (item_id, file_name) VALUES ($1, $2)
                             ON CONFLICT DO NOTHING",
                        )
                        .bind(item_id)
                        .bind(file_name)
                        .execute(&mut **tx)
                        .await?;
                    }

                    if !removed_bids.is_empty() {
                        sqlx::query("DELETE FROM bids WHERE item_id = $1 AND id = ANY($2)")
                            .bind(item_id)
                            .bind(&removed_bids)
                            .execute(&mut **tx)
                            .await?;
                    }

                    let mut confirmed = Vec::with_capacity(unsaved_bids.len());
                    for bid in unsaved_bids {
                        let bid_id: i64 = sqlx::query_scalar(
                            "INSERT INTO bids (item_id, bidder_id, amount, bid_time)
                             VALUES ($1, $2, $3, $4) RETURNING id",
                        )
                        .bind(item_id)
                        .bind(bid.bidder_id)
                        .bind(bid.amount)
                        .bind(bid.bid_time)
                        .fetch_one(&mut **tx)
                        .await?;
                        confirmed.push((bid, bid_id));
                    }
                    Ok(confirmed)
                })
            })
            .await?;

        for (bid, bid_id) in &confirmed {
            item.confirm_bid(bid, *bid_id);
        }
        item.mark_clean();
        info!(
            "{:<12} --> 상품 변경 저장 id: {}, 신규 입찰: {}",
            "Store",
            item_id,
            confirmed.len()
        );
        Ok(())
    }

    async fn delete_item(&self, item_id: i64) -> Result<()> {
        let (bids, images) = self
            .db_manager
            .transaction::<_, (u64, u64), CatalogError>(|tx| {
                Box::pin(async move {
                    let bids = sqlx::query("DELETE FROM bids WHERE item_id = $1")
                        .bind(item_id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    let images = sqlx::query("DELETE FROM images WHERE item_id = $1")
                        .bind(item_id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    let deleted = sqlx::query("DELETE FROM items WHERE id = $1")
                        .bind(item_id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    if deleted == 0 {
                        return Err(CatalogError::ItemNotFound(item_id));
                    }
                    Ok((bids, images))
                })
            })
            .await?;

        info!(
            "{:<12} --> 상품 삭제 id: {}, 입찰: {}, 이미지: {}",
            "Store", item_id, bids, images
        );
        Ok(())
    }

    async fn store_image_blob(&self, item_id: i64, data: Vec<u8>) -> Result<()> {
        let result = sqlx::query("UPDATE items SET image_blob = $1 WHERE id = $2")
            .bind(data)
            .bind(item_id)
            .execute(self.db_manager.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::ItemNotFound(item_id));
        }
        Ok(())
    }

    async fn load_image_blob(&self, item_id: i64) -> Result<Option<Vec<u8>>> {
        query_handlers::get_image_blob(&self.db_manager, item_id).await
    }

    async fn store_description(&self, item_id: i64, description: String) -> Result<()> {
        let result = sqlx::query("UPDATE items SET description_clob = $1 WHERE id = $2")
            .bind(description)
            .bind(item_id)
            .execute(self.db_manager.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::ItemNotFound(item_id));
        }
        Ok(())
    }

    async fn load_description(&self, item_id: i64) -> Result<Option<String>> {
        query_handlers::get_description(&self.db_manager, item_id).await
    }
}
// endregion: --- Postgres Item Store
