use thiserror::Error;

/// 상품 카탈로그 에러
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("잘못된 인자: {0}")]
    InvalidArgument(String),

    #[error("참조 누락: {0}")]
    MissingReference(String),

    #[error("상품을 찾을 수 없습니다. id: {0}")]
    ItemNotFound(i64),

    #[error("입찰을 찾을 수 없습니다. id: {0}")]
    BidNotFound(i64),

    #[error("잘못된 금액 형식: {0}")]
    InvalidMonetaryAmount(String),

    #[error("USD 환율이 설정되지 않은 통화: {0}")]
    UnknownCurrency(String),

    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),

    #[error("설정 오류: {message}")]
    Config { message: String },
}

impl CatalogError {
    /// 응답에 포함되는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::InvalidArgument(_) => "INVALID_ARGUMENT",
            CatalogError::MissingReference(_) => "MISSING_REFERENCE",
            CatalogError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            CatalogError::BidNotFound(_) => "BID_NOT_FOUND",
            CatalogError::InvalidMonetaryAmount(_) => "INVALID_MONETARY_AMOUNT",
            CatalogError::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            CatalogError::Database(_) => "DATABASE_ERROR",
            CatalogError::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// 호출자의 요청이 잘못된 경우
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidArgument(_)
                | CatalogError::MissingReference(_)
                | CatalogError::InvalidMonetaryAmount(_)
                | CatalogError::UnknownCurrency(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::ItemNotFound(_) | CatalogError::BidNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
