//! 환경 변수 기반 설정
// region:    --- Imports
use crate::error::{CatalogError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
// endregion: --- Imports

// region:    --- App Config
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: String,
    pub recreate_database: bool,
    pub usd_rates: HashMap<String, Decimal>,
}

impl AppConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").map_err(|_| CatalogError::Config {
                message: "DATABASE_URL 환경 변수가 필요합니다.".to_string(),
            })?,
            max_connections: match env::var("DATABASE_MAX_CONNECTIONS") {
                Ok(raw) => parse_max_connections(&raw)?,
                Err(_) => 5,
            },
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            recreate_database: env::var("RECREATE_DATABASE")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            usd_rates: parse_usd_rates(&env::var("USD_RATES").unwrap_or_default())?,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_max_connections(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CatalogError::Config {
            message: format!("DATABASE_MAX_CONNECTIONS 는 1 이상의 정수여야 합니다: {}", raw),
        }),
    }
}

/// "EUR=1.08,GBP=1.27" 형식의 환율 목록 파싱
pub fn parse_usd_rates(raw: &str) -> Result<HashMap<String, Decimal>> {
    let mut rates = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (currency, rate) = entry.split_once('=').ok_or_else(|| CatalogError::Config {
            message: format!("USD_RATES 항목 형식 오류: {}", entry),
        })?;
        let rate = Decimal::from_str(rate.trim()).map_err(|e| CatalogError::Config {
            message: format!("USD_RATES 환율 파싱 실패 ({}): {}", entry, e),
        })?;
        rates.insert(currency.trim().to_ascii_uppercase(), rate);
    }
    Ok(rates)
}
// endregion: --- App Config
