//! 무게 단위 변환
//! 데이터베이스에는 파운드(imperial_weight)로 저장하고, 도메인에서는 킬로그램을 사용한다.

/// 1kg 당 파운드
pub const POUNDS_PER_KILOGRAM: f64 = 2.20462;

/// kg -> lb (저장 시)
pub fn to_imperial(kilograms: f64) -> f64 {
    kilograms * POUNDS_PER_KILOGRAM
}

/// lb -> kg (조회 시)
pub fn to_metric(pounds: f64) -> f64 {
    pounds / POUNDS_PER_KILOGRAM
}

/// 1kg 에 해당하는 단위 수
pub fn units_per_kilogram(symbol: &str) -> Option<f64> {
    match symbol.trim().to_ascii_lowercase().as_str() {
        "kg" => Some(1.0),
        "g" => Some(1000.0),
        "lb" | "lbs" => Some(POUNDS_PER_KILOGRAM),
        _ => None,
    }
}
