// region:    --- Imports
use item_catalog::catalog::money::UsdConverter;
use item_catalog::config::AppConfig;
use item_catalog::database::DatabaseManager;
use item_catalog::handlers;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드
    let config = AppConfig::from_env()?;

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::connect(&config).await?);

    // 데이터베이스 초기화
    let initialized = if config.recreate_database {
        db_manager.initialize_database().await
    } else {
        db_manager.ensure_schema().await
    };
    if let Err(e) = initialized {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // USD 환산기
    let converter = Arc::new(UsdConverter::new(config.usd_rates.clone()));

    // 라우터 설정
    let routes_all = handlers::routes(db_manager, converter);

    // 리스너 생성
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
