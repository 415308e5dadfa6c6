use crate::config::AppConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::info;

pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn connect(config: &AppConfig) -> Result<Self, sqlx::Error> {
        Self::connect_url(&config.database_url, config.max_connections).await
    }

    /// URL 로 직접 연결
    pub async fn connect_url(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// 데이터베이스 풀 가져오기
    pub fn get_pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// 트랜잭션 실행
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 데이터베이스 초기화 (테이블 재생성)
    pub async fn initialize_database(&self) -> Result<(), sqlx::Error> {
        // 00-recreate-db.sql 실행
        let recreate_db_sql = include_str!("../../sql/00-recreate-db.sql");
        self.execute_multi_query(recreate_db_sql).await?;
        info!("{:<12} --> 기존 테이블 삭제 완료", "Database");

        self.ensure_schema().await
    }

    /// 스키마 생성 (이미 존재하면 유지)
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        // 01-create-schema.sql 실행
        let create_schema_sql = include_str!("../../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;
        info!("{:<12} --> 스키마 생성 완료", "Database");
        Ok(())
    }

    /// 여러 쿼리 실행
    /// 트리거 함수 본문에 ';' 가 포함되므로 문장 단위로 나누지 않고 그대로 실행한다.
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(sql).execute(&*self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
