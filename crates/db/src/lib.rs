//! Database layer: connection pool setup, migrations, row models and
//! repositories for the onboarding portal's Postgres schema.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

/// Shared alias so callers don't import sqlx directly for the pool type.
pub type DbPool = sqlx::PgPool;

/// Connect to Postgres with a bounded pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Cheap liveness probe used by the health endpoint.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
