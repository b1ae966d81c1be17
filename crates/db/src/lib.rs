//! Optional Postgres connection used for service health reporting.
//!
//! The scan and analyze flows never touch the database; the pool is only
//! created when `DATABASE_URL` is configured.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a lazily-connecting pool from a database URL.
///
/// No connection is opened until the first query, so a database outage
/// never blocks server startup.
pub fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_lazy(database_url)
}

/// Run a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| {
        tracing::trace!("Database health check passed");
    })
}
