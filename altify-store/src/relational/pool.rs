//! Connection pool construction: `deadpool` + `AsyncDieselConnectionManager`.

use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConn = Object<AsyncPgConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors from pool construction, connection checkout, or query execution.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database unavailable: {0}")]
    Pool(String),

    #[error(transparent)]
    Query(#[from] diesel::result::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Build a connection pool against `database_url` (spec §6: `DATABASE_URL`).
pub fn build_pool(database_url: &str, max_size: usize) -> Result<DbPool, DbError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder(manager)
        .max_size(max_size.max(1))
        .build()
        .map_err(|e| DbError::Pool(e.to_string()))
}

/// Run embedded migrations against `database_url` using a plain (sync)
/// connection, as `diesel_migrations` requires.
pub fn run_migrations(database_url: &str) -> Result<(), DbError> {
    use diesel::Connection;
    let mut conn = diesel::pg::PgConnection::establish(database_url)
        .map_err(|e| DbError::Migration(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| DbError::Migration(e.to_string()))
}
