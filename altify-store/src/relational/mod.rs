pub mod models;
pub mod pool;
pub mod postgres_store;
pub mod schema;

pub use pool::{build_pool, run_migrations, DbConn, DbError, DbPool, MIGRATIONS};
pub use postgres_store::PostgresRelationalStore;
