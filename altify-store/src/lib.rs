//! Concrete adapters for the Relational Store (RS) and Blob Store (BS) ports
//! defined in `altify-core`: PostgreSQL via `diesel`/`diesel-async`, and a
//! filesystem-backed blob store keyed by task id.

pub mod blob;
pub mod relational;

pub use blob::FilesystemBlobStore;
pub use relational::{build_pool, run_migrations, DbError, PostgresRelationalStore};
