//! Adapter construction shared by every subcommand (spec §6): `DATABASE_URL`,
//! the AMQP broker address, and the blob store root.

use std::sync::Arc;

use altify_broker::LapinBroker;
use altify_core::config::queues;
use altify_core::ports::{BlobStore, Broker, RelationalStore};
use altify_store::{FilesystemBlobStore, PostgresRelationalStore};
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct StoreSettings {
    /// Postgres connection string (spec §6: `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Max size of the Postgres connection pool.
    #[arg(long, env = "DATABASE_POOL_SIZE", default_value_t = 10)]
    pub database_pool_size: usize,

    /// AMQP broker URI (spec §6).
    #[arg(long, env = "AMQP_URL", default_value = "amqp://127.0.0.1:5672/%2f")]
    pub amqp_url: String,

    /// Filesystem root for blob storage.
    #[arg(long, env = "BLOB_STORE_ROOT", default_value = "./data/blobs")]
    pub blob_store_root: String,
}

pub struct Adapters {
    pub rs: Arc<dyn RelationalStore>,
    pub bs: Arc<dyn BlobStore>,
    pub bk: Arc<dyn Broker>,
}

/// Run migrations, connect to the broker, and declare the topology — the
/// common startup every subcommand except `migrate` needs.
pub async fn build(settings: &StoreSettings) -> anyhow::Result<Adapters> {
    altify_store::run_migrations(&settings.database_url)?;
    let pool = altify_store::build_pool(&settings.database_url, settings.database_pool_size)?;
    let rs: Arc<dyn RelationalStore> = Arc::new(PostgresRelationalStore::new(pool));

    let bs: Arc<dyn BlobStore> = Arc::new(FilesystemBlobStore::new(&settings.blob_store_root));

    let broker = LapinBroker::connect(&settings.amqp_url, queues::DLQ).await?;
    broker.ensure_topology(queues::MAIN).await?;
    let bk: Arc<dyn Broker> = Arc::new(broker);

    Ok(Adapters { rs, bs, bk })
}
