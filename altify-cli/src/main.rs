//! Altify - asynchronous alt-text job pipeline.
//!
//! Process entrypoints wiring the concrete adapters (`altify-store`,
//! `altify-broker`) to the `altify-core` ports each subcommand's crate
//! depends on (spec §6, §9).

mod settings;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use settings::StoreSettings;

#[derive(Parser)]
#[command(name = "altify")]
#[command(about = "Asynchronous alt-text job pipeline")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit structured JSON log lines instead of human-readable ones.
    #[arg(long, global = true, env = "ALTIFY_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingress API (upload/bulk-upload/approve/finalize, plus the
    /// reconciler and GC background sweeps).
    Serve {
        #[command(flatten)]
        store: StoreSettings,
        #[command(flatten)]
        server: altify_server::ServerSettings,
    },

    /// Run one worker slot against `tasks.main`.
    Worker {
        #[command(flatten)]
        store: StoreSettings,
        #[command(flatten)]
        worker: altify_worker::WorkerSettings,
    },

    /// Run the DLQ re-drive consumer against `tasks.dlq`.
    Dlq {
        #[command(flatten)]
        store: StoreSettings,
        #[command(flatten)]
        dlq: altify_dlq::DlqSettings,
    },

    /// Run the queue-depth-driven autoscaler control loop.
    Autoscale {
        #[command(flatten)]
        store: StoreSettings,
        #[command(flatten)]
        autoscaler: altify_autoscaler::AutoscalerSettings,
    },

    /// Apply pending database migrations and exit.
    Migrate {
        #[command(flatten)]
        store: StoreSettings,
    },

    /// Run one reconciler + GC sweep pass and exit (operator-triggered,
    /// outside `serve`'s periodic loop).
    Reconcile {
        #[command(flatten)]
        store: StoreSettings,
        #[command(flatten)]
        server: altify_server::ServerSettings,
    },
}

fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let default_filter = if is_verbose() { "altify=info" } else { "altify=warn" };
    altify_core::observability::init_tracing(default_filter, cli.json_logs);

    let cancel = CancellationToken::new();
    spawn_shutdown_signal(cancel.clone());

    match cli.command {
        Commands::Serve { store, server } => {
            let adapters = settings::build(&store).await?;
            let state = altify_server::AppState::new(adapters.rs, adapters.bs, adapters.bk);
            altify_server::serve(state, server, cancel).await
        }
        Commands::Worker { store, worker } => {
            let adapters = settings::build(&store).await?;
            let deps = altify_worker::WorkerDeps {
                rs: adapters.rs,
                bs: adapters.bs,
                bk: adapters.bk,
                inferencer: Arc::new(altify_worker::stub_inferencer::StubInferencer),
            };
            altify_worker::run(deps, worker, altify_core::config::queues::MAIN, cancel).await
        }
        Commands::Dlq { store, dlq } => {
            let adapters = settings::build(&store).await?;
            let deps = altify_dlq::DlqDeps { rs: adapters.rs, bk: adapters.bk };
            altify_dlq::run(deps, dlq, cancel).await
        }
        Commands::Autoscale { store, autoscaler } => {
            let adapters = settings::build(&store).await?;
            let orchestrator = Arc::new(altify_autoscaler::LoggingOrchestrator);
            altify_autoscaler::run(adapters.bk, orchestrator, autoscaler, cancel).await
        }
        Commands::Migrate { store } => {
            altify_store::run_migrations(&store.database_url)?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Commands::Reconcile { store, server } => {
            let adapters = settings::build(&store).await?;
            let state = altify_server::AppState::new(adapters.rs, adapters.bs, adapters.bk);
            altify_server::reconcile_once(&state, server.reconcile_grace(), server.gc_window()).await;
            tracing::info!("reconcile sweep complete");
            Ok(())
        }
    }
}

/// Cancel `cancel` on SIGINT (and SIGTERM, where supported) so every
/// subcommand's run loop observes graceful shutdown the same way (spec §9).
fn spawn_shutdown_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        tracing::info!("shutdown signal received");
        cancel.cancel();
    });
}
