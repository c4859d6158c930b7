//! `altify-server` — the Ingress API (spec §4.1, §6): upload, bulk-upload,
//! task lookup, and approval, plus the reconciler and GC background sweeps.
//!
//! Takes already-constructed adapter handles via [`AppState`]; it never
//! reaches for ambient/global connections itself (spec §9). Concrete
//! adapters are wired in by `altify-cli`.

mod dto;
mod gc;
mod handlers;
mod ingress;
mod openapi;
mod reconciler;
mod routes;
mod settings;
mod state;
mod validation;

pub use routes::create_router;
pub use settings::ServerSettings;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Run a single reconciler + GC sweep pass and return. Used by the `reconcile`
/// CLI subcommand for an operator-triggered run outside the `serve` loop.
pub async fn reconcile_once(state: &AppState, grace: Duration, gc_window: Duration) {
    reconciler::sweep_once(state, grace).await;
    gc::sweep_once(state, gc_window).await;
}

/// Run the ingress API until `cancel` fires (SIGINT/SIGTERM, observed by the
/// caller) or the listener itself errors out. Spawns the reconciler and GC
/// sweeps as sibling tasks and stops them alongside the HTTP server.
pub async fn serve(state: AppState, settings: ServerSettings, cancel: CancellationToken) -> anyhow::Result<()> {
    let state = Arc::new(state);

    let reconciler_handle = tokio::spawn(reconciler::run(
        Arc::clone(&state),
        settings.reconcile_interval(),
        settings.reconcile_grace(),
        cancel.clone(),
    ));
    let gc_handle = tokio::spawn(gc::run(Arc::clone(&state), settings.gc_interval(), settings.gc_window(), cancel.clone()));

    let app = routes::create_router((*state).clone());
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    tracing::info!(%addr, "starting altify-server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = {
        let cancel = cancel.clone();
        async move { cancel.cancelled().await }
    };
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    cancel.cancel();
    let _ = reconciler_handle.await;
    let _ = gc_handle.await;
    Ok(())
}
