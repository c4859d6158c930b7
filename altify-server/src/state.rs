//! Shared state for the ingress API, matching `foia-server`'s `AppState`
//! (a `Clone` struct of `Arc`-wrapped dependencies passed to `axum::State`).

use std::sync::Arc;

use altify_core::ports::{BlobStore, Broker, RelationalStore};

/// Dependency-injected handles for the three external collaborators the
/// ingress API talks to directly (spec §4.1, §4.5). Built once at process
/// init by the binary that wires concrete adapters in; never constructed
/// from ambient/global state (spec §9, "global singletons -> explicit
/// dependency-injected handles").
#[derive(Clone)]
pub struct AppState {
    pub rs: Arc<dyn RelationalStore>,
    pub bs: Arc<dyn BlobStore>,
    pub bk: Arc<dyn Broker>,
}

impl AppState {
    pub fn new(rs: Arc<dyn RelationalStore>, bs: Arc<dyn BlobStore>, bk: Arc<dyn Broker>) -> Self {
        Self { rs, bs, bk }
    }
}
