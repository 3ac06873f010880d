use tokio_util::sync::CancellationToken;

use crate::services::DuelEngine;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: DuelEngine,
    /// Cancelled on shutdown; stops the job worker.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(engine: DuelEngine, shutdown: CancellationToken) -> Self {
        Self { engine, shutdown }
    }

    pub fn engine(&self) -> &DuelEngine {
        &self.engine
    }
}
