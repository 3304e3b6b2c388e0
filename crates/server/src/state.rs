use std::sync::Arc;

use calc_compute::Orchestrator;
use calc_core::Config;

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub config: Config,
}

impl AppState {
    /// State with an in-memory expression store and operation times from `config`.
    pub fn new(config: Config) -> Self {
        let orchestrator = Arc::new(Orchestrator::in_memory(config.operations));
        Self { orchestrator, config }
    }
}
