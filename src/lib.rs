pub mod adapters;
pub mod config;
pub mod db;
pub mod followup;
pub mod models;
pub mod monitoring;
pub mod orchestrator;
pub mod priority;
pub mod scheduler;
pub mod triage;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use db::ClinicalStore;
use orchestrator::{Orchestrator, OrchestratorError};

/// Install the global fmt subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Daemon entry point: open the store, wire the engine and run the batch
/// scheduler until the process is stopped.
pub fn run() -> Result<(), OrchestratorError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let engine_config = config::EngineConfig::load_or_default(&config::engine_config_path())?;
    let store = Arc::new(ClinicalStore::open(&config::database_path())?);
    let orchestrator = Arc::new(Orchestrator::from_config(
        store,
        engine_config,
        &config::remedies_path(),
    )?);

    let _scheduler = scheduler::start_scheduler(orchestrator);
    tracing::info!(data_dir = %config::app_data_dir().display(), "Engine ready");

    loop {
        std::thread::park();
    }
}
