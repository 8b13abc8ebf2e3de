pub mod cli;
pub mod core;
pub mod notifiers;
pub mod providers;
pub mod scheduler;
pub mod store;
pub mod watcher;

use crate::core::config::AppConfig;
use crate::core::kv::Store;
use crate::core::state::StateStore;
use crate::notifiers::email::EmailNotifier;
use crate::providers::bankersalgo::BankersAlgoProvider;
use crate::store::KeyValueStore;
use crate::store::state::{KvStateStore, STATE_COLLECTION};
use crate::watcher::RateWatcher;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Watch,
    Check,
    Status,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rate watch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        from = %config.pair.from,
        to = %config.pair.to,
        threshold = config.alert.email_threshold,
        "Loaded config"
    );

    let data_path = config.default_data_path()?;
    let store = KeyValueStore::open(&data_path)?;
    let state = Arc::new(KvStateStore::new(store.get_collection(STATE_COLLECTION)?));

    match command {
        AppCommand::Status => cli::status::run(state.as_ref(), &config).await,
        AppCommand::Check => {
            let watcher = build_watcher(&config, state)?;
            cli::check::run(&watcher).await
        }
        AppCommand::Watch => {
            let watcher = Arc::new(build_watcher(&config, state)?);
            watch(watcher, &config.schedule.cron).await
        }
    }
}

pub fn build_watcher(config: &AppConfig, state: Arc<dyn StateStore>) -> Result<RateWatcher> {
    let source = BankersAlgoProvider::from_config(config)?;
    let notifier = EmailNotifier::from_config(&config.email)
        .context("Failed to set up email notifier")?;
    Ok(RateWatcher::new(
        Arc::new(source),
        state,
        Arc::new(notifier),
        config.alert.clone(),
    ))
}

async fn watch(watcher: Arc<RateWatcher>, cron: &str) -> Result<()> {
    let trigger = scheduler::Trigger::new(cron)?;
    info!(cron, "Watching exchange rate");

    let handle = trigger.start(move || {
        let watcher = Arc::clone(&watcher);
        async move { watcher.run_logged(chrono::Local::now()).await }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");
    handle.stop().await
}
