#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Stakeledger service entrypoint (systemd-friendly).
//! Loads config, opens the ledger and serves the HTTP API until SIGINT.

use std::sync::Arc;

use anyhow::{Context, Result};
use stakeledger::api::auth::AdminToken;
use stakeledger::api::{router, AppState};
use stakeledger::core::config::{LogConfig, ServiceConfig};
use stakeledger::core::service::clock::SystemClock;
use stakeledger::core::service::staking::StakingService;
use stakeledger::core::service::verifier::verifier_from_mode;
use stakeledger::core::state::persistent_state::LedgerStore;
use stakeledger::monitoring::metrics::Metrics;
use tracing::{info, warn, Level};

fn init_tracing(cfg: &LogConfig) {
    let level = cfg.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level);
    let _ = if cfg.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(?e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::var("STAKING_CONFIG").ok();
    let mut cfg = ServiceConfig::load(path.as_deref()).context("load config")?;
    cfg.apply_overrides(|k| std::env::var(k).ok());
    cfg.validate().context("validate config")?;

    init_tracing(&cfg.log);

    let store = LedgerStore::open(&cfg.storage.data_dir)
        .with_context(|| format!("open ledger at {}", cfg.storage.data_dir))?;
    let metrics = Arc::new(Metrics::new().context("metrics init")?);
    let admin = cfg
        .admin
        .token_hex
        .as_deref()
        .map(AdminToken::from_hex)
        .transpose()
        .context("admin token")?;
    if admin.is_none() {
        warn!("no admin token configured; pool administration disabled");
    }

    let service = Arc::new(StakingService::new(
        store.clone(),
        verifier_from_mode(cfg.verifier.mode),
        Arc::new(SystemClock),
        metrics.clone(),
        cfg.staking.clone(),
        cfg.verifier.timeout(),
    ));
    let app = router(AppState::new(service, metrics, admin));

    let listener = tokio::net::TcpListener::bind(cfg.http.listen_addr.as_str())
        .await
        .with_context(|| format!("bind {}", cfg.http.listen_addr))?;
    info!(
        listen = %cfg.http.listen_addr,
        data_dir = %cfg.storage.data_dir,
        verifier = ?cfg.verifier.mode,
        "stakeledger starting"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    store.flush().context("flush ledger")?;
    info!("stakeledger stopped");
    Ok(())
}
