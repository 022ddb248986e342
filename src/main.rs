//! Salon Console API Server
//!
//! Run with: cargo run --bin salon -- --config ./config.toml
//!
//! Without `--config` the default locations are tried
//! (`~/.config/salon/config.toml`, `/etc/salon/config.toml`, `./config.toml`),
//! then `SALON_*` environment variables are applied.

use anyhow::Context;
use clap::Parser;
use salon::api::{serve, AppState};
use salon::config::{Config, LoggingConfig};
use salon::push::{OutboxPushSender, PushRelayClient, PushSender};
use salon::storage::{BlobStore, SalonStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "salon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Salon console API server")]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);
    tracing::info!("Starting Salon API server v{}", env!("CARGO_PKG_VERSION"));

    let store_config = config.store_config();
    tracing::info!("Data directory: {:?}", store_config.data_dir);

    let store = Arc::new(
        SalonStore::open(&store_config)
            .with_context(|| format!("opening store in {:?}", store_config.data_dir))?,
    );
    let blobs = BlobStore::new(store_config.blobs_dir());

    let push: Arc<dyn PushSender> = if config.push.enabled {
        tracing::info!("Push relay enabled: {}", config.push.endpoint);
        Arc::new(PushRelayClient::new(config.push_config())?)
    } else {
        tracing::info!("Push relay disabled, notifications stay in the outbox");
        Arc::new(OutboxPushSender::new())
    };

    let api_config = config.api_config()?;
    let state = AppState::new(
        Arc::clone(&store),
        blobs,
        push,
        config.auth_policy(),
        config.reminder_config()?,
        api_config.clone(),
    );

    bootstrap_admin(&state, &config).await?;

    let reminders = Arc::clone(&state.reminders);
    let reminder_handle = Arc::clone(&reminders).start();

    tracing::info!(
        salon = %config.salon.name,
        "Starting server on {}:{}",
        api_config.host,
        api_config.port
    );
    serve(state, &api_config).await?;

    reminders.stop().await;
    reminder_handle.abort();
    tracing::info!("Salon API server stopped");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("salon={},tower_http={}", logging.level, logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the configured administrator on first start
async fn bootstrap_admin(state: &AppState, config: &Config) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (
        config.auth.bootstrap_admin_email.as_deref(),
        config.auth.bootstrap_admin_password.as_deref(),
    ) else {
        if state.store.count_admins()? == 0 {
            tracing::warn!(
                "No administrator exists; set SALON_ADMIN_EMAIL and SALON_ADMIN_PASSWORD or run `salon-cli create-admin`"
            );
        }
        return Ok(());
    };

    match state
        .auth
        .ensure_admin(email, password, &config.auth.bootstrap_admin_name)
        .await?
    {
        Some(profile) => tracing::info!(user_id = %profile.id, "Bootstrap administrator created"),
        None => tracing::debug!("Bootstrap administrator already present"),
    }

    Ok(())
}
