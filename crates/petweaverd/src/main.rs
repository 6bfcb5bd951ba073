//! PetWeaver Daemon - pet battle assistant core
//!
//! Records encounters, polls the responder mailbox, and drives the
//! scripted-strategy engine from the battle feed.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use petweaverd::config::DaemonConfig;
use petweaverd::core::DaemonCore;
use petweaverd::feed::FeedWatcher;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("PetWeaver Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var("PETWEAVER_CONFIG").ok().map(PathBuf::from);
    let config = DaemonConfig::load(config_path.as_deref());

    let mut core = DaemonCore::open(&config)?;

    let (feed_tx, mut feed_rx) = mpsc::channel(64);
    FeedWatcher::new(
        config.feed_path(),
        feed_tx,
        Duration::from_secs(config.feed_poll_secs),
    )
    .spawn();

    let mut poll = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    info!("PetWeaver Daemon ready");

    loop {
        tokio::select! {
            Some(event) = feed_rx.recv() => core.handle_event(event),
            _ = poll.tick() => core.poll_mailbox(),
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}
