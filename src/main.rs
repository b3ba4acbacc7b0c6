//! Tapcoin Demo
//!
//! Runs a short session the way a host shell would: resolves the player,
//! starts the engine, taps for a few seconds and reports the result.

use std::time::Duration;
use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tapcoin::{
    VERSION, Engine, EngineConfig, Identity, TapCoordinates, TierTable,
    core::{format_points, format_profit_per_hour, tier_badge},
    engine::synchronizer_for,
    persistence::header_label,
};

/// Number of simulated taps.
const DEMO_TAPS: u32 = 40;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let default_level = if cfg!(feature = "debug-tracing") { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Tapcoin Engine v{}", VERSION);

    let config = EngineConfig::from_env();
    let identity = match std::env::var("TAPCOIN_USER_JSON") {
        Ok(json) => match Identity::from_host_json(&json) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!("Ignoring TAPCOIN_USER_JSON, playing as guest: {}", e);
                None
            }
        },
        Err(_) => None,
    };

    info!("{}", header_label(identity.as_ref()));
    info!(
        "Persistence: {}, profit per hour {}",
        config.persistence_mode,
        format_profit_per_hour(config.profit_per_hour)
    );

    let sync = synchronizer_for(&config, identity)?;
    let handle = Engine::new(config, TierTable::standard(), sync)?.spawn();

    for i in 0..DEMO_TAPS {
        // Sweep taps across a 300x300 card
        let x = 50.0 + (i * 37 % 300) as f32;
        let y = 200.0 + (i * 53 % 300) as f32;
        handle.tap(TapCoordinates::new(x, y)).await?;
        tokio::time::sleep(Duration::from_millis(75)).await;
    }

    let snapshot = handle.snapshot().await?;
    let session = &snapshot.session;
    info!(
        "{} coins | {} {} | {:.1}% to next | {} effects on screen | sync {:?}",
        format_points(session.points),
        session.tier_name,
        tier_badge(session.tier_index, session.tier_count),
        session.progress_percent,
        session.active_effects,
        snapshot.sync_state
    );

    let final_state = handle.shutdown().await?;
    info!("Final balance: {} coins", format_points(final_state.points));

    Ok(())
}
