//! Sandbox: plays one short match against `MemoryHost` and prints what
//! each player saw.
//!
//! Set `SORTIE_CONFIG` to a TOML file to override the built-in timings.

use std::time::Duration;

use sortie::prelude::*;

fn sandbox_config() -> Result<ServerConfig, SortieError> {
    if let Ok(path) = std::env::var("SORTIE_CONFIG") {
        return Ok(ServerConfig::load(path)?);
    }

    // 3 second warmup, 15 second match, 5 second extraction.
    Ok(ServerConfig {
        matches: MatchConfig {
            warmup_ticks: 60,
            match_duration_ticks: 300,
            extraction_ticks: 100,
            ..MatchConfig::default()
        },
        ended_worlds: EndedWorldPolicy::Lease { ticks: 40 },
        ..ServerConfig::default()
    })
}

/// Wall time for `ticks` periods. Saturates instead of wrapping on
/// absurd values from a user config.
fn ticks_to_duration(period: Duration, ticks: u64) -> Duration {
    period.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX))
}

#[tokio::main]
async fn main() -> Result<(), SortieError> {
    let config = sandbox_config()?;
    sortie::telemetry::init_tracing(&config.log_filter);

    let host = MemoryHost::new();
    let players = [PlayerId(1), PlayerId(2), PlayerId(3)];
    for player in players {
        host.connect(player);
    }

    let tick_period = Duration::from_secs(1) / config.tick.tick_rate_hz.max(1);
    let warmup = ticks_to_duration(tick_period, config.matches.warmup_ticks);
    let match_length = ticks_to_duration(tick_period, config.matches.match_duration_ticks);

    let server = ExtractionServer::new(config, host);
    let handle = server.handle();
    let driver = tokio::spawn(server.run());

    let feedback = handle.execute("extraction start".parse()?).await?;
    tracing::info!(%feedback, "command accepted");

    let Some(world) = handle.matches().find_player(PlayerId(1)) else {
        tracing::error!("match vanished before warmup ended");
        handle.shutdown();
        return Ok(());
    };

    // Player 1 heads for the extraction block as soon as they land.
    tokio::time::sleep(warmup + tick_period * 2).await;
    let extracting = handle.request_extraction(PlayerId(1), &world);
    tracing::info!(player = %PlayerId(1), extracting, "extraction requested");

    // Player 3 drops out halfway through.
    tokio::time::sleep(match_length / 2).await;
    handle.player_left(PlayerId(3), &world);
    handle.host().disconnect(PlayerId(3));

    tokio::time::sleep(match_length / 2 + tick_period * 4).await;
    handle.shutdown();
    if let Err(error) = driver.await {
        tracing::error!(%error, "tick driver panicked");
    }

    for player in players {
        let record = handle.host().player(player);
        let inbox = handle.host().take_inbox(player);
        println!("{player}:");
        for notice in &inbox {
            println!("  {notice}");
        }
        if let Some(record) = record {
            println!(
                "  location: {:?}, removals: {}",
                record.location, record.removals
            );
        }
    }

    Ok(())
}
