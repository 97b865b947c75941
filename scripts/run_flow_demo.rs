//! Drives a few flow chains in real time and prints the pool counters.
//!
//! Configure with `CADENCE_*` variables (see `FlowConfig::load`) and
//! `LOG_FILTER`.

use anyhow::{Context, Result};
use cadence_core::{drive, drive_until_idle, yield_tick, FlowConfig, Host, RunOutcome, Work};
use cadence_monitoring::MonitoringConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const FRAME: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    let monitoring_config = MonitoringConfig {
        log_filter: std::env::var("LOG_FILTER")
            .unwrap_or_else(|_| "info,cadence_core=debug".to_string()),
        ..MonitoringConfig::for_service("run-flow-demo")
    };
    cadence_monitoring::init(monitoring_config.clone())
        .context("Failed to initialize monitoring")?;

    let config = FlowConfig::load().context("Failed to load configuration")?;
    let host = Host::with_config(config).context("Failed to create host")?;

    let player = host.create_owner("player");
    let spawner = host.create_owner("spawner");
    let waves = Arc::new(AtomicUsize::new(0));

    let intro = player
        .flow()
        .call(|| info!("Intro started"))
        .wait(Duration::from_millis(300))
        .parallel(vec![
            Work::new(|_| async {
                info!("Fading music");
                Ok(())
            }),
            Work::new(|_| async {
                yield_tick().await;
                info!("Camera settled");
                Ok(())
            }),
        ])
        .call(|| info!("Intro finished"))
        .run(false);

    let wave_counter = waves.clone();
    spawner
        .flow()
        .repeat(3, move |c| {
            let waves = wave_counter.clone();
            c.call(move || {
                let wave = waves.fetch_add(1, Ordering::SeqCst) + 1;
                info!(wave, "Spawning wave");
            })
            .wait(Duration::from_millis(200))
        })
        .stop_chain_if(|| true, true)
        .call(|| info!("Not reached"))
        .run(true);

    drive(&host, FRAME, |_| intro.is_finished()).await;
    if intro.outcome() != Some(RunOutcome::Completed) {
        anyhow::bail!("intro ended as {:?}", intro.outcome());
    }

    let report = drive_until_idle(&host, FRAME, 200).await;
    info!(
        frame = report.frame,
        idle = report.is_idle(),
        waves = waves.load(Ordering::SeqCst),
        "Demo finished"
    );

    let stats = serde_json::to_string_pretty(&host.pool().stats())
        .context("Failed to serialize pool stats")?;
    println!("{}", stats);

    cadence_monitoring::shutdown(&monitoring_config);
    Ok(())
}
