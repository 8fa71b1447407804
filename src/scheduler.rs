// src/scheduler.rs
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::config::ScheduleSettings;
use crate::ingest::{Pipeline, RunOptions};

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub fetch_interval: Duration,
    pub vacuum_interval: Duration,
}

impl From<&ScheduleSettings> for SchedulerCfg {
    fn from(settings: &ScheduleSettings) -> Self {
        Self {
            fetch_interval: Duration::from_secs(settings.fetch_interval_minutes * 60),
            vacuum_interval: Duration::from_secs(settings.vacuum_interval_hours * 3600),
        }
    }
}

/// Drive the pipeline on the fetch cadence and the store vacuum on its own,
/// much longer cadence. The first fetch fires immediately; a failed run is
/// logged and the loop keeps going. Runs are awaited to completion, so two
/// runs never overlap.
pub async fn run(pipeline: &Pipeline<'_>, cfg: SchedulerCfg, opts: RunOptions) -> anyhow::Result<()> {
    info!(
        fetch_secs = cfg.fetch_interval.as_secs(),
        vacuum_secs = cfg.vacuum_interval.as_secs(),
        "scheduler started"
    );

    let mut fetch_tick = interval(cfg.fetch_interval);
    fetch_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut vacuum_tick = interval(cfg.vacuum_interval);
    vacuum_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval() yields its first tick immediately; the vacuum should wait
    // a full period before its first pass.
    vacuum_tick.tick().await;

    loop {
        tokio::select! {
            _ = fetch_tick.tick() => {
                match pipeline.run_once(opts).await {
                    Ok(summary) => info!(
                        fetched = summary.fetched,
                        inserted = summary.inserted,
                        matched = summary.matched,
                        notified = summary.notified,
                        "run complete"
                    ),
                    Err(e) => error!(error = ?e, "run failed"),
                }
            }
            _ = vacuum_tick.tick() => {
                if let Err(e) = pipeline.store.vacuum().await {
                    error!(error = ?e, "vacuum failed");
                }
            }
        }
    }
}
