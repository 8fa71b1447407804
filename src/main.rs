//! NOAA Alert Watcher — Binary Entrypoint
//! Wires config, the alert store, the NOAA client, and the Pushover
//! notifier, then runs the pipeline once or on the configured schedule.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use noaa_alerts::cli::Args;
use noaa_alerts::config::Settings;
use noaa_alerts::counties::{ensure_test_county, load_counties, WatchList};
use noaa_alerts::fetch::NoaaClient;
use noaa_alerts::ingest::{Pipeline, RunOptions};
use noaa_alerts::notify::pushover::PushoverNotifier;
use noaa_alerts::scheduler::{self, SchedulerCfg};
use noaa_alerts::store::AlertStore;

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading any credentials; no-op when absent.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(args.debug);

    let settings = Settings::load(&args.config)?;

    let mut counties = load_counties(&args.counties)?;
    if settings.pushover.test_message {
        ensure_test_county(&mut counties);
    }
    let watch = WatchList::new(counties);
    info!(counties = watch.counties.len(), "watch-list loaded");

    let store = AlertStore::open(&args.db)
        .await
        .context("opening alert store")?;

    let source = NoaaClient::new(
        settings.noaa.api_url.clone(),
        settings.user_agent_string(),
    );
    let notifier = PushoverNotifier::new(
        settings.pushover.api_url.clone(),
        settings.pushover.token.clone(),
        settings.pushover.user.clone(),
    );

    let pipeline = Pipeline {
        source: &source,
        store: &store,
        notifier: &notifier,
        watch: &watch,
        ignored_events: &settings.events.ignored,
        template: &settings.template,
        output_dir: &args.output,
        base_url: settings.pushover.base_url.as_deref(),
    };

    let opts = RunOptions {
        purge: args.purge,
        push_enabled: !args.nopush,
    };

    if args.once || args.purge {
        let summary = pipeline.run_once(opts).await?;
        info!(
            fetched = summary.fetched,
            inserted = summary.inserted,
            matched = summary.matched,
            notified = summary.notified,
            "run complete"
        );
        return Ok(());
    }

    scheduler::run(&pipeline, SchedulerCfg::from(&settings.schedule), opts).await
}
