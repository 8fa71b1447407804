// src/ingest/mod.rs
pub mod normalize;
pub mod types;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::counties::WatchList;
use crate::fetch::AlertSource;
use crate::matcher;
use crate::notify::{push_message, push_title, Notifier, PushNote};
use crate::render::{self, TemplateOptions};
use crate::store::{AlertStore, InsertOutcome};
use types::{AlertDetail, RunSummary};

/// Alerts whose expiry fell more than this far behind "now" are garbage.
const EXPIRY_GRACE_SECS: i64 = 24 * 3600;

/// One-time metrics registration (so series show up wherever they are
/// exported).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("alerts_fetched_total", "Entries seen in the alerts feed.");
        describe_counter!("alerts_inserted_total", "New alerts inserted into the store.");
        describe_counter!("alerts_matched_total", "Alerts matching the county watch-list.");
        describe_counter!("alerts_notified_total", "Push notifications delivered.");
        describe_counter!("pipeline_runs_total", "Completed pipeline runs.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Per-run switches from the command line.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Replace expiry GC with a full purge before fetching.
    pub purge: bool,
    /// Deliver pushes for matches; matches are still logged when off.
    pub push_enabled: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            purge: false,
            push_enabled: true,
        }
    }
}

/// One run's collaborators, wired once at startup and borrowed per run.
pub struct Pipeline<'a> {
    pub source: &'a dyn AlertSource,
    pub store: &'a AlertStore,
    pub notifier: &'a dyn Notifier,
    pub watch: &'a WatchList,
    pub ignored_events: &'a [String],
    pub template: &'a TemplateOptions,
    pub output_dir: &'a Path,
    pub base_url: Option<&'a str>,
}

impl Pipeline<'_> {
    /// Full purge entry point: drop every stored alert.
    pub async fn purge_all(&self) -> Result<u64> {
        let deleted = self.store.delete_all().await.context("purging alerts")?;
        info!(deleted, "purged stored alerts");
        Ok(deleted)
    }

    /// One pipeline run: GC, fetch, normalize + idempotent insert, match,
    /// then render + notify per match.
    pub async fn run_once(&self, opts: RunOptions) -> Result<RunSummary> {
        ensure_metrics_described();
        let mut summary = RunSummary::default();

        // 1. Garbage collection before anything new comes in.
        if opts.purge {
            self.purge_all().await?;
        } else {
            let cutoff = Utc::now().timestamp() - EXPIRY_GRACE_SECS;
            self.store
                .delete_expired(cutoff)
                .await
                .context("deleting expired alerts")?;
        }

        // 2. This run's batch id; `created` ties rows to the run that first
        // saw them. Microseconds, so back-to-back runs get distinct ids.
        let batch = Utc::now().timestamp_micros();

        // 3. Fetch. Soft failure ends the run cleanly with zero counts;
        // malformed JSON is the caller's problem.
        let Some(document) = self.source.fetch_feed().await? else {
            info!("no alert data this run");
            return Ok(summary);
        };

        // 4. Normalize and insert; the store ignores already-known ids.
        let mut existing = 0usize;
        for feature in document.features {
            summary.fetched += 1;
            let alert = normalize::normalize(feature);
            match self
                .store
                .insert_if_absent(&alert, batch)
                .await
                .context("inserting alert")?
            {
                InsertOutcome::Inserted => summary.inserted += 1,
                InsertOutcome::AlreadyExists => existing += 1,
            }
        }
        debug!(fetched = summary.fetched, "found alerts in feed");
        info!(inserted = summary.inserted, "inserted new alerts");
        debug!(existing, "matched existing alerts");

        // 5. Match only what this run created.
        let created = self
            .store
            .select_by_batch(batch)
            .await
            .context("selecting batch")?;
        let matched = matcher::match_batch(created, self.watch);
        summary.matched = matched.len();

        // 6. Detail, artifact, push. A failure on one alert never takes
        // down the rest of the run.
        for m in matched {
            if self.ignored_events.iter().any(|e| e == &m.alert.event) {
                info!(
                    county = %m.county_name,
                    state = %m.county_state,
                    event = %m.alert.event,
                    "ignoring alert"
                );
                continue;
            }

            let detail = match self
                .source
                .fetch_detail(&m.alert.alert_id, &m.alert.api_url)
                .await
            {
                Ok(Some(detail)) => detail,
                // Maintenance page on the detail endpoint: render what we
                // have and still notify.
                Ok(None) => AlertDetail::default(),
                Err(e) => {
                    warn!(error = ?e, alert_id = %m.alert.alert_id, "detail fetch failed, skipping alert");
                    continue;
                }
            };

            let html = render::render_detail_page(
                &detail,
                m.alert.expires_utc_ts,
                &m.alert.url,
                self.template,
            );
            if let Err(e) = render::write_detail_page(self.output_dir, &m.alert.alert_id, &html) {
                warn!(error = ?e, alert_id = %m.alert.alert_id, "failed to write detail page");
            }

            let push_url = match self.base_url {
                Some(base) => format!("{base}/{}.html", m.alert.alert_id),
                None => m.alert.url.clone(),
            };
            let note = PushNote {
                title: push_title(&m),
                message: push_message(&m),
                url: push_url,
            };

            if !opts.push_enabled {
                info!(title = %note.title, "push delivery disabled for this run");
                continue;
            }
            match self.notifier.send(&note).await {
                Ok(()) => summary.notified += 1,
                Err(e) => {
                    warn!(error = ?e, title = %note.title, "push delivery failed");
                }
            }
        }

        counter!("alerts_fetched_total").increment(summary.fetched as u64);
        counter!("alerts_inserted_total").increment(summary.inserted as u64);
        counter!("alerts_matched_total").increment(summary.matched as u64);
        counter!("alerts_notified_total").increment(summary.notified as u64);
        counter!("pipeline_runs_total").increment(1);
        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);

        Ok(summary)
    }
}
