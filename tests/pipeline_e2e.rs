// tests/pipeline_e2e.rs
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;

use noaa_alerts::counties::County;
use noaa_alerts::ingest::normalize::alert_identity;
use noaa_alerts::ingest::types::FeedDocument;
use noaa_alerts::render::TemplateOptions;
use noaa_alerts::{
    AlertDetail, AlertSource, AlertStore, FetchError, Notifier, Pipeline, PushNote, RunOptions,
    WatchList,
};

struct MockSource {
    /// Raw feed JSON; `None` simulates a soft upstream failure (HTML page,
    /// non-2xx) which the client reports as "no data".
    feed: Option<String>,
    detail_fails: bool,
}

impl MockSource {
    fn with_feed(feed: &str) -> Self {
        Self {
            feed: Some(feed.to_string()),
            detail_fails: false,
        }
    }

    fn soft_failure() -> Self {
        Self {
            feed: None,
            detail_fails: false,
        }
    }
}

#[async_trait]
impl AlertSource for MockSource {
    async fn fetch_feed(&self) -> Result<Option<FeedDocument>, FetchError> {
        Ok(self
            .feed
            .as_deref()
            .map(|s| serde_json::from_str(s).expect("mock feed JSON")))
    }

    async fn fetch_detail(
        &self,
        _alert_id: &str,
        _url: &str,
    ) -> Result<Option<AlertDetail>, FetchError> {
        if self.detail_fails {
            let source = serde_json::from_str::<FeedDocument>("not json").unwrap_err();
            return Err(FetchError::MalformedPayload {
                context: "alert detail",
                source,
            });
        }
        Ok(Some(AlertDetail {
            headline: "Tornado Warning for Anne Arundel County".to_string(),
            event: "Tornado Warning".to_string(),
            issuer: "NWS Baltimore".to_string(),
            description: "A tornado was spotted.".to_string(),
            instructions: "Take cover now.".to_string(),
            area: "Anne Arundel".to_string(),
        }))
    }
}

#[derive(Default)]
struct MockNotifier {
    sent: Mutex<Vec<PushNote>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, note: &PushNote) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(note.clone());
        Ok(())
    }
}

fn watch_list() -> WatchList {
    WatchList::new(vec![County {
        fips: String::new(),
        ugc: "MDC031".to_string(),
        name: "TEST".to_string(),
        state: "NA".to_string(),
    }])
}

fn feed_with_test_entry() -> String {
    let expires = (Utc::now() + Duration::hours(2)).to_rfc3339();
    format!(
        r#"{{
            "features": [{{
                "properties": {{
                    "id": "X",
                    "event": "Tornado Warning",
                    "headline": "Tornado Warning issued for Anne Arundel",
                    "expires": "{expires}",
                    "uri": "https://alerts.weather.gov/X",
                    "@id": "https://api.weather.gov/alerts/X",
                    "geocode": {{"UGC": ["MDC031"]}}
                }}
            }}]
        }}"#
    )
}

struct Fixture {
    store: AlertStore,
    notifier: MockNotifier,
    watch: WatchList,
    template: TemplateOptions,
    ignored: Vec<String>,
    output: tempfile::TempDir,
    _db_dir: tempfile::TempDir,
}

impl Fixture {
    async fn new() -> Self {
        let db_dir = tempfile::tempdir().unwrap();
        let store = AlertStore::open(&db_dir.path().join("alerts.db"))
            .await
            .expect("open store");
        Self {
            store,
            notifier: MockNotifier::default(),
            watch: watch_list(),
            template: TemplateOptions::default(),
            ignored: Vec::new(),
            output: tempfile::tempdir().unwrap(),
            _db_dir: db_dir,
        }
    }

    fn pipeline<'a>(&'a self, source: &'a MockSource) -> Pipeline<'a> {
        Pipeline {
            source,
            store: &self.store,
            notifier: &self.notifier,
            watch: &self.watch,
            ignored_events: &self.ignored,
            template: &self.template,
            output_dir: self.output.path(),
            base_url: None,
        }
    }
}

#[tokio::test]
async fn one_matching_entry_is_stored_matched_and_pushed() {
    let fixture = Fixture::new().await;
    let source = MockSource::with_feed(&feed_with_test_entry());
    let summary = fixture
        .pipeline(&source)
        .run_once(RunOptions::default())
        .await
        .expect("run");

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.notified, 1);
    assert_eq!(fixture.store.count().await.unwrap(), 1);

    let sent = fixture.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "TEST (NA) Weather Alert");
    assert!(sent[0]
        .message
        .starts_with("Tornado Warning issued for Anne Arundel"));
    assert_eq!(sent[0].url, "https://alerts.weather.gov/X");

    // detail artifact is keyed by the identity hash
    let artifact = fixture
        .output
        .path()
        .join(format!("{}.html", alert_identity("X")));
    assert!(artifact.exists());
}

#[tokio::test]
async fn refetching_the_same_feed_inserts_and_notifies_nothing() {
    let fixture = Fixture::new().await;
    let source = MockSource::with_feed(&feed_with_test_entry());

    let first = fixture
        .pipeline(&source)
        .run_once(RunOptions::default())
        .await
        .unwrap();
    assert_eq!(first.inserted, 1);

    let second = fixture
        .pipeline(&source)
        .run_once(RunOptions::default())
        .await
        .unwrap();
    assert_eq!(second.fetched, 1);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.matched, 0);
    assert_eq!(second.notified, 0);

    assert_eq!(fixture.store.count().await.unwrap(), 1);
    assert_eq!(fixture.notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn soft_upstream_failure_ends_the_run_cleanly() {
    let fixture = Fixture::new().await;
    let source = MockSource::soft_failure();
    let summary = fixture
        .pipeline(&source)
        .run_once(RunOptions::default())
        .await
        .expect("soft failure is not an error");

    assert_eq!(summary, noaa_alerts::RunSummary::default());
    assert_eq!(fixture.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn ignored_events_match_but_never_notify() {
    let mut fixture = Fixture::new().await;
    fixture.ignored = vec!["Tornado Warning".to_string()];
    let source = MockSource::with_feed(&feed_with_test_entry());

    let summary = fixture
        .pipeline(&source)
        .run_once(RunOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.notified, 0);
    assert!(fixture.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn nopush_runs_keep_the_store_but_send_nothing() {
    let fixture = Fixture::new().await;
    let source = MockSource::with_feed(&feed_with_test_entry());

    let opts = RunOptions {
        purge: false,
        push_enabled: false,
    };
    let summary = fixture.pipeline(&source).run_once(opts).await.unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.notified, 0);
    assert!(fixture.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn detail_failure_skips_the_alert_not_the_run() {
    let fixture = Fixture::new().await;
    let mut source = MockSource::with_feed(&feed_with_test_entry());
    source.detail_fails = true;

    let summary = fixture
        .pipeline(&source)
        .run_once(RunOptions::default())
        .await
        .expect("run survives a detail failure");
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.notified, 0);
    assert_eq!(fixture.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn purge_clears_the_store_before_fetching() {
    let fixture = Fixture::new().await;
    let source = MockSource::with_feed(&feed_with_test_entry());
    fixture
        .pipeline(&source)
        .run_once(RunOptions::default())
        .await
        .unwrap();
    assert_eq!(fixture.store.count().await.unwrap(), 1);

    let empty = MockSource::soft_failure();
    let opts = RunOptions {
        purge: true,
        push_enabled: true,
    };
    fixture.pipeline(&empty).run_once(opts).await.unwrap();
    assert_eq!(fixture.store.count().await.unwrap(), 0);
}
