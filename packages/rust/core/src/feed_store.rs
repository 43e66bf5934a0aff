//! The content store: fetches the remote ContentFeed, mirrors it into local
//! storage, and publishes `{data, loading, error}` snapshots to consumers.
//!
//! Lifecycle:
//! 1. [`ContentStore::open`] seeds state from the persisted mirror
//! 2. [`ContentStore::refresh`] fetches, persists wholesale, then publishes
//! 3. [`ContentStore::start`] refreshes once immediately and then on a fixed
//!    interval until cancelled
//!
//! A failed refresh never discards data already on screen; it only sets
//! `error`.

use std::sync::Arc;
use std::time::Duration;

use brokersite_client::ApiClient;
use brokersite_shared::{BrokerSiteError, ContentFeed, FeedConfig, Result};
use brokersite_storage::{FetchOutcome, FetchRecord, Storage};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::icons::IconRegistry;

/// Tunables for a [`ContentStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Storage key the mirror lives under.
    pub storage_key: String,
    /// Time between background refetches.
    pub refetch_interval: Duration,
    /// Reject feeds that reference unknown icon keys.
    pub strict_icons: bool,
}

impl StoreOptions {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            refetch_interval: config.refetch_interval(),
            strict_icons: config.strict_icons,
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

/// Snapshot of what consumers see.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// The authoritative feed, if one has ever been loaded.
    pub data: Option<Arc<ContentFeed>>,
    /// True until the first load completes, successfully or not.
    pub loading: bool,
    /// Message of the most recent failure; cleared on success.
    pub error: Option<String>,
    /// When `data` was fetched (or persisted, for a cached feed).
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Loads, caches, and refreshes the content feed.
pub struct ContentStore {
    client: ApiClient,
    storage: Storage,
    icons: IconRegistry,
    options: StoreOptions,
    state: watch::Sender<FeedState>,
}

impl ContentStore {
    /// Build a store and seed its state from the persisted mirror.
    ///
    /// A mirror that no longer parses is reported through `error` and left
    /// for the next successful refresh to overwrite.
    #[instrument(skip_all, fields(key = %options.storage_key))]
    pub async fn open(client: ApiClient, storage: Storage, options: StoreOptions) -> Result<Self> {
        let initial = match storage.load_feed(&options.storage_key).await {
            Ok(Some(feed)) => {
                let fetched_at = storage
                    .get_entry(&options.storage_key)
                    .await?
                    .map(|entry| entry.updated_at);
                info!(name = %feed.name, "loaded cached feed");
                FeedState {
                    data: Some(Arc::new(feed)),
                    loading: false,
                    error: None,
                    fetched_at,
                }
            }
            Ok(None) => {
                debug!("no cached feed");
                FeedState {
                    loading: true,
                    ..FeedState::default()
                }
            }
            Err(e @ BrokerSiteError::Parse { .. }) => {
                warn!(error = %e, "cached feed is corrupt, waiting for refetch");
                FeedState {
                    loading: true,
                    error: Some(e.to_string()),
                    ..FeedState::default()
                }
            }
            Err(e) => return Err(e),
        };

        let (state, _rx) = watch::channel(initial);
        Ok(Self {
            client,
            storage,
            icons: IconRegistry::new(),
            options,
            state,
        })
    }

    /// Replace the icon registry used to check incoming feeds.
    pub fn with_icons(mut self, icons: IconRegistry) -> Self {
        self.icons = icons;
        self
    }

    /// Current snapshot.
    pub fn get(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn icons(&self) -> &IconRegistry {
        &self.icons
    }

    /// Fetch the feed now, persist it, and publish it.
    ///
    /// On failure the previous data stays in place and only `error` changes.
    /// If `cancel` fires before the new feed is committed, nothing is
    /// persisted or published and [`BrokerSiteError::Cancelled`] is returned.
    #[instrument(skip_all, fields(key = %self.options.storage_key))]
    pub async fn refresh(&self, cancel: &CancelToken) -> Result<Arc<ContentFeed>> {
        if cancel.is_cancelled() {
            return Err(BrokerSiteError::Cancelled);
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.client.get_feeds() => Some(result),
        };

        let Some(fetched) = fetched else {
            info!("feed refresh cancelled in flight");
            self.log_fetch(FetchOutcome::Cancelled, None, None).await;
            return Err(BrokerSiteError::Cancelled);
        };

        let feed = match fetched.and_then(|feed| self.check_icons(feed)) {
            Ok(feed) => feed,
            Err(e) => {
                warn!(error = %e, "feed refresh failed");
                let message = e.to_string();
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message.clone());
                });
                self.log_fetch(FetchOutcome::Failed, None, Some(&message)).await;
                return Err(e);
            }
        };

        if cancel.is_cancelled() {
            info!("feed refresh cancelled before commit");
            self.log_fetch(FetchOutcome::Cancelled, None, None).await;
            return Err(BrokerSiteError::Cancelled);
        }

        let previous_hash = match self.storage.get_entry(&self.options.storage_key).await {
            Ok(entry) => entry.map(|e| e.content_hash),
            Err(e) => {
                warn!(error = %e, "could not read previous mirror");
                None
            }
        };

        // Persisting is best effort: the in-memory feed is still the newest.
        let hash = match self.storage.save_feed(&self.options.storage_key, &feed).await {
            Ok(entry) => Some(entry.content_hash),
            Err(e) => {
                warn!(error = %e, "failed to persist feed");
                None
            }
        };

        let feed = Arc::new(feed);
        self.state.send_replace(FeedState {
            data: Some(Arc::clone(&feed)),
            loading: false,
            error: None,
            fetched_at: Some(Utc::now()),
        });

        let outcome = match (&previous_hash, &hash) {
            (Some(prev), Some(new)) if prev == new => FetchOutcome::Unchanged,
            _ => FetchOutcome::Updated,
        };
        info!(%outcome, name = %feed.name, "feed refreshed");
        self.log_fetch(outcome, hash.as_deref(), None).await;

        Ok(feed)
    }

    /// Spawn the polling task: one refresh right away, then one per
    /// `refetch_interval`. The task exits when `cancel` fires.
    pub fn start(self: Arc<Self>, cancel: &CancelToken) -> JoinHandle<()> {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let period = self.options.refetch_interval;
            info!(interval_secs = period.as_secs(), "feed polling started");

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        match self.refresh(&cancel).await {
                            Ok(_) => {}
                            Err(BrokerSiteError::Cancelled) => break,
                            // Already published to `error`; wait for the next tick.
                            Err(e) => debug!(error = %e, "scheduled refresh failed"),
                        }
                    }
                }
            }

            info!("feed polling stopped");
        })
    }

    /// Delete the persisted mirror. In-memory state is left as is.
    /// Returns whether a mirror existed.
    pub async fn clear(&self) -> Result<bool> {
        let removed = self.storage.delete_entry(&self.options.storage_key).await?;
        info!(removed, "cleared cached feed");
        Ok(removed)
    }

    /// Most recent fetch attempts, newest first.
    pub async fn history(&self, limit: u32) -> Result<Vec<FetchRecord>> {
        self.storage.recent_fetches(limit).await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn check_icons(&self, feed: ContentFeed) -> Result<ContentFeed> {
        let unknown = self.icons.validate_feed(&feed);
        if unknown.is_empty() {
            return Ok(feed);
        }
        if self.options.strict_icons {
            return Err(BrokerSiteError::validation(format!(
                "feed references unknown icon keys: {}",
                unknown.join(", ")
            )));
        }
        warn!(keys = ?unknown, "feed references unknown icon keys");
        Ok(feed)
    }

    async fn log_fetch(&self, outcome: FetchOutcome, hash: Option<&str>, detail: Option<&str>) {
        if let Err(e) = self.storage.record_fetch(outcome, hash, detail).await {
            warn!(error = %e, "failed to record fetch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokersite_shared::{ApiSettings, AppConfig, FEED_STORAGE_KEY, ServiceItem};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn fixture() -> String {
        std::fs::read_to_string("../../../fixtures/json/feed.fixture.json").expect("read fixture")
    }

    fn fixture_feed() -> ContentFeed {
        let envelope: brokersite_shared::FeedEnvelope =
            serde_json::from_str(&fixture()).expect("parse fixture");
        envelope.data.expect("fixture data")
    }

    fn temp_db() -> PathBuf {
        std::env::temp_dir().join(format!("bs_store_{}.db", Uuid::now_v7()))
    }

    fn client_for(uri: &str) -> ApiClient {
        let settings =
            ApiSettings::resolve(&AppConfig::default(), Some(uri)).expect("resolve settings");
        ApiClient::new(settings).expect("build client")
    }

    async fn store_at(uri: &str, db: &PathBuf, options: StoreOptions) -> ContentStore {
        let storage = Storage::open(db).await.expect("open storage");
        ContentStore::open(client_for(uri), storage, options)
            .await
            .expect("open store")
    }

    async fn mount_fixture(server: &wiremock::MockServer) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/feeds"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(fixture()))
            .mount(server)
            .await;
    }

    fn cleanup(db: &PathBuf) {
        let _ = std::fs::remove_file(db);
    }

    #[tokio::test]
    async fn empty_cache_starts_loading() {
        let server = wiremock::MockServer::start().await;
        let db = temp_db();
        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;

        let state = store.get();
        assert!(state.data.is_none());
        assert!(state.loading);
        assert!(state.error.is_none());
        cleanup(&db);
    }

    #[tokio::test]
    async fn first_fetch_publishes_and_persists() {
        let server = wiremock::MockServer::start().await;
        mount_fixture(&server).await;
        let db = temp_db();
        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;

        let feed = store.refresh(&CancelToken::new()).await.expect("refresh");
        assert_eq!(*feed, fixture_feed());

        let state = store.get();
        assert_eq!(state.data.as_deref(), Some(&fixture_feed()));
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(state.fetched_at.is_some());

        let persisted = store
            .storage()
            .load_feed(FEED_STORAGE_KEY)
            .await
            .expect("load")
            .expect("persisted");
        assert_eq!(persisted, fixture_feed());
        cleanup(&db);
    }

    #[tokio::test]
    async fn cached_feed_survives_failed_refetch() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/feeds"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let db = temp_db();
        {
            let seed = Storage::open(&db).await.expect("open");
            seed.save_feed(FEED_STORAGE_KEY, &fixture_feed())
                .await
                .expect("seed cache");
        }

        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;
        let before = store.get();
        assert!(!before.loading);
        assert!(before.data.is_some());

        let err = store.refresh(&CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Http { status: 500 }));

        let after = store.get();
        assert_eq!(after.data.as_deref(), Some(&fixture_feed()));
        assert!(!after.loading);
        assert_eq!(after.error.as_deref(), Some("HTTP error! status: 500"));

        let history = store.history(5).await.expect("history");
        assert_eq!(history[0].outcome, "failed");
        cleanup(&db);
    }

    #[tokio::test]
    async fn corrupt_cache_reports_error_then_recovers() {
        let server = wiremock::MockServer::start().await;
        mount_fixture(&server).await;

        let db = temp_db();
        {
            let seed = Storage::open(&db).await.expect("open");
            seed.put_entry(FEED_STORAGE_KEY, "{\"name\": ")
                .await
                .expect("seed garbage");
        }

        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;
        let state = store.get();
        assert!(state.data.is_none());
        assert!(state.loading);
        assert!(
            state
                .error
                .as_deref()
                .is_some_and(|e| e.contains("cached feed is unreadable"))
        );

        store.refresh(&CancelToken::new()).await.expect("refresh");
        let state = store.get();
        assert!(state.error.is_none());
        assert!(state.data.is_some());
        cleanup(&db);
    }

    #[tokio::test]
    async fn cancelled_refresh_commits_nothing() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/feeds"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(fixture())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let db = temp_db();
        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;
        let token = CancelToken::new();

        let (result, ()) = tokio::join!(store.refresh(&token), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        assert!(matches!(result, Err(BrokerSiteError::Cancelled)));
        let state = store.get();
        assert!(state.data.is_none());
        assert!(state.error.is_none());
        assert!(
            store
                .storage()
                .load_feed(FEED_STORAGE_KEY)
                .await
                .expect("load")
                .is_none()
        );

        let history = store.history(5).await.expect("history");
        assert_eq!(history[0].outcome, "cancelled");
        cleanup(&db);
    }

    #[tokio::test]
    async fn already_cancelled_token_makes_no_request() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(fixture()))
            .expect(0)
            .mount(&server)
            .await;

        let db = temp_db();
        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;
        let token = CancelToken::new();
        token.cancel();

        assert!(matches!(
            store.refresh(&token).await,
            Err(BrokerSiteError::Cancelled)
        ));
        cleanup(&db);
    }

    #[tokio::test]
    async fn identical_refetch_is_logged_unchanged() {
        let server = wiremock::MockServer::start().await;
        mount_fixture(&server).await;
        let db = temp_db();
        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;

        let token = CancelToken::new();
        store.refresh(&token).await.expect("first");
        store.refresh(&token).await.expect("second");

        let history = store.history(10).await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].outcome, "unchanged");
        assert_eq!(history[1].outcome, "updated");
        assert_eq!(history[0].content_hash, history[1].content_hash);
        cleanup(&db);
    }

    fn feed_with_unknown_icon() -> serde_json::Value {
        let mut feed = fixture_feed();
        feed.services.items.push(ServiceItem {
            id: "crypto-loans".into(),
            title: "Crypto Loans".into(),
            description: String::new(),
            icon: "rocket-icon".into(),
        });
        serde_json::json!({ "status": "success", "message": "", "data": feed })
    }

    #[tokio::test]
    async fn strict_icons_rejects_unknown_keys() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/feeds"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(feed_with_unknown_icon()))
            .mount(&server)
            .await;

        let db = temp_db();
        let options = StoreOptions {
            strict_icons: true,
            ..StoreOptions::default()
        };
        let store = store_at(&server.uri(), &db, options).await;

        let err = store.refresh(&CancelToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("rocket-icon"));
        assert!(store.get().data.is_none());
        assert!(!store.get().loading);
        cleanup(&db);
    }

    #[tokio::test]
    async fn strict_icons_accepts_registered_custom_icon() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/feeds"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(feed_with_unknown_icon()))
            .mount(&server)
            .await;

        let mut icons = IconRegistry::new();
        icons
            .register(Box::new(crate::icons::PathIcon {
                key: "rocket-icon",
                label: "Rocket",
                path: "M12 2l4 8h-8z",
            }))
            .expect("register rocket");

        let db = temp_db();
        let options = StoreOptions {
            strict_icons: true,
            ..StoreOptions::default()
        };
        let store = store_at(&server.uri(), &db, options).await.with_icons(icons);
        assert!(store.icons().contains("rocket-icon"));

        let feed = store.refresh(&CancelToken::new()).await.expect("refresh");
        assert!(feed.service("crypto-loans").is_some());
        assert!(store.get().error.is_none());
        cleanup(&db);
    }

    #[tokio::test]
    async fn lenient_icons_accepts_unknown_keys() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/feeds"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(feed_with_unknown_icon()))
            .mount(&server)
            .await;

        let db = temp_db();
        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;

        let feed = store.refresh(&CancelToken::new()).await.expect("refresh");
        assert!(feed.service("crypto-loans").is_some());
        cleanup(&db);
    }

    #[tokio::test]
    async fn subscribers_see_new_feed() {
        let server = wiremock::MockServer::start().await;
        mount_fixture(&server).await;
        let db = temp_db();
        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;

        let mut rx = store.subscribe();
        store.refresh(&CancelToken::new()).await.expect("refresh");

        rx.changed().await.expect("changed");
        assert!(rx.borrow().data.is_some());
        cleanup(&db);
    }

    #[tokio::test]
    async fn polling_refreshes_until_cancelled() {
        let server = wiremock::MockServer::start().await;
        mount_fixture(&server).await;
        let db = temp_db();
        let options = StoreOptions {
            refetch_interval: Duration::from_millis(50),
            ..StoreOptions::default()
        };
        let store = Arc::new(store_at(&server.uri(), &db, options).await);

        let token = CancelToken::new();
        let handle = Arc::clone(&store).start(&token);

        tokio::time::sleep(Duration::from_millis(180)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("task stopped")
            .expect("task joined");

        let requests = server.received_requests().await.expect("recording");
        assert!(requests.len() >= 2, "got {} requests", requests.len());
        assert!(store.get().data.is_some());

        let settled = requests.len();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let requests = server.received_requests().await.expect("recording");
        assert_eq!(requests.len(), settled);
        cleanup(&db);
    }

    #[tokio::test]
    async fn clear_removes_mirror_only() {
        let server = wiremock::MockServer::start().await;
        mount_fixture(&server).await;
        let db = temp_db();
        let store = store_at(&server.uri(), &db, StoreOptions::default()).await;

        store.refresh(&CancelToken::new()).await.expect("refresh");
        assert!(store.clear().await.expect("clear"));
        assert!(!store.clear().await.expect("clear again"));
        assert!(store.get().data.is_some());
        cleanup(&db);
    }
}
