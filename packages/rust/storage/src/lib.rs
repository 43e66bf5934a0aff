//! libSQL storage layer for the content feed mirror.
//!
//! The [`Storage`] struct wraps a local libSQL database holding a small
//! key/value table (the persisted ContentFeed lives under
//! [`FEED_STORAGE_KEY`](brokersite_shared::FEED_STORAGE_KEY)) and a history of
//! feed fetch attempts.
//!
//! **Access rules:**
//! - The content store: read-write via [`Storage::open`]
//! - Inspection (`feed status`): read-only via [`Storage::open_readonly`]

mod migrations;

use std::fmt;
use std::path::Path;

use brokersite_shared::{BrokerSiteError, ContentFeed, Result, content_hash};
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use uuid::Uuid;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// A persisted key/value row.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    /// Serialized JSON value.
    pub value: String,
    /// SHA-256 of `value`.
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a single feed fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetched and the content differs from what was cached.
    Updated,
    /// Fetched but identical to the cached content.
    Unchanged,
    Failed,
    Cancelled,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the fetch history.
#[derive(Debug, Clone)]
pub struct FetchRecord {
    pub id: String,
    pub fetched_at: String,
    pub outcome: String,
    pub content_hash: Option<String>,
    pub detail: Option<String>,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BrokerSiteError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        BrokerSiteError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(BrokerSiteError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Key/value operations
    // -----------------------------------------------------------------------

    /// Write `value` under `key`, replacing any previous value wholesale.
    pub async fn put_entry(&self, key: &str, value: &str) -> Result<CacheEntry> {
        self.check_writable()?;
        let hash = content_hash(value);
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, content_hash, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   content_hash = excluded.content_hash,
                   updated_at = excluded.updated_at",
                params![key, value, hash.as_str(), now.to_rfc3339()],
            )
            .await
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;

        Ok(CacheEntry {
            key: key.to_string(),
            value: value.to_string(),
            content_hash: hash,
            updated_at: now,
        })
    }

    /// Read the row stored under `key`.
    pub async fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT key, value, content_hash, updated_at FROM kv_store WHERE key = ?1",
                params![key],
            )
            .await
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_cache_entry(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(BrokerSiteError::Storage(e.to_string())),
        }
    }

    /// Remove `key`. Returns whether a row existed.
    pub async fn delete_entry(&self, key: &str) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .await
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // Typed feed mirror
    // -----------------------------------------------------------------------

    /// Serialize and persist a feed under `key`.
    pub async fn save_feed(&self, key: &str, feed: &ContentFeed) -> Result<CacheEntry> {
        let json = serde_json::to_string(feed)
            .map_err(|e| BrokerSiteError::parse(format!("failed to serialize feed: {e}")))?;
        self.put_entry(key, &json).await
    }

    /// Load the feed persisted under `key`.
    ///
    /// A row that no longer deserializes yields a `Parse` error rather than
    /// `None`, so callers can tell "never cached" from "cache is corrupt".
    pub async fn load_feed(&self, key: &str) -> Result<Option<ContentFeed>> {
        let Some(entry) = self.get_entry(key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&entry.value)
            .map(Some)
            .map_err(|e| BrokerSiteError::parse(format!("cached feed is unreadable: {e}")))
    }

    // -----------------------------------------------------------------------
    // Fetch history
    // -----------------------------------------------------------------------

    /// Append a fetch attempt to the history. Returns the generated record ID.
    pub async fn record_fetch(
        &self,
        outcome: FetchOutcome,
        hash: Option<&str>,
        detail: Option<&str>,
    ) -> Result<String> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO feed_fetches (id, fetched_at, outcome, content_hash, detail)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.as_str(), now.as_str(), outcome.as_str(), hash, detail],
            )
            .await
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// Most recent fetch attempts, newest first.
    pub async fn recent_fetches(&self, limit: u32) -> Result<Vec<FetchRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, fetched_at, outcome, content_hash, detail
                 FROM feed_fetches ORDER BY rowid DESC LIMIT ?1",
                params![i64::from(limit)],
            )
            .await
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(FetchRecord {
                id: row
                    .get::<String>(0)
                    .map_err(|e| BrokerSiteError::Storage(e.to_string()))?,
                fetched_at: row
                    .get::<String>(1)
                    .map_err(|e| BrokerSiteError::Storage(e.to_string()))?,
                outcome: row
                    .get::<String>(2)
                    .map_err(|e| BrokerSiteError::Storage(e.to_string()))?,
                content_hash: row.get::<String>(3).ok(),
                detail: row.get::<String>(4).ok(),
            });
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Row mapping helpers
// ---------------------------------------------------------------------------

fn row_to_cache_entry(row: &libsql::Row) -> Result<CacheEntry> {
    let updated_at: String = row
        .get(3)
        .map_err(|e| BrokerSiteError::Storage(e.to_string()))?;

    Ok(CacheEntry {
        key: row
            .get(0)
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?,
        value: row
            .get(1)
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?,
        content_hash: row
            .get(2)
            .map_err(|e| BrokerSiteError::Storage(e.to_string()))?,
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| BrokerSiteError::Storage(format!("invalid date: {e}")))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokersite_shared::{FEED_STORAGE_KEY, HeroSection, ServiceItem};

    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("bs_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn sample_feed() -> ContentFeed {
        let mut feed = ContentFeed {
            name: "Nepean Mortgage".into(),
            hero_section: HeroSection {
                title: "Home loans made simple".into(),
                description: "Independent broking".into(),
                banner: String::new(),
            },
            ..ContentFeed::default()
        };
        feed.services.items.push(ServiceItem {
            id: "home-loans".into(),
            title: "Home Loans".into(),
            description: "Owner-occupier loans".into(),
            icon: "homeloan-icon".into(),
        });
        feed
    }

    #[tokio::test]
    async fn open_creates_schema() {
        let storage = test_storage().await;
        assert_eq!(storage.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("bs_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn put_overwrites_wholesale() {
        let storage = test_storage().await;

        let first = storage.put_entry("k", r#"{"a":1,"b":2}"#).await.expect("put");
        let second = storage.put_entry("k", r#"{"c":3}"#).await.expect("put again");
        assert_ne!(first.content_hash, second.content_hash);

        let found = storage.get_entry("k").await.expect("get").expect("row");
        assert_eq!(found.value, r#"{"c":3}"#);
        assert_eq!(found.content_hash, second.content_hash);
    }

    #[tokio::test]
    async fn feed_roundtrip_is_identical() {
        let storage = test_storage().await;
        let feed = sample_feed();

        storage
            .save_feed(FEED_STORAGE_KEY, &feed)
            .await
            .expect("save feed");
        let loaded = storage
            .load_feed(FEED_STORAGE_KEY)
            .await
            .expect("load feed")
            .expect("feed present");

        assert_eq!(loaded, feed);
    }

    #[tokio::test]
    async fn missing_feed_is_none() {
        let storage = test_storage().await;
        let loaded = storage.load_feed(FEED_STORAGE_KEY).await.expect("load");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn corrupt_feed_is_parse_error() {
        let storage = test_storage().await;
        storage
            .put_entry(FEED_STORAGE_KEY, "{not json")
            .await
            .expect("put garbage");

        let err = storage.load_feed(FEED_STORAGE_KEY).await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Parse { .. }));
        assert!(err.to_string().contains("cached feed is unreadable"));
    }

    #[tokio::test]
    async fn delete_entry_reports_existence() {
        let storage = test_storage().await;
        storage.put_entry("k", "{}").await.expect("put");
        assert!(storage.delete_entry("k").await.expect("delete"));
        assert!(!storage.delete_entry("k").await.expect("delete again"));
        assert!(storage.get_entry("k").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn fetch_history_newest_first() {
        let storage = test_storage().await;
        storage
            .record_fetch(FetchOutcome::Updated, Some("abc"), None)
            .await
            .expect("record 1");
        storage
            .record_fetch(FetchOutcome::Failed, None, Some("HTTP error! status: 500"))
            .await
            .expect("record 2");

        let history = storage.recent_fetches(10).await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].outcome, "failed");
        assert_eq!(history[0].detail.as_deref(), Some("HTTP error! status: 500"));
        assert_eq!(history[1].outcome, "updated");
        assert_eq!(history[1].content_hash.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("bs_test_{}.db", Uuid::now_v7()));
        drop(Storage::open(&tmp).await.expect("create"));

        let ro = Storage::open_readonly(&tmp).await.expect("open ro");
        let err = ro.put_entry("k", "{}").await.unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }
}
