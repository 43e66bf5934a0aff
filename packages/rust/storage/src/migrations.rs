//! SQL migration definitions for the brokersite cache database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: kv_store, feed_fetches",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Persistent key/value mirror (the content feed lives under one key)
CREATE TABLE IF NOT EXISTS kv_store (
    key          TEXT PRIMARY KEY,
    value        TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- Feed fetch history
CREATE TABLE IF NOT EXISTS feed_fetches (
    id           TEXT PRIMARY KEY,
    fetched_at   TEXT NOT NULL,
    outcome      TEXT NOT NULL,
    content_hash TEXT,
    detail       TEXT
);

CREATE INDEX IF NOT EXISTS idx_feed_fetches_fetched_at ON feed_fetches(fetched_at);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
