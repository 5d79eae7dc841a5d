//! SQL schema for the midst SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS subscriptions (
    profile_id  TEXT PRIMARY KEY,
    tier        TEXT NOT NULL,   -- 'FREE' | 'PRO' | 'ENTERPRISE'
    status      TEXT NOT NULL,   -- provider vocabulary, stored verbatim
    cancel_at   TEXT,            -- ISO 8601 UTC; NULL unless a cancellation is scheduled
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subscriptions_tier_idx ON subscriptions(tier);

PRAGMA user_version = 1;
";
