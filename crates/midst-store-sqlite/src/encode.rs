//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Tiers use their canonical
//! upper-case names and statuses the provider's own strings.

use chrono::{DateTime, Utc};
use midst_core::{
  subscription::{ProfileId, SubscriptionRecord, SubscriptionStatus},
  tier::Tier,
};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tier ────────────────────────────────────────────────────────────────────

pub fn encode_tier(t: Tier) -> &'static str { t.into() }

pub fn decode_tier(s: &str) -> Result<Tier> {
  match s {
    "FREE" => Ok(Tier::Free),
    "PRO" => Ok(Tier::Pro),
    "ENTERPRISE" => Ok(Tier::Enterprise),
    other => Err(Error::Malformed {
      column: "tier",
      value:  other.to_owned(),
    }),
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: &SubscriptionStatus) -> Result<String> {
  s.validate()?;
  Ok(s.as_str().to_owned())
}

pub fn decode_status(s: &str) -> Result<SubscriptionStatus> {
  SubscriptionStatus::parse(s).map_err(|_| Error::Malformed {
    column: "status",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const RECORD_COLUMNS: &str =
  "profile_id, tier, status, cancel_at, created_at, updated_at";

/// Raw strings read directly from a `subscriptions` row.
pub struct RawRecord {
  pub profile_id: String,
  pub tier:       String,
  pub status:     String,
  pub cancel_at:  Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawRecord {
  /// Map a row selected with [`RECORD_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id: row.get(0)?,
      tier:       row.get(1)?,
      status:     row.get(2)?,
      cancel_at:  row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<SubscriptionRecord> {
    Ok(SubscriptionRecord {
      profile_id: ProfileId::new(self.profile_id),
      tier:       decode_tier(&self.tier)?,
      status:     decode_status(&self.status)?,
      cancel_at:  self.cancel_at.as_deref().map(decode_dt).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
