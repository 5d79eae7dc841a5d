//! [`SqliteStore`] — the SQLite implementation of [`SubscriptionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};

use midst_core::{
  store::SubscriptionStore,
  subscription::{NewSubscription, ProfileId, SubscriptionRecord, SubscriptionUpdate},
  tier::Tier,
};

use crate::{
  Error, Result,
  encode::{RECORD_COLUMNS, RawRecord, encode_dt, encode_status, encode_tier},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subscription store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT` over [`RECORD_COLUMNS`] with a single optional text
  /// parameter and decode every row.
  async fn select_records(
    &self,
    filter: &'static str,
    param: Option<String>,
  ) -> Result<Vec<SubscriptionRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {RECORD_COLUMNS} FROM subscriptions {filter} ORDER BY profile_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
          Some(p) => stmt
            .query_map(rusqlite::params![p], RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = Error;

  async fn get_by_profile_id(
    &self,
    profile_id: &ProfileId,
  ) -> Result<Option<SubscriptionRecord>> {
    let id_str = profile_id.as_str().to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RECORD_COLUMNS} FROM subscriptions WHERE profile_id = ?1"
              ),
              rusqlite::params![id_str],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn update(
    &self,
    profile_id: &ProfileId,
    update: SubscriptionUpdate,
  ) -> Result<Option<SubscriptionRecord>> {
    // Build the SET clause from the fields actually present.
    let mut sets: Vec<&'static str> = vec![];
    let mut values: Vec<Value> = vec![];
    if let Some(tier) = update.tier {
      sets.push("tier = ?");
      values.push(Value::Text(encode_tier(tier).to_owned()));
    }
    if let Some(status) = &update.status {
      sets.push("status = ?");
      values.push(Value::Text(encode_status(status)?));
    }
    if let Some(cancel_at) = update.cancel_at {
      sets.push("cancel_at = ?");
      values.push(match cancel_at {
        Some(at) => Value::Text(encode_dt(at)),
        None => Value::Null,
      });
    }
    sets.push("updated_at = ?");
    values.push(Value::Text(encode_dt(Utc::now())));
    values.push(Value::Text(profile_id.as_str().to_owned()));

    let sql = format!(
      "UPDATE subscriptions SET {} WHERE profile_id = ?",
      sets.join(", ")
    );
    let id_str = profile_id.as_str().to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(&sql, rusqlite::params_from_iter(values))?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {RECORD_COLUMNS} FROM subscriptions WHERE profile_id = ?1"),
          rusqlite::params![id_str],
          RawRecord::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn get_by_tier(&self, tier: Tier) -> Result<Vec<SubscriptionRecord>> {
    self
      .select_records("WHERE tier = ?1", Some(encode_tier(tier).to_owned()))
      .await
  }

  async fn create(&self, input: NewSubscription) -> Result<SubscriptionRecord> {
    let status_str = encode_status(&input.status)?;
    let now = Utc::now();
    let record = SubscriptionRecord {
      profile_id: input.profile_id,
      tier:       input.tier,
      status:     input.status,
      cancel_at:  input.cancel_at,
      created_at: now,
      updated_at: now,
    };

    let id_str        = record.profile_id.as_str().to_owned();
    let tier_str      = encode_tier(record.tier).to_owned();
    let cancel_at_str = record.cancel_at.map(encode_dt);
    let at_str        = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO subscriptions (
             profile_id, tier, status, cancel_at, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
           ON CONFLICT (profile_id) DO NOTHING",
          rusqlite::params![id_str, tier_str, status_str, cancel_at_str, at_str],
        )?;
        Ok(n)
      })
      .await?;

    if inserted == 0 {
      return Err(midst_core::Error::SubscriptionExists(record.profile_id).into());
    }
    Ok(record)
  }

  async fn list(&self) -> Result<Vec<SubscriptionRecord>> {
    self.select_records("", None).await
  }
}
