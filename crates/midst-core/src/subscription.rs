//! Subscription records and the typed partial updates that mutate them.
//!
//! Records are owned by a [`SubscriptionStore`](crate::store::SubscriptionStore).
//! The resolver reads them and mutates them only through [`TierChange`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, tier::Tier};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque identifier of a profile. No format is imposed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProfileId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ProfileId {
  fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for ProfileId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Subscription status, using the payment provider's vocabulary.
///
/// Statuses the provider may add later are preserved verbatim in
/// [`SubscriptionStatus::Other`] rather than rejected. Only a blank status is
/// refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubscriptionStatus {
  Active,
  Trialing,
  PastDue,
  Canceled,
  Incomplete,
  Other(String),
}

impl SubscriptionStatus {
  /// Parse a provider status string. Unknown values are kept as
  /// [`SubscriptionStatus::Other`]; a blank value is rejected.
  pub fn parse(s: &str) -> Result<Self> {
    let status = match s {
      "active" => Self::Active,
      "trialing" => Self::Trialing,
      "past_due" => Self::PastDue,
      "canceled" => Self::Canceled,
      "incomplete" => Self::Incomplete,
      other => Self::Other(other.to_owned()),
    };
    status.validate()?;
    Ok(status)
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Active => "active",
      Self::Trialing => "trialing",
      Self::PastDue => "past_due",
      Self::Canceled => "canceled",
      Self::Incomplete => "incomplete",
      Self::Other(s) => s,
    }
  }

  pub fn is_canceled(&self) -> bool { matches!(self, Self::Canceled) }

  /// Stores call this before writing, so a hand-built `Other("")` is refused
  /// the same way a deserialised one is.
  pub fn validate(&self) -> Result<()> {
    if self.as_str().trim().is_empty() {
      return Err(Error::InvalidStatus(self.as_str().to_owned()));
    }
    Ok(())
  }
}

impl TryFrom<String> for SubscriptionStatus {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<SubscriptionStatus> for String {
  fn from(s: SubscriptionStatus) -> Self {
    match s {
      SubscriptionStatus::Other(s) => s,
      known => known.as_str().to_owned(),
    }
  }
}

impl fmt::Display for SubscriptionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The stored subscription state of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
  pub profile_id: ProfileId,
  pub tier:       Tier,
  pub status:     SubscriptionStatus,
  /// Present only while a cancellation is scheduled but not yet effective.
  pub cancel_at:  Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
  /// Apply `update` in place. `updated_at` is left to the caller.
  pub fn apply(&mut self, update: SubscriptionUpdate) {
    if let Some(tier) = update.tier {
      self.tier = tier;
    }
    if let Some(status) = update.status {
      self.status = status;
    }
    if let Some(cancel_at) = update.cancel_at {
      self.cancel_at = cancel_at;
    }
  }
}

/// Input to [`SubscriptionStore::create`](crate::store::SubscriptionStore::create).
/// Timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
  pub profile_id: ProfileId,
  pub tier:       Tier,
  #[serde(default = "active")]
  pub status:     SubscriptionStatus,
  #[serde(default)]
  pub cancel_at:  Option<DateTime<Utc>>,
}

fn active() -> SubscriptionStatus { SubscriptionStatus::Active }

impl NewSubscription {
  pub fn new(profile_id: impl Into<ProfileId>, tier: Tier) -> Self {
    Self {
      profile_id: profile_id.into(),
      tier,
      status: SubscriptionStatus::Active,
      cancel_at: None,
    }
  }

  pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
    self.status = status;
    self
  }

  pub fn with_cancel_at(mut self, at: DateTime<Utc>) -> Self {
    self.cancel_at = Some(at);
    self
  }
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// A repository-level partial update. `None` leaves a field untouched.
///
/// `cancel_at` is doubly optional: `Some(None)` clears a scheduled
/// cancellation, `Some(Some(t))` schedules one at `t`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionUpdate {
  pub tier:      Option<Tier>,
  pub status:    Option<SubscriptionStatus>,
  pub cancel_at: Option<Option<DateTime<Utc>>>,
}

impl SubscriptionUpdate {
  /// Mark the subscription canceled, effective at `at`.
  pub fn schedule_cancellation(at: DateTime<Utc>) -> Self {
    Self {
      tier:      None,
      status:    Some(SubscriptionStatus::Canceled),
      cancel_at: Some(Some(at)),
    }
  }

  /// Drop any scheduled cancellation and return the subscription to active.
  pub fn reactivate() -> Self {
    Self {
      tier:      None,
      status:    Some(SubscriptionStatus::Active),
      cancel_at: Some(None),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.tier.is_none() && self.status.is_none() && self.cancel_at.is_none()
  }
}

/// The only mutation the resolver performs: a new tier, optionally with a new
/// status. It cannot touch `cancel_at` or any other field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
  pub tier:   Tier,
  #[serde(default)]
  pub status: Option<SubscriptionStatus>,
}

impl From<TierChange> for SubscriptionUpdate {
  fn from(change: TierChange) -> Self {
    Self {
      tier:      Some(change.tier),
      status:    change.status,
      cancel_at: None,
    }
  }
}
