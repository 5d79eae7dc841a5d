//! The entitlement policy: which tier a subscription record grants at a given
//! instant.
//!
//! Everything here is pure. I/O and clock reads happen in
//! [`EntitlementResolver`](crate::resolver::EntitlementResolver).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  subscription::{ProfileId, SubscriptionRecord, SubscriptionStatus},
  tier::Tier,
};

/// Why a profile resolved to the tier it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum EntitlementBasis {
  /// No record exists for the profile.
  NoSubscription,
  /// The stored tier is granted as-is.
  Subscribed,
  /// Canceled, but the scheduled cancellation has not taken effect yet.
  GracePeriod { until: DateTime<Utc> },
  /// Canceled and the scheduled cancellation has taken effect.
  CancellationElapsed { at: DateTime<Utc> },
  /// Canceled with no scheduled cancellation date.
  Canceled,
  /// The record could not be read; the least-privileged tier was assumed.
  LookupFailed,
}

impl EntitlementBasis {
  /// Whether the stored tier was granted (as opposed to falling back to free).
  pub fn grants_stored_tier(self) -> bool {
    matches!(self, Self::Subscribed | Self::GracePeriod { .. })
  }
}

/// The outcome of resolving a profile's entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
  pub profile_id:  ProfileId,
  pub tier:        Tier,
  #[serde(flatten)]
  pub basis:       EntitlementBasis,
  pub resolved_at: DateTime<Utc>,
}

/// Decide the tier `record` grants at `now`.
///
/// - no record → [`Tier::Free`]
/// - `canceled` with `cancel_at` in the future → stored tier
/// - `canceled` with `cancel_at` reached or absent → [`Tier::Free`]
/// - any other status, including `past_due` and unrecognised ones → stored
///   tier
pub fn evaluate(
  record: Option<&SubscriptionRecord>,
  now: DateTime<Utc>,
) -> (Tier, EntitlementBasis) {
  let Some(record) = record else {
    return (Tier::Free, EntitlementBasis::NoSubscription);
  };

  match (&record.status, record.cancel_at) {
    (SubscriptionStatus::Canceled, Some(until)) if now < until => {
      (record.tier, EntitlementBasis::GracePeriod { until })
    }
    (SubscriptionStatus::Canceled, Some(at)) => {
      (Tier::Free, EntitlementBasis::CancellationElapsed { at })
    }
    (SubscriptionStatus::Canceled, None) => (Tier::Free, EntitlementBasis::Canceled),
    _ => (record.tier, EntitlementBasis::Subscribed),
  }
}

/// Shorthand for the tier half of [`evaluate`].
pub fn entitled_tier(record: Option<&SubscriptionRecord>, now: DateTime<Utc>) -> Tier {
  evaluate(record, now).0
}
