//! [`EntitlementResolver`] — answers "what tier is this profile entitled to
//! right now?" and applies tier changes on behalf of billing-event handling.
//!
//! The two paths fail differently. Reads never fail: any lookup error is
//! logged and resolved to [`Tier::Free`]. Writes always report failure, and
//! a missing record ([`Error::SubscriptionNotFound`]) is distinct from a
//! backend failure ([`Error::Store`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  clock::{Clock, SystemClock},
  policy::{self, Entitlement, EntitlementBasis},
  store::SubscriptionStore,
  subscription::{ProfileId, SubscriptionRecord, SubscriptionStatus, TierChange},
  tier::{Feature, Tier},
};

/// The result of gating a single feature for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCheck {
  pub feature:       Feature,
  pub allowed:       bool,
  pub tier:          Tier,
  pub required_tier: Tier,
}

pub struct EntitlementResolver<S, C = SystemClock> {
  store: Arc<S>,
  clock: C,
}

impl<S> EntitlementResolver<S>
where
  S: SubscriptionStore,
{
  pub fn new(store: Arc<S>) -> Self { Self { store, clock: SystemClock } }
}

impl<S, C> EntitlementResolver<S, C>
where
  S: SubscriptionStore,
  C: Clock,
{
  pub fn with_clock(store: Arc<S>, clock: C) -> Self { Self { store, clock } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn clock(&self) -> &C { &self.clock }

  // ── Read path ─────────────────────────────────────────────────────────────

  /// The tier `profile_id` is entitled to now. Never fails.
  pub async fn resolve_tier(&self, profile_id: &ProfileId) -> Tier {
    self.resolve(profile_id).await.tier
  }

  /// Like [`resolve_tier`](Self::resolve_tier), but also reports why.
  pub async fn resolve(&self, profile_id: &ProfileId) -> Entitlement {
    let lookup = self.store.get_by_profile_id(profile_id).await;
    let now = self.clock.now();

    let (tier, basis) = match lookup {
      Ok(record) => policy::evaluate(record.as_ref(), now),
      Err(e) => {
        tracing::warn!(
          profile_id = %profile_id,
          error = %e,
          "subscription lookup failed; resolving to free tier"
        );
        (Tier::Free, EntitlementBasis::LookupFailed)
      }
    };

    tracing::debug!(profile_id = %profile_id, %tier, ?basis, "resolved entitlement");

    Entitlement {
      profile_id: profile_id.clone(),
      tier,
      basis,
      resolved_at: now,
    }
  }

  /// Gate `feature` on the profile's resolved tier. Inherits the fail-safe
  /// behaviour of [`resolve_tier`](Self::resolve_tier).
  pub async fn check_feature(
    &self,
    profile_id: &ProfileId,
    feature: Feature,
  ) -> FeatureCheck {
    let tier = self.resolve_tier(profile_id).await;
    FeatureCheck {
      feature,
      allowed: tier.unlocks(feature),
      tier,
      required_tier: feature.min_tier(),
    }
  }

  // ── Write path ────────────────────────────────────────────────────────────

  /// Overwrite the stored tier, and the status if one is given.
  ///
  /// Fails with [`Error::SubscriptionNotFound`] if the profile has no record;
  /// no record is created. Backend failures propagate as [`Error::Store`].
  pub async fn update_tier(
    &self,
    profile_id: &ProfileId,
    tier: Tier,
    status: Option<SubscriptionStatus>,
  ) -> Result<SubscriptionRecord> {
    let change = TierChange { tier, status };
    let updated = self
      .store
      .update(profile_id, change.into())
      .await
      .map_err(Into::<Error>::into)?
      .ok_or_else(|| Error::SubscriptionNotFound(profile_id.clone()))?;

    tracing::info!(
      profile_id = %profile_id,
      tier = %updated.tier,
      status = %updated.status,
      "updated subscription tier"
    );
    Ok(updated)
  }

  /// `update_tier(profile_id, Tier::Free, None)`.
  pub async fn downgrade_to_free(
    &self,
    profile_id: &ProfileId,
  ) -> Result<SubscriptionRecord> {
    self.update_tier(profile_id, Tier::Free, None).await
  }
}

impl<S, C: Clone> Clone for EntitlementResolver<S, C> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      clock: self.clock.clone(),
    }
  }
}

impl<S, C> std::fmt::Debug for EntitlementResolver<S, C> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EntitlementResolver").finish_non_exhaustive()
  }
}
