//! Handlers for `/profiles/:id/...` — the read path used for feature gating.
//!
//! None of these fail on storage errors; resolution falls back to `FREE`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profiles/:id/tier` | `{"profile_id","tier"}` |
//! | `GET`  | `/profiles/:id/entitlement` | Tier plus the basis it was granted on |
//! | `GET`  | `/profiles/:id/features/:feature` | 400 if the feature is unknown |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use midst_core::{
  EntitlementResolver,
  clock::Clock,
  policy::Entitlement,
  resolver::FeatureCheck,
  store::SubscriptionStore,
  subscription::ProfileId,
  tier::{Feature, Tier},
};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct TierResponse {
  pub profile_id: ProfileId,
  pub tier:       Tier,
}

/// `GET /profiles/:id/tier`
pub async fn tier<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Path(profile_id): Path<ProfileId>,
) -> Json<TierResponse>
where
  S: SubscriptionStore,
  C: Clock,
{
  let tier = resolver.resolve_tier(&profile_id).await;
  Json(TierResponse { profile_id, tier })
}

/// `GET /profiles/:id/entitlement`
pub async fn entitlement<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Path(profile_id): Path<ProfileId>,
) -> Json<Entitlement>
where
  S: SubscriptionStore,
  C: Clock,
{
  Json(resolver.resolve(&profile_id).await)
}

/// `GET /profiles/:id/features/:feature`
pub async fn feature<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Path((profile_id, feature)): Path<(ProfileId, String)>,
) -> Result<Json<FeatureCheck>, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  let feature = Feature::parse(&feature)?;
  Ok(Json(resolver.check_feature(&profile_id, feature).await))
}
