//! Handlers for `/subscriptions` endpoints — the write path driven by
//! billing-event handling, plus reporting reads.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subscriptions` | Optional `?tier=FREE\|PRO\|ENTERPRISE` |
//! | `POST`   | `/subscriptions` | Body: [`NewSubscription`]; 201, or 409 if one exists |
//! | `GET`    | `/subscriptions/:id` | 404 if not found |
//! | `PUT`    | `/subscriptions/:id/tier` | Body: `{"tier":"PRO","status":"active"}` |
//! | `POST`   | `/subscriptions/:id/downgrade` | Back to `FREE` |
//! | `PUT`    | `/subscriptions/:id/cancellation` | Body: `{"cancel_at":"..."}` |
//! | `DELETE` | `/subscriptions/:id/cancellation` | Reactivate |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use midst_core::{
  EntitlementResolver,
  clock::Clock,
  store::SubscriptionStore,
  subscription::{
    NewSubscription, ProfileId, SubscriptionRecord, SubscriptionUpdate, TierChange,
  },
  tier::Tier,
};
use serde::Deserialize;

use crate::{error::ApiError, extract::ApiJson};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Parsed case-insensitively; 400 on an unknown tier.
  pub tier: Option<String>,
}

/// `GET /subscriptions[?tier=<tier>]`
pub async fn list<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SubscriptionRecord>>, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  let records = match params.tier.as_deref().map(Tier::parse).transpose()? {
    Some(tier) => resolver.store().get_by_tier(tier).await,
    None => resolver.store().list().await,
  }
  .map_err(ApiError::from_store)?;
  Ok(Json(records))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subscriptions` — returns 201 + the stored record.
pub async fn create<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  ApiJson(body): ApiJson<NewSubscription>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  let record = resolver
    .store()
    .create(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subscriptions/:id`
pub async fn get_one<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Path(profile_id): Path<ProfileId>,
) -> Result<Json<SubscriptionRecord>, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  let record = resolver
    .store()
    .get_by_profile_id(&profile_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("subscription {profile_id} not found")))?;
  Ok(Json(record))
}

// ─── Tier changes ─────────────────────────────────────────────────────────────

/// `PUT /subscriptions/:id/tier` — body: [`TierChange`].
pub async fn update_tier<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Path(profile_id): Path<ProfileId>,
  ApiJson(body): ApiJson<TierChange>,
) -> Result<Json<SubscriptionRecord>, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  let record = resolver
    .update_tier(&profile_id, body.tier, body.status)
    .await?;
  Ok(Json(record))
}

/// `POST /subscriptions/:id/downgrade`
pub async fn downgrade<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Path(profile_id): Path<ProfileId>,
) -> Result<Json<SubscriptionRecord>, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  Ok(Json(resolver.downgrade_to_free(&profile_id).await?))
}

// ─── Cancellation ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CancellationBody {
  pub cancel_at: DateTime<Utc>,
}

/// `PUT /subscriptions/:id/cancellation` — marks the subscription canceled,
/// effective at `cancel_at`.
pub async fn schedule_cancellation<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Path(profile_id): Path<ProfileId>,
  ApiJson(body): ApiJson<CancellationBody>,
) -> Result<Json<SubscriptionRecord>, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  apply(
    &resolver,
    &profile_id,
    SubscriptionUpdate::schedule_cancellation(body.cancel_at),
  )
  .await
  .map(Json)
}

/// `DELETE /subscriptions/:id/cancellation`
pub async fn clear_cancellation<S, C>(
  State(resolver): State<Arc<EntitlementResolver<S, C>>>,
  Path(profile_id): Path<ProfileId>,
) -> Result<Json<SubscriptionRecord>, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  apply(&resolver, &profile_id, SubscriptionUpdate::reactivate())
    .await
    .map(Json)
}

async fn apply<S, C>(
  resolver: &EntitlementResolver<S, C>,
  profile_id: &ProfileId,
  update: SubscriptionUpdate,
) -> Result<SubscriptionRecord, ApiError>
where
  S: SubscriptionStore,
  C: Clock,
{
  let record = resolver
    .store()
    .update(profile_id, update)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("subscription {profile_id} not found")))?;

  tracing::info!(
    profile_id = %profile_id,
    status = %record.status,
    cancel_at = ?record.cancel_at,
    "updated subscription cancellation"
  );
  Ok(record)
}
