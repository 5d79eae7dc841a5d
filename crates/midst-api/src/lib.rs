//! JSON REST API for midst entitlements.
//!
//! Exposes an axum [`Router`] backed by an [`EntitlementResolver`] over any
//! [`SubscriptionStore`]. Auth, TLS, and webhook signature verification are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", midst_api::api_router(resolver))
//! ```

pub mod entitlements;
pub mod error;
pub mod extract;
pub mod subscriptions;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post, put},
};
use midst_core::{EntitlementResolver, clock::Clock, store::SubscriptionStore};
use serde_json::{Value, json};

pub use error::ApiError;

/// Build a fully-materialised API router for `resolver`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(resolver: EntitlementResolver<S, C>) -> Router<()>
where
  S: SubscriptionStore + 'static,
  C: Clock + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Entitlement reads
    .route("/profiles/{id}/tier", get(entitlements::tier::<S, C>))
    .route("/profiles/{id}/entitlement", get(entitlements::entitlement::<S, C>))
    .route(
      "/profiles/{id}/features/{feature}",
      get(entitlements::feature::<S, C>),
    )
    // Subscriptions
    .route(
      "/subscriptions",
      get(subscriptions::list::<S, C>).post(subscriptions::create::<S, C>),
    )
    .route("/subscriptions/{id}", get(subscriptions::get_one::<S, C>))
    .route("/subscriptions/{id}/tier", put(subscriptions::update_tier::<S, C>))
    .route(
      "/subscriptions/{id}/downgrade",
      post(subscriptions::downgrade::<S, C>),
    )
    .route(
      "/subscriptions/{id}/cancellation",
      put(subscriptions::schedule_cancellation::<S, C>)
        .delete(subscriptions::clear_cancellation::<S, C>),
    )
    .with_state(Arc::new(resolver))
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::{DateTime, Duration, TimeZone as _, Utc};
  use midst_core::{
    EntitlementResolver,
    clock::{Clock, ManualClock},
    store::SubscriptionStore,
    subscription::{
      NewSubscription, ProfileId, SubscriptionRecord, SubscriptionStatus,
      SubscriptionUpdate,
    },
    tier::Tier,
  };
  use midst_store_sqlite::SqliteStore;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::api_router;

  fn start() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap() }

  async fn make_resolver() -> (EntitlementResolver<SqliteStore, ManualClock>, ManualClock) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let clock = ManualClock::new(start());
    (EntitlementResolver::with_clock(Arc::new(store), clock.clone()), clock)
  }

  async fn oneshot_json<S, C>(
    resolver: &EntitlementResolver<S, C>,
    method:   &str,
    uri:      &str,
    body:     Option<Value>,
  ) -> (StatusCode, Value)
  where
    S: SubscriptionStore + 'static,
    C: Clock + Clone + 'static,
  {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(resolver.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  /// A backend that refuses every call.
  struct UnavailableStore;

  #[derive(Debug, thiserror::Error)]
  #[error("connection refused")]
  struct Unavailable;

  impl From<Unavailable> for midst_core::Error {
    fn from(e: Unavailable) -> Self { midst_core::Error::store(e) }
  }

  impl SubscriptionStore for UnavailableStore {
    type Error = Unavailable;

    async fn get_by_profile_id(
      &self,
      _: &ProfileId,
    ) -> Result<Option<SubscriptionRecord>, Unavailable> {
      Err(Unavailable)
    }

    async fn update(
      &self,
      _: &ProfileId,
      _: SubscriptionUpdate,
    ) -> Result<Option<SubscriptionRecord>, Unavailable> {
      Err(Unavailable)
    }

    async fn get_by_tier(&self, _: Tier) -> Result<Vec<SubscriptionRecord>, Unavailable> {
      Err(Unavailable)
    }

    async fn create(&self, _: NewSubscription) -> Result<SubscriptionRecord, Unavailable> {
      Err(Unavailable)
    }

    async fn list(&self) -> Result<Vec<SubscriptionRecord>, Unavailable> {
      Err(Unavailable)
    }
  }

  // ── Health ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_is_ok() {
    let (r, _) = make_resolver().await;
    let (status, body) = oneshot_json(&r, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  // ── Read path ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_profile_is_free() {
    let (r, _) = make_resolver().await;
    let (status, body) = oneshot_json(&r, "GET", "/profiles/nobody/tier", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile_id"], "nobody");
    assert_eq!(body["tier"], "FREE");

    let (_, body) = oneshot_json(&r, "GET", "/profiles/nobody/entitlement", None).await;
    assert_eq!(body["basis"], "no_subscription");
  }

  #[tokio::test]
  async fn feature_check_reports_required_tier() {
    let (r, _) = make_resolver().await;
    r.store()
      .create(NewSubscription::new("p", Tier::Pro))
      .await
      .unwrap();

    let (status, body) =
      oneshot_json(&r, "GET", "/profiles/p/features/analytics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);

    let (_, body) =
      oneshot_json(&r, "GET", "/profiles/p/features/team_workspaces", None).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["required_tier"], "ENTERPRISE");

    let (status, body) =
      oneshot_json(&r, "GET", "/profiles/p/features/teleport", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("teleport"));
  }

  // ── Write path ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_tier_on_missing_profile_returns_404_and_creates_nothing() {
    let (r, _) = make_resolver().await;
    let (status, body) = oneshot_json(
      &r,
      "PUT",
      "/subscriptions/p1/tier",
      Some(serde_json::json!({ "tier": "PRO", "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = oneshot_json(&r, "GET", "/subscriptions/p1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn create_twice_conflicts() {
    let (r, _) = make_resolver().await;
    let body = serde_json::json!({ "profile_id": "p", "tier": "PRO", "status": "trialing" });

    let (status, created) =
      oneshot_json(&r, "POST", "/subscriptions", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "trialing");
    assert!(created["cancel_at"].is_null());

    let (status, _) = oneshot_json(&r, "POST", "/subscriptions", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn update_and_downgrade() {
    let (r, _) = make_resolver().await;
    r.store()
      .create(NewSubscription::new("p", Tier::Free))
      .await
      .unwrap();

    let (status, body) = oneshot_json(
      &r,
      "PUT",
      "/subscriptions/p/tier",
      Some(serde_json::json!({ "tier": "ENTERPRISE", "status": "past_due" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "ENTERPRISE");
    assert_eq!(body["status"], "past_due");

    let (_, body) = oneshot_json(&r, "GET", "/profiles/p/tier", None).await;
    assert_eq!(body["tier"], "ENTERPRISE");

    for _ in 0..2 {
      let (status, body) =
        oneshot_json(&r, "POST", "/subscriptions/p/downgrade", None).await;
      assert_eq!(status, StatusCode::OK);
      assert_eq!(body["tier"], "FREE");
    }
  }

  #[tokio::test]
  async fn list_filters_by_tier() {
    let (r, _) = make_resolver().await;
    for (id, tier) in [("a", Tier::Pro), ("b", Tier::Free), ("c", Tier::Pro)] {
      r.store().create(NewSubscription::new(id, tier)).await.unwrap();
    }

    let (_, all) = oneshot_json(&r, "GET", "/subscriptions", None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (status, pro) = oneshot_json(&r, "GET", "/subscriptions?tier=pro", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = pro
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["profile_id"].as_str().unwrap().to_owned())
      .collect();
    assert_eq!(ids, ["a", "c"]);

    let (status, _) = oneshot_json(&r, "GET", "/subscriptions?tier=gold", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn tier_in_body_is_case_insensitive() {
    let (r, _) = make_resolver().await;
    let (status, body) = oneshot_json(
      &r,
      "POST",
      "/subscriptions",
      Some(serde_json::json!({ "profile_id": "q", "tier": "pro" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tier"], "PRO");
    assert_eq!(body["status"], "active");

    let (status, body) = oneshot_json(
      &r,
      "PUT",
      "/subscriptions/q/tier",
      Some(serde_json::json!({ "tier": "enterprise" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "ENTERPRISE");

    let (status, body) = oneshot_json(
      &r,
      "PUT",
      "/subscriptions/q/tier",
      Some(serde_json::json!({ "tier": "platinum" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("platinum"));
  }

  #[tokio::test]
  async fn blank_status_is_rejected_on_create() {
    let (r, _) = make_resolver().await;
    r.store()
      .create(NewSubscription::new("good", Tier::Pro))
      .await
      .unwrap();

    let (status, body) = oneshot_json(
      &r,
      "POST",
      "/subscriptions",
      Some(serde_json::json!({ "profile_id": "bad", "tier": "PRO", "status": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = oneshot_json(
      &r,
      "PUT",
      "/subscriptions/good/tier",
      Some(serde_json::json!({ "tier": "PRO", "status": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, all) = oneshot_json(&r, "GET", "/subscriptions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);
    let (_, body) = oneshot_json(&r, "GET", "/profiles/bad/tier", None).await;
    assert_eq!(body["tier"], "FREE");
  }

  #[tokio::test]
  async fn store_failure_is_500_on_writes_but_free_on_reads() {
    let r = EntitlementResolver::with_clock(
      Arc::new(UnavailableStore),
      ManualClock::new(start()),
    );

    for (method, uri, body) in [
      ("PUT", "/subscriptions/p/tier", Some(serde_json::json!({ "tier": "PRO" }))),
      ("POST", "/subscriptions/p/downgrade", None),
    ] {
      let (status, body) = oneshot_json(&r, method, uri, body).await;
      assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
      assert!(
        body["error"].as_str().unwrap().contains("connection refused"),
        "{method} {uri}"
      );
    }

    let (status, body) = oneshot_json(&r, "GET", "/profiles/p/tier", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "FREE");
  }

  // ── Grace period end to end ──────────────────────────────────────────────────

  #[tokio::test]
  async fn cancellation_grace_period_then_free() {
    let (r, clock) = make_resolver().await;
    r.store()
      .create(NewSubscription::new("p1", Tier::Pro))
      .await
      .unwrap();

    let cancel_at = start() + Duration::days(5);
    let (status, body) = oneshot_json(
      &r,
      "PUT",
      "/subscriptions/p1/cancellation",
      Some(serde_json::json!({ "cancel_at": cancel_at })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "canceled");

    let (_, body) = oneshot_json(&r, "GET", "/profiles/p1/entitlement", None).await;
    assert_eq!(body["tier"], "PRO");
    assert_eq!(body["basis"], "grace_period");

    clock.advance(Duration::days(6));
    let (_, body) = oneshot_json(&r, "GET", "/profiles/p1/entitlement", None).await;
    assert_eq!(body["tier"], "FREE");
    assert_eq!(body["basis"], "cancellation_elapsed");
  }

  #[tokio::test]
  async fn reactivation_restores_tier() {
    let (r, clock) = make_resolver().await;
    r.store()
      .create(
        NewSubscription::new("p", Tier::Pro)
          .with_status(SubscriptionStatus::Canceled)
          .with_cancel_at(start() - Duration::days(1)),
      )
      .await
      .unwrap();
    let (_, body) = oneshot_json(&r, "GET", "/profiles/p/tier", None).await;
    assert_eq!(body["tier"], "FREE");

    let (status, body) =
      oneshot_json(&r, "DELETE", "/subscriptions/p/cancellation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert!(body["cancel_at"].is_null());

    clock.advance(Duration::days(30));
    let (_, body) = oneshot_json(&r, "GET", "/profiles/p/tier", None).await;
    assert_eq!(body["tier"], "PRO");

    let (status, _) =
      oneshot_json(&r, "DELETE", "/subscriptions/ghost/cancellation", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
