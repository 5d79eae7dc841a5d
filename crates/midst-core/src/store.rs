//! The `SubscriptionStore` trait: the narrow repository contract the resolver
//! consumes.
//!
//! The trait is implemented by storage backends (e.g. `midst-store-sqlite`,
//! or [`MemoryStore`](crate::memory::MemoryStore) for tests). Higher layers
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  subscription::{NewSubscription, ProfileId, SubscriptionRecord, SubscriptionUpdate},
  tier::Tier,
};

/// Abstraction over a subscription repository.
///
/// Backend errors must convert into [`crate::Error`]; backends map their own
/// "already exists" condition to [`crate::Error::SubscriptionExists`] and wrap
/// everything else as [`crate::Error::Store`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  /// Retrieve the record for `profile_id`. Returns `None` if there is none.
  fn get_by_profile_id<'a>(
    &'a self,
    profile_id: &'a ProfileId,
  ) -> impl Future<Output = Result<Option<SubscriptionRecord>, Self::Error>> + Send + 'a;

  /// Apply a partial update and return the updated record.
  ///
  /// Returns `None`, and writes nothing, when no record exists for
  /// `profile_id`. Concurrent updates are last-write-wins.
  fn update<'a>(
    &'a self,
    profile_id: &'a ProfileId,
    update: SubscriptionUpdate,
  ) -> impl Future<Output = Result<Option<SubscriptionRecord>, Self::Error>> + Send + 'a;

  /// All records currently stored at `tier`, ordered by profile id.
  fn get_by_tier(
    &self,
    tier: Tier,
  ) -> impl Future<Output = Result<Vec<SubscriptionRecord>, Self::Error>> + Send + '_;

  /// Persist a new record. Fails if one already exists for the profile.
  fn create(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<SubscriptionRecord, Self::Error>> + Send + '_;

  /// All records, ordered by profile id.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<SubscriptionRecord>, Self::Error>> + Send + '_;
}
