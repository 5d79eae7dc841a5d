//! Error types for `midst-core`.

use thiserror::Error;

use crate::subscription::ProfileId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subscription not found for profile {0}")]
  SubscriptionNotFound(ProfileId),

  #[error("subscription already exists for profile {0}")]
  SubscriptionExists(ProfileId),

  #[error("invalid tier: {0:?}")]
  InvalidTier(String),

  #[error("invalid subscription status: {0:?}")]
  InvalidStatus(String),

  #[error("unknown feature: {0:?}")]
  UnknownFeature(String),

  /// A failure reported by the storage backend, kept distinct from
  /// [`Error::SubscriptionNotFound`] so callers can tell the two apart.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::SubscriptionNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
