//! [`MemoryStore`] — an in-process [`SubscriptionStore`].
//!
//! Holds every record in a `BTreeMap` behind a `RwLock`. Useful for tests and
//! for running the API without a database file.

use std::{
  collections::BTreeMap,
  sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;

use crate::{
  Error, Result,
  store::SubscriptionStore,
  subscription::{NewSubscription, ProfileId, SubscriptionRecord, SubscriptionUpdate},
  tier::Tier,
};

/// Cloning is cheap — clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  records: Arc<RwLock<BTreeMap<ProfileId, SubscriptionRecord>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.read().len() }

  pub fn is_empty(&self) -> bool { self.read().is_empty() }

  // A panic while holding the lock cannot leave a record half-written, so a
  // poisoned lock is still safe to use.
  fn read(&self) -> RwLockReadGuard<'_, BTreeMap<ProfileId, SubscriptionRecord>> {
    self.records.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<ProfileId, SubscriptionRecord>> {
    self.records.write().unwrap_or_else(|e| e.into_inner())
  }
}

impl SubscriptionStore for MemoryStore {
  type Error = Error;

  async fn get_by_profile_id(
    &self,
    profile_id: &ProfileId,
  ) -> Result<Option<SubscriptionRecord>> {
    Ok(self.read().get(profile_id).cloned())
  }

  async fn update(
    &self,
    profile_id: &ProfileId,
    update: SubscriptionUpdate,
  ) -> Result<Option<SubscriptionRecord>> {
    if let Some(status) = &update.status {
      status.validate()?;
    }
    let mut records = self.write();
    let Some(record) = records.get_mut(profile_id) else {
      return Ok(None);
    };
    record.apply(update);
    record.updated_at = Utc::now();
    Ok(Some(record.clone()))
  }

  async fn get_by_tier(&self, tier: Tier) -> Result<Vec<SubscriptionRecord>> {
    Ok(
      self
        .read()
        .values()
        .filter(|r| r.tier == tier)
        .cloned()
        .collect(),
    )
  }

  async fn create(&self, input: NewSubscription) -> Result<SubscriptionRecord> {
    input.status.validate()?;
    let mut records = self.write();
    if records.contains_key(&input.profile_id) {
      return Err(Error::SubscriptionExists(input.profile_id));
    }

    let now = Utc::now();
    let record = SubscriptionRecord {
      profile_id: input.profile_id,
      tier:       input.tier,
      status:     input.status,
      cancel_at:  input.cancel_at,
      created_at: now,
      updated_at: now,
    };
    records.insert(record.profile_id.clone(), record.clone());
    Ok(record)
  }

  async fn list(&self) -> Result<Vec<SubscriptionRecord>> {
    Ok(self.read().values().cloned().collect())
  }
}
