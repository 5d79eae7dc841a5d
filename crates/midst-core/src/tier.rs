//! Subscription tiers and the features they unlock.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};

use crate::{Error, Result};

// ─── Tier ────────────────────────────────────────────────────────────────────

/// An entitlement level from the billing plan catalogue.
///
/// Variants are declared from least to most privileged, so the derived
/// ordering doubles as the entitlement ordering (`Free < Pro < Enterprise`).
/// Serialised upper-case; deserialised case-insensitively via [`Tier::parse`].
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  IntoStaticStr,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Tier {
  #[default]
  Free,
  Pro,
  Enterprise,
}

impl Tier {
  /// Parse a tier name case-insensitively (`"pro"`, `"PRO"`, `"Pro"`).
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::InvalidTier(s.to_owned()))
  }

  /// Every feature available at this tier, in catalogue order.
  pub fn features(self) -> Vec<Feature> {
    Feature::iter().filter(|f| self.unlocks(*f)).collect()
  }

  pub fn unlocks(self, feature: Feature) -> bool { self >= feature.min_tier() }
}

impl TryFrom<String> for Tier {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

// ─── Feature ─────────────────────────────────────────────────────────────────

/// A gated capability of the platform.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
  /// Create and present personas.
  Masks,
  /// Messaging threads with other profiles.
  Messaging,
  /// Lifts the persona cap of the free plan.
  UnlimitedMasks,
  CustomNarratives,
  Analytics,
  VerifiedCredentials,
  TeamWorkspaces,
}

impl Feature {
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::UnknownFeature(s.to_owned()))
  }

  /// The least privileged tier that unlocks this feature.
  pub const fn min_tier(self) -> Tier {
    match self {
      Self::Masks | Self::Messaging => Tier::Free,
      Self::UnlimitedMasks | Self::CustomNarratives | Self::Analytics => {
        Tier::Pro
      }
      Self::VerifiedCredentials | Self::TeamWorkspaces => Tier::Enterprise,
    }
  }
}
