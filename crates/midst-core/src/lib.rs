//! Core types and trait definitions for midst entitlements.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::SubscriptionStore`]; everything that
//! decides what a profile is entitled to lives here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod memory;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod subscription;
pub mod tier;

pub use error::{Error, Result};
pub use resolver::EntitlementResolver;
