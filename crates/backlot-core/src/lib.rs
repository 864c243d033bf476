#![deny(missing_docs)]

//! # backlot-core — Foundational Types for BackLot
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde`, `serde_json`,
//! `thiserror`, `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`UserId`] where a [`VehicleId`] is
//!    expected, and a [`Vin`] is validated at construction.
//!
//! 2. **[`Money`] is integer cents.** Monetary values are never
//!    floating-point. Arithmetic is checked; overflow is an error, not a
//!    wrap. JSON representation is a decimal string.
//!
//! 3. **The [`Vehicle`] aggregate owns its lifecycle.** Status transitions
//!    and financial mutations go through methods that validate the current
//!    state and return [`VehicleError`] on violation. Callers never poke
//!    fields into inconsistent combinations.
//!
//! 4. **[`ValidationError`] hierarchy.** Structured errors with `thiserror`
//!    — no `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod money;
pub mod vehicle;

// Re-export primary types at crate root for ergonomic imports.
pub use error::ValidationError;
pub use identity::{
    ArbId, ConversationId, EventId, MessageId, TaskId, UserId, VehicleId,
};
pub use money::Money;
pub use vehicle::{TitleStatus, Vehicle, VehicleError, VehicleStatus, Vin};
