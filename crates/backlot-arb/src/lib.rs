//! # backlot-arb — Arbitration Workflow
//!
//! The arbitration (ARB) domain: dispute cases opened against vehicles,
//! either because a buyer contests a completed sale (Sold ARB) or because
//! an inventory vehicle fails inspection or assessment (Inventory ARB).
//!
//! - **Error** ([`error`]): Structured error hierarchy for the arbitration
//!   subsystem.
//!
//! - **Case** ([`case`]): The [`ArbCase`] record, the [`ArbType`] /
//!   [`ArbOutcome`] enums, and the allowed-outcome table. A case's outcome
//!   moves Pending → terminal exactly once; re-arbitration opens a new case.
//!
//! - **Outcome** ([`outcome`]): [`OutcomeDecision`] — the validated form of
//!   a submitted outcome. Constructing one enforces the per-branch
//!   required-field rules, so the processor only ever sees well-formed
//!   decisions.
//!
//! - **Processor** ([`processor`]): [`process_outcome`] — the single
//!   authoritative operation that resolves a pending case and applies the
//!   financial and status effects to the vehicle. All-or-nothing: on any
//!   error, neither the case nor the vehicle is mutated.
//!
//! - **History** ([`history`]): Read-only projections — outcome tallies,
//!   newest-first orderings, per-vehicle history.

pub mod case;
pub mod error;
pub mod history;
pub mod outcome;
pub mod processor;

// Re-export primary types for ergonomic imports.
pub use case::{ArbCase, ArbOutcome, ArbType, TransportPlan};
pub use error::ArbError;
pub use history::{newest_first, pending_case, vehicle_history, OutcomeTally};
pub use outcome::OutcomeDecision;
pub use processor::process_outcome;
