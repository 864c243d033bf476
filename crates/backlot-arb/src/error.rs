//! # Arbitration Error Types
//!
//! Structured error hierarchy for the arbitration subsystem. Every variant
//! carries enough context for operators to diagnose the failure without
//! inspecting logs: state machine rejections include the case and its
//! current outcome, rule-table rejections include the offending pair.

use thiserror::Error;

use backlot_core::{ArbId, ValidationError, VehicleError, VehicleId};

use crate::case::{ArbOutcome, ArbType};

/// Errors arising from arbitration operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbError {
    /// The submitted outcome is not in the allowed set for this case type.
    #[error("outcome {outcome} is not allowed for {arb_type}")]
    OutcomeNotAllowed {
        /// The case type.
        arb_type: ArbType,
        /// The rejected outcome.
        outcome: ArbOutcome,
    },

    /// "Pending" was submitted as an outcome. Pending is the initial state,
    /// never a resolution.
    #[error("an outcome must be selected before submission")]
    OutcomeNotSelected,

    /// The outcome requires a positive adjustment amount that was absent.
    #[error("{arb_type} price adjustment requires a positive adjustment_amount")]
    MissingAdjustmentAmount {
        /// The case type.
        arb_type: ArbType,
    },

    /// Buyer-withdrew requires transport details with a positive cost.
    #[error("buyer withdrawal requires transport details with a positive transport_cost")]
    MissingTransport,

    /// Hard withdrawal is destructive and must be explicitly confirmed.
    #[error("inventory withdrawal is destructive and must be confirmed")]
    WithdrawalNotConfirmed,

    /// The case has already been resolved; outcomes are one-way.
    #[error("arbitration case {arb_id} was already processed with outcome {outcome}")]
    AlreadyProcessed {
        /// The case identifier.
        arb_id: ArbId,
        /// The outcome already recorded.
        outcome: ArbOutcome,
    },

    /// The case does not belong to the targeted vehicle.
    #[error("arbitration case {arb_id} belongs to vehicle {expected}, not {got}")]
    VehicleMismatch {
        /// The case identifier.
        arb_id: ArbId,
        /// The vehicle the case was opened against.
        expected: VehicleId,
        /// The vehicle the caller targeted.
        got: VehicleId,
    },

    /// The submitted case type does not match the open case.
    #[error("arbitration case {arb_id} is a {case_type}, but {submitted} was submitted")]
    TypeMismatch {
        /// The case identifier.
        arb_id: ArbId,
        /// The type the case was opened with.
        case_type: ArbType,
        /// The type the caller submitted.
        submitted: ArbType,
    },

    /// A vehicle may have at most one pending case at a time.
    #[error("vehicle {vehicle_id} already has a pending arbitration case {arb_id}")]
    PendingCaseExists {
        /// The vehicle identifier.
        vehicle_id: VehicleId,
        /// The already-open case.
        arb_id: ArbId,
    },

    /// Vehicle lifecycle or financial mutation failure.
    #[error(transparent)]
    Vehicle(#[from] VehicleError),

    /// Domain-primitive validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
