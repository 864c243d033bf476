//! # Outcome Processor
//!
//! [`process_outcome`] is the single authoritative operation that resolves
//! a pending arbitration case and applies its effects to the vehicle.
//!
//! ## Atomicity
//!
//! The function is all-or-nothing over both records: vehicle effects are
//! staged on a scratch copy and committed only after every check and
//! mutation has succeeded, so a failed branch (say, an adjustment larger
//! than the recorded purchase cost) leaves the case Pending and the
//! vehicle untouched. Callers provide the outer exclusion — the in-memory
//! store runs this under a single write lock, and the persistence layer
//! pairs it with a conditional `UPDATE ... WHERE outcome = 'pending'`
//! inside one transaction.
//!
//! ## Effects
//!
//! | decision | case | vehicle |
//! |---|---|---|
//! | Denied | outcome = denied | back to its pre-arbitration status |
//! | PriceAdjustment (Sold) | stores amount | amount added to expenses; back to Sold |
//! | PriceAdjustment (Inventory) | stores amount | purchase cost reduced; back to Inventory |
//! | BuyerWithdrew | stores transport | cost added to expenses; sale cleared; to Inventory |
//! | Withdrawn | outcome = withdrawn | purchase cleared; to Withdrawn (terminal) |

use chrono::{DateTime, Utc};

use backlot_core::{UserId, Vehicle, VehicleStatus};

use crate::case::{ArbCase, ArbOutcome};
use crate::error::ArbError;
use crate::outcome::OutcomeDecision;

/// Resolve a pending case and apply the decision's effects to the vehicle.
///
/// # Errors
///
/// - [`ArbError::AlreadyProcessed`] if the case is not Pending. Nothing is
///   mutated.
/// - [`ArbError::VehicleMismatch`] if the case belongs to another vehicle.
/// - [`ArbError::OutcomeNotAllowed`] if the decision's outcome is outside
///   the case type's allowed set (a decision validated against the wrong
///   case type).
/// - [`ArbError::Vehicle`] if a vehicle mutation fails; the case stays
///   Pending and the vehicle is unchanged.
pub fn process_outcome(
    case: &mut ArbCase,
    vehicle: &mut Vehicle,
    decision: OutcomeDecision,
    resolved_by: UserId,
    now: DateTime<Utc>,
) -> Result<(), ArbError> {
    if case.outcome != ArbOutcome::Pending {
        return Err(ArbError::AlreadyProcessed {
            arb_id: case.id,
            outcome: case.outcome,
        });
    }
    if case.vehicle_id != vehicle.id {
        return Err(ArbError::VehicleMismatch {
            arb_id: case.id,
            expected: case.vehicle_id,
            got: vehicle.id,
        });
    }
    if !case.arb_type.allows(decision.outcome()) {
        return Err(ArbError::OutcomeNotAllowed {
            arb_type: case.arb_type,
            outcome: decision.outcome(),
        });
    }

    // Stage vehicle effects on a scratch copy; commit only on full success.
    let mut staged = vehicle.clone();
    match &decision {
        OutcomeDecision::Denied => {
            staged.leave_arb(case.arb_type.return_status(), now)?;
        }
        OutcomeDecision::PriceAdjustment { amount } => {
            match case.arb_type.return_status() {
                // A post-sale concession eats into the realized profit.
                VehicleStatus::Sold => staged.record_expense(*amount, now)?,
                // A pre-sale concession lowers what the lot has into the car.
                _ => staged.reduce_purchase_cost(*amount, now)?,
            }
            staged.leave_arb(case.arb_type.return_status(), now)?;
        }
        OutcomeDecision::BuyerWithdrew { transport } => {
            staged.record_expense(transport.cost, now)?;
            staged.clear_sale(now);
            staged.leave_arb(VehicleStatus::Inventory, now)?;
        }
        OutcomeDecision::Withdrawn => {
            staged.clear_purchase(now);
            staged.leave_arb(VehicleStatus::Withdrawn, now)?;
        }
    }
    *vehicle = staged;

    // The Pending check above makes this the case's one and only
    // Pending → terminal transition.
    case.outcome = decision.outcome();
    match decision {
        OutcomeDecision::PriceAdjustment { amount } => {
            case.adjustment_amount = Some(amount);
        }
        OutcomeDecision::BuyerWithdrew { transport } => {
            case.transport = Some(transport);
        }
        OutcomeDecision::Denied | OutcomeDecision::Withdrawn => {}
    }
    case.resolved_at = Some(now);
    case.resolved_by = Some(resolved_by);

    Ok(())
}
