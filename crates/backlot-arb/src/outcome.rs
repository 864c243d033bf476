//! # Outcome Validation
//!
//! [`OutcomeDecision`] is the validated form of a submitted outcome. The
//! rule table lives in [`OutcomeDecision::validate`]:
//!
//! | case type | outcome | required extra fields |
//! |---|---|---|
//! | Sold ARB | price_adjustment | adjustment_amount > 0 |
//! | Sold ARB | buyer_withdrew | transport with transport_cost > 0 |
//! | Sold ARB | denied | none |
//! | Inventory ARB | price_adjustment | adjustment_amount > 0 |
//! | Inventory ARB | withdrawn | none, but confirmation flag required |
//! | Inventory ARB | denied | none |
//!
//! Validation is pure: it produces a decision or an error and touches
//! nothing. The processor only accepts [`OutcomeDecision`] values, so an
//! unvalidated submission cannot reach it.

use backlot_core::Money;

use crate::case::{ArbOutcome, ArbType, TransportPlan};
use crate::error::ArbError;

/// A validated arbitration decision, carrying exactly the payload its
/// branch requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeDecision {
    /// Dispute rejected; the vehicle returns to its prior state unchanged.
    Denied,
    /// A negotiated amount adjusts the vehicle's financials.
    PriceAdjustment {
        /// The positive adjustment amount.
        amount: Money,
    },
    /// Sold ARB only: the sale is reversed and the vehicle transported back.
    BuyerWithdrew {
        /// Validated return-transport details.
        transport: TransportPlan,
    },
    /// Inventory ARB only: the vehicle is hard-withdrawn.
    Withdrawn,
}

impl OutcomeDecision {
    /// Validate a submitted outcome against the rule table.
    ///
    /// `confirm_withdrawal` is the explicit acknowledgement required for
    /// the destructive Inventory ARB withdrawal; it is ignored for every
    /// other branch.
    ///
    /// # Errors
    ///
    /// - [`ArbError::OutcomeNotSelected`] if `outcome` is `Pending`.
    /// - [`ArbError::OutcomeNotAllowed`] for a pair outside the table.
    /// - [`ArbError::MissingAdjustmentAmount`] /
    ///   [`ArbError::MissingTransport`] for an absent or non-positive
    ///   required field.
    /// - [`ArbError::WithdrawalNotConfirmed`] for an unconfirmed withdrawal.
    pub fn validate(
        arb_type: ArbType,
        outcome: ArbOutcome,
        adjustment_amount: Option<Money>,
        transport: Option<TransportPlan>,
        confirm_withdrawal: bool,
    ) -> Result<Self, ArbError> {
        if outcome == ArbOutcome::Pending {
            return Err(ArbError::OutcomeNotSelected);
        }
        if !arb_type.allows(outcome) {
            return Err(ArbError::OutcomeNotAllowed { arb_type, outcome });
        }

        match outcome {
            ArbOutcome::Denied => Ok(Self::Denied),
            ArbOutcome::PriceAdjustment => {
                let amount = adjustment_amount
                    .filter(Money::is_positive)
                    .ok_or(ArbError::MissingAdjustmentAmount { arb_type })?;
                Ok(Self::PriceAdjustment { amount })
            }
            ArbOutcome::BuyerWithdrew => {
                // TransportPlan::new already enforced a positive cost.
                let transport = transport.ok_or(ArbError::MissingTransport)?;
                Ok(Self::BuyerWithdrew { transport })
            }
            ArbOutcome::Withdrawn => {
                if !confirm_withdrawal {
                    return Err(ArbError::WithdrawalNotConfirmed);
                }
                Ok(Self::Withdrawn)
            }
            ArbOutcome::Pending => unreachable!("rejected above"),
        }
    }

    /// The terminal outcome this decision resolves to.
    pub fn outcome(&self) -> ArbOutcome {
        match self {
            Self::Denied => ArbOutcome::Denied,
            Self::PriceAdjustment { .. } => ArbOutcome::PriceAdjustment,
            Self::BuyerWithdrew { .. } => ArbOutcome::BuyerWithdrew,
            Self::Withdrawn => ArbOutcome::Withdrawn,
        }
    }
}
