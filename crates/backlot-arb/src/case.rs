//! # Arbitration Cases
//!
//! The [`ArbCase`] record and its vocabulary: case types, outcomes, and
//! the allowed-outcome table that ties them together.
//!
//! A case is opened against a vehicle in the `Pending` outcome and resolves
//! exactly once to a terminal outcome. The two case types share `Denied`
//! and `PriceAdjustment`; `BuyerWithdrew` is exclusive to Sold ARB and
//! `Withdrawn` exclusive to Inventory ARB.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use backlot_core::{ArbId, Money, UserId, ValidationError, VehicleId, VehicleStatus};

// ── Case Type ───────────────────────────────────────────────────────────

/// Why the case was opened: a contested sale or a failed inventory
/// inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbType {
    /// A buyer contests a completed sale.
    SoldArb,
    /// An inventory vehicle fails inspection or assessment.
    InventoryArb,
}

impl ArbType {
    /// The canonical string identifier for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoldArb => "sold_arb",
            Self::InventoryArb => "inventory_arb",
        }
    }

    /// Parse a stored case-type string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sold_arb" => Some(Self::SoldArb),
            "inventory_arb" => Some(Self::InventoryArb),
            _ => None,
        }
    }

    /// The terminal outcomes permitted for this case type.
    pub fn allowed_outcomes(&self) -> &'static [ArbOutcome] {
        match self {
            Self::SoldArb => &[
                ArbOutcome::Denied,
                ArbOutcome::PriceAdjustment,
                ArbOutcome::BuyerWithdrew,
            ],
            Self::InventoryArb => &[
                ArbOutcome::Denied,
                ArbOutcome::PriceAdjustment,
                ArbOutcome::Withdrawn,
            ],
        }
    }

    /// Whether the given outcome is permitted for this case type.
    pub fn allows(&self, outcome: ArbOutcome) -> bool {
        self.allowed_outcomes().contains(&outcome)
    }

    /// The vehicle status this case type was opened from — and the one a
    /// non-destructive outcome returns the vehicle to.
    pub fn return_status(&self) -> VehicleStatus {
        match self {
            Self::SoldArb => VehicleStatus::Sold,
            Self::InventoryArb => VehicleStatus::Inventory,
        }
    }
}

impl std::fmt::Display for ArbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Outcome ─────────────────────────────────────────────────────────────

/// The resolution state of an arbitration case.
///
/// `Pending` is the initial state; every other variant is terminal. Once a
/// case leaves `Pending` it never returns — re-arbitration opens a new case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbOutcome {
    /// Case is open, awaiting a decision.
    Pending,
    /// Dispute rejected; no financial change.
    Denied,
    /// A negotiated amount adjusts the vehicle's financials.
    PriceAdjustment,
    /// Sold ARB only: the buyer backed out and the vehicle returns.
    BuyerWithdrew,
    /// Inventory ARB only: the vehicle is hard-withdrawn from inventory.
    Withdrawn,
}

impl ArbOutcome {
    /// The canonical string identifier for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Denied => "denied",
            Self::PriceAdjustment => "price_adjustment",
            Self::BuyerWithdrew => "buyer_withdrew",
            Self::Withdrawn => "withdrawn",
        }
    }

    /// Parse a stored outcome string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "denied" => Some(Self::Denied),
            "price_adjustment" => Some(Self::PriceAdjustment),
            "buyer_withdrew" => Some(Self::BuyerWithdrew),
            "withdrawn" => Some(Self::Withdrawn),
            _ => None,
        }
    }

    /// Whether this outcome is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ArbOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Transport ───────────────────────────────────────────────────────────

/// Return-transport details recorded when a buyer withdraws from a sale.
///
/// Only the cost is required; type, location, and date are filled in as
/// the desk learns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportPlan {
    /// How the vehicle is coming back (e.g., "flatbed", "driveaway").
    pub transport_type: Option<String>,
    /// Pickup location, if known.
    pub location: Option<String>,
    /// Scheduled pickup date.
    pub date: Option<NaiveDate>,
    /// Cost of the return transport. Always positive.
    pub cost: Money,
}

impl TransportPlan {
    /// Create a validated transport plan.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveAmount`] for a zero or
    /// negative cost.
    pub fn new(
        transport_type: Option<String>,
        location: Option<String>,
        date: Option<NaiveDate>,
        cost: Money,
    ) -> Result<Self, ValidationError> {
        if !cost.is_positive() {
            return Err(ValidationError::NonPositiveAmount {
                field: "transport_cost",
                amount: cost.to_decimal_string(),
            });
        }
        Ok(Self {
            transport_type: transport_type.filter(|t| !t.trim().is_empty()),
            location,
            date,
            cost,
        })
    }
}

// ── The Case ────────────────────────────────────────────────────────────

/// One arbitration case against a vehicle.
///
/// Opened in the `Pending` outcome; resolved exactly once by the outcome
/// processor, which stamps `resolved_at`/`resolved_by` and stores the
/// branch-specific payload (adjustment amount or transport plan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbCase {
    /// Unique case identifier.
    pub id: ArbId,
    /// The vehicle this case was opened against.
    pub vehicle_id: VehicleId,
    /// Why the case was opened.
    pub arb_type: ArbType,
    /// Current resolution state.
    pub outcome: ArbOutcome,
    /// Negotiated amount, present after a `PriceAdjustment` resolution.
    pub adjustment_amount: Option<Money>,
    /// Return-transport details, present after a `BuyerWithdrew` resolution.
    pub transport: Option<TransportPlan>,
    /// Free-form notes from the submitter.
    pub notes: Option<String>,
    /// When the case was opened.
    pub opened_at: DateTime<Utc>,
    /// Who opened the case.
    pub opened_by: UserId,
    /// When the case was resolved, once terminal.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who resolved the case, once terminal.
    pub resolved_by: Option<UserId>,
}

impl ArbCase {
    /// Open a new case in the `Pending` outcome.
    pub fn open(
        vehicle_id: VehicleId,
        arb_type: ArbType,
        notes: Option<String>,
        opened_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ArbId::new(),
            vehicle_id,
            arb_type,
            outcome: ArbOutcome::Pending,
            adjustment_amount: None,
            transport: None,
            notes,
            opened_at: now,
            opened_by,
            resolved_at: None,
            resolved_by: None,
        }
    }

    /// Whether the case is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        self.outcome == ArbOutcome::Pending
    }
}
