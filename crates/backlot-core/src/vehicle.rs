//! # Vehicle Aggregate
//!
//! The vehicle record and its lifecycle state machine. Status transitions
//! and financial mutations go through methods that validate the current
//! state, so a vehicle can never end up Sold without a sale price or in
//! arbitration from Withdrawn.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──receive()──▶ Inventory ──record_sale()──▶ Sold ──mark_complete()──▶ Complete
//!                            │  ▲                      │  ▲
//!                   enter_arb() │ leave_arb()  enter_arb() │ leave_arb()
//!                            ▼  │                      ▼  │
//!                            Arb ◀─────────────────────┘
//!                             │
//!                             └──leave_arb(Withdrawn)──▶ Withdrawn
//! ```
//!
//! `Arb` is entered from either Inventory or Sold; the arbitration
//! processor decides which state the vehicle returns to (or whether it is
//! withdrawn outright).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;
use crate::identity::VehicleId;
use crate::money::Money;

// ── VIN ─────────────────────────────────────────────────────────────────

/// A validated Vehicle Identification Number.
///
/// Seventeen characters, uppercase alphanumeric, excluding the letters
/// I, O, and Q (ISO 3779). Input is uppercased before validation so
/// `"1hgcm82633a004352"` and `"1HGCM82633A004352"` construct the same VIN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    /// Create a validated VIN.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidVin`] if the input is not exactly
    /// 17 characters or contains characters outside `[A-HJ-NPR-Z0-9]`.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = s.into();
        let vin = raw.trim().to_ascii_uppercase();
        if vin.len() != 17 {
            return Err(ValidationError::InvalidVin {
                vin: raw,
                reason: "must be exactly 17 characters".to_string(),
            });
        }
        if let Some(bad) = vin
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() || matches!(c, 'I' | 'O' | 'Q'))
        {
            return Err(ValidationError::InvalidVin {
                vin: raw,
                reason: format!("character '{bad}' is not permitted"),
            });
        }
        Ok(Self(vin))
    }

    /// The VIN as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Vin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Status Enums ────────────────────────────────────────────────────────

/// Vehicle lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    /// Acquired but not yet received onto the lot.
    Pending,
    /// On the lot and available for sale.
    Inventory,
    /// Sold; title and funding may still be settling.
    Sold,
    /// Under arbitration — an open dispute blocks normal workflow.
    Arb,
    /// Hard-withdrawn from inventory. Terminal.
    Withdrawn,
    /// Sale fully settled, title delivered. Terminal.
    Complete,
}

impl VehicleStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Inventory => "inventory",
            Self::Sold => "sold",
            Self::Arb => "arb",
            Self::Withdrawn => "withdrawn",
            Self::Complete => "complete",
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Withdrawn | Self::Complete)
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "inventory" => Some(Self::Inventory),
            "sold" => Some(Self::Sold),
            "arb" => Some(Self::Arb),
            "withdrawn" => Some(Self::Withdrawn),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the vehicle's title document currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    /// Title is physically in hand.
    Present,
    /// Title is on its way (auction, bank, or prior owner).
    InTransit,
    /// Title has not been located.
    Absent,
}

impl TitleStatus {
    /// The canonical string name of this title status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::InTransit => "in_transit",
            Self::Absent => "absent",
        }
    }

    /// Parse a stored title status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(Self::Present),
            "in_transit" => Some(Self::InTransit),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

impl std::fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors raised by vehicle lifecycle and financial mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VehicleError {
    /// The attempted status transition is not valid from the current state.
    #[error("invalid vehicle transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// The current status name.
        from: String,
        /// The attempted target status name.
        to: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// The vehicle is in a terminal status and cannot change further.
    #[error("vehicle {vehicle_id} is in terminal status {status}")]
    Terminal {
        /// The vehicle identifier.
        vehicle_id: VehicleId,
        /// The terminal status name.
        status: String,
    },

    /// A financial mutation required purchase information that is absent.
    #[error("vehicle {vehicle_id} has no recorded purchase")]
    NoPurchaseRecorded {
        /// The vehicle identifier.
        vehicle_id: VehicleId,
    },

    /// A purchase-cost reduction exceeded the recorded cost.
    #[error(
        "adjustment {adjustment} exceeds recorded purchase cost {bought_price} for vehicle {vehicle_id}"
    )]
    AdjustmentExceedsCost {
        /// The vehicle identifier.
        vehicle_id: VehicleId,
        /// The requested reduction.
        adjustment: Money,
        /// The recorded purchase cost.
        bought_price: Money,
    },

    /// Underlying domain-primitive validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// ── The Vehicle ─────────────────────────────────────────────────────────

/// A vehicle owned by the dealership.
///
/// Financial fields are mutated only through methods so that the expense
/// accumulator and purchase/sale records stay consistent with the
/// lifecycle status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique vehicle identifier.
    pub id: VehicleId,
    /// Validated VIN.
    pub vin: Vin,
    /// Model year.
    pub year: i32,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Trim level, if known.
    pub trim: Option<String>,
    /// Current lifecycle status.
    pub status: VehicleStatus,
    /// Where the title document is.
    pub title_status: TitleStatus,
    /// What the dealership paid, if a purchase has been recorded.
    pub bought_price: Option<Money>,
    /// When the vehicle was purchased.
    pub purchase_date: Option<NaiveDate>,
    /// Sale price, present while the vehicle is Sold/Complete.
    pub sold_price: Option<Money>,
    /// Buyer's name, present while the vehicle is Sold/Complete.
    pub buyer_name: Option<String>,
    /// When the sale was made.
    pub sale_date: Option<NaiveDate>,
    /// Accumulated expenses (reconditioning, transport, arbitration
    /// adjustments against a completed sale).
    pub expense_total: Money,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Take a purchased vehicle into the system.
    ///
    /// The vehicle starts in [`VehicleStatus::Inventory`] with its purchase
    /// recorded and no expenses.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an invalid year or empty make/model.
    #[allow(clippy::too_many_arguments)]
    pub fn intake(
        vin: Vin,
        year: i32,
        make: impl Into<String>,
        model: impl Into<String>,
        trim: Option<String>,
        bought_price: Option<Money>,
        purchase_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if !(1900..=2100).contains(&year) {
            return Err(ValidationError::InvalidYear(year));
        }
        let make = make.into();
        let model = model.into();
        if make.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "make" });
        }
        if model.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "model" });
        }

        Ok(Self {
            id: VehicleId::new(),
            vin,
            year,
            make,
            model,
            trim,
            status: VehicleStatus::Inventory,
            title_status: TitleStatus::Absent,
            bought_price,
            purchase_date,
            sold_price: None,
            buyer_name: None,
            sale_date: None,
            expense_total: Money::ZERO,
            created_at: now,
            updated_at: now,
        })
    }

    /// Net profit on the sale: sold price minus purchase cost minus
    /// accumulated expenses. `None` until both prices are recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AmountOverflow`] on arithmetic overflow.
    pub fn net_profit(&self) -> Result<Option<Money>, ValidationError> {
        match (self.sold_price, self.bought_price) {
            (Some(sold), Some(bought)) => {
                let gross = sold.checked_sub(bought)?;
                Ok(Some(gross.checked_sub(self.expense_total)?))
            }
            _ => Ok(None),
        }
    }

    fn reject_terminal(&self) -> Result<(), VehicleError> {
        if self.status.is_terminal() {
            return Err(VehicleError::Terminal {
                vehicle_id: self.id,
                status: self.status.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Record a sale: Inventory → Sold.
    ///
    /// # Errors
    ///
    /// Returns [`VehicleError::InvalidTransition`] unless the vehicle is
    /// currently in inventory, or [`ValidationError`] for an empty buyer
    /// name or non-positive price.
    pub fn record_sale(
        &mut self,
        buyer_name: impl Into<String>,
        sold_price: Money,
        sale_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), VehicleError> {
        self.reject_terminal()?;
        if self.status != VehicleStatus::Inventory {
            return Err(VehicleError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: VehicleStatus::Sold.as_str().to_string(),
                reason: "only inventory vehicles can be sold".to_string(),
            });
        }
        let buyer_name = buyer_name.into();
        if buyer_name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "buyer_name" }.into());
        }
        if !sold_price.is_positive() {
            return Err(ValidationError::NonPositiveAmount {
                field: "sold_price",
                amount: sold_price.to_decimal_string(),
            }
            .into());
        }

        self.sold_price = Some(sold_price);
        self.buyer_name = Some(buyer_name);
        self.sale_date = Some(sale_date);
        self.status = VehicleStatus::Sold;
        self.updated_at = now;
        Ok(())
    }

    /// Erase the sale record (buyer, price, date). Status is left to the
    /// caller — the arbitration processor pairs this with a transition
    /// back to Inventory.
    pub fn clear_sale(&mut self, now: DateTime<Utc>) {
        self.sold_price = None;
        self.buyer_name = None;
        self.sale_date = None;
        self.updated_at = now;
    }

    /// Add a positive amount to the expense accumulator.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveAmount`] for a zero/negative
    /// amount or [`ValidationError::AmountOverflow`] on overflow.
    pub fn record_expense(
        &mut self,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), VehicleError> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount {
                field: "expense",
                amount: amount.to_decimal_string(),
            }
            .into());
        }
        self.expense_total = self.expense_total.checked_add(amount)?;
        self.updated_at = now;
        Ok(())
    }

    /// Reduce the recorded purchase cost by a positive amount.
    ///
    /// # Errors
    ///
    /// Returns [`VehicleError::NoPurchaseRecorded`] if no purchase is on
    /// file, or [`VehicleError::AdjustmentExceedsCost`] if the reduction
    /// is larger than the recorded cost.
    pub fn reduce_purchase_cost(
        &mut self,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), VehicleError> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount {
                field: "adjustment_amount",
                amount: amount.to_decimal_string(),
            }
            .into());
        }
        let bought = self
            .bought_price
            .ok_or(VehicleError::NoPurchaseRecorded { vehicle_id: self.id })?;
        if amount > bought {
            return Err(VehicleError::AdjustmentExceedsCost {
                vehicle_id: self.id,
                adjustment: amount,
                bought_price: bought,
            });
        }
        self.bought_price = Some(bought.checked_sub(amount)?);
        self.updated_at = now;
        Ok(())
    }

    /// Erase all purchase information. Used by the hard-withdrawal path.
    pub fn clear_purchase(&mut self, now: DateTime<Utc>) {
        self.bought_price = None;
        self.purchase_date = None;
        self.updated_at = now;
    }

    /// Receive a pending vehicle onto the lot: Pending → Inventory.
    ///
    /// # Errors
    ///
    /// Returns [`VehicleError::InvalidTransition`] unless currently Pending.
    pub fn receive(&mut self, now: DateTime<Utc>) -> Result<(), VehicleError> {
        self.reject_terminal()?;
        if self.status != VehicleStatus::Pending {
            return Err(VehicleError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: VehicleStatus::Inventory.as_str().to_string(),
                reason: "only pending vehicles can be received".to_string(),
            });
        }
        self.status = VehicleStatus::Inventory;
        self.updated_at = now;
        Ok(())
    }

    /// Place the vehicle under arbitration: Inventory | Sold → Arb.
    ///
    /// # Errors
    ///
    /// Returns [`VehicleError::InvalidTransition`] from any other status.
    pub fn enter_arb(&mut self, now: DateTime<Utc>) -> Result<(), VehicleError> {
        self.reject_terminal()?;
        if !matches!(self.status, VehicleStatus::Inventory | VehicleStatus::Sold) {
            return Err(VehicleError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: VehicleStatus::Arb.as_str().to_string(),
                reason: "arbitration opens only against inventory or sold vehicles".to_string(),
            });
        }
        self.status = VehicleStatus::Arb;
        self.updated_at = now;
        Ok(())
    }

    /// Leave arbitration for the given status.
    ///
    /// The target must be Inventory, Sold, or Withdrawn — the three states
    /// an arbitration outcome can put a vehicle into.
    ///
    /// # Errors
    ///
    /// Returns [`VehicleError::InvalidTransition`] if the vehicle is not
    /// currently in Arb or the target is not a valid arbitration exit.
    pub fn leave_arb(
        &mut self,
        to: VehicleStatus,
        now: DateTime<Utc>,
    ) -> Result<(), VehicleError> {
        if self.status != VehicleStatus::Arb {
            return Err(VehicleError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: "vehicle is not under arbitration".to_string(),
            });
        }
        if !matches!(
            to,
            VehicleStatus::Inventory | VehicleStatus::Sold | VehicleStatus::Withdrawn
        ) {
            return Err(VehicleError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: "not a valid arbitration exit state".to_string(),
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Settle a finished sale: Sold → Complete.
    ///
    /// # Errors
    ///
    /// Returns [`VehicleError::InvalidTransition`] unless currently Sold.
    pub fn mark_complete(&mut self, now: DateTime<Utc>) -> Result<(), VehicleError> {
        if self.status != VehicleStatus::Sold {
            return Err(VehicleError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: VehicleStatus::Complete.as_str().to_string(),
                reason: "only sold vehicles can be completed".to_string(),
            });
        }
        self.status = VehicleStatus::Complete;
        self.updated_at = now;
        Ok(())
    }
}
