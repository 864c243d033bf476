//! # History Projections
//!
//! Read-only shapes over collections of [`ArbCase`] records: the outcome
//! tally shown at the top of the case list, newest-first orderings, and
//! the per-vehicle chronological history. No function here mutates a case.

use serde::{Deserialize, Serialize};

use backlot_core::VehicleId;

use crate::case::{ArbCase, ArbOutcome};

/// Counts of cases by outcome, for the case-list header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    /// Cases still awaiting a decision.
    pub pending: usize,
    /// Cases resolved as denied.
    pub denied: usize,
    /// Cases resolved with a price adjustment.
    pub price_adjustment: usize,
    /// Cases resolved by buyer withdrawal.
    pub buyer_withdrew: usize,
    /// Cases resolved by hard withdrawal.
    pub withdrawn: usize,
}

impl OutcomeTally {
    /// Tally the outcomes of the given cases.
    pub fn of<'a>(cases: impl IntoIterator<Item = &'a ArbCase>) -> Self {
        let mut tally = Self::default();
        for case in cases {
            match case.outcome {
                ArbOutcome::Pending => tally.pending += 1,
                ArbOutcome::Denied => tally.denied += 1,
                ArbOutcome::PriceAdjustment => tally.price_adjustment += 1,
                ArbOutcome::BuyerWithdrew => tally.buyer_withdrew += 1,
                ArbOutcome::Withdrawn => tally.withdrawn += 1,
            }
        }
        tally
    }

    /// Total number of tallied cases.
    pub fn total(&self) -> usize {
        self.pending + self.denied + self.price_adjustment + self.buyer_withdrew + self.withdrawn
    }
}

/// Sort cases newest-first by opening time, with the id as a stable
/// tiebreaker for cases opened in the same instant.
pub fn newest_first(cases: &mut [ArbCase]) {
    cases.sort_by(|a, b| {
        b.opened_at
            .cmp(&a.opened_at)
            .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
    });
}

/// The chronological (newest-first) arbitration history for one vehicle.
pub fn vehicle_history(cases: &[ArbCase], vehicle_id: VehicleId) -> Vec<ArbCase> {
    let mut history: Vec<ArbCase> = cases
        .iter()
        .filter(|c| c.vehicle_id == vehicle_id)
        .cloned()
        .collect();
    newest_first(&mut history);
    history
}

/// The open (Pending) case for a vehicle, if any.
///
/// The stack enforces at most one pending case per vehicle, so the first
/// match is the only match.
pub fn pending_case(cases: &[ArbCase], vehicle_id: VehicleId) -> Option<&ArbCase> {
    cases
        .iter()
        .find(|c| c.vehicle_id == vehicle_id && c.is_pending())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use backlot_core::UserId;

    use crate::case::ArbType;

    fn case_for(vehicle_id: VehicleId, offset_hours: i64) -> ArbCase {
        ArbCase::open(
            vehicle_id,
            ArbType::SoldArb,
            None,
            UserId::new(),
            Utc::now() + Duration::hours(offset_hours),
        )
    }

    #[test]
    fn tally_counts_by_outcome() {
        let vehicle_id = VehicleId::new();
        let mut resolved = case_for(vehicle_id, 0);
        resolved.outcome = ArbOutcome::Denied;
        let cases = vec![case_for(vehicle_id, 1), case_for(vehicle_id, 2), resolved];

        let tally = OutcomeTally::of(&cases);
        assert_eq!(tally.pending, 2);
        assert_eq!(tally.denied, 1);
        assert_eq!(tally.price_adjustment, 0);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn tally_of_empty_is_zero() {
        let tally = OutcomeTally::of(&[]);
        assert_eq!(tally, OutcomeTally::default());
        assert_eq!(tally.total(), 0);
    }

    #[test]
    fn newest_first_orders_descending() {
        let vehicle_id = VehicleId::new();
        let mut cases = vec![
            case_for(vehicle_id, 0),
            case_for(vehicle_id, 5),
            case_for(vehicle_id, 2),
        ];
        newest_first(&mut cases);
        assert!(cases[0].opened_at >= cases[1].opened_at);
        assert!(cases[1].opened_at >= cases[2].opened_at);
    }

    #[test]
    fn vehicle_history_filters_and_orders() {
        let mine = VehicleId::new();
        let other = VehicleId::new();
        let cases = vec![
            case_for(mine, 0),
            case_for(other, 1),
            case_for(mine, 3),
            case_for(other, 4),
        ];

        let history = vehicle_history(&cases, mine);
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|c| c.vehicle_id == mine));
        assert!(history[0].opened_at >= history[1].opened_at);
    }

    #[test]
    fn pending_case_finds_the_open_one() {
        let vehicle_id = VehicleId::new();
        let mut resolved = case_for(vehicle_id, 0);
        resolved.outcome = ArbOutcome::PriceAdjustment;
        let open = case_for(vehicle_id, 1);
        let open_id = open.id;
        let cases = vec![resolved, open];

        let found = pending_case(&cases, vehicle_id).unwrap();
        assert_eq!(found.id, open_id);
    }

    #[test]
    fn pending_case_none_when_all_resolved() {
        let vehicle_id = VehicleId::new();
        let mut resolved = case_for(vehicle_id, 0);
        resolved.outcome = ArbOutcome::Denied;
        assert!(pending_case(&[resolved], vehicle_id).is_none());
    }
}
