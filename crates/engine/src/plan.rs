//! Planned mutations.
//!
//! Every write path first builds a [`MutationPlan`] from already-validated
//! input, then hands it to the store. Stores apply a plan atomically or not
//! at all, so a plan is the unit of commit.

use std::collections::HashMap;

use uuid::Uuid;

use crate::RangeVisit;

/// The visit row change carried by a plan, if any. Recount plans adjust
/// counters only and carry no record.
#[derive(Clone, Debug)]
pub(crate) enum PlanRecord {
    Insert(RangeVisit),
    Replace(RangeVisit),
    Remove(Uuid),
}

/// Signed stock and counter deltas plus at most one visit record change.
/// Opaque outside the crate; stores execute it, operations build it.
///
/// Deltas net: debiting and crediting the same lot in one plan (an amend
/// that reallocates) collapses to the difference, and a zero entry is no
/// write at all.
#[derive(Clone, Debug, Default)]
pub struct MutationPlan {
    pub(crate) lot_deltas: HashMap<Uuid, i64>,
    pub(crate) firearm_deltas: HashMap<Uuid, i64>,
    pub(crate) record: Option<PlanRecord>,
}

impl MutationPlan {
    pub(crate) fn debit_lot(&mut self, lot_id: Uuid, rounds: i64) {
        *self.lot_deltas.entry(lot_id).or_default() -= rounds;
    }

    pub(crate) fn credit_lot(&mut self, lot_id: Uuid, rounds: i64) {
        *self.lot_deltas.entry(lot_id).or_default() += rounds;
    }

    pub(crate) fn raise_counter(&mut self, firearm_id: Uuid, rounds: i64) {
        *self.firearm_deltas.entry(firearm_id).or_default() += rounds;
    }

    pub(crate) fn lower_counter(&mut self, firearm_id: Uuid, rounds: i64) {
        *self.firearm_deltas.entry(firearm_id).or_default() -= rounds;
    }
}
