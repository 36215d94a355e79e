//! Lot selection.
//!
//! [`StockView`] is a projection of current ammunition quantities that a plan
//! is built against. Allocations debit the projection as they go, so several
//! entries of one request (or the released half of an edit) see each other's
//! effects before anything is written.
//!
//! Two paths, both required:
//! - caliber aggregate: oldest lot first by purchase date (ties by id),
//!   spilling into newer lots until the requirement is met;
//! - pinned lot: the named lot must cover the requirement on its own, no
//!   substitution.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{AmmunitionLot, EngineError, EntityKind, ResultEngine, StockScope, util};

/// A planned debit: `rounds` taken from one lot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LotDebit {
    pub lot_id: Uuid,
    pub rounds: i64,
}

pub(crate) struct StockView {
    /// FIFO order: ascending purchase date, then id.
    lots: Vec<AmmunitionLot>,
    remaining: HashMap<Uuid, i64>,
}

impl StockView {
    pub fn new(mut lots: Vec<AmmunitionLot>) -> Self {
        lots.sort_by(|a, b| {
            a.purchased_at
                .cmp(&b.purchased_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        let remaining = lots.iter().map(|lot| (lot.id, lot.on_hand)).collect();
        Self { lots, remaining }
    }

    /// Return previously consumed rounds to the projection, e.g. the inverse
    /// half of an edit. Unknown lots are ignored; the store re-checks every
    /// row when the plan lands.
    pub fn release(&mut self, lot_id: Uuid, rounds: i64) {
        if let Some(remaining) = self.remaining.get_mut(&lot_id) {
            *remaining += rounds;
        }
    }

    /// Debit a pinned lot, or fail with the lot's shortfall.
    pub fn allocate_lot(&mut self, lot_id: Uuid, rounds: i64) -> ResultEngine<LotDebit> {
        let Some(remaining) = self.remaining.get_mut(&lot_id) else {
            return Err(EngineError::unknown(EntityKind::AmmunitionLot, lot_id));
        };
        if *remaining < rounds {
            return Err(EngineError::InsufficientStock {
                scope: StockScope::Lot(lot_id),
                requested: rounds,
                available: *remaining,
            });
        }
        *remaining -= rounds;
        Ok(LotDebit { lot_id, rounds })
    }

    /// Debit a caliber FIFO, spilling across lots, or fail with the caliber's
    /// aggregate shortfall.
    pub fn allocate_caliber(&mut self, caliber: &str, rounds: i64) -> ResultEngine<Vec<LotDebit>> {
        let lot_ids: Vec<Uuid> = self
            .lots
            .iter()
            .filter(|lot| util::same_caliber(&lot.caliber, caliber))
            .map(|lot| lot.id)
            .collect();
        let available: i64 = lot_ids
            .iter()
            .filter_map(|lot_id| self.remaining.get(lot_id))
            .sum();
        if available < rounds {
            return Err(EngineError::InsufficientStock {
                scope: StockScope::Caliber(util::normalize_caliber(caliber)),
                requested: rounds,
                available,
            });
        }

        let mut debits = Vec::new();
        let mut outstanding = rounds;
        for lot_id in lot_ids {
            if outstanding == 0 {
                break;
            }
            let Some(remaining) = self.remaining.get_mut(&lot_id) else {
                continue;
            };
            if *remaining <= 0 {
                continue;
            }
            let take = outstanding.min(*remaining);
            *remaining -= take;
            outstanding -= take;
            debits.push(LotDebit { lot_id, rounds: take });
        }
        Ok(debits)
    }
}
