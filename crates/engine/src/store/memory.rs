//! In-process store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::plan::PlanRecord;
use crate::{
    AmmunitionLot, EngineError, EntityKind, Firearm, MutationPlan, RangeVisit, ResultEngine,
    SessionFilter, StockScope, usage,
};

use super::EntityStore;

#[derive(Debug, Default)]
struct Inner {
    firearms: HashMap<Uuid, Firearm>,
    lots: HashMap<Uuid, AmmunitionLot>,
    visits: HashMap<Uuid, RangeVisit>,
}

/// Store for clients that keep their records in process: same rules, no
/// database. A failed apply leaves the state untouched because every check
/// runs before the first field changes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn firearm(&self, id: Uuid) -> ResultEngine<Option<Firearm>> {
        Ok(self.read().firearms.get(&id).cloned())
    }

    async fn firearms(&self) -> ResultEngine<Vec<Firearm>> {
        let mut firearms: Vec<Firearm> = self.read().firearms.values().cloned().collect();
        firearms.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(firearms)
    }

    async fn insert_firearm(&self, firearm: &Firearm) -> ResultEngine<()> {
        self.write().firearms.insert(firearm.id, firearm.clone());
        Ok(())
    }

    async fn ammunition_lot(&self, id: Uuid) -> ResultEngine<Option<AmmunitionLot>> {
        Ok(self.read().lots.get(&id).cloned())
    }

    async fn ammunition_lots(&self) -> ResultEngine<Vec<AmmunitionLot>> {
        let mut lots: Vec<AmmunitionLot> = self.read().lots.values().cloned().collect();
        lots.sort_by(|a, b| {
            a.purchased_at
                .cmp(&b.purchased_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(lots)
    }

    async fn insert_lot(&self, lot: &AmmunitionLot) -> ResultEngine<()> {
        self.write().lots.insert(lot.id, lot.clone());
        Ok(())
    }

    async fn range_visit(&self, id: Uuid) -> ResultEngine<Option<RangeVisit>> {
        Ok(self.read().visits.get(&id).cloned())
    }

    async fn range_visits(&self, filter: &SessionFilter) -> ResultEngine<Vec<RangeVisit>> {
        let mut visits: Vec<RangeVisit> = self
            .read()
            .visits
            .values()
            .filter(|visit| {
                filter
                    .before
                    .is_none_or(|before| visit.occurred_at < before)
            })
            .cloned()
            .collect();
        visits.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(limit) = filter.limit {
            visits.truncate(limit as usize);
        }
        Ok(visits)
    }

    async fn apply(&self, plan: MutationPlan) -> ResultEngine<()> {
        let mut inner = self.write();

        // check everything first so a failure changes nothing
        for (lot_id, delta) in &plan.lot_deltas {
            if *delta == 0 {
                continue;
            }
            let Some(lot) = inner.lots.get(lot_id) else {
                return Err(EngineError::unknown(EntityKind::AmmunitionLot, lot_id));
            };
            if lot.on_hand + delta < 0 {
                return Err(EngineError::InsufficientStock {
                    scope: StockScope::Lot(*lot_id),
                    requested: -delta,
                    available: lot.on_hand,
                });
            }
        }
        for (firearm_id, delta) in &plan.firearm_deltas {
            if *delta == 0 {
                continue;
            }
            let Some(firearm) = inner.firearms.get(firearm_id) else {
                return Err(EngineError::unknown(EntityKind::Firearm, firearm_id));
            };
            if firearm.rounds_fired + delta < 0 {
                return Err(EngineError::Corrupted(format!(
                    "firearm {firearm_id} counter would drop below zero"
                )));
            }
        }
        match &plan.record {
            Some(PlanRecord::Replace(visit)) if !inner.visits.contains_key(&visit.id) => {
                return Err(EngineError::unknown(EntityKind::RangeVisit, visit.id));
            }
            Some(PlanRecord::Remove(visit_id)) if !inner.visits.contains_key(visit_id) => {
                return Err(EngineError::unknown(EntityKind::RangeVisit, visit_id));
            }
            _ => {}
        }

        for (lot_id, delta) in &plan.lot_deltas {
            if let Some(lot) = inner.lots.get_mut(lot_id) {
                lot.on_hand += delta;
            }
        }
        for (firearm_id, delta) in &plan.firearm_deltas {
            if let Some(firearm) = inner.firearms.get_mut(firearm_id) {
                firearm.rounds_fired += delta;
            }
        }
        match plan.record {
            Some(PlanRecord::Insert(mut visit) | PlanRecord::Replace(mut visit)) => {
                usage::sort_entries(&mut visit.entries);
                inner.visits.insert(visit.id, visit);
            }
            Some(PlanRecord::Remove(visit_id)) => {
                inner.visits.remove(&visit_id);
            }
            None => {}
        }
        Ok(())
    }
}
