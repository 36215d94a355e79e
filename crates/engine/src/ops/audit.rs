//! Consistency audit.
//!
//! Counters and stock levels are plain columns kept in step with usage rows
//! by the commit pipeline. `recount` rebuilds what they should be from the
//! recorded usage and repairs any drift, so a skewed database (manual edits,
//! an interrupted import) can be brought back without replaying history.

use std::collections::HashMap;

use uuid::Uuid;

use crate::plan::MutationPlan;
use crate::store::EntityStore;
use crate::{ResultEngine, SessionFilter};

use super::Engine;

/// Outcome of a recount: how many records needed fixing. All zeros means
/// the ledger already added up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Recount {
    pub firearms_adjusted: u64,
    pub lots_adjusted: u64,
}

impl<S: EntityStore> Engine<S> {
    /// Recompute every firearm counter and lot stock level from usage rows
    /// and write back the corrections.
    ///
    /// Expected values: a firearm has fired its seed rounds plus every usage
    /// entry attributed to it; a lot holds its purchased quantity minus
    /// every round drawn from it.
    pub async fn recount(&self) -> ResultEngine<Recount> {
        let firearms = self.store.firearms().await?;
        let lots = self.store.ammunition_lots().await?;
        let visits = self.store.range_visits(&SessionFilter::default()).await?;

        let mut fired: HashMap<Uuid, i64> = HashMap::new();
        let mut drawn: HashMap<Uuid, i64> = HashMap::new();
        for visit in &visits {
            for entry in &visit.entries {
                if let Some(firearm_id) = entry.slot.firearm_id() {
                    *fired.entry(firearm_id).or_default() += entry.rounds;
                }
                *drawn.entry(entry.lot_id).or_default() += entry.rounds;
            }
        }

        let mut plan = MutationPlan::default();
        let mut report = Recount::default();
        for firearm in &firearms {
            let expected =
                firearm.seed_rounds + fired.get(&firearm.id).copied().unwrap_or_default();
            let delta = expected - firearm.rounds_fired;
            if delta != 0 {
                plan.firearm_deltas.insert(firearm.id, delta);
                report.firearms_adjusted += 1;
            }
        }
        for lot in &lots {
            let expected = lot.purchased - drawn.get(&lot.id).copied().unwrap_or_default();
            let delta = expected - lot.on_hand;
            if delta != 0 {
                plan.lot_deltas.insert(lot.id, delta);
                report.lots_adjusted += 1;
            }
        }

        if !plan.lot_deltas.is_empty() || !plan.firearm_deltas.is_empty() {
            self.store.apply(plan).await?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::store::MemoryStore;
    use crate::{NewFirearmCmd, NewLotCmd, SessionCmd, StockSource, UsageSlot};

    use super::*;

    #[tokio::test]
    async fn recount_repairs_skewed_records() {
        let engine = Engine::with_store(MemoryStore::new());
        let firearm = engine
            .new_firearm(NewFirearmCmd::new("CZ 75", "9mm"))
            .await
            .unwrap();
        let lot = engine
            .new_lot(NewLotCmd::new("case", "9mm", 200, Utc::now()))
            .await
            .unwrap();
        engine
            .commit_session(SessionCmd::new(Utc::now(), "range").expend(
                UsageSlot::Firearm {
                    firearm_id: firearm.id,
                },
                StockSource::caliber("9mm"),
                50,
            ))
            .await
            .unwrap();

        // skew both records away from what the usage rows say
        let mut skew = MutationPlan::default();
        skew.debit_lot(lot.id, 25);
        skew.raise_counter(firearm.id, 7);
        engine.store.apply(skew).await.unwrap();

        let report = engine.recount().await.unwrap();
        assert_eq!(
            report,
            Recount {
                firearms_adjusted: 1,
                lots_adjusted: 1,
            }
        );
        assert_eq!(engine.firearm(firearm.id).await.unwrap().rounds_fired, 50);
        assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 150);

        // a ledger that adds up needs no corrections
        let report = engine.recount().await.unwrap();
        assert_eq!(report, Recount::default());
    }

    #[tokio::test]
    async fn seeded_counters_survive_a_recount() {
        let engine = Engine::with_store(MemoryStore::new());
        let firearm = engine
            .new_firearm(NewFirearmCmd::new("Garand", ".30-06").seed_rounds(1200))
            .await
            .unwrap();

        let report = engine.recount().await.unwrap();
        assert_eq!(report, Recount::default());
        assert_eq!(engine.firearm(firearm.id).await.unwrap().rounds_fired, 1200);
    }
}
