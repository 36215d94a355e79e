use uuid::Uuid;

use crate::allocator::StockView;
use crate::checks;
use crate::plan::{MutationPlan, PlanRecord};
use crate::store::EntityStore;
use crate::{
    EngineError, EntityKind, RangeVisit, ResultEngine, SessionCmd, SessionIssue, StockSource,
    UsageEntry, usage,
};

use super::super::{Engine, normalize_optional_text};

impl<S: EntityStore> Engine<S> {
    /// Validate `cmd` against current records without committing anything.
    /// An empty list means a commit would pass its checks, stock permitting.
    pub async fn check_session(&self, cmd: &SessionCmd) -> ResultEngine<Vec<SessionIssue>> {
        let catalog = self.catalog().await?;
        Ok(checks::check_session(cmd, &catalog))
    }

    /// Commit a new range session.
    ///
    /// Runs every check, allocates ammunition oldest lot first (or from the
    /// pinned lot), and lands the visit record, lot debits and counter
    /// credits in one atomic step. Any failure leaves all records unchanged.
    pub async fn commit_session(&self, cmd: SessionCmd) -> ResultEngine<RangeVisit> {
        let catalog = self.catalog().await?;
        checks::fail_on_issues(checks::check_session(&cmd, &catalog))?;

        let mut stock = StockView::new(catalog.lots_vec());
        let mut plan = MutationPlan::default();
        let visit = plan_session(&cmd, None, &mut stock, &mut plan)?;
        plan.record = Some(PlanRecord::Insert(visit.clone()));

        self.store.apply(plan).await?;
        Ok(visit)
    }

    /// Replace an existing session with `cmd`.
    ///
    /// The prior usage is released first, so the new allocation can draw on
    /// rounds the old one held and stock moves only by the difference. The
    /// visit keeps its id.
    pub async fn amend_session(
        &self,
        visit_id: Uuid,
        cmd: SessionCmd,
    ) -> ResultEngine<RangeVisit> {
        let Some(prior) = self.store.range_visit(visit_id).await? else {
            return Err(EngineError::unknown(EntityKind::RangeVisit, visit_id));
        };
        let catalog = self.catalog().await?;
        checks::fail_on_issues(checks::check_session(&cmd, &catalog))?;

        let mut stock = StockView::new(catalog.lots_vec());
        let mut plan = MutationPlan::default();
        release_prior(&prior, &mut stock, &mut plan);
        let visit = plan_session(&cmd, Some(visit_id), &mut stock, &mut plan)?;
        plan.record = Some(PlanRecord::Replace(visit.clone()));

        self.store.apply(plan).await?;
        Ok(visit)
    }

    /// Delete a session and return its consumption: lot stock comes back,
    /// counters go down.
    pub async fn delete_session(&self, visit_id: Uuid) -> ResultEngine<()> {
        let Some(prior) = self.store.range_visit(visit_id).await? else {
            return Err(EngineError::unknown(EntityKind::RangeVisit, visit_id));
        };

        let mut plan = MutationPlan::default();
        for entry in &prior.entries {
            plan.credit_lot(entry.lot_id, entry.rounds);
            if let Some(firearm_id) = entry.slot.firearm_id() {
                plan.lower_counter(firearm_id, entry.rounds);
            }
        }
        plan.record = Some(PlanRecord::Remove(visit_id));
        self.store.apply(plan).await
    }
}

/// Put a prior visit's consumption back into the projection and plan the
/// inverse deltas. Replanning after this sees the returned rounds.
fn release_prior(prior: &RangeVisit, stock: &mut StockView, plan: &mut MutationPlan) {
    for entry in &prior.entries {
        stock.release(entry.lot_id, entry.rounds);
        plan.credit_lot(entry.lot_id, entry.rounds);
        if let Some(firearm_id) = entry.slot.firearm_id() {
            plan.lower_counter(firearm_id, entry.rounds);
        }
    }
}

/// Allocate every live entry of `cmd`, accumulate the debits into `plan`,
/// and return the visit record to persist. `visit_id` pins the id for
/// replacements. Entries with `rounds <= 0` are dropped.
fn plan_session(
    cmd: &SessionCmd,
    visit_id: Option<Uuid>,
    stock: &mut StockView,
    plan: &mut MutationPlan,
) -> ResultEngine<RangeVisit> {
    let location = cmd.location.trim().to_string();
    let notes = normalize_optional_text(cmd.notes.as_deref());
    let mut visit = RangeVisit::new(cmd.occurred_at, location, notes);
    if let Some(visit_id) = visit_id {
        visit.id = visit_id;
    }

    for entry in cmd.usage.iter().filter(|entry| entry.rounds > 0) {
        let debits = match &entry.source {
            Some(StockSource::Lot { lot_id }) => {
                vec![stock.allocate_lot(*lot_id, entry.rounds)?]
            }
            Some(StockSource::Caliber { caliber }) => {
                stock.allocate_caliber(caliber, entry.rounds)?
            }
            None => {
                return Err(EngineError::Corrupted(
                    "usage entry without a source survived validation".to_string(),
                ));
            }
        };
        for debit in debits {
            plan.debit_lot(debit.lot_id, debit.rounds);
            visit.entries.push(UsageEntry::new(
                visit.id,
                entry.slot.clone(),
                debit.lot_id,
                debit.rounds,
            ));
        }
        if let Some(firearm_id) = entry.slot.firearm_id() {
            plan.raise_counter(firearm_id, entry.rounds);
        }
    }

    usage::sort_entries(&mut visit.entries);
    Ok(visit)
}
