//! SQLite persistence through SeaORM.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::plan::PlanRecord;
use crate::{
    AmmunitionLot, EngineError, EntityKind, Firearm, MutationPlan, RangeVisit, ResultEngine,
    SessionFilter, StockScope, UsageEntry, ammunition, firearms, usage, visits,
};

use super::EntityStore;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

/// Store backed by a SeaORM connection. One applied plan is one SQL
/// transaction.
#[derive(Clone, Debug)]
pub struct SqlStore {
    database: DatabaseConnection,
}

impl SqlStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl EntityStore for SqlStore {
    async fn firearm(&self, id: Uuid) -> ResultEngine<Option<Firearm>> {
        let model = firearms::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?;
        match model {
            Some(model) => Ok(Some(model.try_into()?)),
            None => Ok(None),
        }
    }

    async fn firearms(&self) -> ResultEngine<Vec<Firearm>> {
        let models = firearms::Entity::find()
            .order_by_asc(firearms::Column::Name)
            .order_by_asc(firearms::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Firearm::try_from).collect()
    }

    async fn insert_firearm(&self, firearm: &Firearm) -> ResultEngine<()> {
        firearms::ActiveModel::from(firearm)
            .insert(&self.database)
            .await?;
        Ok(())
    }

    async fn ammunition_lot(&self, id: Uuid) -> ResultEngine<Option<AmmunitionLot>> {
        let model = ammunition::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?;
        match model {
            Some(model) => Ok(Some(model.try_into()?)),
            None => Ok(None),
        }
    }

    async fn ammunition_lots(&self) -> ResultEngine<Vec<AmmunitionLot>> {
        let models = ammunition::Entity::find()
            .order_by_asc(ammunition::Column::PurchasedAt)
            .order_by_asc(ammunition::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(AmmunitionLot::try_from).collect()
    }

    async fn insert_lot(&self, lot: &AmmunitionLot) -> ResultEngine<()> {
        ammunition::ActiveModel::from(lot)
            .insert(&self.database)
            .await?;
        Ok(())
    }

    async fn range_visit(&self, id: Uuid) -> ResultEngine<Option<RangeVisit>> {
        let Some(model) = visits::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };

        let entry_models = usage::Entity::find()
            .filter(usage::Column::VisitId.eq(id.to_string()))
            .all(&self.database)
            .await?;
        let mut entries: Vec<UsageEntry> = Vec::with_capacity(entry_models.len());
        for entry_model in entry_models {
            entries.push(entry_model.try_into()?);
        }
        usage::sort_entries(&mut entries);

        let mut visit: RangeVisit = model.try_into()?;
        visit.entries = entries;
        Ok(Some(visit))
    }

    async fn range_visits(&self, filter: &SessionFilter) -> ResultEngine<Vec<RangeVisit>> {
        let mut query = visits::Entity::find()
            .order_by_desc(visits::Column::OccurredAt)
            .order_by_desc(visits::Column::Id);
        if let Some(before) = filter.before {
            query = query.filter(visits::Column::OccurredAt.lt(before));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        let models = query.all(&self.database).await?;
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = models.iter().map(|model| model.id.clone()).collect();
        let entry_models = usage::Entity::find()
            .filter(usage::Column::VisitId.is_in(ids))
            .all(&self.database)
            .await?;
        let mut grouped: HashMap<String, Vec<UsageEntry>> = HashMap::new();
        for entry_model in entry_models {
            let visit_id = entry_model.visit_id.clone();
            grouped
                .entry(visit_id)
                .or_default()
                .push(entry_model.try_into()?);
        }

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let mut entries = grouped.remove(&model.id).unwrap_or_default();
            usage::sort_entries(&mut entries);
            let mut visit: RangeVisit = model.try_into()?;
            visit.entries = entries;
            out.push(visit);
        }
        Ok(out)
    }

    async fn apply(&self, plan: MutationPlan) -> ResultEngine<()> {
        with_tx!(self, |db_tx| { apply_plan(&db_tx, plan).await })
    }
}

/// Execute a plan against `db`. Every delta is validated against the row as
/// it stands inside the transaction, so plans built from stale reads fail
/// here instead of writing bad stock.
async fn apply_plan<C: ConnectionTrait>(db: &C, plan: MutationPlan) -> ResultEngine<()> {
    for (lot_id, delta) in &plan.lot_deltas {
        if *delta == 0 {
            continue;
        }
        let Some(model) = ammunition::Entity::find_by_id(lot_id.to_string())
            .one(db)
            .await?
        else {
            return Err(EngineError::unknown(EntityKind::AmmunitionLot, lot_id));
        };
        let projected = model.on_hand + delta;
        if projected < 0 {
            return Err(EngineError::InsufficientStock {
                scope: StockScope::Lot(*lot_id),
                requested: -delta,
                available: model.on_hand,
            });
        }
        let active = ammunition::ActiveModel {
            id: ActiveValue::Set(model.id),
            on_hand: ActiveValue::Set(projected),
            ..Default::default()
        };
        active.update(db).await?;
    }

    for (firearm_id, delta) in &plan.firearm_deltas {
        if *delta == 0 {
            continue;
        }
        let Some(model) = firearms::Entity::find_by_id(firearm_id.to_string())
            .one(db)
            .await?
        else {
            return Err(EngineError::unknown(EntityKind::Firearm, firearm_id));
        };
        let projected = model.rounds_fired + delta;
        if projected < 0 {
            return Err(EngineError::Corrupted(format!(
                "firearm {firearm_id} counter would drop below zero"
            )));
        }
        let active = firearms::ActiveModel {
            id: ActiveValue::Set(model.id),
            rounds_fired: ActiveValue::Set(projected),
            ..Default::default()
        };
        active.update(db).await?;
    }

    match &plan.record {
        Some(PlanRecord::Insert(visit)) => {
            visits::ActiveModel::from(visit).insert(db).await?;
            insert_entries(db, visit).await?;
        }
        Some(PlanRecord::Replace(visit)) => {
            visits::ActiveModel::from(visit).update(db).await?;
            usage::Entity::delete_many()
                .filter(usage::Column::VisitId.eq(visit.id.to_string()))
                .exec(db)
                .await?;
            insert_entries(db, visit).await?;
        }
        Some(PlanRecord::Remove(visit_id)) => {
            usage::Entity::delete_many()
                .filter(usage::Column::VisitId.eq(visit_id.to_string()))
                .exec(db)
                .await?;
            let deleted = visits::Entity::delete_by_id(visit_id.to_string())
                .exec(db)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::unknown(EntityKind::RangeVisit, visit_id));
            }
        }
        None => {}
    }

    Ok(())
}

async fn insert_entries<C: ConnectionTrait>(db: &C, visit: &RangeVisit) -> ResultEngine<()> {
    for entry in &visit.entries {
        usage::ActiveModel::from(entry).insert(db).await?;
    }
    Ok(())
}
