//! The module contains the `Firearm` struct and its persistence model.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util};

/// A tracked firearm.
///
/// The interesting field is `rounds_fired`: a monotonic counter credited by
/// committed range sessions and by nothing else. Its starting value is kept
/// in `seed_rounds` so the counter can always be recomputed from the visit
/// history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firearm {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    pub name: String,
    pub caliber: String,
    /// Cumulative rounds fired, seed included.
    pub rounds_fired: i64,
    /// Counter value at registration; immutable afterwards.
    pub seed_rounds: i64,
}

impl Firearm {
    pub fn new(name: String, caliber: String, seed_rounds: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            caliber,
            rounds_fired: seed_rounds,
            seed_rounds,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "firearms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub caliber: String,
    pub rounds_fired: i64,
    pub seed_rounds: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Firearm> for ActiveModel {
    fn from(firearm: &Firearm) -> Self {
        Self {
            id: ActiveValue::Set(firearm.id.to_string()),
            name: ActiveValue::Set(firearm.name.clone()),
            caliber: ActiveValue::Set(firearm.caliber.clone()),
            rounds_fired: ActiveValue::Set(firearm.rounds_fired),
            seed_rounds: ActiveValue::Set(firearm.seed_rounds),
        }
    }
}

impl TryFrom<Model> for Firearm {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "firearm")?,
            name: model.name,
            caliber: model.caliber,
            rounds_fired: model.rounds_fired,
            seed_rounds: model.seed_rounds,
        })
    }
}
