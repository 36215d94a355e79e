//! The module contains the `AmmunitionLot` struct and its persistence model.
//!
//! A lot is one purchased batch of a single caliber. `on_hand` is the only
//! mutable field and it changes exclusively through committed plans; the
//! purchase quantity stays around so stock can be recomputed from the visit
//! history.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util};

/// A purchased batch of ammunition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmunitionLot {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    /// Free-form description, e.g. "Federal 115gr FMJ".
    pub label: String,
    pub caliber: String,
    /// Rounds still available. Never negative.
    pub on_hand: i64,
    /// Rounds in the batch when it was bought; immutable afterwards.
    pub purchased: i64,
    /// Defines the FIFO consumption order across lots of one caliber.
    pub purchased_at: DateTime<Utc>,
}

impl AmmunitionLot {
    pub fn new(label: String, caliber: String, quantity: i64, purchased_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            caliber,
            on_hand: quantity,
            purchased: quantity,
            purchased_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ammunition_lots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub label: String,
    pub caliber: String,
    pub on_hand: i64,
    pub purchased: i64,
    pub purchased_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AmmunitionLot> for ActiveModel {
    fn from(lot: &AmmunitionLot) -> Self {
        Self {
            id: ActiveValue::Set(lot.id.to_string()),
            label: ActiveValue::Set(lot.label.clone()),
            caliber: ActiveValue::Set(lot.caliber.clone()),
            on_hand: ActiveValue::Set(lot.on_hand),
            purchased: ActiveValue::Set(lot.purchased),
            purchased_at: ActiveValue::Set(lot.purchased_at),
        }
    }
}

impl TryFrom<Model> for AmmunitionLot {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "ammunition lot")?,
            label: model.label,
            caliber: model.caliber,
            on_hand: model.on_hand,
            purchased: model.purchased,
            purchased_at: model.purchased_at,
        })
    }
}
