//! Range visit primitives.
//!
//! A `RangeVisit` is the committed record of one range session: where and
//! when, plus the usage rows describing what was fired and from which lots.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, usage};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeVisit {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub location: String,
    pub notes: Option<String>,
    pub entries: Vec<usage::UsageEntry>,
}

impl RangeVisit {
    pub fn new(occurred_at: DateTime<Utc>, location: String, notes: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at,
            location,
            notes,
            entries: Vec::new(),
        }
    }

    /// Total rounds expended across all usage rows.
    pub fn rounds_total(&self) -> i64 {
        self.entries.iter().map(|entry| entry.rounds).sum()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "range_visits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub occurred_at: DateTimeUtc,
    pub location: String,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::usage::Entity")]
    Usage,
}

impl Related<super::usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RangeVisit> for ActiveModel {
    fn from(visit: &RangeVisit) -> Self {
        Self {
            id: ActiveValue::Set(visit.id.to_string()),
            occurred_at: ActiveValue::Set(visit.occurred_at),
            location: ActiveValue::Set(visit.location.clone()),
            notes: ActiveValue::Set(visit.notes.clone()),
        }
    }
}

impl TryFrom<Model> for RangeVisit {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: crate::util::parse_uuid(&model.id, "range visit")?,
            occurred_at: model.occurred_at,
            location: model.location,
            notes: model.notes,
            entries: Vec::new(),
        })
    }
}
