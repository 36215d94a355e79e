//! Usage entries.
//!
//! A [`UsageEntry`] is one slice of ammunition consumption inside a
//! [`RangeVisit`](crate::RangeVisit): `rounds` drawn from one lot, attributed
//! to one slot. FIFO allocation may split a single requested entry across
//! several lots, so one slot can own several rows with distinct lot ids.
//!
//! In the engine, *every* change to stock and counters happens via these rows.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SlotKind {
    Firearm,
    Borrowed,
}

impl SlotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Firearm => "firearm",
            Self::Borrowed => "borrowed",
        }
    }
}

impl TryFrom<&str> for SlotKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "firearm" => Ok(Self::Firearm),
            "borrowed" => Ok(Self::Borrowed),
            other => Err(EngineError::Corrupted(format!(
                "invalid usage slot kind: {other}"
            ))),
        }
    }
}

/// What the rounds were fired through: a tracked firearm, or a borrowed one
/// identified only by a synthetic tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum UsageSlot {
    Firearm { firearm_id: Uuid },
    Borrowed { tag: String },
}

impl UsageSlot {
    pub const BORROWED_PREFIX: &'static str = "borrowed-";

    /// Parse a request slot key: a firearm UUID, or `borrowed-<suffix>` with
    /// a non-empty suffix.
    pub fn parse_key(key: &str) -> Option<Self> {
        if let Some(tag) = key.strip_prefix(Self::BORROWED_PREFIX) {
            let tag = tag.trim();
            (!tag.is_empty()).then(|| Self::Borrowed {
                tag: tag.to_string(),
            })
        } else {
            Uuid::parse_str(key)
                .ok()
                .map(|firearm_id| Self::Firearm { firearm_id })
        }
    }

    /// The wire form of the slot, usable as a request map key.
    pub fn key(&self) -> String {
        match self {
            Self::Firearm { firearm_id } => firearm_id.to_string(),
            Self::Borrowed { tag } => format!("{}{tag}", Self::BORROWED_PREFIX),
        }
    }

    pub(crate) fn firearm_id(&self) -> Option<Uuid> {
        match self {
            Self::Firearm { firearm_id } => Some(*firearm_id),
            Self::Borrowed { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub slot: UsageSlot,
    pub lot_id: Uuid,
    /// Rounds drawn from `lot_id`. Always > 0 once persisted.
    pub rounds: i64,
}

impl UsageEntry {
    pub fn new(visit_id: Uuid, slot: UsageSlot, lot_id: Uuid, rounds: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            visit_id,
            slot,
            lot_id,
            rounds,
        }
    }

    fn slot_kind(&self) -> SlotKind {
        match self.slot {
            UsageSlot::Firearm { .. } => SlotKind::Firearm,
            UsageSlot::Borrowed { .. } => SlotKind::Borrowed,
        }
    }

    fn slot_id(&self) -> String {
        match &self.slot {
            UsageSlot::Firearm { firearm_id } => firearm_id.to_string(),
            UsageSlot::Borrowed { tag } => tag.clone(),
        }
    }
}

/// Fixed order for loaded entries, so both storage backends agree.
pub(crate) fn sort_entries(entries: &mut [UsageEntry]) {
    entries.sort_by_key(|entry| (entry.slot.key(), entry.lot_id));
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "usage_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub visit_id: String,
    pub slot_kind: String,
    pub slot_id: String,
    pub lot_id: String,
    pub rounds: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::visits::Entity",
        from = "Column::VisitId",
        to = "super::visits::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Visits,
}

impl Related<super::visits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Visits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&UsageEntry> for ActiveModel {
    fn from(entry: &UsageEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            visit_id: ActiveValue::Set(entry.visit_id.to_string()),
            slot_kind: ActiveValue::Set(entry.slot_kind().as_str().to_string()),
            slot_id: ActiveValue::Set(entry.slot_id()),
            lot_id: ActiveValue::Set(entry.lot_id.to_string()),
            rounds: ActiveValue::Set(entry.rounds),
        }
    }
}

impl TryFrom<Model> for UsageEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let slot = match SlotKind::try_from(model.slot_kind.as_str())? {
            SlotKind::Firearm => UsageSlot::Firearm {
                firearm_id: util::parse_uuid(&model.slot_id, "usage slot firearm")?,
            },
            SlotKind::Borrowed => UsageSlot::Borrowed { tag: model.slot_id },
        };

        Ok(Self {
            id: util::parse_uuid(&model.id, "usage entry")?,
            visit_id: util::parse_uuid(&model.visit_id, "range visit")?,
            slot,
            lot_id: util::parse_uuid(&model.lot_id, "ammunition lot")?,
            rounds: model.rounds,
        })
    }
}
