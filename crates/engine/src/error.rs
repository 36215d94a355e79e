//! The module contains the error the engine can throw.
//!
//! The interesting ones are:
//!
//! - [`InsufficientStock`] thrown when an allocation cannot be satisfied.
//! - [`UnknownEntity`] thrown when a referenced record does not exist.
//!
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`UnknownEntity`]: EngineError::UnknownEntity
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::checks::SessionIssue;

/// Kind of record an id failed to resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Firearm,
    AmmunitionLot,
    RangeVisit,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Firearm => "firearm",
            Self::AmmunitionLot => "ammunition lot",
            Self::RangeVisit => "range visit",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an unsatisfiable allocation was drawing from: a caliber's aggregate
/// stock, or one pinned lot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StockScope {
    Caliber(String),
    Lot(Uuid),
}

impl fmt::Display for StockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caliber(caliber) => write!(f, "caliber \"{caliber}\""),
            Self::Lot(lot_id) => write!(f, "lot {lot_id}"),
        }
    }
}

fn join_issues(issues: &[SessionIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },
    #[error("Invalid session: {}", join_issues(.0))]
    InvalidSession(Vec<SessionIssue>),
    #[error("{kind} \"{id}\" not found!")]
    UnknownEntity { kind: EntityKind, id: String },
    #[error("Not enough rounds for {scope}: requested {requested}, available {available}")]
    InsufficientStock {
        scope: StockScope,
        requested: i64,
        available: i64,
    },
    #[error("Inconsistent record: {0}")]
    Corrupted(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn unknown(kind: EntityKind, id: impl ToString) -> Self {
        Self::UnknownEntity {
            kind,
            id: id.to_string(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Validation { field, reason },
                Self::Validation {
                    field: other_field,
                    reason: other_reason,
                },
            ) => field == other_field && reason == other_reason,
            (Self::InvalidSession(a), Self::InvalidSession(b)) => a == b,
            (
                Self::UnknownEntity { kind, id },
                Self::UnknownEntity {
                    kind: other_kind,
                    id: other_id,
                },
            ) => kind == other_kind && id == other_id,
            (
                Self::InsufficientStock {
                    scope,
                    requested,
                    available,
                },
                Self::InsufficientStock {
                    scope: other_scope,
                    requested: other_requested,
                    available: other_available,
                },
            ) => scope == other_scope && requested == other_requested && available == other_available,
            (Self::Corrupted(a), Self::Corrupted(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
