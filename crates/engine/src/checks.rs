//! Pre-commit session checks.
//!
//! Pure functions over a loaded [`Catalog`]: no IO, no mutation. The commit
//! pipeline runs them before planning anything, and the same checks are
//! exposed through [`Engine::check_session`](crate::Engine::check_session)
//! so a client can pre-validate a form without attempting a commit.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::{
    AmmunitionLot, EngineError, EntityKind, Firearm, ResultEngine, SessionCmd, StockSource,
    UsageSlot, util,
};

/// Firearms and lots loaded for one validation/planning pass.
pub(crate) struct Catalog {
    pub firearms: HashMap<Uuid, Firearm>,
    pub lots: HashMap<Uuid, AmmunitionLot>,
}

impl Catalog {
    pub fn new(firearms: Vec<Firearm>, lots: Vec<AmmunitionLot>) -> Self {
        Self {
            firearms: firearms.into_iter().map(|f| (f.id, f)).collect(),
            lots: lots.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    pub fn lots_vec(&self) -> Vec<AmmunitionLot> {
        self.lots.values().cloned().collect()
    }
}

/// One failed pre-commit check. `field()` gives the offending request field,
/// the `Display` impl the human reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionIssue {
    EmptyLocation,
    NoUsage,
    MissingSource {
        slot: UsageSlot,
    },
    UnknownFirearm {
        firearm_id: Uuid,
    },
    UnknownLot {
        slot: UsageSlot,
        lot_id: Uuid,
    },
    CaliberMismatch {
        slot: UsageSlot,
        firearm_caliber: String,
        ammunition_caliber: String,
    },
}

impl SessionIssue {
    pub fn field(&self) -> String {
        match self {
            Self::EmptyLocation => "location".to_string(),
            Self::NoUsage => "usage".to_string(),
            Self::MissingSource { slot }
            | Self::UnknownLot { slot, .. }
            | Self::CaliberMismatch { slot, .. } => format!("usage.{}", slot.key()),
            Self::UnknownFirearm { firearm_id } => format!("usage.{firearm_id}"),
        }
    }
}

impl fmt::Display for SessionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLocation => write!(f, "location must not be empty"),
            Self::NoUsage => write!(f, "no usage entry with rounds > 0"),
            Self::MissingSource { slot } => write!(
                f,
                "slot \"{}\" names neither an ammunition lot nor a caliber",
                slot.key()
            ),
            Self::UnknownFirearm { firearm_id } => {
                write!(f, "slot \"{firearm_id}\" is not a registered firearm")
            }
            Self::UnknownLot { slot, lot_id } => write!(
                f,
                "slot \"{}\" references unknown ammunition lot {lot_id}",
                slot.key()
            ),
            Self::CaliberMismatch {
                slot,
                firearm_caliber,
                ammunition_caliber,
            } => write!(
                f,
                "slot \"{}\" fires {firearm_caliber} but the ammunition is {ammunition_caliber}",
                slot.key()
            ),
        }
    }
}

/// Run every pre-commit check. Entries with `rounds <= 0` are skipped here
/// and dropped by the planner; they only matter for the "at least one live
/// entry" rule.
pub(crate) fn check_session(cmd: &SessionCmd, catalog: &Catalog) -> Vec<SessionIssue> {
    let mut issues = Vec::new();

    if cmd.location.trim().is_empty() {
        issues.push(SessionIssue::EmptyLocation);
    }
    if !cmd.usage.iter().any(|entry| entry.rounds > 0) {
        issues.push(SessionIssue::NoUsage);
    }

    for entry in cmd.usage.iter().filter(|entry| entry.rounds > 0) {
        let firearm = match &entry.slot {
            UsageSlot::Firearm { firearm_id } => match catalog.firearms.get(firearm_id) {
                Some(firearm) => Some(firearm),
                None => {
                    issues.push(SessionIssue::UnknownFirearm {
                        firearm_id: *firearm_id,
                    });
                    continue;
                }
            },
            UsageSlot::Borrowed { .. } => None,
        };

        let ammunition_caliber = match &entry.source {
            Some(StockSource::Lot { lot_id }) => match catalog.lots.get(lot_id) {
                Some(lot) => lot.caliber.clone(),
                None => {
                    issues.push(SessionIssue::UnknownLot {
                        slot: entry.slot.clone(),
                        lot_id: *lot_id,
                    });
                    continue;
                }
            },
            Some(StockSource::Caliber { caliber }) if !caliber.trim().is_empty() => {
                caliber.clone()
            }
            _ => {
                issues.push(SessionIssue::MissingSource {
                    slot: entry.slot.clone(),
                });
                continue;
            }
        };

        if let Some(firearm) = firearm
            && !util::same_caliber(&firearm.caliber, &ammunition_caliber)
        {
            issues.push(SessionIssue::CaliberMismatch {
                slot: entry.slot.clone(),
                firearm_caliber: firearm.caliber.clone(),
                ammunition_caliber: util::normalize_caliber(&ammunition_caliber),
            });
        }
    }

    issues
}

/// Turn a non-empty issue list into the commit-aborting error: missing
/// entities win over field problems, everything else groups into one
/// `InvalidSession`.
pub(crate) fn fail_on_issues(issues: Vec<SessionIssue>) -> ResultEngine<()> {
    if issues.is_empty() {
        return Ok(());
    }
    for issue in &issues {
        match issue {
            SessionIssue::UnknownFirearm { firearm_id } => {
                return Err(EngineError::unknown(EntityKind::Firearm, firearm_id));
            }
            SessionIssue::UnknownLot { lot_id, .. } => {
                return Err(EngineError::unknown(EntityKind::AmmunitionLot, lot_id));
            }
            _ => {}
        }
    }
    Err(EngineError::InvalidSession(issues))
}
