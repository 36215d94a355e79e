//! Command structs for engine operations.
//!
//! These types group parameters for write operations (session commit/amend,
//! firearm and lot registration), keeping call sites readable and avoiding
//! long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::UsageSlot;

/// Where an entry's ammunition comes from: a pinned lot chosen by the user,
/// or a caliber resolved FIFO across that caliber's lots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StockSource {
    Lot { lot_id: Uuid },
    Caliber { caliber: String },
}

impl StockSource {
    #[must_use]
    pub fn lot(lot_id: Uuid) -> Self {
        Self::Lot { lot_id }
    }

    #[must_use]
    pub fn caliber(caliber: impl Into<String>) -> Self {
        Self::Caliber {
            caliber: caliber.into(),
        }
    }
}

/// One requested usage entry: a slot, an ammunition source and a round count.
///
/// `source` is optional only so the validator can report a request that named
/// neither a lot nor a caliber; every committed entry has one.
#[derive(Clone, Debug)]
pub struct UsageCmd {
    pub slot: UsageSlot,
    pub source: Option<StockSource>,
    pub rounds: i64,
}

/// Create or replace a range session.
#[derive(Clone, Debug)]
pub struct SessionCmd {
    pub occurred_at: DateTime<Utc>,
    pub location: String,
    pub notes: Option<String>,
    pub usage: Vec<UsageCmd>,
}

impl SessionCmd {
    #[must_use]
    pub fn new(occurred_at: DateTime<Utc>, location: impl Into<String>) -> Self {
        Self {
            occurred_at,
            location: location.into(),
            notes: None,
            usage: Vec::new(),
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Add a usage entry expending `rounds` through `slot` from `source`.
    #[must_use]
    pub fn expend(mut self, slot: UsageSlot, source: StockSource, rounds: i64) -> Self {
        self.usage.push(UsageCmd {
            slot,
            source: Some(source),
            rounds,
        });
        self
    }
}

/// Register a firearm.
#[derive(Clone, Debug)]
pub struct NewFirearmCmd {
    pub name: String,
    pub caliber: String,
    /// Rounds already fired before tracking started.
    pub seed_rounds: i64,
}

impl NewFirearmCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, caliber: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caliber: caliber.into(),
            seed_rounds: 0,
        }
    }

    #[must_use]
    pub fn seed_rounds(mut self, seed_rounds: i64) -> Self {
        self.seed_rounds = seed_rounds;
        self
    }
}

/// Register an ammunition lot.
#[derive(Clone, Debug)]
pub struct NewLotCmd {
    pub label: String,
    pub caliber: String,
    pub quantity: i64,
    pub purchased_at: DateTime<Utc>,
}

impl NewLotCmd {
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        caliber: impl Into<String>,
        quantity: i64,
        purchased_at: DateTime<Utc>,
    ) -> Self {
        Self {
            label: label.into(),
            caliber: caliber.into(),
            quantity,
            purchased_at,
        }
    }
}

/// Narrow a session listing: sessions strictly before a timestamp, capped at
/// `limit` rows. Defaults to the full history, newest first.
#[derive(Clone, Debug, Default)]
pub struct SessionFilter {
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

impl SessionFilter {
    #[must_use]
    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}
