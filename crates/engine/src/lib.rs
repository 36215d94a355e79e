//! Reconciliation engine for a personal range log.
//!
//! The engine owns three kinds of records (firearms, ammunition lots, range
//! visits) and one rule: committed usage, lot stock and firearm counters
//! always add up. Every write first builds a fully validated plan and then
//! lands it atomically, so no failure can leave stock half-adjusted.

pub use ammunition::AmmunitionLot;
pub use checks::SessionIssue;
pub use commands::{
    NewFirearmCmd, NewLotCmd, SessionCmd, SessionFilter, StockSource, UsageCmd,
};
pub use error::{EngineError, EntityKind, StockScope};
pub use firearms::Firearm;
pub use ops::{Engine, EngineBuilder, Recount};
pub use plan::MutationPlan;
pub use store::{EntityStore, MemoryStore, SqlStore};
pub use usage::{UsageEntry, UsageSlot};
pub use visits::RangeVisit;

mod allocator;
mod ammunition;
mod checks;
mod commands;
mod error;
mod firearms;
mod ops;
mod plan;
mod store;
mod usage;
mod util;
mod visits;

type ResultEngine<T> = Result<T, EngineError>;
