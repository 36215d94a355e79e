//! Storage backends.
//!
//! [`EntityStore`] is the persistence seam of the engine: load entities,
//! list them, and land a [`MutationPlan`] as one atomic step. [`SqlStore`]
//! keeps everything in SQLite through SeaORM. [`MemoryStore`] serves
//! clients that hold their records in process and reconcile against the
//! same rules.

mod memory;
mod sql;

pub use memory::MemoryStore;
pub use sql::SqlStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    AmmunitionLot, Firearm, MutationPlan, RangeVisit, ResultEngine, SessionFilter,
};

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn firearm(&self, id: Uuid) -> ResultEngine<Option<Firearm>>;

    /// All firearms, ordered by name then id.
    async fn firearms(&self) -> ResultEngine<Vec<Firearm>>;

    async fn insert_firearm(&self, firearm: &Firearm) -> ResultEngine<()>;

    async fn ammunition_lot(&self, id: Uuid) -> ResultEngine<Option<AmmunitionLot>>;

    /// All lots, oldest purchase first, ties by id.
    async fn ammunition_lots(&self) -> ResultEngine<Vec<AmmunitionLot>>;

    async fn insert_lot(&self, lot: &AmmunitionLot) -> ResultEngine<()>;

    /// One visit with its usage entries loaded.
    async fn range_visit(&self, id: Uuid) -> ResultEngine<Option<RangeVisit>>;

    /// Visits newest first, entries loaded, narrowed by `filter`.
    async fn range_visits(&self, filter: &SessionFilter) -> ResultEngine<Vec<RangeVisit>>;

    /// Land every delta and the record change together, or nothing at all.
    ///
    /// Deltas are re-checked against current rows, not the rows the plan was
    /// built from. A plan made stale by a concurrent commit fails with
    /// [`InsufficientStock`](crate::EngineError::InsufficientStock) and
    /// leaves no partial effect.
    async fn apply(&self, plan: MutationPlan) -> ResultEngine<()>;
}
