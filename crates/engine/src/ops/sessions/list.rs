use uuid::Uuid;

use crate::store::EntityStore;
use crate::{EngineError, EntityKind, RangeVisit, ResultEngine, SessionFilter};

use super::super::Engine;

impl<S: EntityStore> Engine<S> {
    /// Fetch one session with its usage entries.
    pub async fn session(&self, visit_id: Uuid) -> ResultEngine<RangeVisit> {
        let Some(visit) = self.store.range_visit(visit_id).await? else {
            return Err(EngineError::unknown(EntityKind::RangeVisit, visit_id));
        };
        Ok(visit)
    }

    /// List sessions newest first, narrowed by `filter`.
    pub async fn sessions(&self, filter: &SessionFilter) -> ResultEngine<Vec<RangeVisit>> {
        self.store.range_visits(filter).await
    }
}
