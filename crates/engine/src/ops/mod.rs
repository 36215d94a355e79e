use sea_orm::DatabaseConnection;

use crate::checks::Catalog;
use crate::store::{EntityStore, SqlStore};
use crate::{EngineError, ResultEngine};

mod armory;
mod audit;
mod sessions;

pub use audit::Recount;

/// The reconciliation engine. Every read and write goes through one of its
/// operations; every write lands a fully validated plan or nothing.
#[derive(Debug)]
pub struct Engine<S> {
    store: S,
}

impl Engine<SqlStore> {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

impl<S: EntityStore> Engine<S> {
    /// Run the engine over a caller-provided store, e.g.
    /// [`MemoryStore`](crate::MemoryStore) for clients that keep their
    /// records in process.
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub(crate) async fn catalog(&self) -> ResultEngine<Catalog> {
        let firearms = self.store.firearms().await?;
        let lots = self.store.ammunition_lots().await?;
        Ok(Catalog::new(firearms, lots))
    }
}

fn normalize_required_name(value: &str, label: &'static str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation {
            field: label,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine<SqlStore>> {
        Ok(Engine {
            store: SqlStore::new(self.database),
        })
    }
}
