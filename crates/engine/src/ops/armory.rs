//! Registry operations for firearms and ammunition lots.

use uuid::Uuid;

use crate::store::EntityStore;
use crate::{
    AmmunitionLot, EngineError, EntityKind, Firearm, NewFirearmCmd, NewLotCmd, ResultEngine, util,
};

use super::{Engine, normalize_required_name};

impl<S: EntityStore> Engine<S> {
    /// Register a firearm. Its round counter starts at `seed_rounds`, the
    /// rounds it had fired before tracking began.
    pub async fn new_firearm(&self, cmd: NewFirearmCmd) -> ResultEngine<Firearm> {
        let name = normalize_required_name(&cmd.name, "name")?;
        let caliber = util::normalize_caliber(&normalize_required_name(&cmd.caliber, "caliber")?);
        if cmd.seed_rounds < 0 {
            return Err(EngineError::Validation {
                field: "seed_rounds",
                reason: "must not be negative".to_string(),
            });
        }

        let firearm = Firearm::new(name, caliber, cmd.seed_rounds);
        self.store.insert_firearm(&firearm).await?;
        Ok(firearm)
    }

    /// Register an ammunition lot with its full purchased quantity on hand.
    pub async fn new_lot(&self, cmd: NewLotCmd) -> ResultEngine<AmmunitionLot> {
        let label = normalize_required_name(&cmd.label, "label")?;
        let caliber = util::normalize_caliber(&normalize_required_name(&cmd.caliber, "caliber")?);
        if cmd.quantity <= 0 {
            return Err(EngineError::Validation {
                field: "quantity",
                reason: "must be positive".to_string(),
            });
        }

        let lot = AmmunitionLot::new(label, caliber, cmd.quantity, cmd.purchased_at);
        self.store.insert_lot(&lot).await?;
        Ok(lot)
    }

    pub async fn firearm(&self, firearm_id: Uuid) -> ResultEngine<Firearm> {
        let Some(firearm) = self.store.firearm(firearm_id).await? else {
            return Err(EngineError::unknown(EntityKind::Firearm, firearm_id));
        };
        Ok(firearm)
    }

    /// All firearms, ordered by name.
    pub async fn firearms(&self) -> ResultEngine<Vec<Firearm>> {
        self.store.firearms().await
    }

    pub async fn ammunition_lot(&self, lot_id: Uuid) -> ResultEngine<AmmunitionLot> {
        let Some(lot) = self.store.ammunition_lot(lot_id).await? else {
            return Err(EngineError::unknown(EntityKind::AmmunitionLot, lot_id));
        };
        Ok(lot)
    }

    /// All lots, oldest purchase first.
    pub async fn ammunition_lots(&self) -> ResultEngine<Vec<AmmunitionLot>> {
        self.store.ammunition_lots().await
    }

    /// Lots of one caliber, oldest purchase first. Matching follows the
    /// engine-wide caliber rules, so `"9MM"` finds `"9mm"` lots.
    pub async fn lots_for_caliber(&self, caliber: &str) -> ResultEngine<Vec<AmmunitionLot>> {
        let lots = self.store.ammunition_lots().await?;
        Ok(lots
            .into_iter()
            .filter(|lot| util::same_caliber(&lot.caliber, caliber))
            .collect())
    }
}
