//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for the range log:
//!
//! - `firearms`: registered firearms with their round counters
//! - `ammunition_lots`: purchased ammunition with remaining stock
//! - `range_visits`: committed range sessions
//! - `usage_entries`: per-slot, per-lot consumption rows of a visit

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Firearms {
    Table,
    Id,
    Name,
    Caliber,
    RoundsFired,
    SeedRounds,
}

#[derive(Iden)]
enum AmmunitionLots {
    Table,
    Id,
    Label,
    Caliber,
    OnHand,
    Purchased,
    PurchasedAt,
}

#[derive(Iden)]
enum RangeVisits {
    Table,
    Id,
    OccurredAt,
    Location,
    Notes,
}

#[derive(Iden)]
enum UsageEntries {
    Table,
    Id,
    VisitId,
    SlotKind,
    SlotId,
    LotId,
    Rounds,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Firearms
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Firearms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Firearms::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Firearms::Name).string().not_null())
                    .col(ColumnDef::new(Firearms::Caliber).string().not_null())
                    .col(
                        ColumnDef::new(Firearms::RoundsFired)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Firearms::SeedRounds)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Ammunition lots
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AmmunitionLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AmmunitionLots::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AmmunitionLots::Label).string().not_null())
                    .col(ColumnDef::new(AmmunitionLots::Caliber).string().not_null())
                    .col(
                        ColumnDef::new(AmmunitionLots::OnHand)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AmmunitionLots::Purchased)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AmmunitionLots::PurchasedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ammunition_lots-caliber-purchased_at")
                    .table(AmmunitionLots::Table)
                    .col(AmmunitionLots::Caliber)
                    .col(AmmunitionLots::PurchasedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Range visits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RangeVisits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RangeVisits::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RangeVisits::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RangeVisits::Location).string().not_null())
                    .col(ColumnDef::new(RangeVisits::Notes).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-range_visits-occurred_at")
                    .table(RangeVisits::Table)
                    .col(RangeVisits::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Usage entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(UsageEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsageEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UsageEntries::VisitId).string().not_null())
                    .col(ColumnDef::new(UsageEntries::SlotKind).string().not_null())
                    .col(ColumnDef::new(UsageEntries::SlotId).string().not_null())
                    .col(ColumnDef::new(UsageEntries::LotId).string().not_null())
                    .col(
                        ColumnDef::new(UsageEntries::Rounds)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-usage_entries-visit_id")
                            .from(UsageEntries::Table, UsageEntries::VisitId)
                            .to(RangeVisits::Table, RangeVisits::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-usage_entries-lot_id")
                            .from(UsageEntries::Table, UsageEntries::LotId)
                            .to(AmmunitionLots::Table, AmmunitionLots::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-usage_entries-visit_id")
                    .table(UsageEntries::Table)
                    .col(UsageEntries::VisitId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-usage_entries-lot_id")
                    .table(UsageEntries::Table)
                    .col(UsageEntries::LotId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-usage_entries-slot")
                    .table(UsageEntries::Table)
                    .col(UsageEntries::SlotKind)
                    .col(UsageEntries::SlotId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(UsageEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RangeVisits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AmmunitionLots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Firearms::Table).to_owned())
            .await?;
        Ok(())
    }
}
