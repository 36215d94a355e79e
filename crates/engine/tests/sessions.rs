use chrono::{DateTime, TimeZone, Utc};
use sea_orm::Database;
use uuid::Uuid;

use engine::{
    AmmunitionLot, Engine, EngineError, EntityKind, Firearm, NewFirearmCmd, NewLotCmd, SessionCmd,
    SessionFilter, SessionIssue, SqlStore, StockScope, StockSource, UsageSlot,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine<SqlStore> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, d, 10, 0, 0).unwrap()
}

fn slot(firearm: &Firearm) -> UsageSlot {
    UsageSlot::Firearm {
        firearm_id: firearm.id,
    }
}

async fn seed_firearm(engine: &Engine<SqlStore>, name: &str, caliber: &str) -> Firearm {
    engine
        .new_firearm(NewFirearmCmd::new(name, caliber))
        .await
        .unwrap()
}

async fn seed_lot(
    engine: &Engine<SqlStore>,
    label: &str,
    caliber: &str,
    quantity: i64,
    purchased_at: DateTime<Utc>,
) -> AmmunitionLot {
    engine
        .new_lot(NewLotCmd::new(label, caliber, quantity, purchased_at))
        .await
        .unwrap()
}

#[tokio::test]
async fn committing_debits_oldest_lots_first_and_raises_counters() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let older = seed_lot(&engine, "S&B Jan", "9mm", 50, day(5)).await;
    let newer = seed_lot(&engine, "S&B Feb", "9mm", 50, day(20)).await;

    let visit = engine
        .commit_session(
            SessionCmd::new(day(21), "indoor range").expend(
                slot(&firearm),
                StockSource::caliber("9mm"),
                70,
            ),
        )
        .await
        .unwrap();

    assert_eq!(engine.ammunition_lot(older.id).await.unwrap().on_hand, 0);
    assert_eq!(engine.ammunition_lot(newer.id).await.unwrap().on_hand, 30);
    assert_eq!(engine.firearm(firearm.id).await.unwrap().rounds_fired, 70);

    let stored = engine.session(visit.id).await.unwrap();
    assert_eq!(stored.rounds_total(), 70);
    let rounds_by_lot: Vec<(Uuid, i64)> = stored
        .entries
        .iter()
        .map(|entry| (entry.lot_id, entry.rounds))
        .collect();
    assert!(rounds_by_lot.contains(&(older.id, 50)));
    assert!(rounds_by_lot.contains(&(newer.id, 20)));
}

#[tokio::test]
async fn overdrawing_a_caliber_fails_the_whole_session() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let older = seed_lot(&engine, "S&B Jan", "9mm", 50, day(5)).await;
    let newer = seed_lot(&engine, "S&B Feb", "9mm", 50, day(20)).await;

    let err = engine
        .commit_session(
            SessionCmd::new(day(21), "indoor range").expend(
                slot(&firearm),
                StockSource::caliber("9mm"),
                120,
            ),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InsufficientStock {
            scope: StockScope::Caliber("9mm".to_string()),
            requested: 120,
            available: 100,
        }
    );
    assert_eq!(engine.ammunition_lot(older.id).await.unwrap().on_hand, 50);
    assert_eq!(engine.ammunition_lot(newer.id).await.unwrap().on_hand, 50);
    assert_eq!(engine.firearm(firearm.id).await.unwrap().rounds_fired, 0);
    assert!(
        engine
            .sessions(&SessionFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn a_session_with_several_entries_commits_atomically() {
    let engine = engine_with_db().await;
    let nine = seed_firearm(&engine, "CZ 75", "9mm").await;
    let forty_five = seed_firearm(&engine, "1911", ".45 ACP").await;
    let lot_nine = seed_lot(&engine, "S&B 9", "9mm", 50, day(5)).await;
    let lot_forty_five = seed_lot(&engine, "PMC 45", ".45 ACP", 20, day(5)).await;

    let err = engine
        .commit_session(
            SessionCmd::new(day(10), "range")
                .expend(slot(&nine), StockSource::caliber("9mm"), 30)
                .expend(slot(&forty_five), StockSource::caliber(".45 ACP"), 25),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InsufficientStock {
            scope: StockScope::Caliber(".45 ACP".to_string()),
            requested: 25,
            available: 20,
        }
    );
    // the passing entry must not land either
    assert_eq!(engine.ammunition_lot(lot_nine.id).await.unwrap().on_hand, 50);
    assert_eq!(
        engine
            .ammunition_lot(lot_forty_five.id)
            .await
            .unwrap()
            .on_hand,
        20
    );
    assert_eq!(engine.firearm(nine.id).await.unwrap().rounds_fired, 0);
    assert_eq!(engine.firearm(forty_five.id).await.unwrap().rounds_fired, 0);
}

#[tokio::test]
async fn amending_moves_stock_by_the_difference() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let lot = seed_lot(&engine, "case", "9mm", 100, day(1)).await;

    let visit = engine
        .commit_session(SessionCmd::new(day(2), "range").expend(
            slot(&firearm),
            StockSource::caliber("9mm"),
            100,
        ))
        .await
        .unwrap();
    assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 0);
    assert_eq!(engine.firearm(firearm.id).await.unwrap().rounds_fired, 100);

    let amended = engine
        .amend_session(
            visit.id,
            SessionCmd::new(day(2), "range").expend(
                slot(&firearm),
                StockSource::caliber("9mm"),
                60,
            ),
        )
        .await
        .unwrap();

    assert_eq!(amended.id, visit.id);
    assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 40);
    assert_eq!(engine.firearm(firearm.id).await.unwrap().rounds_fired, 60);

    let stored = engine.session(visit.id).await.unwrap();
    assert_eq!(stored.rounds_total(), 60);
    assert_eq!(stored.entries.len(), 1);
}

#[tokio::test]
async fn amending_can_reuse_rounds_the_old_version_held() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let lot = seed_lot(&engine, "case", "9mm", 100, day(1)).await;

    let visit = engine
        .commit_session(SessionCmd::new(day(2), "range").expend(
            slot(&firearm),
            StockSource::caliber("9mm"),
            100,
        ))
        .await
        .unwrap();

    // nothing is on hand, but the amend releases the old 100 first
    engine
        .amend_session(
            visit.id,
            SessionCmd::new(day(2), "range, updated").expend(
                slot(&firearm),
                StockSource::caliber("9mm"),
                100,
            ),
        )
        .await
        .unwrap();

    assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 0);
    assert_eq!(engine.firearm(firearm.id).await.unwrap().rounds_fired, 100);
    assert_eq!(
        engine.session(visit.id).await.unwrap().location,
        "range, updated"
    );
}

#[tokio::test]
async fn deleting_returns_stock_and_lowers_counters() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let lot = seed_lot(&engine, "case", "9mm", 100, day(1)).await;

    let visit = engine
        .commit_session(SessionCmd::new(day(2), "range").expend(
            slot(&firearm),
            StockSource::caliber("9mm"),
            40,
        ))
        .await
        .unwrap();

    engine.delete_session(visit.id).await.unwrap();

    assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 100);
    assert_eq!(engine.firearm(firearm.id).await.unwrap().rounds_fired, 0);
    assert_eq!(
        engine.session(visit.id).await.unwrap_err(),
        EngineError::UnknownEntity {
            kind: EntityKind::RangeVisit,
            id: visit.id.to_string(),
        }
    );
}

#[tokio::test]
async fn borrowed_slots_consume_stock_but_no_counter() {
    let engine = engine_with_db().await;
    let lot = seed_lot(&engine, "range ammo", "9mm", 100, day(1)).await;

    let visit = engine
        .commit_session(SessionCmd::new(day(2), "rental lane").expend(
            UsageSlot::Borrowed {
                tag: "rental".to_string(),
            },
            StockSource::caliber("9mm"),
            40,
        ))
        .await
        .unwrap();

    assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 60);
    let stored = engine.session(visit.id).await.unwrap();
    assert_eq!(
        stored.entries[0].slot,
        UsageSlot::Borrowed {
            tag: "rental".to_string()
        }
    );
}

#[tokio::test]
async fn pinned_lots_never_substitute() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let older = seed_lot(&engine, "old", "9mm", 50, day(1)).await;
    let newer = seed_lot(&engine, "new", "9mm", 50, day(10)).await;

    // pinning the newer lot skips the FIFO order entirely
    engine
        .commit_session(SessionCmd::new(day(11), "range").expend(
            slot(&firearm),
            StockSource::lot(newer.id),
            30,
        ))
        .await
        .unwrap();
    assert_eq!(engine.ammunition_lot(older.id).await.unwrap().on_hand, 50);
    assert_eq!(engine.ammunition_lot(newer.id).await.unwrap().on_hand, 20);

    // a pinned shortfall fails even though the caliber as a whole could cover
    let err = engine
        .commit_session(SessionCmd::new(day(12), "range").expend(
            slot(&firearm),
            StockSource::lot(older.id),
            60,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientStock {
            scope: StockScope::Lot(older.id),
            requested: 60,
            available: 50,
        }
    );
}

#[tokio::test]
async fn caliber_matching_ignores_case() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let lot = seed_lot(&engine, "case", "9mm", 100, day(1)).await;

    engine
        .commit_session(SessionCmd::new(day(2), "range").expend(
            slot(&firearm),
            StockSource::caliber("9MM"),
            10,
        ))
        .await
        .unwrap();

    assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 90);
}

#[tokio::test]
async fn field_problems_group_into_one_invalid_session() {
    let engine = engine_with_db().await;
    seed_firearm(&engine, "CZ 75", "9mm").await;

    let err = engine
        .commit_session(SessionCmd::new(day(2), "   "))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidSession(vec![SessionIssue::EmptyLocation, SessionIssue::NoUsage])
    );
}

#[tokio::test]
async fn unknown_references_abort_the_commit() {
    let engine = engine_with_db().await;
    seed_lot(&engine, "case", "9mm", 100, day(1)).await;
    let stranger = Uuid::new_v4();

    let err = engine
        .commit_session(SessionCmd::new(day(2), "range").expend(
            UsageSlot::Firearm {
                firearm_id: stranger,
            },
            StockSource::caliber("9mm"),
            10,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::UnknownEntity {
            kind: EntityKind::Firearm,
            id: stranger.to_string(),
        }
    );

    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let err = engine
        .commit_session(SessionCmd::new(day(2), "range").expend(
            slot(&firearm),
            StockSource::lot(stranger),
            10,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::UnknownEntity {
            kind: EntityKind::AmmunitionLot,
            id: stranger.to_string(),
        }
    );
}

#[tokio::test]
async fn caliber_mismatch_is_rejected_before_any_allocation() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "1911", ".45 ACP").await;
    let lot = seed_lot(&engine, "case", "9mm", 100, day(1)).await;

    let err = engine
        .commit_session(SessionCmd::new(day(2), "range").expend(
            slot(&firearm),
            StockSource::lot(lot.id),
            10,
        ))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidSession(vec![SessionIssue::CaliberMismatch {
            slot: slot(&firearm),
            firearm_caliber: ".45 ACP".to_string(),
            ammunition_caliber: "9mm".to_string(),
        }])
    );
    assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 100);
}

#[tokio::test]
async fn check_session_reports_issues_without_committing() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let lot = seed_lot(&engine, "case", "9mm", 100, day(1)).await;

    let issues = engine
        .check_session(&SessionCmd::new(day(2), ""))
        .await
        .unwrap();
    assert_eq!(issues.len(), 2);
    assert!(
        engine
            .sessions(&SessionFilter::default())
            .await
            .unwrap()
            .is_empty()
    );

    let issues = engine
        .check_session(&SessionCmd::new(day(2), "range").expend(
            slot(&firearm),
            StockSource::lot(lot.id),
            10,
        ))
        .await
        .unwrap();
    assert!(issues.is_empty());
    assert_eq!(engine.ammunition_lot(lot.id).await.unwrap().on_hand, 100);
}

#[tokio::test]
async fn missing_sessions_are_reported_on_amend_and_delete() {
    let engine = engine_with_db().await;
    let stranger = Uuid::new_v4();
    let expected = EngineError::UnknownEntity {
        kind: EntityKind::RangeVisit,
        id: stranger.to_string(),
    };

    let err = engine
        .amend_session(stranger, SessionCmd::new(day(2), "range"))
        .await
        .unwrap_err();
    assert_eq!(err, expected);

    let err = engine.delete_session(stranger).await.unwrap_err();
    assert_eq!(err, expected);
}

#[tokio::test]
async fn listing_is_newest_first_with_before_and_limit() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    seed_lot(&engine, "case", "9mm", 100, day(1)).await;

    for d in [2, 3, 4] {
        engine
            .commit_session(SessionCmd::new(day(d), format!("range {d}")).expend(
                slot(&firearm),
                StockSource::caliber("9mm"),
                10,
            ))
            .await
            .unwrap();
    }

    let all = engine.sessions(&SessionFilter::default()).await.unwrap();
    let locations: Vec<&str> = all.iter().map(|v| v.location.as_str()).collect();
    assert_eq!(locations, ["range 4", "range 3", "range 2"]);
    assert!(all.iter().all(|visit| visit.rounds_total() == 10));

    let older = engine
        .sessions(&SessionFilter::default().before(day(4)))
        .await
        .unwrap();
    assert_eq!(older.len(), 2);
    assert_eq!(older[0].location, "range 3");

    let capped = engine
        .sessions(&SessionFilter::default().before(day(4)).limit(1))
        .await
        .unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].location, "range 3");
}

#[tokio::test]
async fn stock_and_counters_add_up_after_a_mixed_sequence() {
    let engine = engine_with_db().await;
    let firearm = seed_firearm(&engine, "CZ 75", "9mm").await;
    let first = seed_lot(&engine, "L1", "9mm", 60, day(1)).await;
    let second = seed_lot(&engine, "L2", "9mm", 60, day(2)).await;

    let a = engine
        .commit_session(SessionCmd::new(day(3), "range a").expend(
            slot(&firearm),
            StockSource::caliber("9mm"),
            80,
        ))
        .await
        .unwrap();
    let b = engine
        .commit_session(SessionCmd::new(day(4), "range b").expend(
            slot(&firearm),
            StockSource::caliber("9mm"),
            30,
        ))
        .await
        .unwrap();
    engine
        .amend_session(
            a.id,
            SessionCmd::new(day(3), "range a").expend(
                slot(&firearm),
                StockSource::caliber("9mm"),
                50,
            ),
        )
        .await
        .unwrap();
    engine.delete_session(b.id).await.unwrap();

    let first = engine.ammunition_lot(first.id).await.unwrap();
    let second = engine.ammunition_lot(second.id).await.unwrap();
    let firearm = engine.firearm(firearm.id).await.unwrap();
    let visits = engine.sessions(&SessionFilter::default()).await.unwrap();

    let consumed: i64 = visits.iter().map(|visit| visit.rounds_total()).sum();
    assert_eq!(consumed, 50);
    assert_eq!(firearm.rounds_fired, 50);
    assert_eq!(
        first.on_hand + second.on_hand + consumed,
        first.purchased + second.purchased
    );

    // a recount over a consistent ledger has nothing to fix
    let report = engine.recount().await.unwrap();
    assert_eq!(report, engine::Recount::default());
}

#[tokio::test]
async fn registering_rejects_bad_input() {
    let engine = engine_with_db().await;

    let err = engine
        .new_firearm(NewFirearmCmd::new("  ", "9mm"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation {
            field: "name",
            reason: "must not be empty".to_string(),
        }
    );

    let err = engine
        .new_firearm(NewFirearmCmd::new("CZ 75", "9mm").seed_rounds(-1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation {
            field: "seed_rounds",
            reason: "must not be negative".to_string(),
        }
    );

    let err = engine
        .new_lot(NewLotCmd::new("case", "9mm", 0, day(1)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation {
            field: "quantity",
            reason: "must be positive".to_string(),
        }
    );
}

#[tokio::test]
async fn listings_have_stable_order() {
    let engine = engine_with_db().await;
    seed_firearm(&engine, "Beretta 92", "9mm").await;
    seed_firearm(&engine, "AR-15", "5.56mm").await;
    seed_lot(&engine, "newer", "9mm", 50, day(10)).await;
    seed_lot(&engine, "older", "9mm", 50, day(1)).await;
    seed_lot(&engine, "other caliber", ".45 ACP", 50, day(2)).await;

    let names: Vec<String> = engine
        .firearms()
        .await
        .unwrap()
        .into_iter()
        .map(|firearm| firearm.name)
        .collect();
    assert_eq!(names, ["AR-15", "Beretta 92"]);

    let labels: Vec<String> = engine
        .ammunition_lots()
        .await
        .unwrap()
        .into_iter()
        .map(|lot| lot.label)
        .collect();
    assert_eq!(labels, ["older", "other caliber", "newer"]);

    let nine_only: Vec<String> = engine
        .lots_for_caliber("9MM")
        .await
        .unwrap()
        .into_iter()
        .map(|lot| lot.label)
        .collect();
    assert_eq!(nine_only, ["older", "newer"]);
}

#[tokio::test]
async fn restart_reads_the_same_state() {
    let root =
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();
    let path = root.join(format!("rangebook_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let (firearm_id, lot_id) = {
        let db = Database::connect(&url).await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        let firearm = engine
            .new_firearm(NewFirearmCmd::new("CZ 75", "9mm"))
            .await
            .unwrap();
        let lot = engine
            .new_lot(NewLotCmd::new("case", "9mm", 100, day(1)))
            .await
            .unwrap();
        engine
            .commit_session(SessionCmd::new(day(2), "range").expend(
                slot(&firearm),
                StockSource::caliber("9mm"),
                25,
            ))
            .await
            .unwrap();
        (firearm.id, lot.id)
    };

    let db = Database::connect(&url).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    assert_eq!(engine.firearm(firearm_id).await.unwrap().rounds_fired, 25);
    assert_eq!(engine.ammunition_lot(lot_id).await.unwrap().on_hand, 75);
    assert_eq!(
        engine
            .sessions(&SessionFilter::default())
            .await
            .unwrap()
            .len(),
        1
    );

    std::fs::remove_file(&path).ok();
}
