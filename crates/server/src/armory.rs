//! Firearm and ammunition registry API endpoints

use api_types::armory::{
    FirearmNew, FirearmView, FirearmsResponse, LotNew, LotQuery, LotView, LotsResponse,
    RecountResponse,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};

use engine::{AmmunitionLot, Firearm, NewFirearmCmd, NewLotCmd};

use crate::{ServerError, server::ServerState};

fn firearm_view(firearm: Firearm) -> FirearmView {
    FirearmView {
        id: firearm.id,
        name: firearm.name,
        caliber: firearm.caliber,
        rounds_fired: firearm.rounds_fired,
        seed_rounds: firearm.seed_rounds,
    }
}

fn lot_view(lot: AmmunitionLot, utc: FixedOffset) -> LotView {
    LotView {
        id: lot.id,
        label: lot.label,
        caliber: lot.caliber,
        on_hand: lot.on_hand,
        purchased: lot.purchased,
        purchased_at: lot.purchased_at.with_timezone(&utc),
    }
}

fn utc_offset() -> Result<FixedOffset, ServerError> {
    FixedOffset::east_opt(0).ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))
}

pub async fn firearm_new(
    State(state): State<ServerState>,
    Json(payload): Json<FirearmNew>,
) -> Result<(StatusCode, Json<FirearmView>), ServerError> {
    let mut cmd = NewFirearmCmd::new(payload.name, payload.caliber);
    if let Some(seed_rounds) = payload.seed_rounds {
        cmd = cmd.seed_rounds(seed_rounds);
    }

    let firearm = state.engine.new_firearm(cmd).await?;

    Ok((StatusCode::CREATED, Json(firearm_view(firearm))))
}

pub async fn list_firearms(
    State(state): State<ServerState>,
) -> Result<Json<FirearmsResponse>, ServerError> {
    let firearms = state
        .engine
        .firearms()
        .await?
        .into_iter()
        .map(firearm_view)
        .collect();

    Ok(Json(FirearmsResponse { firearms }))
}

pub async fn lot_new(
    State(state): State<ServerState>,
    Json(payload): Json<LotNew>,
) -> Result<(StatusCode, Json<LotView>), ServerError> {
    let cmd = NewLotCmd::new(
        payload.label,
        payload.caliber,
        payload.quantity,
        payload.purchased_at.with_timezone(&Utc),
    );

    let lot = state.engine.new_lot(cmd).await?;

    let utc = utc_offset()?;
    Ok((StatusCode::CREATED, Json(lot_view(lot, utc))))
}

pub async fn list_lots(
    State(state): State<ServerState>,
    Query(payload): Query<LotQuery>,
) -> Result<Json<LotsResponse>, ServerError> {
    let lots = match payload.caliber {
        Some(caliber) => state.engine.lots_for_caliber(&caliber).await?,
        None => state.engine.ammunition_lots().await?,
    };

    let utc = utc_offset()?;
    let lots = lots.into_iter().map(|lot| lot_view(lot, utc)).collect();

    Ok(Json(LotsResponse { lots }))
}

pub async fn recount(
    State(state): State<ServerState>,
) -> Result<Json<RecountResponse>, ServerError> {
    let report = state.engine.recount().await?;

    Ok(Json(RecountResponse {
        firearms_adjusted: report.firearms_adjusted,
        lots_adjusted: report.lots_adjusted,
    }))
}
