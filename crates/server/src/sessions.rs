//! Range session API endpoints

use api_types::session::{
    IssueView, SessionCheckResponse, SessionCreated, SessionDetailResponse, SessionListResponse,
    SessionNew, SessionQuery, SessionView, UsageView,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};
use uuid::Uuid;

use engine::{RangeVisit, SessionCmd, SessionFilter, StockSource, UsageCmd, UsageSlot};

use crate::{ServerError, server::ServerState};

/// Turn the wire request into an engine command. Slot keys and source shape
/// are request problems, not engine ones, so they fail here with 400.
fn session_cmd(payload: SessionNew) -> Result<SessionCmd, ServerError> {
    let mut cmd = SessionCmd::new(payload.occurred_at.with_timezone(&Utc), payload.location);
    cmd.notes = payload.notes;

    for (key, usage) in payload.usage {
        let Some(slot) = UsageSlot::parse_key(&key) else {
            return Err(ServerError::Generic(format!("invalid usage slot \"{key}\"")));
        };
        let source = match (usage.ammunition_id, usage.caliber) {
            (Some(lot_id), _) => Some(StockSource::lot(lot_id)),
            (None, Some(caliber)) => Some(StockSource::caliber(caliber)),
            (None, None) => None,
        };
        cmd.usage.push(UsageCmd {
            slot,
            source,
            rounds: usage.rounds,
        });
    }

    Ok(cmd)
}

fn utc_offset() -> Result<FixedOffset, ServerError> {
    FixedOffset::east_opt(0).ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))
}

fn session_view(visit: &RangeVisit, utc: FixedOffset) -> SessionView {
    SessionView {
        id: visit.id,
        occurred_at: visit.occurred_at.with_timezone(&utc),
        location: visit.location.clone(),
        notes: visit.notes.clone(),
        rounds_total: visit.rounds_total(),
    }
}

pub async fn commit(
    State(state): State<ServerState>,
    Json(payload): Json<SessionNew>,
) -> Result<(StatusCode, Json<SessionCreated>), ServerError> {
    let cmd = session_cmd(payload)?;
    let visit = state.engine.commit_session(cmd).await?;

    Ok((StatusCode::CREATED, Json(SessionCreated { id: visit.id })))
}

pub async fn check(
    State(state): State<ServerState>,
    Json(payload): Json<SessionNew>,
) -> Result<Json<SessionCheckResponse>, ServerError> {
    let cmd = session_cmd(payload)?;
    let issues = state
        .engine
        .check_session(&cmd)
        .await?
        .into_iter()
        .map(|issue| IssueView {
            field: issue.field(),
            reason: issue.to_string(),
        })
        .collect();

    Ok(Json(SessionCheckResponse { issues }))
}

pub async fn amend(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SessionNew>,
) -> Result<StatusCode, ServerError> {
    let cmd = session_cmd(payload)?;
    state.engine.amend_session(id, cmd).await?;

    Ok(StatusCode::OK)
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_session(id).await?;

    Ok(StatusCode::OK)
}

pub async fn list(
    State(state): State<ServerState>,
    Query(payload): Query<SessionQuery>,
) -> Result<Json<SessionListResponse>, ServerError> {
    let mut filter = SessionFilter::default();
    if let Some(before) = payload.before {
        filter = filter.before(before.with_timezone(&Utc));
    }
    if let Some(limit) = payload.limit {
        filter = filter.limit(limit);
    }

    let visits = state.engine.sessions(&filter).await?;

    let utc = utc_offset()?;
    let sessions = visits
        .iter()
        .map(|visit| session_view(visit, utc))
        .collect();

    Ok(Json(SessionListResponse { sessions }))
}

pub async fn detail(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionDetailResponse>, ServerError> {
    let visit = state.engine.session(id).await?;

    let utc = utc_offset()?;
    let usage = visit
        .entries
        .iter()
        .map(|entry| UsageView {
            slot: entry.slot.key(),
            ammunition_id: entry.lot_id,
            rounds: entry.rounds,
        })
        .collect();

    Ok(Json(SessionDetailResponse {
        session: session_view(&visit, utc),
        usage,
    }))
}
