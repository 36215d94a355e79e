use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod armory;
mod server;
mod sessions;

pub mod types {
    pub mod armory {
        pub use api_types::armory::{
            FirearmNew, FirearmView, FirearmsResponse, LotNew, LotQuery, LotView, LotsResponse,
            RecountResponse,
        };
    }

    pub mod session {
        pub use api_types::session::{
            IssueView, SessionCheckResponse, SessionCreated, SessionDetailResponse,
            SessionListResponse, SessionNew, SessionQuery, SessionView, UsageNew, UsageView,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::UnknownEntity { .. } => StatusCode::NOT_FOUND,
        EngineError::Validation { .. }
        | EngineError::InvalidSession(_)
        | EngineError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Corrupted(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Internal details stay in the log; the response carries a fixed message.
fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Corrupted(detail) => {
            tracing::error!("inconsistent record: {detail}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
