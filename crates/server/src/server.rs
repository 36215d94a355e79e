use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{armory, sessions};
use engine::{Engine, SqlStore};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine<SqlStore>>,
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/firearms",
            post(armory::firearm_new).get(armory::list_firearms),
        )
        .route("/ammunition", post(armory::lot_new).get(armory::list_lots))
        .route("/recount", post(armory::recount))
        .route("/sessions", post(sessions::commit).get(sessions::list))
        .route("/sessions/check", post(sessions::check))
        .route(
            "/sessions/{id}",
            get(sessions::detail)
                .patch(sessions::amend)
                .delete(sessions::delete),
        )
        .with_state(state)
}

/// Serve on the default local address. There is no authentication layer, so
/// the listener stays on loopback.
pub async fn run(engine: Engine<SqlStore>) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine<SqlStore>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine<SqlStore>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
