use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use message_store::MessageStore;

#[derive(Clone)]
struct AppState {
    store: Arc<MessageStore>,
}

/// HTTP read API поверх MessageStore. Read-only: endpoint'ы никогда
/// не падают из-за состояния store'а, худший случай — stale данные.
pub async fn run(
    listener: TcpListener,
    store: Arc<MessageStore>,
    shutdown: CancellationToken,
) -> Result<(), String> {
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))
}

pub fn router(store: Arc<MessageStore>) -> Router {
    Router::new()
        .route("/api/messages", get(handle_messages))
        .route("/api/latest", get(handle_latest))
        .with_state(AppState { store })
}

// --- REST: GET /api/messages ---

async fn handle_messages(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.store.history().await).into_response()
}

// --- REST: GET /api/latest ---

async fn handle_latest(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.store.latest().await).into_response()
}
