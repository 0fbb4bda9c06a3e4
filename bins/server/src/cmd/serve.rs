use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use feed_ingest::{IngestAdapter, spawn_feed_task};
use message_store::MessageStore;
use snapshot_persist::{SnapshotFile, final_snapshot, spawn_snapshot_task};

use crate::config::{ServeArgs, ServerConfig};
use crate::error::ServerError;

/// Время на graceful drain task'ов после cancel.
const DRAIN_GRACE: Duration = Duration::from_secs(2);
/// Лимит на финальный snapshot при shutdown.
const FINAL_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("hub-server starting");

    // --- Load config ---
    let config = ServerConfig::load(&args.config)?;
    tracing::info!(config = %args.config, "loaded config");

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- Store + snapshot restore (before anything concurrent runs) ---
    let store = Arc::new(MessageStore::new(config.history_capacity));
    let snapshot_file = SnapshotFile::new(&config.snapshot_path);
    match snapshot_file.load() {
        Ok(Some(snapshot)) => {
            let count = snapshot.messages.len();
            store.restore(snapshot).await;
            tracing::info!(messages = count, path = %config.snapshot_path, "restored snapshot");
        }
        Ok(None) => {
            tracing::info!(path = %config.snapshot_path, "no snapshot file, starting empty");
        }
        Err(e) => tracing::warn!(error = %e, "snapshot load failed, starting empty"),
    }

    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    // --- Snapshot task ---
    handles.push(spawn_snapshot_task(
        store.clone(),
        snapshot_file.clone(),
        Duration::from_secs(config.snapshot_interval_secs),
        token.clone(),
    ));
    tracing::info!(
        interval_s = config.snapshot_interval_secs,
        "snapshot task started"
    );

    // --- Feed ingress ---
    let feed_listener = tokio::net::TcpListener::bind(("0.0.0.0", config.feed_port))
        .await
        .map_err(|e| ServerError::Bind {
            context: "feed",
            source: e,
        })?;
    let adapter = Arc::new(IngestAdapter::new(store.clone()));
    handles.push(spawn_feed_task(feed_listener, adapter.clone(), token.clone()));
    tracing::info!(port = config.feed_port, "feed ingress listening");

    // --- API server ---
    let api_listener = tokio::net::TcpListener::bind(("0.0.0.0", config.api_port))
        .await
        .map_err(|e| ServerError::Bind {
            context: "api",
            source: e,
        })?;
    let api_store = store.clone();
    let api_token = token.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = hub_api_server::run(api_listener, api_store, api_token).await {
            tracing::error!(error = %e, "api server error");
        }
    });
    tracing::info!(port = config.api_port, "api server listening");
    tracing::info!(capacity = store.capacity(), "hub ready");

    // --- Ожидание Ctrl+C ---
    tokio::signal::ctrl_c().await.map_err(ServerError::Signal)?;
    tracing::info!("shutting down...");

    // Signal all tasks to stop cooperatively
    token.cancel();

    // Drain: give tasks a moment to finish gracefully
    tokio::time::sleep(DRAIN_GRACE).await;

    // Abort anything still running
    for h in &handles {
        if !h.is_finished() {
            h.abort();
        }
    }
    if !api_handle.is_finished() {
        api_handle.abort();
    }
    for h in handles {
        let _ = h.await;
    }
    let _ = api_handle.await;

    // Final best-effort snapshot, time-bounded so a hung write
    // cannot hold the process.
    match final_snapshot(&store, &snapshot_file, FINAL_SNAPSHOT_TIMEOUT).await {
        Ok(count) => tracing::info!(messages = count, "final snapshot saved"),
        Err(e) => tracing::warn!(error = %e, "final snapshot failed"),
    }

    if adapter.dropped() > 0 {
        tracing::info!(
            dropped = adapter.dropped(),
            "unparseable payloads dropped this run"
        );
    }

    tracing::info!("shutdown complete");
    Ok(())
}
