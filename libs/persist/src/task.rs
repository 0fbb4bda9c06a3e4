use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use message_store::MessageStore;

use crate::{SnapshotError, SnapshotFile};

// ═══════════════════════════════════════════════════════════════
//  Periodic snapshot task
// ═══════════════════════════════════════════════════════════════

/// Запустить периодический snapshot loop: каждый `period` снимает
/// consistent снимок store'а и переписывает snapshot файл. Ошибка
/// записи — warning, state в памяти не трогается, retry на
/// следующем tick'е.
pub fn spawn_snapshot_task(
    store: Arc<MessageStore>,
    file: SnapshotFile,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // First tick completes immediately; consume it so the first
        // save lands one full period after startup.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    let snapshot = store.snapshot().await;
                    let count = snapshot.messages.len();
                    match file.save(&snapshot) {
                        Ok(()) => tracing::info!(
                            messages = count,
                            path = %file.path().display(),
                            "snapshot saved"
                        ),
                        Err(e) => tracing::warn!(error = %e, "snapshot save failed"),
                    }
                }
            }
        }

        tracing::info!("snapshot task finished");
    })
}

// ═══════════════════════════════════════════════════════════════
//  Shutdown snapshot
// ═══════════════════════════════════════════════════════════════

/// Best-effort финальный snapshot на shutdown, ограниченный по
/// времени: зависший filesystem write не должен держать процесс.
/// Возвращает число сохранённых сообщений.
pub async fn final_snapshot(
    store: &MessageStore,
    file: &SnapshotFile,
    timeout: Duration,
) -> Result<usize, SnapshotError> {
    let snapshot = store.snapshot().await;
    let count = snapshot.messages.len();
    let file = file.clone();

    let save = tokio::task::spawn_blocking(move || file.save(&snapshot));
    match tokio::time::timeout(timeout, save).await {
        Ok(Ok(result)) => result.map(|()| count),
        Ok(Err(join)) => Err(SnapshotError::Io(std::io::Error::other(join))),
        Err(_) => Err(SnapshotError::Timeout),
    }
}
