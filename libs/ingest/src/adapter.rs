use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use message_store::MessageStore;

// ═══════════════════════════════════════════════════════════════
//  IngestAdapter
// ═══════════════════════════════════════════════════════════════

/// Мост между transport событиями `(topic, raw payload)` и typed
/// `MessageStore::ingest`.
///
/// Payload, который не парсится как JSON, дропается молча — ошибка
/// никогда не уходит обратно в transport callback. Drop при этом
/// наблюдаем: counter + debug log.
pub struct IngestAdapter {
    store: Arc<MessageStore>,
    dropped: AtomicU64,
}

impl IngestAdapter {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self {
            store,
            dropped: AtomicU64::new(0),
        }
    }

    /// Обработать одно входящее событие.
    pub async fn ingest(&self, topic: &str, raw: &[u8]) {
        match serde_json::from_slice::<serde_json::Value>(raw) {
            Ok(data) => self.store.ingest(topic, data).await,
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(topic = %topic, error = %e, "unparseable payload, dropping");
            }
        }
    }

    /// Сколько событий дропнуто из-за malformed payload'а.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
