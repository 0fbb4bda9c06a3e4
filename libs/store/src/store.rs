use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Message;

// ═══════════════════════════════════════════════════════════════
//  StoreSnapshot
// ═══════════════════════════════════════════════════════════════

/// Consistent point-in-time снимок обеих структур store'а —
/// сериализуемая форма snapshot файла. Field names = on-disk JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub latest_data: HashMap<String, Message>,
}

// ═══════════════════════════════════════════════════════════════
//  MessageStore
// ═══════════════════════════════════════════════════════════════

struct StoreInner {
    history: VecDeque<Message>,
    latest: HashMap<String, Message>,
}

/// Единственный владелец history log'а и latest index'а.
///
/// Один coarse-grained lock на пару структур: writer'ы (ingest,
/// restore) взаимно исключены, а читатели всегда видят согласованную
/// пару. Никакого I/O под lock'ом.
pub struct MessageStore {
    inner: RwLock<StoreInner>,
    capacity: usize,
}

impl MessageStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                history: VecDeque::with_capacity(capacity),
                latest: HashMap::new(),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Принять одно сообщение: append в history (FIFO eviction при
    /// достижении capacity, независимо от topic'а) + unconditional
    /// upsert в latest index.
    pub async fn ingest(&self, topic: &str, data: serde_json::Value) {
        let message = Message::new(topic, data);
        let mut inner = self.inner.write().await;
        if inner.history.len() >= self.capacity {
            inner.history.pop_front();
        }
        inner.history.push_back(message.clone());
        inner.latest.insert(message.topic.clone(), message);
    }

    /// Point-in-time копия history, oldest first.
    pub async fn history(&self) -> Vec<Message> {
        let inner = self.inner.read().await;
        inner.history.iter().cloned().collect()
    }

    /// Point-in-time копия latest index'а.
    pub async fn latest(&self) -> HashMap<String, Message> {
        let inner = self.inner.read().await;
        inner.latest.clone()
    }

    /// Снимок обеих структур под одним lock hold.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read().await;
        StoreSnapshot {
            messages: inner.history.iter().cloned().collect(),
            latest_data: inner.latest.clone(),
        }
    }

    /// Заменить состояние целиком. Валидно только на старте, до
    /// запуска concurrent writer'ов/reader'ов.
    pub async fn restore(&self, snapshot: StoreSnapshot) {
        let mut inner = self.inner.write().await;
        let mut history: VecDeque<Message> = snapshot.messages.into();
        // Snapshot может прийти из запуска с большей capacity.
        while history.len() > self.capacity {
            history.pop_front();
        }
        inner.history = history;
        inner.latest = snapshot.latest_data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn history_is_bounded_at_capacity() {
        let store = MessageStore::new(3);
        for i in 0..10 {
            store.ingest("t", json!(i)).await;
        }
        assert_eq!(store.history().await.len(), 3);
    }

    #[tokio::test]
    async fn short_history_keeps_every_message() {
        let store = MessageStore::new(100);
        for i in 0..7 {
            store.ingest("t", json!(i)).await;
        }
        assert_eq!(store.history().await.len(), 7);
    }

    #[tokio::test]
    async fn eviction_is_fifo_and_order_preserved() {
        let store = MessageStore::new(100);
        for i in 0..=100 {
            store.ingest(&format!("topic/{i}"), json!(i)).await;
        }
        let history = store.history().await;
        assert_eq!(history.len(), 100);
        // m0 evicted; m1..m100 remain in arrival order
        assert_eq!(history[0].data, json!(1));
        assert_eq!(history[99].data, json!(100));
        for (i, msg) in history.iter().enumerate() {
            assert_eq!(msg.data, json!(i + 1));
        }
    }

    #[tokio::test]
    async fn latest_survives_history_eviction() {
        let store = MessageStore::new(2);
        store.ingest("home/kitchen/temp", json!({"t": 21.5})).await;
        store.ingest("other/a", json!(1)).await;
        store.ingest("other/b", json!(2)).await; // evicts the kitchen entry

        let history = store.history().await;
        assert!(history.iter().all(|m| m.topic != "home/kitchen/temp"));

        let latest = store.latest().await;
        assert_eq!(latest["home/kitchen/temp"].data, json!({"t": 21.5}));
    }

    #[tokio::test]
    async fn latest_tracks_most_recent_per_topic() {
        let store = MessageStore::new(100);
        store.ingest("home/kitchen/temp", json!({"t": 21.5})).await;
        store.ingest("home/kitchen/temp", json!({"t": 22.0})).await;

        let latest = store.latest().await;
        assert_eq!(latest["home/kitchen/temp"].data, json!({"t": 22.0}));

        let history = store.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].data, json!({"t": 21.5}));
        assert_eq!(history[1].data, json!({"t": 22.0}));
    }

    #[tokio::test]
    async fn restore_of_own_snapshot_is_identity() {
        let store = MessageStore::new(100);
        store.ingest("a", json!(1)).await;
        store.ingest("b", json!({"x": [1, 2]})).await;
        let before_history = store.history().await;
        let before_latest = store.latest().await;

        store.restore(store.snapshot().await).await;

        let after_history = store.history().await;
        assert_eq!(after_history.len(), before_history.len());
        for (a, b) in before_history.iter().zip(&after_history) {
            assert_eq!(a.topic, b.topic);
            assert_eq!(a.data, b.data);
            assert_eq!(a.received_at, b.received_at);
        }

        let after_latest = store.latest().await;
        assert_eq!(after_latest.len(), before_latest.len());
        assert_eq!(after_latest["b"].data, before_latest["b"].data);
    }

    #[tokio::test]
    async fn restore_truncates_oldest_to_capacity() {
        let big = MessageStore::new(10);
        for i in 0..10 {
            big.ingest("t", json!(i)).await;
        }
        let snap = big.snapshot().await;

        let small = MessageStore::new(4);
        small.restore(snap).await;

        let history = small.history().await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].data, json!(6));
        assert_eq!(history[3].data, json!(9));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reads_see_consistent_pairs() {
        let store = Arc::new(MessageStore::new(50));

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..1000u32 {
                    store.ingest(&format!("sensor/{}", i % 7), json!(i)).await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    for _ in 0..250 {
                        let snap = store.snapshot().await;
                        assert!(snap.messages.len() <= 50);
                        for msg in &snap.messages {
                            let latest = snap
                                .latest_data
                                .get(&msg.topic)
                                .expect("topic in history but not in latest index");
                            assert!(latest.received_at >= msg.received_at);
                        }
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for r in readers {
            r.await.unwrap();
        }
    }
}
