#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("bind {context}: {source}")]
    Bind {
        context: &'static str,
        source: std::io::Error,
    },

    #[error("snapshot: {0}")]
    Snapshot(#[from] snapshot_persist::SnapshotError),

    #[error("signal: {0}")]
    Signal(std::io::Error),
}
