mod error;
mod file;
mod task;

pub use error::SnapshotError;
pub use file::SnapshotFile;
pub use task::{final_snapshot, spawn_snapshot_task};
