use std::path::{Path, PathBuf};

use message_store::StoreSnapshot;

use crate::SnapshotError;

// ═══════════════════════════════════════════════════════════════
//  SnapshotFile
// ═══════════════════════════════════════════════════════════════

/// Одно-generation snapshot файл. Каждый save переписывает его
/// целиком через `<path>.tmp` + atomic rename: на диске в любой
/// момент либо старый валидный снимок, либо новый, никогда torn.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Прочитать snapshot. `Ok(None)` если файла ещё нет.
    pub fn load(&self) -> Result<Option<StoreSnapshot>, SnapshotError> {
        let content = match std::fs::read(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_slice(&content)?;
        Ok(Some(snapshot))
    }

    /// Записать snapshot целиком: tmp → fsync → rename.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut f = std::fs::File::create(&tmp)?;
            serde_json::to_writer_pretty(&mut f, snapshot)?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
