use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
};

use parking_lot::RwLock;
use tracing::debug;

/// Raw key/value persistence behind the progress store.
///
/// Each call is atomic on its own: readers never observe a partial write.
pub trait ProgressBackend: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn keys(&self) -> anyhow::Result<Vec<String>>;
}

/// In-process map, the analogue of a browser's per-origin local storage.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressBackend for MemoryBackend {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

/// One `<key>.json` file per record inside a directory. Writes replace the
/// whole file through a rename.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> anyhow::Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            anyhow::bail!("invalid progress key: {:?}", key);
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ProgressBackend for FileBackend {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path(key)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path)?;
        debug!("wrote {}", path.display());
        Ok(())
    }

    fn keys(&self) -> anyhow::Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    keys.push(stem.to_string_lossy().to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
