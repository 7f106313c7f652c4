use async_trait::async_trait;
use lru::LruCache;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

pub const WORLD_DIR: &str = "world";
pub const NPC_DIR: &str = "npc";
pub const ZONE_DIR: &str = "zone";
pub const SAVE_DIR: &str = "save";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid resource path '{0}'")]
    InvalidPath(String),
    #[error("resource '{0}' not found")]
    NotFound(String),
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Async text lookup by relative path, e.g. `world/village.txt`.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError>;
}

pub fn world_path(file: &str) -> String {
    format!("{WORLD_DIR}/{file}")
}

pub fn npc_path(file: &str) -> String {
    format!("{NPC_DIR}/{file}")
}

pub fn zone_path(file: &str) -> String {
    format!("{ZONE_DIR}/{file}")
}

/// Reads resources below a data root.
#[derive(Debug, Clone)]
pub struct FsTextSource {
    root: PathBuf,
}

impl FsTextSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path);
        let normal = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !normal {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl TextSource for FsTextSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let full = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(FetchError::NotFound(path.to_string())),
            Err(source) => Err(FetchError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

/// Keeps the most recently fetched texts in memory.
pub struct CachedTextSource<S> {
    inner: S,
    cache: Mutex<LruCache<String, String>>,
}

impl<S: TextSource> CachedTextSource<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cached(&self, path: &str) -> Option<String> {
        self.cache.lock().ok()?.get(path).cloned()
    }
}

#[async_trait]
impl<S: TextSource> TextSource for CachedTextSource<S> {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        if let Some(text) = self.cached(path) {
            tracing::trace!(path, "text cache hit");
            return Ok(text);
        }
        let text = self.inner.fetch_text(path).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(path.to_string(), text.clone());
        }
        Ok(text)
    }
}

/// Fixed set of texts, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextSource {
    files: BTreeMap<String, String>,
}

impl MemoryTextSource {
    pub fn with(mut self, path: &str, text: &str) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: &str, text: &str) {
        self.files.insert(path.to_string(), text.to_string());
    }
}

#[async_trait]
impl TextSource for MemoryTextSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct AssetSummary {
    pub world_files: usize,
    pub npc_files: usize,
    pub zone_files: usize,
    pub save_files: usize,
}

pub fn scan(root: &Path) -> Result<AssetSummary, FetchError> {
    Ok(AssetSummary {
        world_files: count_dir(root.join(WORLD_DIR))?,
        npc_files: count_dir(root.join(NPC_DIR))?,
        zone_files: count_dir(root.join(ZONE_DIR))?,
        save_files: count_dir(root.join(SAVE_DIR))?,
    })
}

/// Missing directories count as empty.
fn count_dir(path: impl AsRef<Path>) -> Result<usize, FetchError> {
    let path = path.as_ref();
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
        Err(source) => {
            return Err(FetchError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let mut count = 0usize;
    for entry in entries.flatten() {
        if entry.path().is_file() {
            count += 1;
        }
    }

    Ok(count)
}
