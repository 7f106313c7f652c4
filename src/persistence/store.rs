use crate::entities::inventory::Inventory;
use crate::world::position::Position;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_SLOT: &str = "Hero";
const LATEST_FILE: &str = "latest";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid save slot '{0}'")]
    InvalidSlot(String),
    #[error("save io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("save parse failed for {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("save encode failed: {0}")]
    Encode(#[from] serde_yaml::Error),
}

/// What a slot remembers about a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    pub world: String,
    pub position: Position,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub inventory: Inventory,
}

/// One YAML document per slot under `<root>/save`, plus a `latest` pointer.
#[derive(Debug, Clone)]
pub struct SaveStore {
    root: PathBuf,
}

impl SaveStore {
    pub fn from_root(root: &Path) -> Self {
        Self {
            root: root.join(crate::assets::SAVE_DIR),
        }
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn save(&self, slot: &str, state: &SaveState) -> Result<(), StoreError> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let data = serde_yaml::to_string(state)?;
        if path.exists() {
            let backup = backup_path(&path);
            fs::copy(&path, &backup).map_err(|source| StoreError::Io { path: backup, source })?;
        }
        fs::write(&path, data).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let latest = self.root.join(LATEST_FILE);
        fs::write(&latest, slot).map_err(|source| StoreError::Io { path: latest, source })?;
        tracing::info!(slot, world = %state.world, position = %state.position, "saved");
        Ok(())
    }

    /// Loads a slot. A corrupt slot falls back to its backup when one exists.
    pub fn load(&self, slot: &str) -> Result<Option<SaveState>, StoreError> {
        let path = self.slot_path(slot)?;
        let state = match read_state(&path) {
            Ok(state) => state,
            Err(err @ StoreError::Parse { .. }) => match read_state(&backup_path(&path)) {
                Ok(Some(state)) => {
                    tracing::warn!(slot, error = %err, "save unreadable, using backup");
                    Some(state)
                }
                _ => return Err(err),
            },
            Err(err) => return Err(err),
        };
        if state.is_some() {
            let latest = self.root.join(LATEST_FILE);
            if let Err(err) = fs::write(&latest, slot) {
                tracing::debug!(error = %err, "latest slot not recorded");
            }
        }
        Ok(state)
    }

    /// Slot written or loaded most recently, or the default slot.
    pub fn latest_slot(&self) -> String {
        fs::read_to_string(self.root.join(LATEST_FILE))
            .ok()
            .map(|slot| slot.trim().to_string())
            .filter(|slot| is_valid_slot(slot))
            .unwrap_or_else(|| DEFAULT_SLOT.to_string())
    }

    pub fn slots(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };
        let mut slots: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_suffix(".yaml").map(str::to_string)
            })
            .collect();
        slots.sort();
        Ok(slots)
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_slot(slot) {
            return Err(StoreError::InvalidSlot(slot.to_string()));
        }
        Ok(self.root.join(format!("{slot}.yaml")))
    }
}

fn is_valid_slot(slot: &str) -> bool {
    !slot.is_empty()
        && slot
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
}

fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("yaml.bak")
}

fn read_state(path: &Path) -> Result<Option<SaveState>, StoreError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_yaml::from_str(&data)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
