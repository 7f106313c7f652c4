use crate::world::position::{Direction, Position};
use crate::world::viewport::{ViewportSize, PLAYER_MARKER};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "glyphwalk.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("usage: glyphwalk <data-root> [moves]")]
    Usage,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid viewport '{0}', expected WIDTHxHEIGHT")]
    InvalidViewport(String),
    #[error("invalid start position {row},{col}")]
    InvalidPosition { row: u32, col: u32 },
    #[error("invalid move '{0}', expected one of ^ v < >")]
    InvalidMove(char),
}

/// Optional `glyphwalk.yaml` in the data root. Positions are 1-based like
/// the world format.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    start_world: Option<String>,
    start_row: Option<u32>,
    start_col: Option<u32>,
    viewport: Option<String>,
    marker: Option<char>,
    player_name: Option<String>,
    cache_size: Option<usize>,
    log_to_file: Option<bool>,
    slot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub root: PathBuf,
    pub moves: Vec<Direction>,
    pub start_world: String,
    pub start_position: Position,
    pub viewport: ViewportSize,
    pub marker: char,
    pub player_name: String,
    pub slot: Option<String>,
    pub cache_size: usize,
    pub log_to_file: bool,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        Self::from_sources(args, |key| std::env::var(key).ok())
    }

    /// Defaults, then `glyphwalk.yaml`, then environment, then arguments.
    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if args.len() < 2 {
            return Err(ConfigError::Usage);
        }
        let root = Path::new(&args[1]).to_path_buf();
        let file = load_file_config(&root)?;
        let env = |key: &str| env(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        let start_world = env("GLYPHWALK_WORLD")
            .or(file.start_world)
            .unwrap_or_else(|| "start.txt".to_string());
        let row = file.start_row.unwrap_or(1);
        let col = file.start_col.unwrap_or(1);
        let start_position =
            Position::from_one_based(row, col).ok_or(ConfigError::InvalidPosition { row, col })?;
        let viewport = match env("GLYPHWALK_VIEWPORT").or(file.viewport) {
            Some(raw) => parse_viewport(&raw)?,
            None => ViewportSize::default(),
        };
        let player_name = env("GLYPHWALK_PLAYER")
            .or(file.player_name)
            .unwrap_or_else(|| "Hero".to_string());
        let slot = env("GLYPHWALK_SLOT").or(file.slot);
        let moves = match args.get(2) {
            Some(raw) => parse_moves(raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            root,
            moves,
            start_world,
            start_position,
            viewport,
            marker: file.marker.unwrap_or(PLAYER_MARKER),
            player_name,
            slot,
            cache_size: file.cache_size.unwrap_or(64),
            log_to_file: file.log_to_file.unwrap_or(false),
        })
    }
}

fn load_file_config(root: &Path) -> Result<FileConfig, ConfigError> {
    let path = root.join(CONFIG_FILE);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    if data.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse { path, source })
}

/// Parses `16x8`.
pub fn parse_viewport(raw: &str) -> Result<ViewportSize, ConfigError> {
    let invalid = || ConfigError::InvalidViewport(raw.to_string());
    let (width, height) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u16 = width.trim().parse().map_err(|_| invalid())?;
    let height: u16 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok(ViewportSize { width, height })
}

pub fn parse_moves(raw: &str) -> Result<Vec<Direction>, ConfigError> {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| Direction::from_glyph(ch).ok_or(ConfigError::InvalidMove(ch)))
        .collect()
}
