pub mod buy;
pub mod fight;
pub mod sell;

use crate::entities::item::{Item, ItemSpecError};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("fight section is missing its stats line")]
    MissingStats,
    #[error("fight stats need {0}")]
    MissingStat(&'static str),
    #[error("invalid {field} value '{value}'")]
    InvalidStat { field: &'static str, value: String },
    #[error("fight hp {0} exceeds the limit of {max}", max = fight::MAX_FIGHT_HP)]
    HpTooLarge(u32),
    #[error("invalid strategy breakpoint '{0}'")]
    InvalidBreakpoint(String),
    #[error(transparent)]
    Item(#[from] ItemSpecError),
}

/// Item lines as used by shop and equipment blocks: one spec per line or
/// comma separated, each optionally prefixed with `$`.
pub fn parse_item_lines(text: &str) -> Result<Vec<Item>, ItemSpecError> {
    text.lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|spec| !spec.is_empty())
        .map(|spec| Item::parse_spec(spec.strip_prefix('$').unwrap_or(spec)))
        .collect()
}

pub fn group_by_kind(items: Vec<Item>) -> BTreeMap<String, Vec<Item>> {
    let mut grouped: BTreeMap<String, Vec<Item>> = BTreeMap::new();
    for item in items {
        grouped.entry(item.kind.clone()).or_default().push(item);
    }
    grouped
}
