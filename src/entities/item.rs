use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

static NEXT_ITEM_ID: AtomicU32 = AtomicU32::new(1_000_000);

impl ItemId {
    pub fn next() -> Self {
        ItemId(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub const ATTACK_STAT: &str = "A";
pub const DEFENSE_STAT: &str = "D";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemSpecError {
    #[error("item spec '{0}' needs kind/template/rarity/name/stat")]
    MissingFields(String),
    #[error("item spec '{spec}' has an invalid {field}")]
    InvalidNumber { spec: String, field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<ItemId>,
    pub kind: String,
    pub template: String,
    pub rarity: u32,
    pub name: String,
    pub stats: BTreeMap<String, i64>,
}

impl Item {
    /// Parses `kind/template/rarity/name/stat[/id]`.
    pub fn parse_spec(spec: &str) -> Result<Self, ItemSpecError> {
        let fields: Vec<&str> = spec.trim().split('/').map(str::trim).collect();
        if fields.len() < 5 || fields[..5].iter().any(|field| field.is_empty()) {
            return Err(ItemSpecError::MissingFields(spec.to_string()));
        }
        let invalid = |field| ItemSpecError::InvalidNumber {
            spec: spec.to_string(),
            field,
        };
        let rarity = fields[2].parse::<u32>().map_err(|_| invalid("rarity"))?;
        let stat = fields[4].parse::<i64>().map_err(|_| invalid("stat"))?;
        let id = match fields.get(5) {
            Some(raw) if !raw.is_empty() => {
                Some(ItemId(raw.parse::<u32>().map_err(|_| invalid("id"))?))
            }
            _ => None,
        };
        let kind = fields[0].to_string();
        let mut stats = BTreeMap::new();
        stats.insert(stat_key(&kind).to_string(), stat);
        Ok(Self {
            id,
            template: fields[1].to_string(),
            rarity,
            name: fields[3].to_string(),
            stats,
            kind,
        })
    }

    pub fn stat_total(&self) -> i64 {
        self.stats.values().sum()
    }

    /// Gold value: `(rarity + 1) * (sum of stats + 1)`.
    pub fn price(&self) -> i64 {
        (i64::from(self.rarity) + 1).saturating_mul(self.stat_total().saturating_add(1))
    }
}

/// Weapons carry attack, everything else defense.
pub fn stat_key(kind: &str) -> &'static str {
    if kind == "weapon" {
        ATTACK_STAT
    } else {
        DEFENSE_STAT
    }
}
