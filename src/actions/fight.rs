use crate::actions::{group_by_kind, parse_item_lines, ActionParseError};
use crate::entities::item::Item;
use crate::world::position::Position;
use std::collections::BTreeMap;

pub const MAX_FIGHT_HP: u32 = 10_000;
pub const DIE_STRATEGY: &str = "die";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FightPlan {
    pub hp: u32,
    pub speed: u32,
    /// Strategy per damage taken, `0..=hp`.
    pub strategies: Vec<Option<String>>,
    pub equipment: BTreeMap<String, Vec<Item>>,
    pub coordinates: Position,
    pub sprite: char,
}

impl FightPlan {
    pub fn strategy_at(&self, damage: u32) -> Option<&str> {
        let index = usize::try_from(damage.min(self.hp)).ok()?;
        self.strategies.get(index)?.as_deref()
    }
}

/// Parses a fight block:
///
/// ```text
/// hp:10 spd:3
/// 5:aggressive,8:flee
/// weapon/club/0/Club/2
/// ```
pub fn parse_fight(text: &str, coordinates: Position, sprite: char) -> Result<FightPlan, ActionParseError> {
    let mut lines = text.lines();
    let stats_line = lines
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or(ActionParseError::MissingStats)?;
    let hp = stat(stats_line, "hp")?;
    let speed = stat(stats_line, "spd")?;
    if hp > MAX_FIGHT_HP {
        return Err(ActionParseError::HpTooLarge(hp));
    }

    let mut breakpoints = Vec::new();
    for part in lines.next().unwrap_or("").split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let invalid = || ActionParseError::InvalidBreakpoint(part.to_string());
        let (damage, strategy) = part.split_once(':').ok_or_else(invalid)?;
        let damage: u32 = damage.trim().parse().map_err(|_| invalid())?;
        let strategy = strategy.trim();
        if strategy.is_empty() {
            return Err(invalid());
        }
        breakpoints.push((damage, strategy.to_string()));
    }
    breakpoints.push((hp, DIE_STRATEGY.to_string()));
    breakpoints.sort_by_key(|(damage, _)| *damage);

    let strategies = (0..=hp)
        .map(|taken| {
            breakpoints
                .iter()
                .rev()
                .find(|(damage, _)| *damage <= taken)
                .map(|(_, strategy)| strategy.clone())
        })
        .collect();

    let remaining: Vec<&str> = lines.collect();
    let equipment = group_by_kind(parse_item_lines(&remaining.join("\n"))?);

    Ok(FightPlan {
        hp,
        speed,
        strategies,
        equipment,
        coordinates,
        sprite,
    })
}

fn stat(line: &str, field: &'static str) -> Result<u32, ActionParseError> {
    let raw = line
        .split_whitespace()
        .find_map(|token| token.strip_prefix(field)?.strip_prefix(':'))
        .ok_or(ActionParseError::MissingStat(field))?;
    raw.parse().map_err(|_| ActionParseError::InvalidStat {
        field,
        value: raw.to_string(),
    })
}
