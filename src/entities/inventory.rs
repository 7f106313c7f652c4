use crate::entities::item::{Item, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Equipment kinds the sell menu knows, with their menu titles.
pub const EQUIPMENT_KINDS: [(&str, &str); 8] = [
    ("weapon", "Weapons"),
    ("body", "Body armor"),
    ("legs", "Leggings"),
    ("feet", "Footwear"),
    ("head", "Headgear"),
    ("arms", "Sleeves"),
    ("shield", "Shields"),
    ("waist", "Waist gear"),
];

pub fn equipment_title(kind: &str) -> Option<&'static str> {
    EQUIPMENT_KINDS
        .iter()
        .find(|(key, _)| *key == kind)
        .map(|(_, title)| *title)
}

/// Inventory predicate consulted for keys and template placeholders.
pub trait Possesses {
    fn possesses(&self, kind: &str, identifier: &str) -> bool;
}

impl<F> Possesses for F
where
    F: Fn(&str, &str) -> bool,
{
    fn possesses(&self, kind: &str, identifier: &str) -> bool {
        self(kind, identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("not enough gold: need {needed}, have {available}")]
    InsufficientGold { needed: i64, available: i64 },
    #[error("no {kind} with id {id} in inventory")]
    MissingItem { kind: String, id: u32 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub gold: i64,
    items: BTreeMap<String, Vec<Item>>,
}

impl Inventory {
    pub fn with_gold(gold: i64) -> Self {
        Self {
            gold,
            items: BTreeMap::new(),
        }
    }

    pub fn items(&self, kind: &str) -> &[Item] {
        self.items.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn owns_named(&self, kind: &str, name: &str) -> bool {
        self.items(kind).iter().any(|item| item.name == name)
    }

    /// Adds an item, assigning an id when it has none.
    pub fn add(&mut self, mut item: Item) -> ItemId {
        let id = *item.id.get_or_insert_with(ItemId::next);
        self.items.entry(item.kind.clone()).or_default().push(item);
        id
    }

    pub fn remove(&mut self, kind: &str, id: ItemId) -> Result<Item, InventoryError> {
        let missing = || InventoryError::MissingItem {
            kind: kind.to_string(),
            id: id.0,
        };
        let items = self.items.get_mut(kind).ok_or_else(missing)?;
        let index = items
            .iter()
            .position(|item| item.id == Some(id))
            .ok_or_else(missing)?;
        let removed = items.remove(index);
        if items.is_empty() {
            self.items.remove(kind);
        }
        Ok(removed)
    }

    /// Pays for `item` and stores it.
    pub fn buy(&mut self, item: Item) -> Result<ItemId, InventoryError> {
        let price = item.price();
        if self.gold < price {
            return Err(InventoryError::InsufficientGold {
                needed: price,
                available: self.gold,
            });
        }
        self.gold -= price;
        Ok(self.add(item))
    }

    pub fn sell(&mut self, kind: &str, id: ItemId) -> Result<i64, InventoryError> {
        let item = self.remove(kind, id)?;
        let price = item.price();
        self.gold = self.gold.saturating_add(price);
        Ok(price)
    }
}

impl Possesses for Inventory {
    /// Matches by item id, name or template.
    fn possesses(&self, kind: &str, identifier: &str) -> bool {
        self.items(kind).iter().any(|item| {
            item.name == identifier
                || item.template == identifier
                || item
                    .id
                    .is_some_and(|id| id.0.to_string() == identifier)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(spec: &str) -> Item {
        Item::parse_spec(spec).expect("item")
    }

    #[test]
    fn add_assigns_ids_and_groups_by_kind() {
        let mut inventory = Inventory::default();
        let sword = inventory.add(item("weapon/sword/0/Sword/4"));
        inventory.add(item("weapon/ax/0/Ax/7/3"));
        inventory.add(item("head/helmet/2/Iron helmet/2"));
        assert_eq!(inventory.items("weapon").len(), 2);
        assert_eq!(inventory.items("head").len(), 1);
        assert!(inventory.items("feet").is_empty());
        assert!(inventory.owns_named("weapon", "Ax"));
        assert!(!inventory.owns_named("head", "Ax"));
        assert_eq!(inventory.items("weapon")[0].id, Some(sword));
        assert_eq!(inventory.items("weapon")[1].id, Some(ItemId(3)));
    }

    #[test]
    fn possesses_matches_name_template_or_id() {
        let mut inventory = Inventory::default();
        inventory.add(item("ring/gold/1/Gold ring/0/8"));
        assert!(inventory.possesses("ring", "gold"));
        assert!(inventory.possesses("ring", "Gold ring"));
        assert!(inventory.possesses("ring", "8"));
        assert!(!inventory.possesses("ring", "silver"));
        assert!(!inventory.possesses("weapon", "gold"));
    }

    #[test]
    fn buy_and_sell_move_gold() {
        let mut inventory = Inventory::with_gold(20);
        let id = inventory.buy(item("weapon/sword/1/IronSword/5")).expect("buy");
        assert_eq!(inventory.gold, 8);
        let err = inventory.buy(item("weapon/sword/1/IronSword/5")).unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientGold {
                needed: 12,
                available: 8
            }
        );
        assert_eq!(inventory.sell("weapon", id), Ok(12));
        assert_eq!(inventory.gold, 20);
        assert!(inventory.items("weapon").is_empty());
    }

    #[test]
    fn closures_act_as_predicates() {
        let predicate = |kind: &str, id: &str| kind == "ring" && id == "gold";
        assert!(predicate.possesses("ring", "gold"));
        assert!(!predicate.possesses("ring", "iron"));
    }
}
