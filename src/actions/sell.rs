use crate::entities::inventory::{equipment_title, Inventory};
use crate::interaction::{ActionEvent, MenuItem};

/// Sell menu from a comma separated kind list. Known equipment kinds list the
/// player's items of that kind; anything else is a plain entry.
pub fn parse_sell(text: &str, inventory: &Inventory) -> Vec<MenuItem> {
    text.split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .map(|kind| match equipment_title(kind) {
            Some(title) => MenuItem {
                children: inventory
                    .items(kind)
                    .iter()
                    .map(|item| MenuItem {
                        name: item.name.clone(),
                        gold: Some(item.price()),
                        consume: true,
                        event: Some(ActionEvent::Sell(item.clone())),
                        children: Vec::new(),
                    })
                    .collect(),
                ..MenuItem::plain(title)
            },
            None => MenuItem::plain(kind),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::item::Item;

    #[test]
    fn known_kinds_list_owned_items_at_positive_prices() {
        let mut inventory = Inventory::default();
        inventory.add(Item::parse_spec("weapon/sword/1/IronSword/5").expect("item"));
        let menu = parse_sell("weapon, head,trinkets", &inventory);
        assert_eq!(menu.len(), 3);
        assert_eq!(menu[0].name, "Weapons");
        assert_eq!(menu[0].children.len(), 1);
        assert_eq!(menu[0].children[0].gold, Some(12));
        assert!(matches!(&menu[0].children[0].event, Some(ActionEvent::Sell(item)) if item.name == "IronSword"));
        assert_eq!(menu[1].name, "Headgear");
        assert!(menu[1].children.is_empty());
        assert_eq!(menu[2], MenuItem::plain("trinkets"));
    }
}
