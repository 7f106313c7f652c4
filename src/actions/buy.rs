use crate::actions::{parse_item_lines, ActionParseError};
use crate::entities::inventory::Inventory;
use crate::interaction::{ActionEvent, MenuItem};

/// Shop menu: every listed item the player does not already own, priced as a
/// negative gold delta.
pub fn parse_buy(text: &str, inventory: &Inventory) -> Result<Vec<MenuItem>, ActionParseError> {
    let items = parse_item_lines(text)?;
    Ok(items
        .into_iter()
        .filter(|item| !inventory.owns_named(&item.kind, &item.name))
        .map(|item| MenuItem {
            name: item.name.clone(),
            gold: Some(-item.price()),
            consume: true,
            event: Some(ActionEvent::Acquire(item)),
            children: Vec::new(),
        })
        .collect())
}
