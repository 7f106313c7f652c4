pub mod hydrate;

use crate::actions::fight::FightPlan;
use crate::entities::item::Item;
use crate::world::events::Destination;
use crate::world::object_spec::Attributes;
use crate::world::position::Position;

/// Actions listed first, in this order. Everything else follows in the order
/// it was declared.
pub const ACTIONS_ORDER: [&str; 6] = ["Look", "Greet", "Buy", "Sell", "Bribe", "Fight"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Terrain,
    Object,
    Door,
    WorldTransition,
    Npc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    Destination(Destination),
    Acquire(Item),
    Sell(Item),
    Fight(Box<FightPlan>),
    /// Raised by terrain attributes, named by the attribute key.
    Custom { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub name: String,
    /// Gold delta applied when chosen; negative costs.
    pub gold: Option<i64>,
    pub consume: bool,
    pub event: Option<ActionEvent>,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gold: None,
            consume: false,
            event: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEntry {
    Text(String),
    Menu(Vec<MenuItem>),
    Event {
        event: ActionEvent,
        text: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    pub hidden: bool,
    pub entry: ActionEntry,
}

impl Action {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hidden: false,
            entry: ActionEntry::Text(text.into()),
        }
    }

    pub fn event(name: impl Into<String>, event: ActionEvent, text: Option<String>) -> Self {
        Self {
            name: name.into(),
            hidden: false,
            entry: ActionEntry::Event { event, text },
        }
    }
}

/// A resolved bump, ready for the menu layer. Built fresh on every bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub label: String,
    pub name: Option<String>,
    pub sprite: char,
    pub coordinates: Position,
    pub attributes: Attributes,
    pub actions: Vec<Action>,
    pub incidental: bool,
    pub short: bool,
    /// Action the menu should open on, set by ambient events.
    pub start: Option<String>,
}

impl Interaction {
    pub fn new(kind: InteractionKind, label: impl Into<String>, sprite: char, coordinates: Position) -> Self {
        Self {
            kind,
            label: label.into(),
            name: None,
            sprite,
            coordinates,
            attributes: Attributes::default(),
            actions: Vec::new(),
            incidental: false,
            short: false,
            start: None,
        }
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|action| action.name == name)
    }

    /// Adds or replaces the action with the same name.
    pub fn set_action(&mut self, action: Action) {
        match self.actions.iter_mut().find(|existing| existing.name == action.name) {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }

    pub fn visible_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(|action| !action.hidden)
    }

    pub fn order_actions(&mut self) {
        self.actions.sort_by_key(|action| action_rank(&action.name));
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.label)
    }
}

fn action_rank(name: &str) -> usize {
    ACTIONS_ORDER
        .iter()
        .position(|known| *known == name)
        .unwrap_or(ACTIONS_ORDER.len())
}
