use crate::actions::buy::parse_buy;
use crate::actions::fight::parse_fight;
use crate::actions::sell::parse_sell;
use crate::assets::{npc_path, TextSource};
use crate::entities::inventory::{Inventory, Possesses};
use crate::interaction::{Action, ActionEntry, ActionEvent, Interaction, InteractionKind, MenuItem};
use crate::scripting::dialogue::{has_section, split_sections, Section};
use crate::scripting::template::{render, TemplateContext};
use crate::world::events::Destination;
use crate::world::model::WorldModel;
use crate::world::movement::BumpSubject;
use crate::world::object_spec::{
    Attributes, DoorSpec, NpcSpec, ObjectSpec, PlacedObjectSpec, TransitionSpec,
};
use crate::world::position::Position;

/// Player facts needed to resolve an interaction.
#[derive(Debug, Clone, Default)]
pub struct HydrationContext {
    pub player_name: String,
    pub inventory: Inventory,
}

impl HydrationContext {
    fn template<'a>(&'a self, label: &'a str, attributes: &'a Attributes) -> TemplateContext<'a> {
        TemplateContext {
            player_name: &self.player_name,
            label,
            attributes,
            possesses: &self.inventory,
        }
    }
}

/// Resolves everything that needs no I/O. NPCs return `None`.
pub fn hydrate_static(world: &WorldModel, subject: BumpSubject, context: &HydrationContext) -> Option<Interaction> {
    match subject {
        BumpSubject::Terrain(position) => Some(describe_terrain(world, position, context)),
        BumpSubject::Object(position) => {
            let sprite = world.glyph_at(position).unwrap_or(' ');
            match world.object_at(position)? {
                ObjectSpec::Npc(_) => None,
                ObjectSpec::Door(door) => Some(door_interaction(door, sprite, context)),
                ObjectSpec::WorldTransition(transition) => Some(transition_interaction(transition, sprite)),
                ObjectSpec::Object(object) => Some(object_interaction(object, sprite, context)),
                ObjectSpec::Sprite(_) | ObjectSpec::Zone(_) => Some(describe_terrain(world, position, context)),
            }
        }
    }
}

pub async fn hydrate(
    world: &WorldModel,
    subject: BumpSubject,
    context: &HydrationContext,
    source: &dyn TextSource,
) -> Interaction {
    if let Some(interaction) = hydrate_static(world, subject, context) {
        return interaction;
    }
    let position = subject.position();
    let sprite = world.glyph_at(position).unwrap_or(' ');
    match world.object_at(position) {
        Some(ObjectSpec::Npc(npc)) => hydrate_npc(npc, sprite, context, source).await,
        _ => describe_terrain(world, position, context),
    }
}

/// Fetches and parses an NPC data file. A failed fetch still yields an
/// interaction whose `Look` carries the error.
pub async fn hydrate_npc(
    npc: &NpcSpec,
    sprite: char,
    context: &HydrationContext,
    source: &dyn TextSource,
) -> Interaction {
    match source.fetch_text(&npc_path(&npc.data_file)).await {
        Ok(text) => npc_from_text(npc, sprite, &text, context),
        Err(err) => {
            tracing::warn!(data_file = %npc.data_file, error = %err, "npc data unavailable");
            let mut interaction = npc_shell(npc, sprite);
            interaction.set_action(Action::text("Look", err.to_string()));
            interaction
        }
    }
}

pub fn npc_from_text(npc: &NpcSpec, sprite: char, text: &str, context: &HydrationContext) -> Interaction {
    let mut interaction = npc_shell(npc, sprite);
    let attributes = Attributes::default();
    let template = context.template(&npc.label, &attributes);
    for Section { name, hidden, body } in split_sections(text) {
        let rendered = render(&body, &template);
        let entry = npc_action_entry(&name, rendered, npc.coordinates, sprite, &context.inventory);
        interaction.set_action(Action { name, hidden, entry });
    }
    interaction.order_actions();
    interaction
}

fn npc_shell(npc: &NpcSpec, sprite: char) -> Interaction {
    let mut interaction = Interaction::new(InteractionKind::Npc, npc.label.clone(), sprite, npc.coordinates);
    interaction.name = Some(display_name(&npc.data_file));
    interaction
}

fn npc_action_entry(
    name: &str,
    body: String,
    coordinates: Position,
    sprite: char,
    inventory: &Inventory,
) -> ActionEntry {
    let parsed = match name {
        "Buy" => parse_buy(&body, inventory).map(ActionEntry::Menu),
        "Sell" => Ok(ActionEntry::Menu(parse_sell(&body, inventory))),
        "Fight" => parse_fight(&body, coordinates, sprite).map(|plan| ActionEntry::Event {
            event: ActionEvent::Fight(Box::new(plan)),
            text: None,
        }),
        _ => return ActionEntry::Text(body),
    };
    parsed.unwrap_or_else(|err| {
        tracing::warn!(action = name, error = %err, "action block left as text");
        ActionEntry::Text(body)
    })
}

/// `merchant.txt` becomes `Merchant`.
pub fn display_name(data_file: &str) -> String {
    let stem = data_file.strip_suffix(".txt").unwrap_or(data_file);
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn describe_terrain(world: &WorldModel, position: Position, context: &HydrationContext) -> Interaction {
    let glyph = world.glyph_at(position).unwrap_or(' ');
    let Some(sprite) = world.legend.get(&glyph) else {
        let mut interaction = Interaction::new(InteractionKind::Terrain, glyph.to_string(), glyph, position);
        interaction.incidental = true;
        return interaction;
    };
    let label = sprite.label.strip_prefix('~').unwrap_or(&sprite.label);
    let mut interaction = Interaction::new(InteractionKind::Terrain, label, glyph, position);
    interaction.incidental = true;
    interaction.short = sprite.short;
    interaction.attributes = sprite.attributes.clone();
    let template = context.template(label, &sprite.attributes);
    for (name, value) in sprite.attributes.capitalized() {
        let event = ActionEvent::Custom {
            name: name.to_string(),
            value: value.to_string(),
        };
        interaction.set_action(Action::event(name, event, Some(render(value, &template))));
    }
    interaction.order_actions();
    interaction
}

fn door_interaction(door: &DoorSpec, sprite: char, context: &HydrationContext) -> Interaction {
    let mut interaction = Interaction::new(InteractionKind::Door, door.label.clone(), sprite, door.coordinates);
    interaction.attributes = door.attributes.clone();
    let unlocked = match door.key() {
        None => true,
        Some(key) => context.inventory.possesses("ring", key),
    };
    let open = if unlocked {
        Action::event(
            "Open",
            ActionEvent::Destination(Destination {
                coordinates: door.destination,
                world_file: None,
            }),
            None,
        )
    } else {
        let template = context.template(&door.label, &door.attributes);
        Action::text("Open", render(door.locked_text(), &template))
    };
    interaction.set_action(open);
    interaction
}

fn transition_interaction(transition: &TransitionSpec, sprite: char) -> Interaction {
    let mut interaction = Interaction::new(
        InteractionKind::WorldTransition,
        transition.label.clone(),
        sprite,
        transition.coordinates,
    );
    interaction.set_action(Action::event(
        "Enter",
        ActionEvent::Destination(Destination {
            coordinates: transition.destination,
            world_file: Some(transition.world_file.clone()),
        }),
        None,
    ));
    interaction
}

fn object_interaction(object: &PlacedObjectSpec, sprite: char, context: &HydrationContext) -> Interaction {
    let mut interaction = Interaction::new(InteractionKind::Object, object.label.clone(), sprite, object.coordinates);
    interaction.attributes = object.attributes.clone();
    let template = context.template(&object.label, &object.attributes);
    for (name, value) in object.attributes.capitalized() {
        interaction.set_action(Action::text(name, render(value, &template)));
    }
    if !object.items.is_empty() {
        let entries = object
            .items
            .iter()
            .map(|item| MenuItem {
                consume: true,
                event: Some(ActionEvent::Acquire(item.clone())),
                ..MenuItem::plain(item.name.clone())
            })
            .collect();
        interaction.set_action(Action {
            name: "Take".to_string(),
            hidden: false,
            entry: ActionEntry::Menu(entries),
        });
    }
    interaction.order_actions();
    interaction
}

/// NPCs in `world` whose data file has a section called `name`, opened on
/// that section.
pub async fn ambient(
    world: &WorldModel,
    name: &str,
    context: &HydrationContext,
    source: &dyn TextSource,
) -> Vec<Interaction> {
    let mut found = Vec::new();
    for spec in world.points.values() {
        let ObjectSpec::Npc(npc) = spec else {
            continue;
        };
        let text = match source.fetch_text(&npc_path(&npc.data_file)).await {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(data_file = %npc.data_file, error = %err, "ambient skipped npc");
                continue;
            }
        };
        if !has_section(&text, name) {
            continue;
        }
        let sprite = world.glyph_at(npc.coordinates).unwrap_or(' ');
        let mut interaction = npc_from_text(npc, sprite, &text, context);
        interaction.start = Some(name.to_string());
        found.push(interaction);
    }
    found
}
