use crate::entities::item::Item;
use crate::world::format::WorldError;
use crate::world::position::Position;
use crate::world::zone::{parse_directions, ZoneBox, ZoneSpec};

/// Ordered `#key=value` attributes. Unknown keys are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Attributes whose key starts with an uppercase letter name actions.
    pub fn capitalized(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter(|(key, _)| key.chars().next().is_some_and(|ch| ch.is_ascii_uppercase()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Legend entry describing a terrain glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSpec {
    pub glyph: char,
    pub label: String,
    pub attributes: Attributes,
    pub passable: bool,
    pub short: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionSpec {
    pub coordinates: Position,
    pub destination: Position,
    pub label: String,
    pub world_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorSpec {
    pub coordinates: Position,
    pub destination: Position,
    pub label: String,
    pub attributes: Attributes,
}

impl DoorSpec {
    pub fn key(&self) -> Option<&str> {
        self.attributes.get("key").filter(|key| !key.is_empty())
    }

    pub fn locked_text(&self) -> &str {
        self.attributes
            .get("text")
            .unwrap_or(DEFAULT_LOCKED_TEXT)
    }
}

pub const DEFAULT_LOCKED_TEXT: &str = "This door seems locked.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcSpec {
    pub coordinates: Position,
    pub label: String,
    pub data_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedObjectSpec {
    pub coordinates: Position,
    pub label: String,
    pub items: Vec<Item>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectSpec {
    Sprite(SpriteSpec),
    Zone(ZoneSpec),
    WorldTransition(TransitionSpec),
    Door(DoorSpec),
    Npc(NpcSpec),
    Object(PlacedObjectSpec),
}

impl ObjectSpec {
    pub fn coordinates(&self) -> Option<Position> {
        match self {
            ObjectSpec::Sprite(_) | ObjectSpec::Zone(_) => None,
            ObjectSpec::WorldTransition(spec) => Some(spec.coordinates),
            ObjectSpec::Door(spec) => Some(spec.coordinates),
            ObjectSpec::Npc(spec) => Some(spec.coordinates),
            ObjectSpec::Object(spec) => Some(spec.coordinates),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ObjectSpec::Sprite(spec) => &spec.label,
            ObjectSpec::Zone(spec) => &spec.overlay_file,
            ObjectSpec::WorldTransition(spec) => &spec.label,
            ObjectSpec::Door(spec) => &spec.label,
            ObjectSpec::Npc(spec) => &spec.label,
            ObjectSpec::Object(spec) => &spec.label,
        }
    }

    pub fn destination(&self) -> Option<Position> {
        match self {
            ObjectSpec::WorldTransition(spec) => Some(spec.destination),
            ObjectSpec::Door(spec) => Some(spec.destination),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ObjectSpec::Sprite(_) => "sprite",
            ObjectSpec::Zone(_) => "zone",
            ObjectSpec::WorldTransition(_) => "world",
            ObjectSpec::Door(_) => "door",
            ObjectSpec::Npc(_) => "npc",
            ObjectSpec::Object(_) => "obj",
        }
    }
}

type Grammar = fn(&str) -> Option<ObjectSpec>;

/// Tried in order; the first full-line match wins.
const GRAMMARS: [Grammar; 6] = [
    parse_sprite,
    parse_zone,
    parse_world_transition,
    parse_door,
    parse_npc,
    parse_object,
];

pub fn classify_object_spec(line: &str) -> Result<ObjectSpec, WorldError> {
    GRAMMARS
        .iter()
        .find_map(|grammar| grammar(line))
        .ok_or_else(|| WorldError::InvalidObjectSpec(line.to_string()))
}

fn parse_sprite(line: &str) -> Option<ObjectSpec> {
    let mut chars = line.chars();
    let glyph = chars.next()?;
    let rest = chars.as_str().strip_prefix(':')?;
    let (label, attributes) = split_attributes(rest)?;
    if !is_label(label) {
        return None;
    }
    let passable = attributes
        .get("passable")
        .is_some_and(|value| matches!(value, "true" | "yes" | "1"));
    Some(ObjectSpec::Sprite(SpriteSpec {
        glyph,
        label: label.to_string(),
        short: label.starts_with('~'),
        attributes,
        passable,
    }))
}

fn parse_zone(line: &str) -> Option<ObjectSpec> {
    let (overlay_file, rest) = line.split_once('@')?;
    if !is_data_file(overlay_file) {
        return None;
    }
    let (raw_directions, rest) = rest.split_once(':')?;
    let directions = parse_directions(raw_directions)?;
    let (raw_boxes, attributes) = split_attributes(rest)?;
    let boxes = parse_boxes(raw_boxes)?;
    Some(ObjectSpec::Zone(ZoneSpec {
        overlay_file: overlay_file.to_string(),
        directions,
        boxes,
        attributes,
    }))
}

fn parse_world_transition(line: &str) -> Option<ObjectSpec> {
    let (coordinates, rest) = parse_coordinates(line)?;
    let rest = rest.strip_prefix('=')?;
    let (destination, rest) = parse_coordinates(rest)?;
    let rest = rest.strip_prefix(':')?;
    let (label, world_file) = rest.split_once('/')?;
    if !is_label(label) || !is_data_file(world_file) {
        return None;
    }
    Some(ObjectSpec::WorldTransition(TransitionSpec {
        coordinates,
        destination,
        label: label.to_string(),
        world_file: world_file.to_string(),
    }))
}

fn parse_door(line: &str) -> Option<ObjectSpec> {
    let (coordinates, rest) = parse_coordinates(line)?;
    let rest = rest.strip_prefix('=')?;
    let (destination, rest) = parse_coordinates(rest)?;
    let rest = rest.strip_prefix(':')?;
    let (label, attributes) = split_attributes(rest)?;
    if !is_label(label) {
        return None;
    }
    Some(ObjectSpec::Door(DoorSpec {
        coordinates,
        destination,
        label: label.to_string(),
        attributes,
    }))
}

fn parse_npc(line: &str) -> Option<ObjectSpec> {
    let (coordinates, rest) = parse_coordinates(line)?;
    let rest = rest.strip_prefix(':')?;
    let (label, data_file) = rest.split_once('/')?;
    if !is_label(label) || !is_data_file(data_file) {
        return None;
    }
    Some(ObjectSpec::Npc(NpcSpec {
        coordinates,
        label: label.to_string(),
        data_file: data_file.to_string(),
    }))
}

fn parse_object(line: &str) -> Option<ObjectSpec> {
    let (coordinates, rest) = parse_coordinates(line)?;
    let rest = rest.strip_prefix(':')?;
    let (head, attributes) = split_attributes(rest)?;
    let (label, inventory) = match head.find(",$") {
        Some(idx) => (&head[..idx], &head[idx + 1..]),
        None => (head, ""),
    };
    if !is_label(label) {
        return None;
    }
    let mut items = Vec::new();
    if !inventory.is_empty() {
        for raw in inventory.split(',') {
            let spec = raw.strip_prefix('$')?;
            items.push(Item::parse_spec(spec).ok()?);
        }
    }
    Some(ObjectSpec::Object(PlacedObjectSpec {
        coordinates,
        label: label.to_string(),
        items,
        attributes,
    }))
}

/// Reads a 1-based `(row,col)` or `row,col` prefix and returns the 0-based
/// position with the unparsed remainder.
fn parse_coordinates(input: &str) -> Option<(Position, &str)> {
    let (body, rest) = match input.strip_prefix('(') {
        Some(inner) => {
            let end = inner.find(')')?;
            (&inner[..end], &inner[end + 1..])
        }
        None => {
            let (row, after_row) = take_digits(input)?;
            let after_comma = after_row.strip_prefix(',')?;
            let (col, rest) = take_digits(after_comma)?;
            let consumed = row.len() + 1 + col.len();
            (&input[..consumed], rest)
        }
    };
    let (row, col) = body.split_once(',')?;
    if !is_digits(row) || !is_digits(col) {
        return None;
    }
    let position = Position::from_one_based(row.parse().ok()?, col.parse().ok()?)?;
    Some((position, rest))
}

fn take_digits(input: &str) -> Option<(&str, &str)> {
    let end = input
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(input.len(), |(idx, _)| idx);
    if end == 0 {
        return None;
    }
    Some((&input[..end], &input[end..]))
}

fn parse_boxes(raw: &str) -> Option<Vec<ZoneBox>> {
    let mut boxes = Vec::new();
    let mut rest = raw;
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let end = inner.find(']')?;
        let values: Vec<i32> = inner[..end]
            .split(',')
            .map(|value| {
                if is_digits(value) {
                    value.parse::<i32>().ok()
                } else {
                    None
                }
            })
            .collect::<Option<Vec<_>>>()?;
        let [r1, c1, r2, c2] = values.as_slice() else {
            return None;
        };
        boxes.push(ZoneBox::new(r1 - 1, c1 - 1, r2 - 1, c2 - 1));
        rest = &inner[end + 1..];
        rest = rest.strip_prefix(';').unwrap_or(rest);
    }
    Some(boxes)
}

/// Splits `head#k=v#k2=v2` into the head and its attributes. Each attribute
/// needs a non-empty key and value.
fn split_attributes(input: &str) -> Option<(&str, Attributes)> {
    let Some(idx) = input.find('#') else {
        return Some((input, Attributes::default()));
    };
    let mut attributes = Attributes::default();
    for raw in input[idx + 1..].split('#') {
        let (key, value) = raw.split_once('=')?;
        if key.is_empty() || value.is_empty() {
            return None;
        }
        attributes.insert(key, value);
    }
    Some((&input[..idx], attributes))
}

fn is_label(label: &str) -> bool {
    !label.is_empty() && !label.contains(['/', '#'])
}

fn is_data_file(name: &str) -> bool {
    name.strip_suffix(".txt").is_some_and(|stem| {
        !stem.is_empty() && stem.chars().all(|ch| ch.is_alphanumeric() || ch == '_')
    })
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}
