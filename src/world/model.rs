use crate::world::format::{split_world_file, WorldError};
use crate::world::object_spec::{classify_object_spec, ObjectSpec, SpriteSpec};
use crate::world::position::Position;
use crate::world::zone::{ActiveZone, ZoneBox, ZoneSpec};
use std::collections::BTreeMap;

/// A loaded world. Never mutated after construction; a world change builds a
/// new model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldModel {
    pub name: String,
    pub tiles: Vec<Vec<char>>,
    pub legend: BTreeMap<char, SpriteSpec>,
    pub points: BTreeMap<Position, ObjectSpec>,
    pub zones: Vec<ZoneSpec>,
}

impl WorldModel {
    pub fn parse(name: &str, content: &str) -> Result<Self, WorldError> {
        let sections = split_world_file(content)?;
        let rows = sections.rows();
        let cols = sections.cols();
        let mut legend = BTreeMap::new();
        let mut points = BTreeMap::new();
        let mut zones = Vec::new();

        for line in &sections.spec_lines {
            match classify_object_spec(line)? {
                ObjectSpec::Sprite(sprite) => {
                    if legend.insert(sprite.glyph, sprite).is_some() {
                        tracing::warn!(world = name, line = %line, "legend glyph redefined");
                    }
                }
                ObjectSpec::Zone(mut zone) => {
                    zone.boxes = if zone.boxes.is_empty() {
                        vec![ZoneBox::whole_map(rows, cols)]
                    } else {
                        zone.boxes
                            .iter()
                            .filter_map(|zone_box| zone_box.clamp(rows, cols))
                            .collect()
                    };
                    if zone.boxes.is_empty() {
                        tracing::warn!(world = name, line = %line, "zone lies outside the grid");
                    }
                    zones.push(zone);
                }
                placed => {
                    let out_of_bounds = |position: Position| WorldError::OutOfBounds {
                        position,
                        rows,
                        cols,
                        line: line.clone(),
                    };
                    let Some(coordinates) = placed.coordinates() else {
                        continue;
                    };
                    if !within(coordinates, rows, cols) {
                        return Err(out_of_bounds(coordinates));
                    }
                    if let ObjectSpec::Door(door) = &placed {
                        if !within(door.destination, rows, cols) {
                            return Err(out_of_bounds(door.destination));
                        }
                    }
                    if points.insert(coordinates, placed).is_some() {
                        tracing::warn!(world = name, line = %line, "object spec replaces an earlier one");
                    }
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            tiles: sections.grid,
            legend,
            points,
            zones,
        })
    }

    pub fn rows(&self) -> usize {
        self.tiles.len()
    }

    pub fn cols(&self) -> usize {
        self.tiles.first().map_or(0, |row| row.len())
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        within(position, self.rows(), self.cols())
    }

    pub fn glyph_at(&self, position: Position) -> Option<char> {
        let (row, col) = position.index()?;
        self.tiles.get(row)?.get(col).copied()
    }

    pub fn sprite_at(&self, position: Position) -> Option<&SpriteSpec> {
        self.glyph_at(position)
            .and_then(|glyph| self.legend.get(&glyph))
    }

    /// Glyphs without a legend entry are open terrain.
    pub fn is_wall_glyph(&self, glyph: char) -> bool {
        self.legend
            .get(&glyph)
            .is_some_and(|sprite| !sprite.passable)
    }

    pub fn is_passable(&self, position: Position) -> bool {
        self.glyph_at(position)
            .is_some_and(|glyph| !self.is_wall_glyph(glyph))
    }

    pub fn object_at(&self, position: Position) -> Option<&ObjectSpec> {
        if !self.in_bounds(position) {
            return None;
        }
        self.points.get(&position)
    }

    /// Zone covering `position`; the last declared zone wins on overlap.
    pub fn zone_at(&self, position: Position) -> Option<ActiveZone> {
        self.zones
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, zone)| {
                zone.box_containing(position).map(|bounds| ActiveZone {
                    index,
                    bounds,
                    spec: zone.clone(),
                })
            })
    }
}

fn within(position: Position, rows: usize, cols: usize) -> bool {
    position
        .index()
        .is_some_and(|(row, col)| row < rows && col < cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VILLAGE: &str = "\
##########
#........#
#..~.....#
#........#
##########
---
#:Wall#Look=Rough stone.
~:~Hedge
---
(3,2):A Sign#Read=Welcome.
(2,9)=(4,2):Door#key=gold
(4,5):Bob/bob.txt
(4,9)=(1,1):Cave/cave.txt
rain.txt@v1:[2,2,3,4]
snow.txt@>1:[3,3,4,9]
";

    #[test]
    fn parse_builds_legend_points_and_zones() {
        let world = WorldModel::parse("village.txt", VILLAGE).expect("world");
        assert_eq!(world.rows(), 5);
        assert_eq!(world.cols(), 10);
        assert_eq!(world.legend.len(), 2);
        assert_eq!(world.points.len(), 4);
        assert_eq!(world.zones.len(), 2);
        assert!(matches!(
            world.object_at(Position::at(2, 1)),
            Some(ObjectSpec::Object(_))
        ));
        assert!(matches!(
            world.object_at(Position::at(3, 8)),
            Some(ObjectSpec::WorldTransition(_))
        ));
    }

    #[test]
    fn parsing_is_idempotent() {
        let first = WorldModel::parse("village.txt", VILLAGE).expect("world");
        let second = WorldModel::parse("village.txt", VILLAGE).expect("world");
        assert_eq!(first, second);
    }

    #[test]
    fn legend_glyphs_block_movement() {
        let world = WorldModel::parse("village.txt", VILLAGE).expect("world");
        assert!(!world.is_passable(Position::at(0, 0)));
        assert!(!world.is_passable(Position::at(2, 3)));
        assert!(world.is_passable(Position::at(1, 1)));
        assert!(!world.is_passable(Position::at(-1, 1)));
        assert!(!world.is_passable(Position::at(1, 10)));
        assert!(world.sprite_at(Position::at(2, 3)).is_some_and(|sprite| sprite.short));
    }

    #[test]
    fn overlapping_zones_resolve_to_the_last_declared() {
        let world = WorldModel::parse("village.txt", VILLAGE).expect("world");
        let zone = world.zone_at(Position::at(2, 3)).expect("zone");
        assert_eq!(zone.spec.overlay_file, "snow.txt");
        assert_eq!(zone.index, 1);
        let zone = world.zone_at(Position::at(1, 1)).expect("zone");
        assert_eq!(zone.spec.overlay_file, "rain.txt");
        assert_eq!(world.zone_at(Position::at(0, 0)), None);
    }

    #[test]
    fn zone_boxes_are_clamped_to_the_grid() {
        let world = WorldModel::parse("village.txt", VILLAGE).expect("world");
        assert_eq!(world.zones[1].boxes, vec![ZoneBox::new(2, 2, 3, 8)]);
    }

    #[test]
    fn zone_without_boxes_covers_the_map() {
        let world = WorldModel::parse("w.txt", "...\n...\n---\nfog.txt@^1:\n").expect("world");
        assert_eq!(world.zones[0].boxes, vec![ZoneBox::new(0, 0, 1, 2)]);
    }

    #[test]
    fn out_of_bounds_objects_fail_the_load() {
        let err = WorldModel::parse("w.txt", "...\n---\n(2,1):Ghost\n").unwrap_err();
        assert!(matches!(err, WorldError::OutOfBounds { .. }));
    }

    #[test]
    fn one_bad_line_aborts_the_whole_parse() {
        let err = WorldModel::parse("w.txt", "...\n---\n(1,1):Sign\n???\n").unwrap_err();
        assert_eq!(err, WorldError::InvalidObjectSpec("???".to_string()));
    }
}
