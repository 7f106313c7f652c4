use crate::world::model::WorldModel;
use crate::world::position::Position;
use serde::{Deserialize, Serialize};

pub const PLAYER_MARKER: char = 'Θ';
pub const BUMP_RESOLVED: char = '▒';
pub const BUMP_EMPTY: char = '⬚';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u16,
    pub height: u16,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 16,
            height: 8,
        }
    }
}

/// A page of the world grid. The origin is always a multiple of the viewport
/// size, so the camera jumps a full page when the player crosses an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub origin: Position,
    pub local: Position,
    pub size: ViewportSize,
}

impl Viewport {
    pub fn paged(player: Position, size: ViewportSize) -> Self {
        let width = i32::from(size.width.max(1));
        let height = i32::from(size.height.max(1));
        let local = Position::at(player.y.rem_euclid(height), player.x.rem_euclid(width));
        let origin = Position::at(player.y - local.y, player.x - local.x);
        Self {
            origin,
            local,
            size,
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        self.to_local(position).is_some()
    }

    /// Viewport cell of a world position, if visible.
    pub fn to_local(&self, position: Position) -> Option<(usize, usize)> {
        let y = position.y.checked_sub(self.origin.y)?;
        let x = position.x.checked_sub(self.origin.x)?;
        if y < 0 || x < 0 || y >= i32::from(self.size.height) || x >= i32::from(self.size.width) {
            return None;
        }
        Some((y as usize, x as usize))
    }

    fn blank(&self) -> Vec<Vec<char>> {
        vec![vec![' '; usize::from(self.size.width)]; usize::from(self.size.height)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers {
    pub solid: Vec<Vec<char>>,
    pub passable: Vec<Vec<char>>,
    pub objects: Vec<Vec<char>>,
}

impl Layers {
    /// Derives all layers from scratch for the given page.
    pub fn compute(world: &WorldModel, viewport: &Viewport, marker: char) -> Self {
        let mut solid = viewport.blank();
        let mut passable = viewport.blank();
        let mut objects = viewport.blank();

        for (y, (solid_row, passable_row)) in solid.iter_mut().zip(passable.iter_mut()).enumerate() {
            for (x, (solid_cell, passable_cell)) in
                solid_row.iter_mut().zip(passable_row.iter_mut()).enumerate()
            {
                let position = Position::at(viewport.origin.y + y as i32, viewport.origin.x + x as i32);
                let Some(glyph) = world.glyph_at(position) else {
                    continue;
                };
                if world.is_wall_glyph(glyph) {
                    *solid_cell = glyph;
                } else {
                    *passable_cell = glyph;
                }
            }
        }

        for position in world.points.keys() {
            if let (Some((y, x)), Some(glyph)) = (viewport.to_local(*position), world.glyph_at(*position)) {
                objects[y][x] = glyph;
            }
        }

        let (y, x) = (viewport.local.y as usize, viewport.local.x as usize);
        if let Some(cell) = objects.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = marker;
        }

        Self {
            solid,
            passable,
            objects,
        }
    }

    /// Flattens the layers, objects over terrain.
    pub fn composite(&self) -> Vec<String> {
        self.objects
            .iter()
            .zip(&self.passable)
            .zip(&self.solid)
            .map(|((objects, passable), solid)| {
                objects
                    .iter()
                    .zip(passable)
                    .zip(solid)
                    .map(|((object, open), wall)| {
                        [*object, *open, *wall]
                            .into_iter()
                            .find(|glyph| *glyph != ' ')
                            .unwrap_or(' ')
                    })
                    .collect()
            })
            .collect()
    }
}

/// Marks the bumped cell, and the cell whose interaction was resolved.
pub fn bump_layer(viewport: &Viewport, bump: Option<Position>, resolved: Option<Position>) -> Vec<Vec<char>> {
    let mut layer = viewport.blank();
    if let Some((y, x)) = bump.and_then(|target| viewport.to_local(target)) {
        layer[y][x] = if resolved == bump { BUMP_RESOLVED } else { BUMP_EMPTY };
    }
    if let Some((y, x)) = resolved.and_then(|subject| viewport.to_local(subject)) {
        layer[y][x] = BUMP_RESOLVED;
    }
    layer
}

pub fn rows_to_strings(layer: &[Vec<char>]) -> Vec<String> {
    layer.iter().map(|row| row.iter().collect()).collect()
}
