use crate::world::object_spec::Attributes;
use crate::world::position::{Direction, Position, PositionDelta};
use crate::world::viewport::Viewport;

/// Inclusive, 0-based rectangle of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneBox {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl ZoneBox {
    pub fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        let (top, bottom) = if top <= bottom { (top, bottom) } else { (bottom, top) };
        let (left, right) = if left <= right { (left, right) } else { (right, left) };
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn whole_map(rows: usize, cols: usize) -> Self {
        Self::new(
            0,
            0,
            i32::try_from(rows).unwrap_or(i32::MAX).saturating_sub(1),
            i32::try_from(cols).unwrap_or(i32::MAX).saturating_sub(1),
        )
    }

    pub fn contains(&self, position: Position) -> bool {
        position.y >= self.top
            && position.y <= self.bottom
            && position.x >= self.left
            && position.x <= self.right
    }

    /// Intersects the box with the world bounds; `None` when nothing remains.
    pub fn clamp(self, rows: usize, cols: usize) -> Option<Self> {
        let bounds = Self::whole_map(rows, cols);
        let clamped = Self {
            top: self.top.max(bounds.top),
            left: self.left.max(bounds.left),
            bottom: self.bottom.min(bounds.bottom),
            right: self.right.min(bounds.right),
        };
        if clamped.top > clamped.bottom || clamped.left > clamped.right {
            None
        } else {
            Some(clamped)
        }
    }
}

/// Overlay region declared with `file.txt@directions:boxes#attrs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSpec {
    pub overlay_file: String,
    pub directions: Vec<PositionDelta>,
    pub boxes: Vec<ZoneBox>,
    pub attributes: Attributes,
}

impl ZoneSpec {
    pub fn box_containing(&self, position: Position) -> Option<ZoneBox> {
        self.boxes.iter().copied().find(|zone_box| zone_box.contains(position))
    }

    pub fn fg(&self) -> Option<&str> {
        self.attributes.get("fg")
    }

    pub fn bg(&self) -> Option<&str> {
        self.attributes.get("bg")
    }
}

/// The zone the player currently stands in, with the box that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveZone {
    pub index: usize,
    pub bounds: ZoneBox,
    pub spec: ZoneSpec,
}

/// Parses compass tokens like `^2v3` into per-frame `(drow, dcol)` steps.
pub fn parse_directions(raw: &str) -> Option<Vec<PositionDelta>> {
    let mut directions = Vec::new();
    let mut chars = raw.chars().peekable();
    while let Some(glyph) = chars.next() {
        let direction = Direction::from_glyph(glyph)?;
        let mut digits = String::new();
        while let Some(digit) = chars.next_if(|ch| ch.is_ascii_digit()) {
            digits.push(digit);
        }
        let amount: i32 = digits.parse().ok()?;
        let unit = direction.delta();
        directions.push(PositionDelta {
            dy: unit.dy * amount,
            dx: unit.dx * amount,
        });
    }
    if directions.is_empty() {
        None
    } else {
        Some(directions)
    }
}

/// Cumulative offset at `frame`. Frame 0 already applies the first token;
/// every full pass over the list adds its sum once.
pub fn animation_offset(directions: &[PositionDelta], frame: u64) -> PositionDelta {
    if directions.is_empty() {
        return PositionDelta { dy: 0, dx: 0 };
    }
    let len = directions.len() as u64;
    let loops = i64::try_from(frame / len).unwrap_or(i64::MAX);
    let partial = (frame % len) as usize + 1;
    let (loop_dy, loop_dx) = sum_deltas(directions);
    let (part_dy, part_dx) = sum_deltas(&directions[..partial]);
    PositionDelta {
        dy: clamp_i32(loop_dy.saturating_mul(loops).saturating_add(part_dy)),
        dx: clamp_i32(loop_dx.saturating_mul(loops).saturating_add(part_dx)),
    }
}

fn sum_deltas(deltas: &[PositionDelta]) -> (i64, i64) {
    deltas.iter().fold((0i64, 0i64), |(dy, dx), delta| {
        (dy + i64::from(delta.dy), dx + i64::from(delta.dx))
    })
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Glyph buffer loaded from a zone's overlay file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneOverlay {
    pub rows: Vec<Vec<char>>,
    pub max_width: usize,
}

impl ZoneOverlay {
    pub fn parse(content: &str) -> Self {
        let mut rows: Vec<Vec<char>> = content
            .replace("\r\n", "\n")
            .lines()
            .map(|line| line.chars().collect())
            .collect();
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }
        let max_width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        Self { rows, max_width }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.max_width == 0
    }

    /// Renders the animated overlay over `viewport`. Cells outside `bounds`
    /// stay blank.
    pub fn render(&self, viewport: &Viewport, bounds: ZoneBox, offset: PositionDelta) -> Vec<Vec<char>> {
        let width = usize::from(viewport.size.width);
        let height = usize::from(viewport.size.height);
        let mut layer = vec![vec![' '; width]; height];
        if self.is_empty() {
            return layer;
        }
        let rows = self.rows.len() as i64;
        let cols = self.max_width as i64;
        let start_y = i64::from(bounds.top) - i64::from(viewport.origin.y);
        let start_x = i64::from(bounds.left) - i64::from(viewport.origin.x);
        for (y, line) in layer.iter_mut().enumerate() {
            for (x, cell) in line.iter_mut().enumerate() {
                let world = Position::at(viewport.origin.y + y as i32, viewport.origin.x + x as i32);
                if !bounds.contains(world) {
                    continue;
                }
                let br = (y as i64 - start_y + i64::from(offset.dy)).rem_euclid(rows) as usize;
                let bc = (x as i64 - start_x + i64::from(offset.dx)).rem_euclid(cols) as usize;
                *cell = self.rows[br].get(bc).copied().unwrap_or(' ');
            }
        }
        layer
    }
}
