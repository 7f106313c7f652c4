use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell on the world grid. `y` is the row and `x` the column, both 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub y: i32,
    pub x: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionDelta {
    pub dy: i32,
    pub dx: i32,
}

impl Position {
    pub const fn at(row: i32, col: i32) -> Self {
        Self { y: row, x: col }
    }

    /// Converts a 1-based `(row, col)` pair from a source file.
    pub fn from_one_based(row: u32, col: u32) -> Option<Self> {
        if row == 0 || col == 0 {
            return None;
        }
        let row = i32::try_from(row).ok()?;
        let col = i32::try_from(col).ok()?;
        Some(Self::at(row - 1, col - 1))
    }

    pub fn offset(self, delta: PositionDelta) -> Option<Self> {
        Some(Self {
            y: self.y.checked_add(delta.dy)?,
            x: self.x.checked_add(delta.dx)?,
        })
    }

    pub fn step(self, direction: Direction) -> Option<Self> {
        self.offset(direction.delta())
    }

    /// Grid indices when both coordinates are non-negative.
    pub fn index(self) -> Option<(usize, usize)> {
        let row = usize::try_from(self.y).ok()?;
        let col = usize::try_from(self.x).ok()?;
        Some((row, col))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.y, self.x)
    }
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn delta(self) -> PositionDelta {
        match self {
            Direction::North => PositionDelta { dy: -1, dx: 0 },
            Direction::East => PositionDelta { dy: 0, dx: 1 },
            Direction::South => PositionDelta { dy: 1, dx: 0 },
            Direction::West => PositionDelta { dy: 0, dx: -1 },
        }
    }

    /// Parses the compass glyphs used by move strings and zone directions.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '^' => Some(Direction::North),
            '>' => Some(Direction::East),
            'v' => Some(Direction::South),
            '<' => Some(Direction::West),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}
