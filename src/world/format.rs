use crate::world::position::Position;

pub const SECTION_SEPARATOR: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("malformed world file: {0}")]
    MalformedWorldFile(String),
    #[error("invalid object spec: {0}")]
    InvalidObjectSpec(String),
    #[error("object spec places {position} outside the {rows}x{cols} grid: {line}")]
    OutOfBounds {
        position: Position,
        rows: usize,
        cols: usize,
        line: String,
    },
}

/// Raw sections of a world file before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSections {
    pub grid: Vec<Vec<char>>,
    pub spec_lines: Vec<String>,
}

impl WorldSections {
    pub fn rows(&self) -> usize {
        self.grid.len()
    }

    pub fn cols(&self) -> usize {
        self.grid.first().map_or(0, |row| row.len())
    }
}

pub fn split_world_file(content: &str) -> Result<WorldSections, WorldError> {
    let normalized = content.replace("\r\n", "\n");
    let mut sections: Vec<Vec<&str>> = vec![Vec::new()];
    for line in normalized.lines() {
        if line.trim_end() == SECTION_SEPARATOR {
            sections.push(Vec::new());
            continue;
        }
        if let Some(section) = sections.last_mut() {
            section.push(line);
        }
    }
    if sections.len() < 2 {
        return Err(WorldError::MalformedWorldFile(format!(
            "expected a '{}' separator after the tile grid",
            SECTION_SEPARATOR
        )));
    }

    let grid = parse_grid(&sections[0])?;
    let spec_lines = sections[1..]
        .iter()
        .flat_map(|section| section.iter())
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect();

    Ok(WorldSections { grid, spec_lines })
}

fn parse_grid(lines: &[&str]) -> Result<Vec<Vec<char>>, WorldError> {
    let start = lines
        .iter()
        .position(|line| !line.is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(start, |idx| idx + 1);
    let rows: Vec<Vec<char>> = lines[start..end]
        .iter()
        .map(|line| line.chars().collect())
        .collect();

    let Some(width) = rows.first().map(|row| row.len()) else {
        return Err(WorldError::MalformedWorldFile("tile grid is empty".to_string()));
    };
    if width == 0 {
        return Err(WorldError::MalformedWorldFile(
            "tile grid starts with an empty row".to_string(),
        ));
    }
    for (row_no, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(WorldError::MalformedWorldFile(format!(
                "grid row {} has {} cells, expected {}",
                row_no + 1,
                row.len(),
                width
            )));
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_grid_and_spec_sections() {
        let input = "##\n#.\n---\n#:Wall\n---\n(2,2):A Sign\n";
        let sections = split_world_file(input).expect("split");
        assert_eq!(sections.rows(), 2);
        assert_eq!(sections.cols(), 2);
        assert_eq!(sections.spec_lines, vec!["#:Wall", "(2,2):A Sign"]);
    }

    #[test]
    fn missing_separator_is_malformed() {
        let err = split_world_file("###\n#.#\n").unwrap_err();
        assert!(matches!(err, WorldError::MalformedWorldFile(_)));
    }

    #[test]
    fn trailing_blank_lines_are_not_rows() {
        let sections = split_world_file("ab\ncd\n\n\n---\n").expect("split");
        assert_eq!(sections.rows(), 2);
        assert!(sections.spec_lines.is_empty());
    }

    #[test]
    fn multi_byte_glyphs_are_single_cells() {
        let sections = split_world_file("▓░▓\n░Θ░\n---\n").expect("split");
        assert_eq!(sections.cols(), 3);
        assert_eq!(sections.grid[1][1], 'Θ');
    }

    #[test]
    fn ragged_grid_is_malformed() {
        let err = split_world_file("###\n##\n---\n").unwrap_err();
        assert_eq!(
            err,
            WorldError::MalformedWorldFile("grid row 2 has 2 cells, expected 3".to_string())
        );
    }

    #[test]
    fn windows_line_endings_are_normalized() {
        let sections = split_world_file("ab\r\ncd\r\n---\r\n#:Wall\r\n").expect("split");
        assert_eq!(sections.grid[0], vec!['a', 'b']);
        assert_eq!(sections.spec_lines, vec!["#:Wall"]);
    }
}
