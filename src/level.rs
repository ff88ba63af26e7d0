use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use crate::types::GhostKind;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level grid is empty")]
    EmptyGrid,
    #[error("level row {row} is {found} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostStart {
    pub kind: GhostKind,
    pub x: f32,
    pub y: f32,
    pub exited: bool,
}

/// One parsed symbol grid, with every entity center already mapped into
/// normalized world coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelLayout {
    pub cols: usize,
    pub rows: usize,
    pub cell_w: f32,
    pub cell_h: f32,
    pub walls: Vec<(f32, f32)>,
    pub doors: Vec<(f32, f32)>,
    pub dots: Vec<(f32, f32)>,
    pub fruits: Vec<(f32, f32)>,
    pub player_start: Option<(f32, f32)>,
    pub ghost_starts: Vec<GhostStart>,
}

/// Parses a rectangular symbol grid. `#` wall, `=` door, `P` player start,
/// `A`/`B`/`C`/`D` ghosts, `.` dot, `%` fruit; anything else is an empty
/// cell. Ghosts whose cell is unreachable from the player start without
/// crossing a door begin inside a spawn enclosure, so their exited latch
/// starts false; ghosts placed in the open maze start with it set.
pub fn parse_level(rows: &[&str]) -> Result<LevelLayout, LevelError> {
    if rows.is_empty() || rows[0].is_empty() {
        return Err(LevelError::EmptyGrid);
    }

    let grid: Vec<Vec<char>> = rows.iter().map(|row| row.chars().collect()).collect();
    let cols = grid[0].len();
    for (row, cells) in grid.iter().enumerate() {
        if cells.len() != cols {
            return Err(LevelError::RaggedRow {
                row,
                found: cells.len(),
                expected: cols,
            });
        }
    }

    let cell_w = 2.0 / cols as f32;
    let cell_h = 2.0 / grid.len() as f32;
    let center = |col: usize, row: usize| {
        (
            -1.0 + (col as f32 + 0.5) * cell_w,
            -1.0 + (row as f32 + 0.5) * cell_h,
        )
    };

    let mut layout = LevelLayout {
        cols,
        rows: grid.len(),
        cell_w,
        cell_h,
        walls: Vec::new(),
        doors: Vec::new(),
        dots: Vec::new(),
        fruits: Vec::new(),
        player_start: None,
        ghost_starts: Vec::new(),
    };
    let mut player_cell = None;
    let mut ghost_cells = Vec::new();

    for (row, cells) in grid.iter().enumerate() {
        for (col, symbol) in cells.iter().enumerate() {
            let (x, y) = center(col, row);
            match symbol {
                '#' => layout.walls.push((x, y)),
                '=' => layout.doors.push((x, y)),
                '.' => layout.dots.push((x, y)),
                '%' => layout.fruits.push((x, y)),
                'P' => {
                    layout.player_start = Some((x, y));
                    player_cell = Some((col, row));
                }
                'A' => ghost_cells.push((GhostKind::Random, col, row)),
                'B' => ghost_cells.push((GhostKind::Ambusher, col, row)),
                'C' => ghost_cells.push((GhostKind::Flanker, col, row)),
                'D' => ghost_cells.push((GhostKind::Chaser, col, row)),
                _ => {}
            }
        }
    }

    let open_cells = player_cell
        .map(|start| reachable_without_doors(&grid, start))
        .unwrap_or_default();
    for (kind, col, row) in ghost_cells {
        let (x, y) = center(col, row);
        layout.ghost_starts.push(GhostStart {
            kind,
            x,
            y,
            exited: open_cells.contains(&(col, row)),
        });
    }

    Ok(layout)
}

/// Flood fill over non-wall cells, treating doors as solid. The result is
/// the region the player can walk, which is exactly the region outside
/// every spawn enclosure.
fn reachable_without_doors(
    grid: &[Vec<char>],
    start: (usize, usize),
) -> HashSet<(usize, usize)> {
    let rows = grid.len();
    let cols = grid[0].len();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some((col, row)) = queue.pop_front() {
        let neighbors = [
            (col.wrapping_sub(1), row),
            (col + 1, row),
            (col, row.wrapping_sub(1)),
            (col, row + 1),
        ];
        for (ncol, nrow) in neighbors {
            if ncol >= cols || nrow >= rows {
                continue;
            }
            let symbol = grid[nrow][ncol];
            if symbol == '#' || symbol == '=' {
                continue;
            }
            if seen.insert((ncol, nrow)) {
                queue.push_back((ncol, nrow));
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_LEVEL;

    #[test]
    fn default_level_parses_with_expected_population() {
        let layout = parse_level(DEFAULT_LEVEL).expect("default level should parse");
        assert_eq!(layout.cols, 19);
        assert_eq!(layout.rows, 17);
        assert!(layout.player_start.is_some());
        assert_eq!(layout.ghost_starts.len(), 4);
        assert_eq!(layout.doors.len(), 1);
        assert_eq!(layout.fruits.len(), 4);
        assert!(layout.dots.len() > 100);
    }

    #[test]
    fn default_level_pen_ghosts_start_unexited() {
        let layout = parse_level(DEFAULT_LEVEL).expect("default level should parse");
        for start in &layout.ghost_starts {
            match start.kind {
                GhostKind::Chaser => assert!(start.exited),
                _ => assert!(!start.exited),
            }
        }
    }

    #[test]
    fn empty_grid_is_an_error() {
        assert_eq!(parse_level(&[]), Err(LevelError::EmptyGrid));
        assert_eq!(parse_level(&[""]), Err(LevelError::EmptyGrid));
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let result = parse_level(&["###", "##"]);
        assert_eq!(
            result,
            Err(LevelError::RaggedRow {
                row: 1,
                found: 2,
                expected: 3,
            })
        );
    }

    #[test]
    fn unrecognized_symbols_are_empty_cells() {
        let layout = parse_level(&["#Z#", "#P#", "###"]).expect("grid should parse");
        assert_eq!(layout.walls.len(), 7);
        assert!(layout.dots.is_empty());
        assert!(layout.player_start.is_some());
    }

    #[test]
    fn grid_with_no_recognized_symbols_produces_zero_entities() {
        let layout = parse_level(&["   ", "   "]).expect("grid should parse");
        assert!(layout.walls.is_empty());
        assert!(layout.dots.is_empty());
        assert!(layout.player_start.is_none());
        assert!(layout.ghost_starts.is_empty());
    }

    #[test]
    fn cell_size_follows_grid_dimensions() {
        let layout = parse_level(&["P.", "..", ".."]).expect("grid should parse");
        assert!((layout.cell_w - 1.0).abs() < 1e-6);
        assert!((layout.cell_h - 2.0 / 3.0).abs() < 1e-6);
        let (px, py) = layout.player_start.expect("player placed");
        assert!((px + 0.5).abs() < 1e-6);
        assert!((py + 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn ghost_behind_door_is_flagged_inside_enclosure() {
        let rows = ["#####", "#A=P#", "#####"];
        let layout = parse_level(&rows).expect("grid should parse");
        assert_eq!(layout.ghost_starts.len(), 1);
        assert!(!layout.ghost_starts[0].exited);

        let open = ["#####", "#A.P#", "#####"];
        let layout = parse_level(&open).expect("grid should parse");
        assert!(layout.ghost_starts[0].exited);
    }
}
