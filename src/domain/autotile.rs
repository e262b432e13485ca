/// Wall auto-tiling.
///
/// Walls arrive as a single reserved glyph. Each frame, every wall cell is
/// redrawn as a box-drawing junction chosen from which of its four
/// orthogonal neighbours are walls too, so wall runs read as continuous
/// lines. Nothing is cached: neighbours may have changed since last frame.

use crate::domain::cell::Cell;

/// Stored terrain glyph that marks a wall.
pub const WALL_GLYPH: char = '#';

/// Junction glyph per neighbour mask.
///
/// Mask bits, most significant first: left, right, up, down.
const JUNCTIONS: [char; 16] = [
    '○', // ----
    '○', // ---D
    '○', // --U-
    '║', // --UD
    '○', // -R--
    '╔', // -R-D
    '╚', // -RU-
    '╠', // -RUD
    '○', // L---
    '╗', // L--D
    '╝', // L-U-
    '╣', // L-UD
    '═', // LR--
    '╦', // LR-D
    '╩', // LRU-
    '╬', // LRUD
];

fn is_wall(rows: &[Vec<Cell>], x: i64, y: i64) -> bool {
    if x < 0 || y < 0 {
        return false;
    }
    rows.get(y as usize)
        .and_then(|row| row.get(x as usize))
        .is_some_and(|cell| cell.character == WALL_GLYPH)
}

/// Neighbour mask for the cell at `(x, y)`. Out-of-bounds counts as open.
pub fn neighbour_mask(rows: &[Vec<Cell>], x: usize, y: usize) -> usize {
    let (x, y) = (x as i64, y as i64);
    [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
        .iter()
        .fold(0, |mask, &(nx, ny)| (mask << 1) | usize::from(is_wall(rows, nx, ny)))
}

/// Glyph to display for the wall at `(x, y)`.
pub fn resolve_glyph(rows: &[Vec<Cell>], x: usize, y: usize) -> char {
    JUNCTIONS[neighbour_mask(rows, x, y)]
}

/// Copy of `rows` with every wall glyph replaced by its junction.
pub fn auto_tile(rows: &[Vec<Cell>]) -> Vec<Vec<Cell>> {
    let mut out = rows.to_vec();
    for (y, row) in rows.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if cell.character == WALL_GLYPH {
                out[y][x].character = resolve_glyph(rows, x, y);
            }
        }
    }
    out
}
