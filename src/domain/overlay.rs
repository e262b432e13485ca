/// Entity overlay: project actors onto a copy of the terrain.
///
/// The result is a fresh grid handed to the renderer for one frame and then
/// dropped; stored terrain is never touched.

use tracing::trace;

use crate::domain::cell::{Cell, Entity};

/// Terrain with every in-bounds entity drawn on top.
///
/// An entity takes over the glyph and foreground colour of its cell but
/// keeps the terrain background. When several entities share a cell the
/// last one in `entities` wins.
pub fn composite(rows: &[Vec<Cell>], entities: &[Entity]) -> Vec<Vec<Cell>> {
    let mut frame = rows.to_vec();
    let height = frame.len();
    let width = frame.first().map_or(0, Vec::len);

    for entity in entities {
        let Some((x, y)) = entity.position_in(width, height) else {
            trace!(x = entity.x, y = entity.y, "entity outside grid, skipped");
            continue;
        };
        let cell = &mut frame[y][x];
        cell.character = entity.character;
        cell.color.clone_from(&entity.color);
    }

    frame
}
