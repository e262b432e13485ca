/// Grid renderer: draws a composited grid onto a `Surface`.
///
/// Every call repaints the whole grid; there is no partial update. Cell
/// height comes from the surface height divided by the row count, cell
/// width from the advance of `@` at that height, and glyphs are placed at
/// the top-left of their cell so placement is identical across redraws.

use crate::domain::cell::Cell;
use crate::ui::surface::Surface;

/// Glyph measured to size cells.
const REFERENCE_GLYPH: char = '@';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellMetrics {
    pub width: u32,
    pub height: u32,
}

/// Cell size for `rows` rows on `surface`. Never smaller than one unit:
/// a grid taller than the surface is clipped rather than collapsed.
pub fn cell_metrics<S: Surface + ?Sized>(surface: &S, rows: usize) -> CellMetrics {
    let (_, surface_h) = surface.dimensions();
    let height = (surface_h / rows.max(1) as u32).max(1);
    let width = surface.measure_glyph(REFERENCE_GLYPH, height).max(1);
    CellMetrics { width, height }
}

/// Paint `grid`. Returns the metrics used, or `None` when there is nothing
/// to draw yet (no snapshot received), in which case the surface is left
/// untouched.
pub fn render<S: Surface + ?Sized>(grid: &[Vec<Cell>], surface: &mut S) -> Option<CellMetrics> {
    if grid.is_empty() {
        return None;
    }

    let metrics = cell_metrics(surface, grid.len());
    let CellMetrics { width: w, height: h } = metrics;

    surface.clear();
    for (y, row) in grid.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let (dx, dy) = (x as u32 * w, y as u32 * h);

            if let Some(bg) = &cell.background {
                surface.fill_rect(dx, dy, w, h, bg);
            }
            if cell.has_glyph() {
                surface.draw_glyph(dx, dy, cell.character, &cell.color);
            }
        }
    }

    Some(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::surface::recording::{Op, RecordingSurface};

    fn row(cells: &[(char, Option<&str>)]) -> Vec<Cell> {
        cells.iter().map(|&(c, bg)| Cell::new(c, "white", bg)).collect()
    }

    #[test]
    fn no_data_is_a_no_op() {
        let mut surface = RecordingSurface::new(100, 100);
        assert_eq!(render(&[], &mut surface), None);
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn cell_size_from_surface_height() {
        let surface = RecordingSurface { glyph_ratio: 2, ..RecordingSurface::new(200, 50) };
        assert_eq!(cell_metrics(&surface, 4), CellMetrics { width: 24, height: 12 });
    }

    #[test]
    fn tiny_surface_still_draws() {
        let surface = RecordingSurface::new(10, 3);
        assert_eq!(cell_metrics(&surface, 20), CellMetrics { width: 1, height: 1 });
    }

    #[test]
    fn background_only_when_set_and_glyph_only_when_not_blank() {
        let grid = vec![row(&[('#', Some("black")), (' ', Some("navy")), ('.', None), (' ', None)])];
        let mut surface = RecordingSurface::new(40, 10);

        let m = render(&grid, &mut surface).unwrap();
        assert_eq!(m, CellMetrics { width: 10, height: 10 });

        assert_eq!(surface.ops[0], Op::Clear);
        assert_eq!(
            surface.fills(),
            vec![
                &Op::Fill { x: 0, y: 0, w: 10, h: 10, color: "black".into() },
                &Op::Fill { x: 10, y: 0, w: 10, h: 10, color: "navy".into() },
            ]
        );
        assert_eq!(
            surface.glyphs(),
            vec![
                &Op::Glyph { x: 0, y: 0, glyph: '#', color: "white".into() },
                &Op::Glyph { x: 20, y: 0, glyph: '.', color: "white".into() },
            ]
        );
    }

    #[test]
    fn background_drawn_before_glyph() {
        let grid = vec![row(&[('@', Some("black"))])];
        let mut surface = RecordingSurface::new(5, 5);
        render(&grid, &mut surface);
        assert!(matches!(surface.ops[1], Op::Fill { .. }));
        assert!(matches!(surface.ops[2], Op::Glyph { .. }));
    }

    #[test]
    fn every_render_repaints_everything() {
        let grid = vec![row(&[('a', None), ('b', None)]), row(&[('c', None), ('d', None)])];
        let mut surface = RecordingSurface::new(8, 8);
        render(&grid, &mut surface);
        render(&grid, &mut surface);
        assert_eq!(surface.glyphs().len(), 8);
        assert_eq!(surface.ops.iter().filter(|op| **op == Op::Clear).count(), 2);
    }

    #[test]
    fn glyphs_are_placed_on_cell_origins() {
        let grid = vec![row(&[('a', None), ('b', None)]), row(&[('c', None), ('d', None)])];
        let mut surface = RecordingSurface { glyph_ratio: 2, ..RecordingSurface::new(100, 6) };
        render(&grid, &mut surface);

        let positions: Vec<(u32, u32)> = surface
            .glyphs()
            .iter()
            .map(|op| match op {
                Op::Glyph { x, y, .. } => (*x, *y),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(positions, vec![(0, 0), (6, 0), (0, 3), (6, 3)]);
    }
}
