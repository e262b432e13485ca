/// Presentation surface capability.
///
/// The renderer only ever talks to this trait, so it can draw to the
/// terminal or to a recording double in tests. Coordinates and sizes are in
/// surface units (terminal cells for the terminal back end). Colours are the
/// server's colour strings; each back end maps them itself.

pub trait Surface {
    /// `(width, height)` in surface units.
    fn dimensions(&self) -> (u32, u32);

    /// Wipe the whole surface.
    fn clear(&mut self);

    /// Advance width of `glyph` drawn at a cell height of `size`.
    fn measure_glyph(&self, glyph: char, size: u32) -> u32;

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: &str);

    /// Draw `glyph` with its top-left corner at `(x, y)`.
    fn draw_glyph(&mut self, x: u32, y: u32, glyph: char, color: &str);
}
