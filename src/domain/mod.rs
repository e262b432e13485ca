/// Display-state model: terrain grid, entity overlay and wall auto-tiling.

pub mod autotile;
pub mod cell;
pub mod grid;
pub mod overlay;
