/// TileGrid: the session's terrain.
///
/// The grid is empty until the first full snapshot arrives. That snapshot
/// fixes the dimensions for the rest of the session; later snapshots must
/// have the same shape and deltas can only overwrite existing cells.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::cell::Cell;
use crate::error::ClientError;

/// Sparse terrain update keyed by `"x:y"`.
pub type DeltaPatch = HashMap<String, Cell>;

/// Result of applying a delta: how many cells were written and which
/// entries were dropped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeltaOutcome {
    pub applied: usize,
    pub rejected: Vec<ClientError>,
}

#[derive(Clone, Debug, Default)]
pub struct TileGrid {
    rows: Vec<Vec<Cell>>,
    dims: Option<(usize, usize)>,
}

impl TileGrid {
    pub fn new() -> Self {
        TileGrid::default()
    }

    /// `(width, height)` once a snapshot has been applied.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.dims
    }

    pub fn is_established(&self) -> bool {
        self.dims.is_some()
    }

    /// Read-only view of the current terrain.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[cfg(test)]
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.rows.get(y)?.get(x)
    }

    /// Replace the whole grid with a copy of `rows`.
    pub fn apply_full_snapshot(&mut self, rows: &[Vec<Cell>]) -> Result<(), ClientError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        if width == 0 {
            return Err(ClientError::malformed("snapshot has no cells"));
        }

        if let Some(y) = rows.iter().position(|row| row.len() != width) {
            return Err(ClientError::malformed(format!(
                "snapshot row {y} has {} cells, expected {width}",
                rows[y].len()
            )));
        }

        if let Some((w, h)) = self.dims {
            if (w, h) != (width, height) {
                return Err(ClientError::malformed(format!(
                    "snapshot is {width}x{height}, session grid is {w}x{h}"
                )));
            }
        }

        self.rows = rows.to_vec();
        self.dims = Some((width, height));
        Ok(())
    }

    /// Overwrite the cells addressed by `patch`.
    ///
    /// Fails only when no snapshot has been applied yet. Unparsable keys and
    /// out-of-bounds coordinates are dropped one by one and reported in the
    /// outcome; the rest of the patch is still written.
    pub fn apply_delta(&mut self, patch: &DeltaPatch) -> Result<DeltaOutcome, ClientError> {
        let (width, height) = self.dims.ok_or(ClientError::OutOfOrderUpdate)?;
        let mut outcome = DeltaOutcome::default();

        for (key, cell) in patch {
            let (x, y) = match parse_key(key) {
                Some(pos) => pos,
                None => {
                    warn!(key = %key, "dropping delta entry with bad key");
                    outcome.rejected.push(ClientError::malformed(format!("bad cell key `{key}`")));
                    continue;
                }
            };

            if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
                let err = ClientError::BoundsError { x, y, width, height };
                warn!("dropping delta entry: {err}");
                outcome.rejected.push(err);
                continue;
            }

            self.rows[y as usize][x as usize] = cell.clone();
            outcome.applied += 1;
        }

        Ok(outcome)
    }

    /// Forget the grid (end of session).
    pub fn reset(&mut self) {
        self.rows.clear();
        self.dims = None;
    }
}

/// Parse an `"x:y"` key.
fn parse_key(key: &str) -> Option<(i64, i64)> {
    let (x, y) = key.split_once(':')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(rows: &[&str]) -> Vec<Vec<Cell>> {
        rows.iter()
            .map(|row| row.chars().map(|c| Cell::new(c, "gray", Some("black"))).collect())
            .collect()
    }

    fn patch(entries: &[(&str, Cell)]) -> DeltaPatch {
        entries.iter().map(|(k, c)| (k.to_string(), c.clone())).collect()
    }

    #[test]
    fn snapshot_round_trips() {
        let rows = grid_from(&["#.", ".#"]);
        let mut grid = TileGrid::new();
        grid.apply_full_snapshot(&rows).unwrap();
        assert_eq!(grid.rows(), rows.as_slice());
        assert_eq!(grid.dimensions(), Some((2, 2)));
    }

    #[test]
    fn snapshot_is_copied_not_aliased() {
        let mut rows = grid_from(&["#."]);
        let mut grid = TileGrid::new();
        grid.apply_full_snapshot(&rows).unwrap();
        rows[0][0].character = 'X';
        assert_eq!(grid.cell(0, 0).unwrap().character, '#');
    }

    #[test]
    fn delta_touches_only_addressed_cell() {
        let mut grid = TileGrid::new();
        grid.apply_full_snapshot(&grid_from(&["#.", ".#"])).unwrap();
        let before = grid.rows().to_vec();

        let red = Cell::new('%', "red", None);
        let outcome = grid.apply_delta(&patch(&[("0:1", red.clone())])).unwrap();

        assert_eq!(outcome.applied, 1);
        assert!(outcome.rejected.is_empty());
        assert_eq!(grid.cell(0, 1), Some(&red));
        assert_eq!(grid.cell(1, 1), Some(&before[1][1]));
        assert_eq!(grid.rows()[0], before[0]);
        assert_eq!(grid.dimensions(), Some((2, 2)));
    }

    #[test]
    fn delta_is_idempotent() {
        let mut once = TileGrid::new();
        once.apply_full_snapshot(&grid_from(&["...", "..."])).unwrap();
        let mut twice = once.clone();

        let p = patch(&[("2:0", Cell::new('+', "brown", None)), ("0:1", Cell::new('~', "blue", Some("navy")))]);
        once.apply_delta(&p).unwrap();
        twice.apply_delta(&p).unwrap();
        twice.apply_delta(&p).unwrap();

        assert_eq!(once.rows(), twice.rows());
    }

    #[test]
    fn delta_before_snapshot_is_out_of_order() {
        let mut grid = TileGrid::new();
        let err = grid.apply_delta(&patch(&[("0:0", Cell::new('#', "gray", None))])).unwrap_err();
        assert_eq!(err, ClientError::OutOfOrderUpdate);
        assert!(!grid.is_established());
    }

    #[test]
    fn out_of_bounds_delta_is_dropped() {
        let mut grid = TileGrid::new();
        grid.apply_full_snapshot(&grid_from(&["#.", ".#"])).unwrap();
        let before = grid.rows().to_vec();

        let outcome = grid.apply_delta(&patch(&[("9:9", Cell::new('X', "red", None))])).unwrap();

        assert_eq!(outcome.applied, 0);
        assert!(matches!(outcome.rejected[..], [ClientError::BoundsError { x: 9, y: 9, .. }]));
        assert_eq!(grid.rows(), before.as_slice());
        assert_eq!(grid.dimensions(), Some((2, 2)));
    }

    #[test]
    fn bad_entries_do_not_block_good_ones() {
        let mut grid = TileGrid::new();
        grid.apply_full_snapshot(&grid_from(&["..", ".."])).unwrap();

        let p = patch(&[
            ("-1:0", Cell::new('X', "red", None)),
            ("a:b", Cell::new('X', "red", None)),
            ("1:1", Cell::new('@', "white", None)),
        ]);
        let outcome = grid.apply_delta(&p).unwrap();

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(grid.cell(1, 1).unwrap().character, '@');
    }

    #[test]
    fn ragged_snapshot_rejected() {
        let mut grid = TileGrid::new();
        let err = grid.apply_full_snapshot(&grid_from(&["###", "#"])).unwrap_err();
        assert!(matches!(err, ClientError::MalformedPayload(_)));
        assert!(!grid.is_established());
    }

    #[test]
    fn empty_snapshot_does_not_establish() {
        let mut grid = TileGrid::new();
        assert!(grid.apply_full_snapshot(&[]).is_err());
        assert!(grid.apply_full_snapshot(&[vec![]]).is_err());
        assert!(!grid.is_established());
    }

    #[test]
    fn snapshot_cannot_reshape_session() {
        let mut grid = TileGrid::new();
        grid.apply_full_snapshot(&grid_from(&["##", "##"])).unwrap();
        assert!(grid.apply_full_snapshot(&grid_from(&["###"])).is_err());
        assert_eq!(grid.dimensions(), Some((2, 2)));

        grid.apply_full_snapshot(&grid_from(&["..", ".."])).unwrap();
        assert_eq!(grid.cell(0, 0).unwrap().character, '.');
    }

    #[test]
    fn reset_forgets_dimensions() {
        let mut grid = TileGrid::new();
        grid.apply_full_snapshot(&grid_from(&["#"])).unwrap();
        grid.reset();
        assert!(!grid.is_established());
        assert!(grid.rows().is_empty());
        grid.apply_full_snapshot(&grid_from(&["..."])).unwrap();
        assert_eq!(grid.dimensions(), Some((3, 1)));
    }

    #[test]
    fn key_parsing() {
        assert_eq!(parse_key("3:4"), Some((3, 4)));
        assert_eq!(parse_key("-1:0"), Some((-1, 0)));
        assert_eq!(parse_key("3"), None);
        assert_eq!(parse_key("x:1"), None);
    }
}
