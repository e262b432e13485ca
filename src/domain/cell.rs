/// Display cells and the transient things drawn on top of them.
///
/// Field names follow the wire format the server emits, so these types
/// deserialize straight out of an `update` / `delta` payload. Unknown
/// fields (tile names, view radius, ...) are ignored.

use std::fmt;

use serde::Deserialize;

/// Space means "background only, no glyph".
pub const BLANK_GLYPH: char = ' ';

fn default_color() -> String {
    "gray".into()
}

/// One terrain cell of the display grid.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Cell {
    pub character: char,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub background: Option<String>,
}

impl Cell {
    pub fn new(character: char, color: &str, background: Option<&str>) -> Self {
        Cell {
            character,
            color: color.to_string(),
            background: background.map(str::to_string),
        }
    }

    /// Does this cell draw a glyph, or only its background?
    pub fn has_glyph(&self) -> bool {
        self.character != BLANK_GLYPH && !self.character.is_control()
    }
}

/// A mobile actor (player or monster) as sent in an `update`.
///
/// Entities are never stored into terrain; they are projected onto a copy
/// of the grid each frame. Coordinates are signed because the server uses
/// `-1` for actors that have not been placed yet.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Entity {
    pub x: i32,
    pub y: i32,
    pub character: char,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Entity {
    /// Grid position, if it lies within a `width` x `height` grid.
    pub fn position_in(&self, width: usize, height: usize) -> Option<(usize, usize)> {
        let (x, y) = (usize::try_from(self.x).ok()?, usize::try_from(self.y).ok()?);
        (x < width && y < height).then_some((x, y))
    }
}

/// Dice expression `count`d`sides` + `inc`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct DiceRoll {
    pub count: u32,
    pub sides: u32,
    #[serde(default)]
    pub inc: i32,
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}{:+}", self.count, self.sides, self.inc)
    }
}

/// The local player's status panel. Display-only; never touches the grid.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PlayerStatus {
    pub character: char,
    #[serde(default = "default_color")]
    pub color: String,
    pub hp: i64,
    pub attack_roll: DiceRoll,
    #[serde(default)]
    pub turn_done: bool,
}
