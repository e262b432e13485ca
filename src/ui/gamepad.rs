/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move one tile (two directions → diagonal)
///   A                     →  Wait a turn
///   Start                 →  Leave the chat line
///
/// Moves are edge-triggered: one press, one turn.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{debug, info};

use crate::config::GamepadConfig;
use crate::net::envelope::Intent;
use crate::ui::input::Focus;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BUTTON_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Held (continuous) and just_pressed (edge) for one input.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

/// D-pad and stick, merged per direction.
#[derive(Clone, Copy, Debug, Default)]
struct DirPad {
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
}

impl DirPad {
    fn held(&self, d: Dir) -> bool {
        self.dpad[d as usize].held || self.stick[d as usize].held
    }

    fn just_pressed(&self, d: Dir) -> bool {
        self.dpad[d as usize].just_pressed || self.stick[d as usize].just_pressed
    }
}

struct ActionMap {
    wait: Vec<Btn>,
    focus_game: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap { wait: vec![Btn::A], focus_game: vec![Btn::Start] }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BUTTON_COUNT],
    pad: DirPad,
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut state = Self::detached();

        #[cfg(feature = "gamepad")]
        match Gilrs::new() {
            Ok(g) => {
                if g.gamepads().next().is_some() {
                    info!("gamepad detected");
                }
                state.gilrs = Some(g);
            }
            Err(err) => debug!(%err, "gamepad support unavailable"),
        }

        state
    }

    /// A tracker with no backend; every query reports nothing pressed.
    fn detached() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BUTTON_COUNT],
            pad: DirPad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
        }
    }

    /// Load button mapping from config. Empty or unparseable lists keep the
    /// defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let wait = parse_list(&cfg.wait);
        if !wait.is_empty() {
            self.action_map.wait = wait;
        }
        let focus = parse_list(&cfg.focus_game);
        if !focus.is_empty() {
            self.action_map.focus_game = focus;
        }
    }

    /// Call once per frame before querying.
    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => self.set_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(axis, value, _) => match axis {
                    Axis::LeftStickX => self.stick_x = value,
                    Axis::LeftStickY => self.stick_y = value,
                    _ => {}
                },
                EventType::Connected => info!("gamepad connected"),
                EventType::Disconnected => {
                    info!("gamepad disconnected");
                    self.release_all();
                }
                _ => {}
            }
        }

        self.update_stick();
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dir = match gilrs_btn {
            Button::DPadUp => Some(Dir::Up),
            Button::DPadDown => Some(Dir::Down),
            Button::DPadLeft => Some(Dir::Left),
            Button::DPadRight => Some(Dir::Right),
            _ => None,
        };
        if let Some(d) = dir {
            self.pad.dpad[d as usize].set(held);
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn_index(btn)].set(held);
        }
    }

    /// Stick position → digital directions. Y is positive upwards.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn update_stick(&mut self) {
        self.pad.stick[Dir::Left as usize].set(self.stick_x < -STICK_DEADZONE);
        self.pad.stick[Dir::Right as usize].set(self.stick_x > STICK_DEADZONE);
        self.pad.stick[Dir::Up as usize].set(self.stick_y > STICK_DEADZONE);
        self.pad.stick[Dir::Down as usize].set(self.stick_y < -STICK_DEADZONE);
    }

    // ── Action queries ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn wait_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.wait)
    }

    pub fn focus_game_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.focus_game)
    }

    /// A one-tile move when a direction went down this frame. The other
    /// axis's held state turns it into a diagonal.
    pub fn move_pressed(&self) -> Option<(i8, i8)> {
        let any_edge = [Dir::Up, Dir::Down, Dir::Left, Dir::Right]
            .iter()
            .any(|&d| self.pad.just_pressed(d));
        if !any_edge {
            return None;
        }

        let axis = |neg: Dir, pos: Dir| -> i8 {
            match (self.pad.held(neg), self.pad.held(pos)) {
                (true, false) => -1,
                (false, true) => 1,
                _ => 0,
            }
        };
        let (dx, dy) = (axis(Dir::Left, Dir::Right), axis(Dir::Up, Dir::Down));
        (dx != 0 || dy != 0).then_some((dx, dy))
    }

    /// The intent for this frame's presses. Nothing is sent while the chat
    /// line has focus, same as the keyboard.
    pub fn intent(&self, focus: Focus) -> Option<Intent> {
        if focus != Focus::Game {
            return None;
        }
        if self.wait_pressed() {
            return Some(Intent::Move { dx: 0, dy: 0 });
        }
        self.move_pressed().map(|(dx, dy)| Intent::Move { dx, dy })
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.pad.dpad).chain(&mut self.pad.stick) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); BUTTON_COUNT];
        self.pad = DirPad::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
