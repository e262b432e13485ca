/// Input routing: keyboard events → chat edits or turn intents.
///
/// Two focus modes:
///   - `Game`: keys are looked up in the move keymap (8 directions + wait),
///     then in the command table (`t` opens chat). First match wins, and at
///     most one of them fires per key.
///   - `Chat`: keys edit the chat line. Enter sends it, Escape goes back
///     to the game.
///
/// The keymap is flattened once at startup from binding groups into a
/// key → action table.
///
/// Only `Press` events are routed. Terminals without keyboard enhancement
/// never report releases, and ignoring `Repeat` means a held key submits a
/// single turn.

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::warn;

use crate::net::envelope::Intent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Focus {
    Game,
    Chat,
}

/// What a key press asks the client to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Send(Intent),
    FocusChanged(Focus),
    ChatEdited,
    Quit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum CommandKey {
    FocusChat,
}

/// One binding group: a move vector and the keys that trigger it.
#[derive(Clone, Debug)]
pub struct BindingGroup {
    pub name: &'static str,
    pub dx: i8,
    pub dy: i8,
    pub keys: Vec<KeyCode>,
}

/// Config name of the chat command binding.
pub const CHAT_BINDING: &str = "chat";

fn chars(s: &str) -> Vec<KeyCode> {
    s.chars().map(KeyCode::Char).collect()
}

/// Numeric keypad digits, vi-style letters, arrows for the four
/// cardinal directions. Order matters: earlier groups win duplicate keys.
pub fn default_bindings() -> Vec<BindingGroup> {
    let group = |name, dx, dy, mut keys: Vec<KeyCode>, extra: &[KeyCode]| {
        keys.extend_from_slice(extra);
        BindingGroup { name, dx, dy, keys }
    };
    vec![
        group("southwest", -1, 1, chars("1b"), &[]),
        group("south", 0, 1, chars("2j"), &[KeyCode::Down]),
        group("southeast", 1, 1, chars("3n"), &[]),
        group("west", -1, 0, chars("4h"), &[KeyCode::Left]),
        group("wait", 0, 0, chars("5."), &[]),
        group("east", 1, 0, chars("6l"), &[KeyCode::Right]),
        group("northwest", -1, -1, chars("7y"), &[]),
        group("north", 0, -1, chars("8k"), &[KeyCode::Up]),
        group("northeast", 1, -1, chars("9u"), &[]),
    ]
}

/// Key name from the config file: a single character, or a named key
/// (`left`, `enter`, `f5`, ...). Case-insensitive for names.
pub fn parse_key_name(name: &str) -> Option<KeyCode> {
    let mut it = name.chars();
    if let (Some(c), None) = (it.next(), it.next()) {
        return Some(KeyCode::Char(c));
    }

    let lower = name.trim().to_ascii_lowercase();
    let code = match lower.as_str() {
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "insert" => KeyCode::Insert,
        "delete" => KeyCode::Delete,
        "tab" => KeyCode::Tab,
        "enter" => KeyCode::Enter,
        "space" => KeyCode::Char(' '),
        _ => {
            let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
            return (1..=12).contains(&n).then_some(KeyCode::F(n));
        }
    };
    Some(code)
}

pub struct InputRouter {
    focus: Focus,
    chat: String,
    moves: HashMap<KeyCode, (i8, i8)>,
    commands: HashMap<KeyCode, CommandKey>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::with_bindings(&default_bindings(), &chars("t"))
    }

    /// Build from binding groups plus overrides keyed by group name (or
    /// `chat` for the chat command). An override replaces the group's keys;
    /// names that do not parse are logged and skipped.
    pub fn from_overrides(overrides: &HashMap<String, Vec<String>>) -> Self {
        let parse_all = |group: &str, names: &[String]| -> Vec<KeyCode> {
            names
                .iter()
                .filter_map(|n| {
                    let key = parse_key_name(n);
                    if key.is_none() {
                        warn!(group, key = %n, "unknown key name in config");
                    }
                    key
                })
                .collect()
        };

        let mut groups = default_bindings();
        for group in &mut groups {
            if let Some(names) = overrides.get(group.name) {
                group.keys = parse_all(group.name, names);
            }
        }
        let chat = match overrides.get(CHAT_BINDING) {
            Some(names) => parse_all(CHAT_BINDING, names),
            None => chars("t"),
        };
        for name in overrides.keys() {
            if name != CHAT_BINDING && !groups.iter().any(|g| g.name == name.as_str()) {
                warn!(group = %name, "unknown key binding group in config");
            }
        }

        Self::with_bindings(&groups, &chat)
    }

    pub fn with_bindings(groups: &[BindingGroup], chat_keys: &[KeyCode]) -> Self {
        let mut moves = HashMap::new();
        for group in groups {
            for &key in &group.keys {
                moves.entry(key).or_insert((group.dx, group.dy));
            }
        }
        let commands = chat_keys.iter().map(|&k| (k, CommandKey::FocusChat)).collect();

        InputRouter { focus: Focus::Game, chat: String::new(), moves, commands }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Text currently typed into the chat line.
    pub fn chat_text(&self) -> &str {
        &self.chat
    }

    /// Return focus to the game (used by gamepad buttons too).
    pub fn focus_game(&mut self) -> Option<Command> {
        if self.focus == Focus::Game {
            return None;
        }
        self.focus = Focus::Game;
        Some(Command::FocusChanged(Focus::Game))
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> Option<Command> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
            return Some(Command::Quit);
        }

        match self.focus {
            Focus::Chat => self.handle_chat_key(key.code, ctrl),
            Focus::Game => self.handle_game_key(key.code),
        }
    }

    fn handle_game_key(&mut self, code: KeyCode) -> Option<Command> {
        if let Some(&(dx, dy)) = self.moves.get(&code) {
            return Some(Command::Send(Intent::Move { dx, dy }));
        }
        match self.commands.get(&code)? {
            CommandKey::FocusChat => {
                self.focus = Focus::Chat;
                Some(Command::FocusChanged(Focus::Chat))
            }
        }
    }

    fn handle_chat_key(&mut self, code: KeyCode, ctrl: bool) -> Option<Command> {
        match code {
            KeyCode::Enter => {
                let message = std::mem::take(&mut self.chat);
                Some(Command::Send(Intent::Chat { message }))
            }
            KeyCode::Esc => self.focus_game(),
            KeyCode::Backspace => self.chat.pop().map(|_| Command::ChatEdited),
            KeyCode::Char(c) if !ctrl => {
                self.chat.push(c);
                Some(Command::ChatEdited)
            }
            _ => None,
        }
    }
}

// ── Terminal event source ──

/// Terminal events the client reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Drain all pending terminal events without blocking.
pub fn drain_terminal_events() -> Vec<TermEvent> {
    let mut events = Vec::new();
    while poll(Duration::ZERO).unwrap_or(false) {
        match event::read() {
            Ok(Event::Key(key)) => events.push(TermEvent::Key(key)),
            Ok(Event::Resize(w, h)) => events.push(TermEvent::Resize(w, h)),
            Ok(_) => {}
            Err(err) => {
                warn!(%err, "terminal read failed");
                break;
            }
        }
    }
    events
}
