/// Screen layout and the text panels around the map.
///
/// ```text
/// ┌──────────────── map ───────────────┐ ┌─ panel ─┐
/// │                                    │ │ status  │
/// │                                    │ │ ─────── │
/// │                                    │ │ message │
/// │                                    │ │ log     │
/// └────────────────────────────────────┘ └─────────┘
///  chat line / key help
/// ```

use crossterm::style::Color;

use crate::domain::cell::PlayerStatus;
use crate::net::client::ConnectionState;
use crate::net::envelope::ChatLine;
use crate::sim::session::SessionState;
use crate::ui::input::{Focus, InputRouter};
use crate::ui::markup;
use crate::ui::palette;
use crate::ui::screen::{FrameBuffer, Rect, TermCell, BASE_BG};

const STATUS_ROWS: usize = 5;
const PANEL_BG: Color = Color::Rgb { r: 20, g: 20, b: 30 };
const CHAT_BG: Color = Color::Rgb { r: 40, g: 40, b: 70 };
const LABEL_FG: Color = Color::Rgb { r: 190, g: 190, b: 200 };
const DIM_FG: Color = Color::DarkGrey;
const SENDER_FG: Color = Color::Rgb { r: 230, g: 230, b: 150 };
const TEXT_FG: Color = Color::Rgb { r: 220, g: 220, b: 220 };

const GAME_HELP: &str = " t:chat  hjklyubn/1-9:move  5/.:wait  ^C:quit";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub map: Rect,
    pub panel: Rect,
    pub chat: Rect,
}

impl Layout {
    /// Split a `term_w` x `term_h` terminal. The panel takes at most half the
    /// width; one column separates it from the map; the last row is the chat
    /// line.
    pub fn compute(term_w: usize, term_h: usize, panel_width: usize) -> Self {
        let body_h = term_h.saturating_sub(1);
        let panel_w = panel_width.min(term_w / 2);
        let map_w = term_w.saturating_sub(panel_w).saturating_sub(usize::from(panel_w > 0));

        Layout {
            map: Rect::new(0, 0, map_w, body_h),
            panel: Rect::new(term_w - panel_w, 0, panel_w, body_h),
            chat: Rect::new(0, body_h, term_w, usize::from(term_h > 0)),
        }
    }
}

/// Draw the status panel, the message log and the chat line.
pub fn compose(
    buf: &mut FrameBuffer,
    layout: &Layout,
    session: &SessionState,
    router: &InputRouter,
    connection: ConnectionState,
) {
    let panel = layout.panel;
    if panel.w > 0 && panel.h > 0 {
        buf.fill(panel, PANEL_BG);
        let status_h = STATUS_ROWS.min(panel.h);
        compose_status(buf, Rect::new(panel.x, panel.y, panel.w, status_h), session, connection);
        let log_area = Rect::new(panel.x, panel.y + status_h, panel.w, panel.h - status_h);
        compose_messages(buf, log_area, session.messages.iter());
    }
    if layout.chat.h > 0 {
        compose_chat(buf, layout.chat, router, session.ended);
    }
}

fn compose_status(buf: &mut FrameBuffer, area: Rect, session: &SessionState, connection: ConnectionState) {
    let right = area.x + area.w;
    let line = |i: usize| area.y + i;
    let x = area.x + 1;

    match (&session.player, connection) {
        (_, ConnectionState::Disconnected) if session.ended => {
            buf.put_str(x, line(0), right, "Disconnected", Color::Red, PANEL_BG);
        }
        (Some(player), _) => compose_player(buf, x, area.y, right, player),
        (None, ConnectionState::Connected) => {
            buf.put_str(x, line(0), right, "Waiting for the world...", LABEL_FG, PANEL_BG);
        }
        (None, ConnectionState::Disconnected) => {
            buf.put_str(x, line(0), right, "Connecting...", LABEL_FG, PANEL_BG);
        }
    }

    if area.h == STATUS_ROWS {
        let rule: String = "─".repeat(area.w);
        buf.put_str(area.x, line(STATUS_ROWS - 1), right, &rule, DIM_FG, PANEL_BG);
    }
}

fn compose_player(buf: &mut FrameBuffer, x: usize, top: usize, right: usize, player: &PlayerStatus) {
    let mut glyph = [0u8; 4];
    buf.put_str(x, top, right, player.character.encode_utf8(&mut glyph), palette::parse(&player.color), PANEL_BG);
    buf.put_str(x, top + 1, right, &format!("Health: {}", player.hp), LABEL_FG, PANEL_BG);
    buf.put_str(x, top + 2, right, &format!("Attack: {}", player.attack_roll), LABEL_FG, PANEL_BG);

    let waiting = if player.turn_done { "Waiting for others" } else { "Waiting for you" };
    let fg = if player.turn_done { DIM_FG } else { Color::Green };
    buf.put_str(x, top + 3, right, waiting, fg, PANEL_BG);
}

/// Wrap one log line (`sender: text`) into rows of at most `width` cells.
pub fn wrap_line(line: &ChatLine, width: usize) -> Vec<Vec<(char, Color)>> {
    let mut rows = vec![Vec::new()];
    if width == 0 {
        return rows;
    }

    let colored = |text: &str, default: Color| -> Vec<(char, Color)> {
        markup::parse(text)
            .into_iter()
            .flat_map(|seg| {
                let fg = seg.color.as_deref().map_or(default, palette::parse);
                seg.text.chars().map(move |c| (c, fg)).collect::<Vec<_>>()
            })
            .collect()
    };

    let mut chars = colored(&line.sender, SENDER_FG);
    chars.extend(": ".chars().map(|c| (c, TEXT_FG)));
    chars.extend(colored(&line.text, TEXT_FG));

    for (c, fg) in chars {
        if c == '\n' {
            rows.push(Vec::new());
            continue;
        }
        if rows.last().is_some_and(|r| r.len() == width) {
            rows.push(Vec::new());
        }
        if let Some(row) = rows.last_mut() {
            row.push((c, fg));
        }
    }
    rows
}

/// Newest messages at the bottom; older ones scroll off the top.
fn compose_messages<'a>(buf: &mut FrameBuffer, area: Rect, lines: impl Iterator<Item = &'a ChatLine>) {
    if area.h == 0 || area.w < 3 {
        return;
    }
    let inner_w = area.w - 2;
    let rows: Vec<Vec<(char, Color)>> = lines.flat_map(|l| wrap_line(l, inner_w)).collect();
    let skip = rows.len().saturating_sub(area.h);

    for (i, row) in rows.iter().skip(skip).enumerate() {
        for (j, &(ch, fg)) in row.iter().enumerate() {
            buf.set(area.x + 1 + j, area.y + i, TermCell { ch, fg, bg: PANEL_BG });
        }
    }
}

fn compose_chat(buf: &mut FrameBuffer, area: Rect, router: &InputRouter, ended: bool) {
    let right = area.x + area.w;
    if ended {
        buf.put_str(area.x, area.y, right, " Disconnected. Press Ctrl+C to quit.", Color::Red, BASE_BG);
        return;
    }
    match router.focus() {
        Focus::Game => {
            buf.put_str(area.x, area.y, right, GAME_HELP, DIM_FG, BASE_BG);
        }
        Focus::Chat => {
            buf.fill(area, CHAT_BG);
            let prompt = " say: ";
            let room = area.w.saturating_sub(prompt.len() + 1);
            let text = router.chat_text();
            let shown: String = {
                let count = text.chars().count();
                text.chars().skip(count.saturating_sub(room)).collect()
            };
            let end = buf.put_str(area.x, area.y, right, prompt, LABEL_FG, CHAT_BG);
            let end = buf.put_str(end, area.y, right, &shown, Color::White, CHAT_BG);
            buf.put_str(end, area.y, right, "_", Color::White, CHAT_BG);
        }
    }
}
