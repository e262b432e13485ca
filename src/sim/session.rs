/// SessionState: everything the client knows about the running game.
///
/// ## Lifecycle
///
///   - created empty at startup (no grid; frames render nothing)
///   - the first `update` establishes the grid and its dimensions
///   - `update` / `delta` / `message` are applied in receipt order
///   - socket close destroys the grid and ends the session
///
/// Entities and the player status come only with full updates. The last
/// entity list is kept so a resize or delta can repaint the same actors.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::domain::autotile;
use crate::domain::cell::{Cell, Entity, PlayerStatus};
use crate::domain::grid::TileGrid;
use crate::domain::overlay;
use crate::error::ClientError;
use crate::net::client::Received;
use crate::net::envelope::{ChatLine, Inbound, UpdatePayload};
use super::event::SessionEvent;

/// Oldest lines are dropped beyond this.
const MESSAGE_HISTORY: usize = 200;

/// Sender shown on locally generated warnings.
pub const WARNING_SENDER: &str = "Client";

pub struct SessionState {
    pub grid: TileGrid,
    pub entities: Vec<Entity>,
    pub player: Option<PlayerStatus>,
    pub messages: VecDeque<ChatLine>,
    pub ended: bool,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            grid: TileGrid::new(),
            entities: Vec::new(),
            player: None,
            messages: VecDeque::with_capacity(MESSAGE_HISTORY),
            ended: false,
        }
    }

    /// Apply one message from the connection.
    pub fn apply(&mut self, received: Received) -> Vec<SessionEvent> {
        match received {
            Received::Inbound(Inbound::Update(update)) => self.apply_update(update),
            Received::Inbound(Inbound::Delta(patch)) => match self.grid.apply_delta(&patch) {
                Ok(outcome) => {
                    if !outcome.rejected.is_empty() {
                        warn!(
                            applied = outcome.applied,
                            dropped = outcome.rejected.len(),
                            "delta partially applied"
                        );
                    }
                    vec![SessionEvent::Redraw]
                }
                Err(err @ ClientError::OutOfOrderUpdate) => {
                    warn!(%err, "ignoring delta");
                    self.push_message(ChatLine::new(
                        WARNING_SENDER,
                        "map change arrived before the map; waiting for a full update",
                    ));
                    vec![SessionEvent::Warning, SessionEvent::Redraw]
                }
                Err(err) => {
                    warn!(%err, "ignoring delta");
                    vec![]
                }
            },
            Received::Inbound(Inbound::Message(line)) => {
                self.push_message(line);
                vec![SessionEvent::ChatReceived, SessionEvent::Redraw]
            }
            Received::Closed { code } => {
                debug!(code, "session ended");
                self.grid.reset();
                self.entities.clear();
                self.ended = true;
                vec![SessionEvent::Disconnected, SessionEvent::Redraw]
            }
        }
    }

    fn apply_update(&mut self, update: UpdatePayload) -> Vec<SessionEvent> {
        let first = !self.grid.is_established();
        if let Err(err) = self.grid.apply_full_snapshot(&update.tiles) {
            warn!(%err, "dropping update");
            return vec![];
        }
        if first {
            info!(dims = ?self.grid.dimensions(), "map received");
        }
        self.entities = update.entities;

        let mut events = vec![SessionEvent::Redraw];
        if let Some(status) = update.player {
            let was_waiting = self.player.as_ref().is_some_and(|p| p.turn_done);
            if was_waiting && !status.turn_done {
                events.push(SessionEvent::TurnReady);
            }
            self.player = Some(status);
        }
        events
    }

    pub fn push_message(&mut self, line: ChatLine) {
        if self.messages.len() == MESSAGE_HISTORY {
            self.messages.pop_front();
        }
        self.messages.push_back(line);
    }

    /// Our turn is in and the server is waiting on other players.
    pub fn awaiting_others(&self) -> bool {
        self.player.as_ref().is_some_and(|p| p.turn_done)
    }

    /// The grid to draw this frame: terrain, optionally auto-tiled, with
    /// entities on top. Empty before the first snapshot.
    pub fn frame(&self, autotile: bool) -> Vec<Vec<Cell>> {
        if autotile {
            overlay::composite(&autotile::auto_tile(self.grid.rows()), &self.entities)
        } else {
            overlay::composite(self.grid.rows(), &self.entities)
        }
    }
}
