/// Events emitted while applying inbound messages to the session.
/// The presentation layer consumes these for redraws and sound cues.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Grid, entities or panels changed; the next frame must repaint.
    Redraw,
    /// The server finished everyone else's turns and waits for ours.
    TurnReady,
    ChatReceived,
    /// A recoverable protocol problem was shown to the user.
    Warning,
    Disconnected,
}
