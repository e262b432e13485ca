/// Per-message protocol errors.
///
/// None of these are fatal: the session drops the offending message (or
/// the offending cell of a delta) and keeps going, so one bad frame never
/// corrupts the grid for the frames after it.

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("delta received before any snapshot")]
    OutOfOrderUpdate,

    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    BoundsError {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("unknown event tag `{0}`")]
    UnknownEventTag(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("connection is closed")]
    Disconnected,
}

impl ClientError {
    pub fn malformed(detail: impl std::fmt::Display) -> Self {
        ClientError::MalformedPayload(detail.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::malformed(err)
    }
}
