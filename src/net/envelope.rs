/// Wire envelope `{"e": tag, "d": payload}` and the typed messages inside it.
///
/// Inbound frames are decoded by tag into the closed `Inbound` enum; the
/// payload shape is validated per tag. Outbound player intents encode back
/// into the same envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::cell::{Cell, Entity, PlayerStatus};
use crate::domain::grid::DeltaPatch;
use crate::error::ClientError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub e: String,
    #[serde(default = "empty_payload")]
    pub d: Value,
}

fn empty_payload() -> Value {
    Value::String(String::new())
}

impl Envelope {
    pub fn new(tag: &str, payload: Value) -> Self {
        Envelope { e: tag.to_string(), d: payload }
    }

    pub fn parse(text: &str) -> Result<Self, ClientError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> String {
        // A `Value` payload always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Full-state `update` payload.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UpdatePayload {
    pub tiles: Vec<Vec<Cell>>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub player: Option<PlayerStatus>,
}

/// A line for the message log.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatLine {
    #[serde(deserialize_with = "sender_string")]
    pub sender: String,
    pub text: String,
}

impl ChatLine {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        ChatLine { sender: sender.into(), text: text.into() }
    }
}

/// Senders are usually names, but accept numbers too (close codes).
fn sender_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Every inbound message the client understands.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// Full snapshot: replaces the grid.
    Update(UpdatePayload),
    /// Sparse patch keyed by `"x:y"`.
    Delta(DeltaPatch),
    Message(ChatLine),
}

impl Inbound {
    /// Decode a text frame. Unknown tags come back as `UnknownEventTag`,
    /// which callers treat as a silent no-op.
    pub fn decode(text: &str) -> Result<Self, ClientError> {
        let Envelope { e, d } = Envelope::parse(text)?;
        match e.as_str() {
            "update" => Ok(Inbound::Update(serde_json::from_value(d)?)),
            "delta" => Ok(Inbound::Delta(serde_json::from_value(d)?)),
            "message" => Ok(Inbound::Message(serde_json::from_value(d)?)),
            _ => Err(ClientError::UnknownEventTag(e)),
        }
    }
}

/// A player intent sent to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Auth { name: String },
    /// One-tile step; `(0, 0)` waits in place.
    Move { dx: i8, dy: i8 },
    Chat { message: String },
}

impl Intent {
    /// Moves travel as `turn` envelopes with `turn_type: "move"`.
    pub fn to_envelope(&self) -> Envelope {
        match self {
            Intent::Auth { name } => Envelope::new("auth", json!({ "name": name })),
            Intent::Move { dx, dy } => Envelope::new(
                "turn",
                json!({ "turn_type": "move", "data": { "dx": dx, "dy": dy } }),
            ),
            Intent::Chat { message } => Envelope::new("chat", json!({ "message": message })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_update() {
        let text = r##"{"e":"update","d":{
            "tiles":[[{"character":"#","color":"gray","background":"black"},
                      {"character":".","color":"gray","background":"black"}]],
            "entities":[{"x":1,"y":0,"character":"@","color":"white","name":"bob"}],
            "player":{"character":"@","color":"white","hp":40,
                      "attack_roll":{"count":2,"sides":6,"inc":2},"turn_done":false}
        }}"##;
        let Inbound::Update(update) = Inbound::decode(text).unwrap() else {
            panic!("expected update");
        };
        assert_eq!(update.tiles[0].len(), 2);
        assert_eq!(update.entities[0].character, '@');
        assert_eq!(update.player.unwrap().hp, 40);
    }

    #[test]
    fn decode_update_without_player() {
        let text = r#"{"e":"update","d":{"tiles":[[{"character":"."}]],"entities":[]}}"#;
        let Inbound::Update(update) = Inbound::decode(text).unwrap() else {
            panic!("expected update");
        };
        assert!(update.player.is_none());
        assert_eq!(update.tiles[0][0].color, "gray");
    }

    #[test]
    fn decode_delta() {
        let text = r#"{"e":"delta","d":{"0:1":{"character":"%","color":"red"}}}"#;
        let Inbound::Delta(patch) = Inbound::decode(text).unwrap() else {
            panic!("expected delta");
        };
        assert_eq!(patch["0:1"], Cell::new('%', "red", None));
    }

    #[test]
    fn delta_tag_does_not_accept_rows() {
        let text = r#"{"e":"delta","d":[[{"character":"%"}]]}"#;
        assert!(matches!(Inbound::decode(text), Err(ClientError::MalformedPayload(_))));
    }

    #[test]
    fn decode_message() {
        let text = r#"{"e":"message","d":{"sender":"Server","text":"bob joined the game"}}"#;
        assert_eq!(
            Inbound::decode(text).unwrap(),
            Inbound::Message(ChatLine::new("Server", "bob joined the game"))
        );
    }

    #[test]
    fn numeric_sender_is_stringified() {
        let text = r#"{"e":"message","d":{"sender":1006,"text":"disconnected"}}"#;
        assert_eq!(
            Inbound::decode(text).unwrap(),
            Inbound::Message(ChatLine::new("1006", "disconnected"))
        );
    }

    #[test]
    fn unknown_tag() {
        let text = r#"{"e":"weather","d":{"rain":true}}"#;
        assert_eq!(
            Inbound::decode(text),
            Err(ClientError::UnknownEventTag("weather".into()))
        );
    }

    #[test]
    fn malformed_frames() {
        assert!(matches!(Inbound::decode("not json"), Err(ClientError::MalformedPayload(_))));
        assert!(matches!(Inbound::decode(r#"{"d":{}}"#), Err(ClientError::MalformedPayload(_))));
        assert!(matches!(
            Inbound::decode(r#"{"e":"message","d":{"text":"no sender"}}"#),
            Err(ClientError::MalformedPayload(_))
        ));
        assert!(matches!(
            Inbound::decode(r#"{"e":"update"}"#),
            Err(ClientError::MalformedPayload(_))
        ));
    }

    #[test]
    fn move_intent_is_wrapped_in_turn() {
        let env = Intent::Move { dx: -1, dy: 0 }.to_envelope();
        assert_eq!(env.e, "turn");
        assert_eq!(env.d, json!({ "turn_type": "move", "data": { "dx": -1, "dy": 0 } }));
    }

    #[test]
    fn auth_and_chat_intents() {
        let auth = Intent::Auth { name: "bob".into() }.to_envelope();
        assert_eq!(auth.to_json(), r#"{"e":"auth","d":{"name":"bob"}}"#);

        let chat = Intent::Chat { message: "hi all".into() }.to_envelope();
        assert_eq!(chat.e, "chat");
        assert_eq!(chat.d["message"], "hi all");
    }
}
