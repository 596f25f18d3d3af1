use super::error::GameError;
use super::message::ClientMessage;

/// Inbound decode layer. Every frame a client sends passes through here, so
/// malformed or unrecognized payloads always come back as a structured
/// refusal instead of being dropped on the floor.
pub struct Protocol;

impl Protocol {
    pub fn decode(text: &str) -> Result<ClientMessage, GameError> {
        serde_json::from_str(text).map_err(|e| GameError::MalformedMessage(e.to_string()))
    }
}
