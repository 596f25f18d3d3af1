use super::error::GameError;
use super::participant::Participant;
use crate::ID;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

/// Everything that can happen to a room, delivered over one queue to the
/// room's owning task. Queue order is processing order; events from one
/// connection arrive in receipt order.
pub enum RoomEvent {
    /// A WebSocket finished its handshake and wants a seat at the table.
    /// The reply carries the minted participant id, or the refusal the
    /// bridge must forward before closing.
    Connected {
        outbox: UnboundedSender<String>,
        reply: oneshot::Sender<Result<ID<Participant>, GameError>>,
    },
    /// A raw text frame from an open connection. Decoded inside the room so
    /// malformed payloads get a structured refusal.
    Frame { user: ID<Participant>, text: String },
    /// The connection closed, cleanly or not.
    Disconnected { user: ID<Participant> },
}

impl std::fmt::Display for RoomEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Connected { .. } => write!(f, "connect"),
            Self::Frame { user, .. } => write!(f, "frame from {}", user),
            Self::Disconnected { user } => write!(f, "disconnect of {}", user),
        }
    }
}
