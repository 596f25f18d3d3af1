use crate::ID;
use crate::gameroom::GameError;
use crate::gameroom::Participant;
use crate::gameroom::Room;
use crate::gameroom::RoomEvent;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

/// Handle to a running room's event queue. Everything a bridge does to a
/// room goes through here; the room replies over the bridge's own outbox.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    pub id: ID<Room>,
    events: UnboundedSender<RoomEvent>,
}

impl RoomHandle {
    /// Creates the handle and the queue end the room task will own.
    pub fn pair(id: ID<Room>) -> (Self, UnboundedReceiver<RoomEvent>) {
        let (events, queue) = unbounded_channel();
        (Self { id, events }, queue)
    }

    /// Whether the room task behind this handle has already exited.
    pub fn is_stale(&self) -> bool {
        self.events.is_closed()
    }

    /// Asks the room for a seat, handing over the outbound half of the
    /// bridge. The refusal, if any, is for the bridge to forward and close.
    pub async fn connect(
        &self,
        outbox: UnboundedSender<String>,
    ) -> Result<ID<Participant>, GameError> {
        let (reply, admission) = oneshot::channel();
        self.events
            .send(RoomEvent::Connected { outbox, reply })
            .map_err(|_| GameError::RoomNotFound)?;
        admission.await.map_err(|_| GameError::RoomNotFound)?
    }

    /// Forwards one raw client frame. Fire-and-forget.
    pub fn frame(&self, user: ID<Participant>, text: String) {
        let _ = self.events.send(RoomEvent::Frame { user, text });
    }

    /// Reports the connection gone. Fire-and-forget.
    pub fn disconnect(&self, user: ID<Participant>) {
        let _ = self.events.send(RoomEvent::Disconnected { user });
    }
}
