use super::error::GameError;
use super::message::ServerMessage;
use super::participant::Participant;
use crate::CAPACITY;
use crate::ID;
use tokio::sync::mpsc::UnboundedSender;

/// Open connections for one room.
///
/// Owns nothing but the outbound half of each bridge; all sends are
/// fire-and-forget. Send failures are logged, never acted on inline;
/// closed connections are swept at the serialization point instead.
#[derive(Debug, Default)]
pub struct Table {
    seats: Vec<Seat>,
}

#[derive(Debug)]
struct Seat {
    user: ID<Participant>,
    outbox: UnboundedSender<String>,
}

impl Table {
    /// Admits a connection and mints its participant id.
    /// Refused once the table is at capacity.
    pub fn connect(
        &mut self,
        outbox: UnboundedSender<String>,
    ) -> Result<ID<Participant>, GameError> {
        if self.seats.len() >= CAPACITY {
            return Err(GameError::RoomFull);
        }
        let user = ID::default();
        self.seats.push(Seat { user, outbox });
        Ok(user)
    }

    pub fn remove(&mut self, user: ID<Participant>) {
        self.seats.retain(|s| s.user != user);
    }

    /// Connections whose bridge has gone away without a disconnect event yet.
    pub fn sweep(&self) -> Vec<ID<Participant>> {
        self.seats
            .iter()
            .filter(|s| s.outbox.is_closed())
            .map(|s| s.user)
            .collect()
    }

    pub fn occupancy(&self) -> usize {
        self.seats.len()
    }
    /// Ids of every open connection, seated or spectating.
    pub fn users(&self) -> impl Iterator<Item = ID<Participant>> + '_ {
        self.seats.iter().map(|s| s.user)
    }
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Sends an event to a single connection.
    pub fn unicast(&self, user: ID<Participant>, message: &ServerMessage) {
        match self.seats.iter().find(|s| s.user == user) {
            Some(seat) => {
                if let Err(e) = seat.outbox.send(message.to_json()) {
                    log::warn!("[table] unicast to {} failed: {:?}", user, e);
                }
            }
            None => log::warn!("[table] unicast to {}: no such connection", user),
        }
    }

    /// Sends an event to every open connection in the room.
    pub fn broadcast(&self, message: &ServerMessage) {
        let json = message.to_json();
        self.seats
            .iter()
            .map(|s| (s.user, s.outbox.send(json.clone())))
            .filter_map(|(user, res)| res.err().map(|e| (user, e)))
            .for_each(|(user, e)| log::warn!("[table] broadcast to {} failed: {:?}", user, e));
    }

    /// Shorthand for unicasting a structured refusal.
    pub fn refuse(&self, user: ID<Participant>, error: &GameError) {
        self.unicast(user, &ServerMessage::error(error));
    }
}
