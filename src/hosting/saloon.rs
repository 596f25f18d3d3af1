use super::handle::RoomHandle;
use crate::ID;
use crate::gameroom::GameError;
use crate::gameroom::Room;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Manages active game rooms and their lifecycles.
///
/// Rooms are spawned as independent tasks and owned by nobody but
/// themselves; the saloon keeps only a handle per room, reaps entries when
/// a room's task exits, and prunes stale handles it happens upon.
pub struct Saloon {
    rooms: RwLock<HashMap<ID<Room>, RoomHandle>>,
}

impl Default for Saloon {
    fn default() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }
}

impl Saloon {
    /// Opens a new empty room, spawns its owning task, and returns its id.
    pub async fn open(self: &Arc<Self>) -> ID<Room> {
        let id = ID::default();
        let (handle, queue) = RoomHandle::pair(id);
        let room = Room::new(id, queue, SmallRng::from_os_rng());
        self.rooms.write().await.insert(id, handle);
        let (done, closed) = tokio::sync::oneshot::channel();
        tokio::spawn(room.run(done));
        let saloon = self.clone();
        tokio::spawn(async move {
            let _ = closed.await;
            let _ = saloon.close(id).await;
            log::info!("[saloon] room {} reaped", id);
        });
        log::info!("[saloon] opened room {}", id);
        id
    }

    /// Removes a room from the registry.
    pub async fn close(&self, id: ID<Room>) -> anyhow::Result<()> {
        self.rooms
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("room not found"))
    }

    /// Resolves a live room, pruning the entry if its task already exited.
    pub async fn lookup(&self, id: ID<Room>) -> Result<RoomHandle, GameError> {
        let handle = self.rooms.read().await.get(&id).cloned();
        match handle {
            Some(h) if !h.is_stale() => Ok(h),
            Some(_) => {
                self.rooms.write().await.remove(&id);
                Err(GameError::RoomNotFound)
            }
            None => Err(GameError::RoomNotFound),
        }
    }

    /// Spawns the pump between one WebSocket session and its room.
    /// A refusal is returned to the caller, who still owns the session.
    pub async fn bridge(
        &self,
        id: ID<Room>,
        mut session: actix_ws::Session,
        mut stream: actix_ws::MessageStream,
    ) -> Result<(), GameError> {
        use futures::StreamExt;
        let handle = self.lookup(id).await?;
        let (outbox, mut inbox) = tokio::sync::mpsc::unbounded_channel::<String>();
        let user = handle.connect(outbox).await?;
        log::debug!("[bridge {}] connection {} attached", id, user);
        actix_web::rt::spawn(async move {
            'sesh: loop {
                tokio::select! {
                    biased;
                    msg = inbox.recv() => match msg {
                        Some(json) => if session.text(json).await.is_err() { break 'sesh },
                        None => break 'sesh,
                    },
                    msg = stream.next() => match msg {
                        Some(Ok(actix_ws::Message::Text(text))) => handle.frame(user, text.to_string()),
                        Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                        Some(Err(_)) => break 'sesh,
                        None => break 'sesh,
                        _ => continue 'sesh,
                    },
                }
            }
            handle.disconnect(user);
            log::debug!("[bridge {}] connection {} detached", id, user);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CAPACITY;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn opened_rooms_resolve() {
        let saloon = Arc::new(Saloon::default());
        let id = saloon.open().await;
        assert!(saloon.lookup(id).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_rooms_do_not() {
        let saloon = Arc::new(Saloon::default());
        assert_eq!(
            saloon.lookup(ID::default()).await.unwrap_err(),
            GameError::RoomNotFound
        );
    }

    #[tokio::test]
    async fn a_fifth_seat_is_refused() {
        let saloon = Arc::new(Saloon::default());
        let id = saloon.open().await;
        let handle = saloon.lookup(id).await.unwrap();
        let mut seats = Vec::new();
        for _ in 0..CAPACITY {
            let (outbox, inbox) = unbounded_channel();
            handle.connect(outbox).await.expect("capacity remains");
            seats.push(inbox);
        }
        let (outbox, _inbox) = unbounded_channel();
        assert_eq!(
            handle.connect(outbox).await.unwrap_err(),
            GameError::RoomFull
        );
    }

    #[tokio::test]
    async fn rooms_are_reaped_after_the_last_connection_leaves() {
        let saloon = Arc::new(Saloon::default());
        let id = saloon.open().await;
        let handle = saloon.lookup(id).await.unwrap();
        let (outbox, _inbox) = unbounded_channel();
        let user = handle.connect(outbox).await.expect("room is empty");
        handle.disconnect(user);
        for _ in 0..100 {
            if saloon.lookup(id).await.is_err() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("room was never reaped");
    }
}
