use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};
use crate::action::Intent;
use crate::engine::Room;
use crate::error::{Rejection, TreasonError};
use crate::projector::Outbound;

pub type RoomId = String;

/// Every open room. The map lock is only held long enough to find a room;
/// all game state changes happen under that room's own lock, so rooms never
/// wait on each other.
#[derive(Default)]
pub struct Rooms {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `id` unless it already exists.
    pub async fn open(&self, id: impl Into<RoomId>) -> RoomId {
        self.insert(id.into(), Room::new).await
    }

    /// Opens `id` with a seeded room, for reproducible games.
    pub async fn open_seeded(&self, id: impl Into<RoomId>, seed: u64) -> RoomId {
        self.insert(id.into(), || Room::with_seed(seed)).await
    }

    async fn insert(&self, id: RoomId, room: impl FnOnce() -> Room) -> RoomId {
        self.rooms
            .write()
            .await
            .entry(id.clone())
            .or_insert_with(|| {
                info!(room = %id, "opened room");
                Arc::new(Mutex::new(room()))
            });
        id
    }

    pub async fn close(&self, id: &str) -> Result<(), Rejection> {
        self.rooms
            .write()
            .await
            .remove(id)
            .map(|_| info!(room = %id, "closed room"))
            .ok_or_else(|| Rejection::UnknownRoom(id.to_owned()))
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.rooms.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    async fn room(&self, id: &str) -> Result<Arc<Mutex<Room>>, Rejection> {
        self.rooms
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Rejection::UnknownRoom(id.to_owned()))
    }

    pub async fn sit(&self, id: &str, seat: usize, name: impl Into<String>) -> Result<(), Rejection> {
        let room = self.room(id).await?;
        let result = room.lock().await.sit(seat, name);
        result.inspect(|_| debug!(room = %id, seat, "seat taken"))
    }

    pub async fn leave(&self, id: &str, seat: usize) -> Result<(), Rejection> {
        let room = self.room(id).await?;
        let result = room.lock().await.leave(seat);
        result.inspect(|_| debug!(room = %id, seat, "seat freed"))
    }

    pub async fn start(&self, id: &str) -> Result<Vec<Outbound>, TreasonError> {
        let room = self.room(id).await?;
        let result = room.lock().await.start();
        self.settle(id, result).await
    }

    /// Applies an intent in room `id`. A rejected intent produces no
    /// messages; an invariant violation closes the room.
    pub async fn submit(&self, id: &str, seat: usize, intent: Intent) -> Result<Vec<Outbound>, TreasonError> {
        let room = self.room(id).await?;
        let result = room.lock().await.apply(seat, intent);
        self.settle(id, result).await
    }

    pub async fn legal_intents(&self, id: &str, seat: usize) -> Result<Vec<Intent>, Rejection> {
        let room = self.room(id).await?;
        let intents = room.lock().await.legal_intents(seat);
        Ok(intents)
    }

    async fn settle(&self, id: &str, result: Result<Vec<Outbound>, TreasonError>) -> Result<Vec<Outbound>, TreasonError> {
        match result {
            Ok(messages) => Ok(messages),
            Err(err) if err.is_fatal() => {
                error!(room = %id, %err, "room state is corrupt, closing it");
                self.rooms.write().await.remove(id);
                Err(err)
            }
            Err(err) => {
                if let Some(rejection) = err.rejection() {
                    debug!(room = %id, %rejection, "intent rejected");
                }
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::action::{ActionKind, Intent};
    use crate::error::Rejection;
    use crate::projector::Message;
    use crate::rooms::Rooms;

    async fn two_player_room(rooms: &Rooms, id: &str) {
        rooms.open_seeded(id, 9).await;
        rooms.sit(id, 0, "ana").await.unwrap();
        rooms.sit(id, 1, "bo").await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let rooms = Rooms::new();
        rooms.open("a").await;
        rooms.sit("a", 0, "ana").await.unwrap();
        rooms.open("a").await;

        assert_eq!(rooms.len().await, 1);
        // the second open kept the seated player
        assert_eq!(rooms.sit("a", 0, "bo").await, Err(Rejection::SeatTaken(0)));
    }

    #[tokio::test]
    async fn unknown_rooms_are_rejected() {
        let rooms = Rooms::new();
        assert_eq!(rooms.sit("nope", 0, "ana").await, Err(Rejection::UnknownRoom("nope".to_owned())));
        assert_eq!(rooms.close("nope").await, Err(Rejection::UnknownRoom("nope".to_owned())));
        let result = rooms.submit("nope", 0, Intent::declare(ActionKind::Income)).await;
        assert_eq!(result.unwrap_err().rejection(), Some(&Rejection::UnknownRoom("nope".to_owned())));
    }

    #[tokio::test]
    async fn rejected_intents_produce_nothing() {
        let rooms = Rooms::new();
        two_player_room(&rooms, "a").await;

        let started = rooms.start("a").await.unwrap();
        assert_eq!(started.len(), 2);

        let messages = rooms.submit("a", 1, Intent::declare(ActionKind::Income)).await.unwrap();
        assert!(messages.is_empty());
        assert!(rooms.contains("a").await);

        let messages = rooms.submit("a", 0, Intent::declare(ActionKind::Income)).await.unwrap();
        assert!(!messages.is_empty());
        assert!(messages.iter().all(|outbound| matches!(outbound.message, Message::GameUpdate(_))));
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let rooms = Rooms::new();
        two_player_room(&rooms, "a").await;
        two_player_room(&rooms, "b").await;
        rooms.start("a").await.unwrap();

        // room b hasn't started, so nothing it does touches a
        let messages = rooms.submit("b", 0, Intent::declare(ActionKind::Income)).await.unwrap();
        assert!(messages.is_empty());
        assert_eq!(rooms.legal_intents("b", 0).await.unwrap(), Vec::<Intent>::new());
        assert!(!rooms.legal_intents("a", 0).await.unwrap().is_empty());

        rooms.close("a").await.unwrap();
        assert!(!rooms.contains("a").await);
        assert!(rooms.contains("b").await);
        assert!(rooms.start("b").await.is_ok());
    }

    #[tokio::test]
    async fn seats_free_up_before_the_start_only() {
        let rooms = Rooms::new();
        two_player_room(&rooms, "a").await;

        rooms.leave("a", 1).await.unwrap();
        assert_eq!(rooms.leave("a", 1).await, Err(Rejection::EmptySeat(1)));
        assert!(rooms.start("a").await.unwrap().is_empty());

        rooms.sit("a", 3, "cy").await.unwrap();
        rooms.start("a").await.unwrap();
        assert_eq!(rooms.leave("a", 3).await, Err(Rejection::AlreadyStarted));
    }

    #[tokio::test]
    async fn rooms_play_concurrently() {
        let rooms = std::sync::Arc::new(Rooms::new());
        let mut tasks = Vec::new();
        for n in 0..4 {
            let rooms = rooms.clone();
            tasks.push(tokio::spawn(async move {
                let id = format!("room-{n}");
                two_player_room(&rooms, &id).await;
                rooms.start(&id).await.unwrap();
                for turn in 0..10 {
                    let messages = rooms.submit(&id, turn % 2, Intent::declare(ActionKind::Income)).await.unwrap();
                    assert!(!messages.is_empty());
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(rooms.len().await, 4);
    }
}
