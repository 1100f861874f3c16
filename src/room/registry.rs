use tokio::sync::RwLock;
use tracing::{debug, info};

use super::models::Room;

/// In-memory set of rooms the bot currently participates in
///
/// Rooms are kept in insertion order and inserts are idempotent by id. There
/// is no removal: once joined, a room stays in the registry for the life of
/// the process. Guarded by a read-write lock because invite acceptance adds
/// rooms while the delivery task is reading.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<Vec<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(Vec::new()),
        }
    }

    /// Inserts a room, returning false if a room with the same id is already
    /// registered
    pub async fn add(&self, room: Room) -> bool {
        let mut rooms = self.rooms.write().await;
        if rooms.iter().any(|r| r.id == room.id) {
            debug!(room_id = %room.id, "Room already registered");
            return false;
        }

        info!(room_id = %room.id, total_rooms = rooms.len() + 1, "Room registered");
        rooms.push(room);
        true
    }

    /// Current rooms in insertion order
    pub async fn list(&self) -> Vec<Room> {
        self.rooms.read().await.clone()
    }

    pub async fn contains(&self, room_id: &str) -> bool {
        self.rooms.read().await.iter().any(|r| r.id == room_id)
    }

    pub async fn get(&self, room_id: &str) -> Option<Room> {
        self.rooms
            .read()
            .await
            .iter()
            .find(|r| r.id == room_id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_lookup() {
        let registry = RoomRegistry::new();

        assert!(registry.add(Room::new("!a:server")).await);
        assert!(registry.contains("!a:server").await);
        assert!(!registry.contains("!b:server").await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn add_is_idempotent_by_id() {
        let registry = RoomRegistry::new();

        assert!(registry.add(Room::new("!a:server")).await);
        assert!(!registry.add(Room::new("!a:server")).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let registry = RoomRegistry::new();

        registry.add(Room::new("!c:server")).await;
        registry.add(Room::new("!a:server")).await;
        registry.add(Room::new("!b:server")).await;

        let ids: Vec<String> = registry.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["!c:server", "!a:server", "!b:server"]);
    }

    #[tokio::test]
    async fn get_returns_registered_room_with_alias() {
        let registry = RoomRegistry::new();
        registry
            .add(Room::new("!a:server").with_alias("#general:server"))
            .await;

        let room = registry.get("!a:server").await.unwrap();
        assert_eq!(room.alias.as_deref(), Some("#general:server"));
        assert!(registry.get("!missing:server").await.is_none());
    }

    #[tokio::test]
    async fn empty_registry_reports_empty() {
        let registry = RoomRegistry::new();
        assert!(registry.is_empty().await);
        assert!(registry.list().await.is_empty());
    }
}
