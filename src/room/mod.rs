// Public API - what other modules can use
pub use models::Room;
pub use registry::RoomRegistry;

// Internal modules
mod models;
mod registry;
