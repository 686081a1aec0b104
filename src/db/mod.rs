//! Database module - room directory (C7) and its connection pool.

pub mod directory;
pub mod pool;

pub use directory::{RoomDirectory, RoomDirectoryError, RoomRecord, RosterMember, UserRecord};
pub use pool::create_pool;
