//! Conversation checkpoint persistence. The graph runner saves state
//! through a [`CheckpointStore`] after every node so threads survive
//! restarts.

pub mod store;

pub use store::{CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore};
