//! MessageStore implementations.

pub mod inmemory;

pub use inmemory::{InMemoryMessageStore, StoredMessage};
