//! Domain layer for the message router.
//!
//! This module contains the router's vocabulary (identities, messages, rooms)
//! and the interfaces of the external collaborators it depends on. It knows
//! nothing about axum, JSON, or the concrete store.

pub mod codec;
pub mod connection;
pub mod error;
pub mod message;
pub mod room;
pub mod store;
pub mod value_object;

pub use codec::MessageCodec;
pub use connection::{Frame, FrameReader, FrameWriter};
pub use error::{StoreError, TransportError, ValidationError, ValueObjectError};
pub use message::{Attachment, Message, MessageKind, MessageParts};
pub use room::Room;
pub use store::MessageStore;
pub use value_object::{ClientId, MessageId, RoomName, Timestamp};
