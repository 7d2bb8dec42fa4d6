//! Wire encoding interface.

use super::{error::ValidationError, message::Message, value_object::ClientId};

/// Converts between frame payloads and [`Message`] values.
pub trait MessageCodec: Send + Sync {
    /// Decode and validate an inbound payload.
    ///
    /// `connection_id` is the identity of the connection the payload arrived
    /// on; it is used as the sender when the payload does not name one.
    fn decode(&self, payload: &str, connection_id: &ClientId) -> Result<Message, ValidationError>;

    /// Encode an outbound message.
    fn encode(&self, message: &Message) -> Result<String, ValidationError>;
}
