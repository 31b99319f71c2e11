use plaza_shared::{Identity, ServerMessage};

use crate::SendError;

/// Delivers server messages to a session by identity. Implemented by the
/// session registry; anything that replies to or notifies clients goes
/// through this seam.
pub trait Outbox {
    fn deliver(&self, identity: &Identity, message: ServerMessage) -> Result<(), SendError>;
}
