use thiserror::Error;

use plaza_shared::{EntityId, Identity, PlaceId};

/// Errors that can occur while delivering a message to a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// No session is registered for the identity
    #[error("No session registered for {identity}")]
    NoSession { identity: Identity },

    /// The session exists but currently has no transport bound
    #[error("Session for {identity} is disconnected")]
    Disconnected { identity: Identity },

    /// The transport's outbound channel has been closed
    #[error("Outbound channel for {identity} is closed")]
    ChannelClosed { identity: Identity },
}

/// Errors reported by zone and scene loads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The store has no payload for the key
    #[error("Nothing stored under {key}")]
    NotFound { key: String },

    /// The store failed while loading
    #[error("Store failure: {reason}")]
    Store { reason: String },

    /// The store returned a payload of the wrong kind for the key
    #[error("Expected a {expected} payload")]
    WrongKind { expected: &'static str },

    /// The loader dropped its completion without reporting an outcome
    #[error("Load was abandoned before completing")]
    Abandoned,
}

/// Errors that refuse a commit before any state is touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The moving body no longer exists (its session ended mid-flight)
    #[error("No body for entity {entity}")]
    NoSuchBody { entity: EntityId },

    /// The target place has gone away
    #[error("No place with id {place_id}")]
    NoSuchPlace { place_id: PlaceId },

    /// The target place is at capacity
    #[error("Place {place_id} is full ({capacity} occupants)")]
    PlaceFull { place_id: PlaceId, capacity: usize },
}
