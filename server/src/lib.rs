//! # Plaza Server
//! An authoritative place server. Participants keep a session across
//! reconnects, invoke services through a routing table, and move their
//! bodies between the places hosting each scene of a zone. Zones and scenes
//! are loaded on demand through a single-flight resolution cache.

#![deny(unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

mod error;
mod events;
mod outbox;
mod resolution;
mod router;
mod server;
mod session;
mod transition;
mod world;
mod zone;

pub use error::{CommitError, LoadError, SendError};
pub use events::{
    DisconnectSessionEvent, EndSessionEvent, LocationChangeEvent, ResumeSessionEvent,
    ServerEvent, ServerEvents, StartSessionEvent,
};
pub use outbox::Outbox;
pub use resolution::*;
pub use router::{Handler, InvocationRouter, ResponseListener, ServiceTable};
pub use server::{CacheConfig, PlaceServer, ServerConfig, ServerHandle, Simulation};
pub use session::{
    ConnectionHandle, ConnectionId, Session, SessionEvent, SessionKey, SessionRegistry,
    SessionState,
};
pub use transition::{MoveRequest, TransitionPipeline};
pub use world::{Body, BodyChange, BodyLocation, Place, World};
pub use zone::{OpenZonePolicy, ZonePolicy, ZoneRegistry};
