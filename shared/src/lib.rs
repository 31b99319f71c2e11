//! # Plaza Shared
//! Common functionality shared between plaza-server & plaza-client crates:
//! identifiers, the fault taxonomy, invocation messages, zone and scene
//! models, and occupant collections.

#![deny(unstable_features, unused_import_braces)]

mod fault;
mod invocation;
mod key_generator;
mod messages;
mod occupants;
mod types;
mod zone;

pub use fault::{codes, Fault};
pub use invocation::{Argument, Arguments, InvocationRequest, InvocationResponse, Reply};
pub use key_generator::KeyGenerator;
pub use messages::ServerMessage;
pub use occupants::{
    OccupantDelta, OccupantInfo, OccupantSet, OccupantStatus, SetDelta, OCCUPANTS,
};
pub use types::{
    EntityId, GroupId, Identity, Key, LocationId, MethodId, PlaceId, RequestId, SceneId,
    SceneVersion, ServiceId, ZoneId,
};
pub use zone::{services, Location, MoveReply, MoveTarget, SceneModel, ZoneSummary};
