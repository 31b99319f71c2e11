use crate::{
    Argument, Arguments, Fault, GroupId, LocationId, OccupantInfo, PlaceId, SceneId, SceneVersion,
    ZoneId,
};

/// Metadata describing a resolved zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSummary {
    pub zone_id: ZoneId,
    pub name: String,
    /// Scenes that make up this zone. An empty list places no constraint on
    /// which scenes may be entered through the zone.
    pub scene_ids: Vec<SceneId>,
}

impl ZoneSummary {
    pub fn contains_scene(&self, scene_id: &SceneId) -> bool {
        self.scene_ids.is_empty() || self.scene_ids.contains(scene_id)
    }
}

/// A spot within a scene that a body can stand at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub location_id: LocationId,
    /// The cluster this location belongs to, if any
    pub group: Option<GroupId>,
}

/// A loadable area definition within a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneModel {
    pub scene_id: SceneId,
    pub zone_id: ZoneId,
    pub version: SceneVersion,
    pub name: String,
    pub locations: Vec<Location>,
    /// Maximum number of bodies the scene's place will hold
    pub capacity: Option<usize>,
    /// Opaque scene data owned by the store collaborator
    pub data: Vec<u8>,
}

impl SceneModel {
    pub fn location(&self, location_id: &LocationId) -> Option<&Location> {
        self.locations
            .iter()
            .find(|location| location.location_id == *location_id)
    }
}

/// Where a body wants to go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTarget {
    pub zone_id: ZoneId,
    pub scene_id: SceneId,
    pub location_id: LocationId,
}

impl MoveTarget {
    pub fn new(zone_id: ZoneId, scene_id: SceneId, location_id: LocationId) -> Self {
        Self {
            zone_id,
            scene_id,
            location_id,
        }
    }

    /// Argument list for a `MOVE_TO` invocation, carrying the version of the
    /// target scene the caller already holds
    pub fn to_args(&self, scene_version: SceneVersion) -> Vec<Argument> {
        vec![
            Argument::U32(self.zone_id.0),
            Argument::U32(self.scene_id.0),
            Argument::U32(self.location_id.0),
            Argument::U32(scene_version),
        ]
    }

    pub fn from_args(args: &Arguments) -> Result<(Self, SceneVersion), Fault> {
        let target = Self {
            zone_id: ZoneId(args.u32(0)?),
            scene_id: SceneId(args.u32(1)?),
            location_id: LocationId(args.u32(2)?),
        };
        Ok((target, args.u32(3)?))
    }
}

/// Successful reply to a `MOVE_TO` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReply {
    pub place_id: PlaceId,
    pub zone: ZoneSummary,
    pub scene_id: SceneId,
    pub location_id: LocationId,
    /// Cluster of the confirmed location
    pub group: Option<GroupId>,
    /// The full scene model, present only when the caller's cached version
    /// was stale
    pub scene_update: Option<SceneModel>,
    /// Snapshot of the place's occupants right after the move
    pub occupants: Vec<OccupantInfo>,
}

/// Service and method ids understood by the place server
pub mod services {
    use crate::{MethodId, ServiceId};

    /// Basic location services
    pub const LOCATION_SERVICE: ServiceId = ServiceId(1);
    /// Zone services; delegates unknown methods to the location service
    pub const ZONE_SERVICE: ServiceId = ServiceId(2);

    /// Leave the currently occupied place. No arguments.
    pub const LEAVE_PLACE: MethodId = MethodId(1);
    /// Move to a scene in a zone. Arguments: zone, scene, location, cached
    /// scene version (all `u32`).
    pub const MOVE_TO: MethodId = MethodId(2);
}
