use plaza_shared::{
    EntityId, Identity, LocationId, OccupantInfo, OccupantStatus, PlaceId, SceneId, ZoneId,
};

/// Where a body currently is. Always replaced as a whole, so an observer
/// never sees a zone from one move paired with a scene from another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BodyLocation {
    pub zone_id: Option<ZoneId>,
    pub scene_id: Option<SceneId>,
    pub place_id: Option<PlaceId>,
    pub location_id: Option<LocationId>,
}

impl BodyLocation {
    pub fn at(
        zone_id: ZoneId,
        scene_id: SceneId,
        place_id: PlaceId,
        location_id: LocationId,
    ) -> Self {
        Self {
            zone_id: Some(zone_id),
            scene_id: Some(scene_id),
            place_id: Some(place_id),
            location_id: Some(location_id),
        }
    }

    /// The same zone and scene, but out of any place
    pub fn vacated(&self) -> Self {
        Self {
            zone_id: self.zone_id,
            scene_id: self.scene_id,
            place_id: None,
            location_id: None,
        }
    }
}

/// The authoritative server-side record of a participant
#[derive(Clone, Debug)]
pub struct Body {
    entity: EntityId,
    identity: Identity,
    location: BodyLocation,
    status: OccupantStatus,
}

impl Body {
    pub(crate) fn new(entity: EntityId, identity: Identity) -> Self {
        Self {
            entity,
            identity,
            location: BodyLocation::default(),
            status: OccupantStatus::Active,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn location(&self) -> BodyLocation {
        self.location
    }

    pub fn zone_id(&self) -> Option<ZoneId> {
        self.location.zone_id
    }

    pub fn scene_id(&self) -> Option<SceneId> {
        self.location.scene_id
    }

    pub fn place_id(&self) -> Option<PlaceId> {
        self.location.place_id
    }

    pub fn status(&self) -> OccupantStatus {
        self.status
    }

    pub fn occupant_info(&self) -> OccupantInfo {
        OccupantInfo {
            entity: self.entity,
            identity: self.identity.clone(),
            status: self.status,
            location_id: self.location.location_id,
        }
    }

    pub(crate) fn relocate(&mut self, location: BodyLocation) -> BodyChange {
        let before = self.location;
        self.location = location;
        BodyChange {
            entity: self.entity,
            identity: self.identity.clone(),
            before,
            after: location,
        }
    }

    pub(crate) fn set_status(&mut self, status: OccupantStatus) {
        self.status = status;
    }
}

/// A committed change of a body's location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyChange {
    pub entity: EntityId,
    pub identity: Identity,
    pub before: BodyLocation,
    pub after: BodyLocation,
}

impl BodyChange {
    pub fn changed_place(&self) -> bool {
        self.before.place_id != self.after.place_id
    }
}
