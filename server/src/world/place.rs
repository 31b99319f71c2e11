use plaza_shared::{OccupantSet, PlaceId, SceneId, ZoneId};

/// The live room hosting the occupants of one scene
#[derive(Debug)]
pub struct Place {
    id: PlaceId,
    zone_id: ZoneId,
    scene_id: SceneId,
    capacity: Option<usize>,
    occupants: OccupantSet,
}

impl Place {
    pub(crate) fn new(
        id: PlaceId,
        zone_id: ZoneId,
        scene_id: SceneId,
        capacity: Option<usize>,
    ) -> Self {
        Self {
            id,
            zone_id,
            scene_id,
            capacity,
            occupants: OccupantSet::new(),
        }
    }

    pub fn id(&self) -> PlaceId {
        self.id
    }

    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn scene_id(&self) -> SceneId {
        self.scene_id
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn occupants(&self) -> &OccupantSet {
        &self.occupants
    }

    pub fn is_full(&self) -> bool {
        self.capacity
            .map(|capacity| self.occupants.len() >= capacity)
            .unwrap_or(false)
    }

    pub(crate) fn occupants_mut(&mut self) -> &mut OccupantSet {
        &mut self.occupants
    }
}
