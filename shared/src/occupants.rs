use std::collections::HashMap;

use crate::{EntityId, Identity, LocationId};

/// Name of the occupant collection every place publishes
pub const OCCUPANTS: &str = "occupants";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupantStatus {
    Active,
    /// The occupant's session lost its connection and may yet resume
    Disconnected,
}

/// What other participants know about an occupant of a place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupantInfo {
    pub entity: EntityId,
    pub identity: Identity,
    pub status: OccupantStatus,
    pub location_id: Option<LocationId>,
}

/// A single change to an occupant collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDelta {
    Added(OccupantInfo),
    Updated(OccupantInfo),
    Removed(EntityId),
}

/// A change to a named occupant collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupantDelta {
    pub collection: String,
    pub delta: SetDelta,
}

impl OccupantDelta {
    pub fn occupants(delta: SetDelta) -> Self {
        Self {
            collection: OCCUPANTS.to_string(),
            delta,
        }
    }
}

/// The set of occupants of a place, keyed by entity. Order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupantSet {
    entries: HashMap<EntityId, OccupantInfo>,
}

impl OccupantSet {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn from_infos(infos: impl IntoIterator<Item = OccupantInfo>) -> Self {
        let mut set = Self::new();
        for info in infos {
            set.entries.insert(info.entity, info);
        }
        set
    }

    /// Returns true if the entity was not already present
    pub fn insert(&mut self, info: OccupantInfo) -> bool {
        self.entries.insert(info.entity, info).is_none()
    }

    /// Returns false if the entity is not present
    pub fn update(&mut self, info: OccupantInfo) -> bool {
        match self.entries.get_mut(&info.entity) {
            Some(existing) => {
                *existing = info;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, entity: &EntityId) -> Option<OccupantInfo> {
        self.entries.remove(entity)
    }

    pub fn contains(&self, entity: &EntityId) -> bool {
        self.entries.contains_key(entity)
    }

    pub fn get(&self, entity: &EntityId) -> Option<&OccupantInfo> {
        self.entries.get(entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OccupantInfo> {
        self.entries.values()
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.entries.values().map(|info| &info.identity)
    }

    pub fn to_vec(&self) -> Vec<OccupantInfo> {
        self.entries.values().cloned().collect()
    }

    /// Apply a delta observed from the authoritative collection. An update
    /// for an unknown entity is treated as an add, so a missed add does not
    /// leave the snapshot permanently short.
    pub fn apply(&mut self, delta: &SetDelta) {
        match delta {
            SetDelta::Added(info) | SetDelta::Updated(info) => {
                self.entries.insert(info.entity, info.clone());
            }
            SetDelta::Removed(entity) => {
                self.entries.remove(entity);
            }
        }
    }
}
