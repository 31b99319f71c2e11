use std::{collections::HashMap, mem, rc::Rc};

use log::{debug, info, warn};

use plaza_shared::{
    EntityId, Identity, KeyGenerator, LocationId, OccupantDelta, OccupantStatus, PlaceId,
    SceneId, SceneModel, ServerMessage, SetDelta, ZoneId,
};

use crate::{
    resolution::{Bundle, Loader, ResolutionCache, ResolutionKey},
    world::{Body, BodyChange, BodyLocation, Place},
    CacheConfig, CommitError, Outbox,
};

/// Owns every body and place, plus the resolution cache their zones and
/// scenes come from. Lives on the simulation context only.
///
/// Each occupant of a place holds one reference on the place's zone and
/// scene cache entries, so anything somebody is standing in stays
/// resolved.
pub struct World {
    bodies: HashMap<EntityId, Body>,
    by_identity: HashMap<Identity, EntityId>,
    places: HashMap<PlaceId, Place>,
    scene_places: HashMap<SceneId, PlaceId>,
    cache: ResolutionCache<ResolutionKey, Bundle>,
    entity_keys: KeyGenerator<EntityId>,
    place_keys: KeyGenerator<PlaceId>,
    outbox: Rc<dyn Outbox>,
    changes: Vec<BodyChange>,
}

impl World {
    pub fn new<L: Loader<ResolutionKey, Bundle> + 'static>(
        cache_config: &CacheConfig,
        loader: L,
        outbox: Rc<dyn Outbox>,
    ) -> Self {
        Self {
            bodies: HashMap::new(),
            by_identity: HashMap::new(),
            places: HashMap::new(),
            scene_places: HashMap::new(),
            cache: ResolutionCache::new(cache_config, loader),
            entity_keys: KeyGenerator::new(),
            place_keys: KeyGenerator::new(),
            outbox,
            changes: Vec::new(),
        }
    }

    // Bodies

    /// Creates the body for a newly started session. An identity that
    /// already has a body keeps it.
    pub fn create_body(&mut self, identity: &Identity) -> EntityId {
        if let Some(entity) = self.by_identity.get(identity) {
            return *entity;
        }
        let entity = self.entity_keys.generate();
        self.bodies
            .insert(entity, Body::new(entity, identity.clone()));
        self.by_identity.insert(identity.clone(), entity);
        debug!("Created body {} [identity={}]", entity, identity);
        entity
    }

    /// Removes the body of an ended session, taking it out of its place
    pub fn remove_body(&mut self, identity: &Identity) -> Option<Body> {
        let entity = self.by_identity.remove(identity)?;
        self.leave_place(entity);
        let body = self.bodies.remove(&entity);
        debug!("Removed body {} [identity={}]", entity, identity);
        body
    }

    pub fn entity_for(&self, identity: &Identity) -> Option<EntityId> {
        self.by_identity.get(identity).copied()
    }

    pub fn body(&self, entity: &EntityId) -> Option<&Body> {
        self.bodies.get(entity)
    }

    pub fn body_for(&self, identity: &Identity) -> Option<&Body> {
        self.entity_for(identity)
            .and_then(|entity| self.bodies.get(&entity))
    }

    pub fn bodies_count(&self) -> usize {
        self.bodies.len()
    }

    /// Marks the body's occupant entry active or disconnected, notifying
    /// the rest of its place
    pub fn set_status(&mut self, identity: &Identity, status: OccupantStatus) {
        let Some(entity) = self.entity_for(identity) else {
            return;
        };
        let Some(body) = self.bodies.get_mut(&entity) else {
            return;
        };
        if body.status() == status {
            return;
        }
        body.set_status(status);
        let info = body.occupant_info();
        let Some(place_id) = body.place_id() else {
            return;
        };
        if let Some(place) = self.places.get_mut(&place_id) {
            place.occupants_mut().update(info.clone());
            self.broadcast(place_id, SetDelta::Updated(info), None);
        }
    }

    // Places

    pub fn place(&self, place_id: &PlaceId) -> Option<&Place> {
        self.places.get(place_id)
    }

    pub fn place_for_scene_id(&self, scene_id: &SceneId) -> Option<PlaceId> {
        self.scene_places.get(scene_id).copied()
    }

    pub fn places_count(&self) -> usize {
        self.places.len()
    }

    /// The place hosting `model`'s scene. Created on first use and dropped
    /// again once its last occupant leaves, so a place that is recreated
    /// picks up the capacity of the scene model it is recreated from.
    pub fn place_for_scene(&mut self, model: &SceneModel) -> PlaceId {
        if let Some(place_id) = self.scene_places.get(&model.scene_id) {
            return *place_id;
        }
        let place_id = self.place_keys.generate();
        self.places.insert(
            place_id,
            Place::new(place_id, model.zone_id, model.scene_id, model.capacity),
        );
        self.scene_places.insert(model.scene_id, place_id);
        info!(
            "Place created [place={}, scene={}, name={}]",
            place_id, model.scene_id, model.name
        );
        place_id
    }

    // Movement

    /// Moves a body into a place as a single change: every precondition is
    /// checked before anything is touched, so a refused commit leaves the
    /// body, both places and the cache references exactly as they were.
    pub fn commit_move(
        &mut self,
        entity: EntityId,
        zone_id: ZoneId,
        place_id: PlaceId,
        location_id: LocationId,
    ) -> Result<BodyChange, CommitError> {
        let Some(body) = self.bodies.get_mut(&entity) else {
            self.drop_place_if_empty(place_id);
            return Err(CommitError::NoSuchBody { entity });
        };
        let Some(place) = self.places.get(&place_id) else {
            return Err(CommitError::NoSuchPlace { place_id });
        };
        let entering = body.place_id() != Some(place_id);
        if entering && place.is_full() {
            let capacity = place.capacity().unwrap_or_default();
            self.drop_place_if_empty(place_id);
            return Err(CommitError::PlaceFull { place_id, capacity });
        }

        let scene_id = place.scene_id();
        let after = BodyLocation::at(zone_id, scene_id, place_id, location_id);
        let change = body.relocate(after);
        let info = body.occupant_info();

        if entering {
            self.vacate(&change);
            if let Some(place) = self.places.get_mut(&place_id) {
                place.occupants_mut().insert(info.clone());
            }
            self.cache.retain(&ResolutionKey::Zone(zone_id));
            self.cache.retain(&ResolutionKey::Scene(scene_id));
            self.broadcast(place_id, SetDelta::Added(info), None);
        } else {
            if let Some(place) = self.places.get_mut(&place_id) {
                place.occupants_mut().update(info.clone());
            }
            self.broadcast(place_id, SetDelta::Updated(info), None);
        }

        debug!(
            "Committed move [entity={}, from={:?}, to={:?}]",
            entity, change.before.place_id, change.after.place_id
        );
        self.changes.push(change.clone());
        Ok(change)
    }

    /// Takes the body out of whatever place it occupies. The body keeps its
    /// zone and scene. Returns `None` if it was not in a place.
    pub fn leave_place(&mut self, entity: EntityId) -> Option<BodyChange> {
        let body = self.bodies.get_mut(&entity)?;
        body.place_id()?;
        let vacated = body.location().vacated();
        let change = body.relocate(vacated);
        self.vacate(&change);
        debug!(
            "Left place [entity={}, place={:?}]",
            entity, change.before.place_id
        );
        self.changes.push(change.clone());
        Some(change)
    }

    /// Body changes committed since the last call
    pub fn take_changes(&mut self) -> Vec<BodyChange> {
        mem::take(&mut self.changes)
    }

    // Cache

    pub fn cache(&self) -> &ResolutionCache<ResolutionKey, Bundle> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResolutionCache<ResolutionKey, Bundle> {
        &mut self.cache
    }

    // Private methods

    fn vacate(&mut self, change: &BodyChange) {
        let BodyLocation {
            zone_id: Some(zone_id),
            scene_id: Some(scene_id),
            place_id: Some(place_id),
            ..
        } = change.before
        else {
            return;
        };
        let Some(place) = self.places.get_mut(&place_id) else {
            warn!(
                "Body left a place that no longer exists [entity={}, place={}]",
                change.entity, place_id
            );
            return;
        };
        place.occupants_mut().remove(&change.entity);
        self.broadcast(
            place_id,
            SetDelta::Removed(change.entity),
            Some(&change.identity),
        );
        self.cache.release(&ResolutionKey::Zone(zone_id));
        self.cache.release(&ResolutionKey::Scene(scene_id));
        self.drop_place_if_empty(place_id);
    }

    fn drop_place_if_empty(&mut self, place_id: PlaceId) {
        let Some(place) = self.places.get(&place_id) else {
            return;
        };
        if !place.occupants().is_empty() {
            return;
        }
        let scene_id = place.scene_id();
        self.places.remove(&place_id);
        if self.scene_places.get(&scene_id) == Some(&place_id) {
            self.scene_places.remove(&scene_id);
        }
        info!("Place dropped [place={}, scene={}]", place_id, scene_id);
    }

    fn broadcast(&self, place_id: PlaceId, delta: SetDelta, also: Option<&Identity>) {
        let Some(place) = self.places.get(&place_id) else {
            return;
        };
        let mut recipients: Vec<&Identity> = place.occupants().identities().collect();
        if let Some(also) = also {
            if !recipients.contains(&also) {
                recipients.push(also);
            }
        }
        let delta = OccupantDelta::occupants(delta);
        for identity in recipients {
            let message = ServerMessage::Occupants {
                place_id,
                delta: delta.clone(),
            };
            if let Err(error) = self.outbox.deliver(identity, message) {
                debug!("Occupant update not delivered [place={}]: {}", place_id, error);
            }
        }
    }
}
