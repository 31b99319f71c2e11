use std::collections::{HashMap, VecDeque};

use log::{debug, info, warn};

use plaza_shared::{EntityId, Fault, MoveReply, Reply, SceneModel, ZoneSummary};

use crate::{
    resolution::{Bundle, Resolution, ResolutionKey},
    router::ResponseListener,
    transition::MoveRequest,
    world::World,
    zone::ZoneRegistry,
};

enum Stage {
    ResolvingZone(Resolution<Bundle>),
    ResolvingScene {
        zone: ZoneSummary,
        resolution: Resolution<Bundle>,
    },
}

struct InFlight {
    request: MoveRequest,
    stage: Stage,
    // cache keys this request references until it finishes
    held: Vec<ResolutionKey>,
}

/// Carries move requests through zone resolution, ratification, scene
/// resolution and the commit, replying to each exactly once.
///
/// Every stage that waits on a load parks the request here; [`advance`]
/// picks parked requests back up once the cache has settled their loads.
/// A body has at most one request in flight. Requests that arrive while
/// one is in flight are queued and run in arrival order.
///
/// [`advance`]: TransitionPipeline::advance
pub struct TransitionPipeline {
    in_flight: HashMap<EntityId, InFlight>,
    queued: HashMap<EntityId, VecDeque<MoveRequest>>,
}

impl TransitionPipeline {
    pub fn new() -> Self {
        Self {
            in_flight: HashMap::new(),
            queued: HashMap::new(),
        }
    }

    /// Starts a move, or queues it behind the body's in-flight move
    pub fn begin(&mut self, world: &mut World, zones: &mut ZoneRegistry, request: MoveRequest) {
        let entity = request.entity;
        if self.in_flight.contains_key(&entity) {
            debug!(
                "Queueing move behind in-flight request [entity={}, request={}]",
                entity,
                request.listener.request_id()
            );
            self.queued.entry(entity).or_default().push_back(request);
            return;
        }
        self.start(world, zones, request);
    }

    /// Steps every parked request whose loads have settled. Returns how many
    /// requests reached their terminal reply.
    pub fn advance(&mut self, world: &mut World, zones: &mut ZoneRegistry) -> usize {
        let entities: Vec<EntityId> = self.in_flight.keys().copied().collect();
        let mut finished = 0;
        for entity in entities {
            let Some(flight) = self.in_flight.remove(&entity) else {
                continue;
            };
            match step(flight, world, zones) {
                Some(flight) => {
                    self.in_flight.insert(entity, flight);
                }
                None => {
                    finished += 1;
                    if let Some(next) = self.next_queued(&entity) {
                        finished += self.start(world, zones, next);
                    }
                }
            }
        }
        finished
    }

    pub fn is_moving(&self, entity: &EntityId) -> bool {
        self.in_flight.contains_key(entity)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued_count(&self, entity: &EntityId) -> usize {
        self.queued.get(entity).map(VecDeque::len).unwrap_or(0)
    }

    // Private methods

    /// Runs requests for one body until one has to wait. Returns how many
    /// finished without waiting.
    fn start(&mut self, world: &mut World, zones: &mut ZoneRegistry, request: MoveRequest) -> usize {
        let mut finished = 0;
        let mut next = Some(request);
        while let Some(request) = next.take() {
            let entity = request.entity;
            debug!(
                "Beginning move [entity={}, zone={}, scene={}]",
                entity, request.target.zone_id, request.target.scene_id
            );
            let key = ResolutionKey::Zone(request.target.zone_id);
            let resolution = world.cache_mut().resolve(key);
            world.cache_mut().retain(&key);
            let flight = InFlight {
                request,
                stage: Stage::ResolvingZone(resolution),
                held: vec![key],
            };
            match step(flight, world, zones) {
                Some(flight) => {
                    self.in_flight.insert(entity, flight);
                }
                None => {
                    finished += 1;
                    next = self.next_queued(&entity);
                }
            }
        }
        finished
    }

    fn next_queued(&mut self, entity: &EntityId) -> Option<MoveRequest> {
        let queue = self.queued.get_mut(entity)?;
        let next = queue.pop_front();
        if queue.is_empty() {
            self.queued.remove(entity);
        }
        next
    }
}

impl Default for TransitionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves a request forward as far as it can go. Returns it if it is still
/// waiting on a load, or `None` once it has replied.
fn step(flight: InFlight, world: &mut World, zones: &mut ZoneRegistry) -> Option<InFlight> {
    let InFlight {
        request,
        mut stage,
        mut held,
    } = flight;

    loop {
        stage = match stage {
            Stage::ResolvingZone(mut resolution) => {
                let Some(outcome) = resolution.try_take() else {
                    return Some(InFlight {
                        request,
                        stage: Stage::ResolvingZone(resolution),
                        held,
                    });
                };

                let zone = match outcome.and_then(Bundle::into_zone) {
                    Ok(zone) => zone,
                    Err(error) => {
                        warn!(
                            "Unable to resolve zone [zone={}, reason={}]",
                            request.target.zone_id, error
                        );
                        finish(world, request.listener, held, Err(Fault::NoSuchZone));
                        return None;
                    }
                };

                let Some(body) = world.body(&request.entity) else {
                    let fault = Fault::Internal(format!("no body for entity {}", request.entity));
                    finish(world, request.listener, held, Err(fault));
                    return None;
                };
                if let Some(reason) = zones.ratify_body_entry(body, &zone) {
                    info!(
                        "Zone entry vetoed [identity={}, zone={}, reason={}]",
                        body.identity(),
                        zone.zone_id,
                        reason
                    );
                    finish(world, request.listener, held, Err(Fault::Vetoed(reason)));
                    return None;
                }

                let key = ResolutionKey::Scene(request.target.scene_id);
                let resolution = world.cache_mut().resolve(key);
                world.cache_mut().retain(&key);
                held.push(key);
                Stage::ResolvingScene { zone, resolution }
            }
            Stage::ResolvingScene {
                zone,
                mut resolution,
            } => {
                let Some(outcome) = resolution.try_take() else {
                    return Some(InFlight {
                        request,
                        stage: Stage::ResolvingScene { zone, resolution },
                        held,
                    });
                };

                let zone_id = zone.zone_id;
                let result = match outcome.and_then(Bundle::into_scene) {
                    Ok(model) => commit(world, &request, zone, model),
                    Err(error) => {
                        // scenes are presented to callers as places
                        warn!(
                            "Unable to resolve scene [scene={}, reason={}]",
                            request.target.scene_id, error
                        );
                        Err(Fault::NoSuchPlace)
                    }
                };
                let entered = result.is_ok();
                let entity = request.entity;
                finish(world, request.listener, held, result);

                if entered {
                    if let Some(body) = world.body(&entity) {
                        zones.body_did_enter_zone(body, zone_id);
                    }
                }
                return None;
            }
        };
    }
}

fn commit(
    world: &mut World,
    request: &MoveRequest,
    zone: ZoneSummary,
    model: SceneModel,
) -> Result<Reply, Fault> {
    let MoveRequest {
        entity,
        target,
        scene_version,
        ..
    } = request;

    if !zone.contains_scene(&model.scene_id) {
        warn!(
            "Scene is not part of zone [zone={}, scene={}]",
            zone.zone_id, model.scene_id
        );
        return Err(Fault::NoSuchPlace);
    }

    let place_id = world.place_for_scene(&model);
    let change = world
        .commit_move(*entity, zone.zone_id, place_id, target.location_id)
        .map_err(|error| {
            warn!("Move refused [entity={}, reason={}]", entity, error);
            Fault::Internal(error.to_string())
        })?;

    info!(
        "Body moved [identity={}, zone={}, scene={}, place={}]",
        change.identity, zone.zone_id, model.scene_id, place_id
    );

    let group = model
        .location(&target.location_id)
        .and_then(|location| location.group);
    let occupants = world
        .place(&place_id)
        .map(|place| place.occupants().to_vec())
        .unwrap_or_default();
    let scene_id = model.scene_id;
    let scene_update = if *scene_version < model.version {
        Some(model)
    } else {
        None
    };

    Ok(Reply::Moved(MoveReply {
        place_id,
        zone,
        scene_id,
        location_id: target.location_id,
        group,
        scene_update,
        occupants,
    }))
}

fn finish(
    world: &mut World,
    listener: ResponseListener,
    held: Vec<ResolutionKey>,
    result: Result<Reply, Fault>,
) {
    listener.reply(result);
    for key in held {
        world.cache_mut().release(&key);
    }
}

