use std::{rc::Rc, time::Instant};

use log::{info, warn};
use smol::channel::{self, Receiver, Sender};

use plaza_shared::{
    services::{LOCATION_SERVICE, ZONE_SERVICE},
    Identity, InvocationRequest, OccupantStatus, SceneId, ServerMessage, ServiceId, ZoneId,
};

use crate::{
    events::ServerEvents,
    resolution::{Bundle, Loader, ResolutionKey},
    router::{InvocationRouter, ServiceTable},
    session::{ConnectionId, SessionEvent, SessionRegistry},
    transition::{location_service, zone_service, TransitionPipeline},
    world::World,
    zone::ZoneRegistry,
    Outbox, SendError, ServerConfig, Simulation,
};

/// The authoritative place server.
///
/// Transport workers talk to the server through its [`SessionRegistry`] and
/// [`ServerHandle`]s, from any thread. Everything else (bodies, places, the
/// resolution cache and in-flight moves) belongs to the simulation context,
/// which is whichever thread calls [`receive`](PlaceServer::receive) once
/// per tick.
pub struct PlaceServer {
    config: ServerConfig,
    registry: SessionRegistry,
    session_events: Receiver<SessionEvent>,
    request_sender: Sender<(Identity, InvocationRequest)>,
    request_receiver: Receiver<(Identity, InvocationRequest)>,
    router: InvocationRouter<Simulation>,
    sim: Simulation,
}

impl PlaceServer {
    /// Create a new PlaceServer, loading zones and scenes through `loader`
    pub fn new<L: Loader<ResolutionKey, Bundle> + 'static>(config: ServerConfig, loader: L) -> Self {
        let (registry, session_events) = SessionRegistry::new();
        let (request_sender, request_receiver) = channel::unbounded();
        let outbox: Rc<dyn Outbox> = Rc::new(registry.clone());

        let mut router = InvocationRouter::new(outbox.clone());
        router.register(LOCATION_SERVICE, location_service());
        router.register(ZONE_SERVICE, zone_service());

        let sim = Simulation {
            world: World::new(&config.cache, loader, outbox),
            zones: ZoneRegistry::new(),
            pipeline: TransitionPipeline::new(),
        };

        Self {
            config,
            registry,
            session_events,
            request_sender,
            request_receiver,
            router,
            sim,
        }
    }

    /// Must be called regularly; performs one tick of the simulation
    /// context and returns what happened during it
    pub fn receive(&mut self, now: Instant) -> ServerEvents {
        let mut events = ServerEvents::new();

        self.apply_session_events(&mut events);
        self.registry
            .expire_sessions(now, self.config.session_grace);
        self.apply_session_events(&mut events);

        while let Ok((caller, request)) = self.request_receiver.try_recv() {
            self.router.dispatch(&mut self.sim, &caller, request);
        }

        // a settled load can let a move start its next load, which may
        // itself complete before the next tick
        loop {
            if self.sim.world.cache_mut().maintain() == 0 {
                break;
            }
            let Simulation {
                world,
                zones,
                pipeline,
            } = &mut self.sim;
            pipeline.advance(world, zones);
        }

        events.push_location_changes(self.sim.world.take_changes());
        events
    }

    // Services

    /// Registers an additional service, alongside the built-in location and
    /// zone services
    pub fn register_service(&mut self, service: ServiceId, table: ServiceTable<Simulation>) {
        self.router.register(service, table);
    }

    /// Queue a request from a caller that is already known by identity
    pub fn request_received(&self, caller: Identity, request: InvocationRequest) {
        let _ = self.request_sender.try_send((caller, request));
    }

    // Sessions

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// A cloneable handle that transport workers use to hand requests over
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            registry: self.registry.clone(),
            requests: self.request_sender.clone(),
        }
    }

    /// Explicitly ends an identity's session, e.g. on logout
    pub fn end_session(&mut self, identity: &Identity) -> bool {
        self.registry.end_session(identity)
    }

    // Bodies & Places

    pub fn world(&self) -> &World {
        &self.sim.world
    }

    pub fn zones_mut(&mut self) -> &mut ZoneRegistry {
        &mut self.sim.zones
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Ejects the identity's body from its place and tells its client to
    /// move to `scene_id` of `zone_id` on its own
    pub fn move_body(
        &mut self,
        identity: &Identity,
        zone_id: ZoneId,
        scene_id: SceneId,
    ) -> Result<(), SendError> {
        let Some(entity) = self.sim.world.entity_for(identity) else {
            return Err(SendError::NoSession {
                identity: identity.clone(),
            });
        };
        self.sim.world.leave_place(entity);
        info!(
            "Forcing move [identity={}, zone={}, scene={}]",
            identity, zone_id, scene_id
        );
        self.registry
            .send_to(identity, ServerMessage::ForcedMove { zone_id, scene_id })
    }

    // Private methods

    fn apply_session_events(&mut self, events: &mut ServerEvents) {
        while let Ok(event) = self.session_events.try_recv() {
            match event {
                SessionEvent::Started { key, identity } => {
                    self.sim.world.create_body(&identity);
                    events.push_start(key, identity);
                }
                SessionEvent::Resumed { key, identity } => {
                    self.sim.world.create_body(&identity);
                    self.sim
                        .world
                        .set_status(&identity, OccupantStatus::Active);
                    events.push_resume(key, identity);
                }
                SessionEvent::Disconnected {
                    key,
                    identity,
                    cause,
                } => {
                    self.sim
                        .world
                        .set_status(&identity, OccupantStatus::Disconnected);
                    events.push_disconnection(key, identity, cause);
                }
                SessionEvent::Ended { key, identity } => {
                    self.sim.world.remove_body(&identity);
                    events.push_end(key, identity);
                }
            }
        }
    }
}

/// Hands decoded requests from transport workers to the simulation context
#[derive(Clone)]
pub struct ServerHandle {
    registry: SessionRegistry,
    requests: Sender<(Identity, InvocationRequest)>,
}

impl ServerHandle {
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Queue a request that arrived on `connection`. Requests from a
    /// connection with no session are dropped.
    pub fn request_received(&self, connection: ConnectionId, request: InvocationRequest) {
        let Some(caller) = self.registry.identity_for(&connection) else {
            warn!(
                "Request from unmapped connection dropped [conn={}, request={}]",
                connection, request.request_id
            );
            return;
        };
        if self.requests.try_send((caller, request)).is_err() {
            warn!("Request dropped, server has shut down [conn={}]", connection);
        }
    }
}
