use log::{debug, info, warn};

use plaza_shared::{
    services::{MOVE_TO, ZONE_SERVICE},
    Fault, GroupId, InvocationRequest, InvocationResponse, KeyGenerator, LocationId, MoveReply,
    MoveTarget, PlaceId, Reply, RequestId, SceneId, ServerMessage, ZoneId,
};

use crate::{
    ClientConfig, GroupSubscriber, MembershipObserver, MembershipTracker, RequestSender,
    SceneCache, TransitionObserver,
};

struct PendingTransition {
    request_id: RequestId,
    target: MoveTarget,
    observer: Box<dyn TransitionObserver>,
}

/// Where the server last confirmed this client to be
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientLocation {
    pub zone_id: ZoneId,
    pub scene_id: SceneId,
    pub place_id: PlaceId,
    pub location_id: LocationId,
}

// Server-initiated moves have nobody waiting on them
struct ForcedMoveObserver;

impl TransitionObserver for ForcedMoveObserver {
    fn transition_succeeded(&mut self, target: &MoveTarget, reply: &MoveReply) {
        info!(
            "Forced move completed [zone={}, scene={}, place={}]",
            target.zone_id, target.scene_id, reply.place_id
        );
    }

    fn transition_failed(&mut self, target: &MoveTarget, fault: &Fault) {
        warn!(
            "Forced move failed [zone={}, scene={}, code={}]",
            target.zone_id,
            target.scene_id,
            fault.code()
        );
    }
}

/// Client-side counterpart of the place server's transition pipeline.
///
/// At most one transition is pending at a time; a second request is refused
/// with [`Fault::AlreadyPending`] without anything being sent. All state is
/// mutated from the thread that calls into the coordinator.
pub struct ClientTransitionCoordinator<S: RequestSender, G: GroupSubscriber> {
    sender: S,
    subscriber: G,
    request_ids: KeyGenerator<RequestId>,
    pending: Option<PendingTransition>,
    location: Option<ClientLocation>,
    group: Option<GroupId>,
    scenes: SceneCache,
    membership: MembershipTracker,
}

impl<S: RequestSender, G: GroupSubscriber> ClientTransitionCoordinator<S, G> {
    pub fn new(config: ClientConfig, sender: S, subscriber: G) -> Self {
        Self {
            sender,
            subscriber,
            request_ids: KeyGenerator::new(),
            pending: None,
            location: None,
            group: None,
            scenes: SceneCache::new(),
            membership: MembershipTracker::new(config.identity),
        }
    }

    /// Ask the server to move this client's body to `target`. The outcome
    /// is reported to `observer` once the reply arrives.
    pub fn request_transition(
        &mut self,
        target: MoveTarget,
        observer: Box<dyn TransitionObserver>,
    ) -> Result<RequestId, Fault> {
        if let Some(pending) = &self.pending {
            debug!(
                "Refusing transition while request {} is pending [zone={}, scene={}]",
                pending.request_id, target.zone_id, target.scene_id
            );
            return Err(Fault::AlreadyPending);
        }

        let request_id = self.request_ids.generate();
        let scene_version = self.scenes.version(&target.scene_id);
        let request = InvocationRequest {
            request_id,
            service_id: ZONE_SERVICE,
            method_id: MOVE_TO,
            args: target.to_args(scene_version),
        };

        self.pending = Some(PendingTransition {
            request_id,
            target,
            observer,
        });

        if let Err(fault) = self.sender.send_request(request) {
            warn!("Unable to send transition request {}: {}", request_id, fault);
            self.pending = None;
            return Err(Fault::transport(fault.to_string()));
        }

        debug!(
            "Requested transition {} [zone={}, scene={}, location={}, version={}]",
            request_id, target.zone_id, target.scene_id, target.location_id, scene_version
        );
        Ok(request_id)
    }

    /// Routes everything the server pushes down to this client
    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Response(response) => self.handle_response(response),
            ServerMessage::Occupants { place_id, delta } => {
                self.membership.apply(place_id, &delta);
            }
            ServerMessage::ForcedMove { zone_id, scene_id } => {
                self.forced_move(zone_id, scene_id);
            }
        }
    }

    /// Applies the reply to the pending transition. Replies to anything else
    /// are stale and ignored.
    pub fn handle_response(&mut self, response: InvocationResponse) {
        let matches = self
            .pending
            .as_ref()
            .map(|pending| pending.request_id == response.request_id)
            .unwrap_or(false);
        if !matches {
            warn!(
                "Ignoring reply to request {} which is not pending",
                response.request_id
            );
            return;
        }
        let Some(PendingTransition {
            target,
            mut observer,
            ..
        }) = self.pending.take()
        else {
            return;
        };

        match response.result {
            Ok(Reply::Moved(reply)) => {
                self.apply_move(&reply);
                observer.transition_succeeded(&target, &reply);
            }
            Ok(other) => {
                let fault = Fault::Internal(format!("unexpected reply to move: {:?}", other));
                warn!("{}", fault);
                observer.transition_failed(&target, &fault);
            }
            Err(fault) => {
                info!(
                    "Transition failed [zone={}, scene={}, code={}]",
                    target.zone_id,
                    target.scene_id,
                    fault.code()
                );
                observer.transition_failed(&target, &fault);
            }
        }
    }

    /// The connection went away: whatever was pending will never be
    /// answered
    pub fn connection_lost(&mut self) {
        let Some(PendingTransition {
            request_id,
            target,
            mut observer,
        }) = self.pending.take()
        else {
            return;
        };
        debug!("Connection lost with request {} pending", request_id);
        observer.transition_failed(&target, &Fault::transport("connection lost"));
    }

    // Queries

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_target(&self) -> Option<&MoveTarget> {
        self.pending.as_ref().map(|pending| &pending.target)
    }

    pub fn location(&self) -> Option<ClientLocation> {
        self.location
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn scenes(&self) -> &SceneCache {
        &self.scenes
    }

    pub fn membership(&self) -> &MembershipTracker {
        &self.membership
    }

    pub fn add_membership_observer(&mut self, observer: Box<dyn MembershipObserver>) {
        self.membership.add_observer(observer);
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn subscriber(&self) -> &G {
        &self.subscriber
    }

    // Private methods

    fn apply_move(&mut self, reply: &MoveReply) {
        if let Some(model) = &reply.scene_update {
            debug!(
                "Caching scene {} version {}",
                model.scene_id, model.version
            );
            self.scenes.insert(model.clone());
        }

        self.location = Some(ClientLocation {
            zone_id: reply.zone.zone_id,
            scene_id: reply.scene_id,
            place_id: reply.place_id,
            location_id: reply.location_id,
        });

        if self.group != reply.group {
            if let Some(old) = self.group.take() {
                self.subscriber.unsubscribe(old);
            }
            if let Some(new) = reply.group {
                self.subscriber.subscribe(new);
            }
            self.group = reply.group;
        }

        self.membership.reset(reply.place_id, &reply.occupants);
    }

    fn forced_move(&mut self, zone_id: ZoneId, scene_id: SceneId) {
        if self.pending.is_some() {
            info!(
                "Forced move ignored, a transition is already pending [zone={}, scene={}]",
                zone_id, scene_id
            );
            return;
        }
        let target = MoveTarget::new(zone_id, scene_id, LocationId(0));
        if let Err(fault) = self.request_transition(target, Box::new(ForcedMoveObserver)) {
            warn!("Unable to follow forced move: {}", fault);
        }
    }
}
