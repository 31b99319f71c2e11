/// The server side of a move: zone resolution, ratification, scene
/// resolution, the commit and the reply, driven through a place server.
use std::{cell::Cell, rc::Rc};

use plaza_server::{Body, LocationChangeEvent, ResolutionKey, ZonePolicy};
use plaza_shared::{
    services::{LEAVE_PLACE, LOCATION_SERVICE, MOVE_TO, ZONE_SERVICE},
    Argument, Fault, GroupId, Identity, InvocationResponse, LocationId, MethodId, MoveReply,
    MoveTarget, OccupantStatus, Reply, SceneId, ServerMessage, SetDelta, ZoneId, ZoneSummary,
};
use plaza_test::{location, occupant_deltas, scene, zone, MapStore, TestConnection, TestServer};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store() -> MapStore {
    let mut small = scene(12, 1, 1, vec![location(1, None)]);
    small.capacity = Some(1);
    MapStore::new()
        .with_zone(zone(1, &[10, 11, 12]))
        .with_zone(zone(2, &[20]))
        .with_scene(scene(10, 1, 5, vec![location(1, Some(100)), location(2, Some(200))]))
        .with_scene(scene(11, 1, 1, vec![location(1, None)]))
        .with_scene(small)
        .with_scene(scene(20, 2, 1, vec![location(1, None)]))
        .with_scene(scene(30, 3, 1, vec![]))
}

fn target(zone_id: u32, scene_id: u32, location_id: u32) -> MoveTarget {
    MoveTarget::new(ZoneId(zone_id), SceneId(scene_id), LocationId(location_id))
}

fn moved(response: &InvocationResponse) -> &MoveReply {
    match &response.result {
        Ok(Reply::Moved(reply)) => reply,
        other => panic!("expected a move reply, got {:?}", other),
    }
}

fn single_response(connection: &TestConnection) -> InvocationResponse {
    let mut responses = connection.responses();
    assert_eq!(responses.len(), 1, "exactly one reply per request");
    responses.remove(0)
}

/// Number of places whose occupant set contains `identity`
fn places_containing(server: &TestServer, identity: &Identity, scenes: &[u32]) -> usize {
    scenes
        .iter()
        .filter_map(|id| server.server().world().place_for_scene_id(&SceneId(*id)))
        .filter_map(|place_id| server.server().world().place(&place_id))
        .filter(|place| place.occupants().identities().any(|other| other == identity))
        .count()
}

struct Veto(&'static str);

impl ZonePolicy for Veto {
    fn ratify_body_entry(&self, _body: &Body, _zone: &ZoneSummary) -> Option<String> {
        Some(self.0.to_string())
    }
}

#[derive(Clone, Default)]
struct Counting {
    ratified: Rc<Cell<usize>>,
    entered: Rc<Cell<usize>>,
}

impl ZonePolicy for Counting {
    fn ratify_body_entry(&self, _body: &Body, _zone: &ZoneSummary) -> Option<String> {
        self.ratified.set(self.ratified.get() + 1);
        None
    }

    fn body_did_enter_zone(&mut self, _body: &Body, _zone_id: ZoneId) {
        self.entered.set(self.entered.get() + 1);
    }
}

#[test]
fn stale_scene_version_bundles_the_model() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");

    let request_id = server.request_move(&alice, target(1, 10, 1), 3);
    let mut events = server.tick();

    let response = single_response(&alice);
    assert_eq!(response.request_id, request_id);
    let reply = moved(&response);
    let update = reply.scene_update.as_ref().expect("stale version gets the model");
    assert_eq!(update.version, 5);
    assert_eq!(reply.zone.zone_id, ZoneId(1));
    assert_eq!(reply.group, Some(GroupId(100)));
    assert_eq!(reply.occupants.len(), 1);
    assert_eq!(events.read::<LocationChangeEvent>().count(), 1);

    // the client now holds version 5: same move, no bundled model
    server.request_move(&alice, target(1, 10, 2), 5);
    server.tick();
    let response = single_response(&alice);
    let reply = moved(&response);
    assert_eq!(reply.scene_update, None);
    assert_eq!(reply.location_id, LocationId(2));
    assert_eq!(reply.group, Some(GroupId(200)));
}

#[test]
fn successful_move_lands_in_exactly_one_place() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");

    server.request_move(&alice, target(1, 10, 1), 0);
    server.tick();
    server.request_move(&alice, target(1, 11, 1), 0);
    server.tick();
    assert_eq!(alice.responses().len(), 2);

    let world = server.server().world();
    let body = world.body_for(alice.identity()).expect("alice has a body");
    let place_id = world.place_for_scene_id(&SceneId(11)).expect("place for scene 11");
    assert_eq!(body.zone_id(), Some(ZoneId(1)));
    assert_eq!(body.scene_id(), Some(SceneId(11)));
    assert_eq!(body.place_id(), Some(place_id));
    assert!(world
        .place(&place_id)
        .expect("place")
        .occupants()
        .contains(&body.entity()));
    assert_eq!(places_containing(&server, alice.identity(), &[10, 11, 12, 20]), 1);

    // occupants hold the cache entries of their zone and scene
    let cache = server.server().world().cache();
    assert!(cache.peek(&ResolutionKey::Scene(SceneId(11))).is_some());
}

#[test]
fn vetoed_entry_leaves_body_unchanged() {
    init_logging();
    let mut server = TestServer::immediate(store());
    server.server_mut().zones_mut().set_policy(ZoneId(2), Veto("ZoneFull"));
    let alice = server.connect("alice");

    server.request_move(&alice, target(1, 10, 1), 0);
    server.tick();
    alice.drain();
    let before = server.server().world().body_for(alice.identity()).expect("body").location();

    server.request_move(&alice, target(2, 20, 1), 0);
    server.tick();

    let response = single_response(&alice);
    assert_eq!(response.result, Err(Fault::Vetoed("ZoneFull".to_string())));
    assert_eq!(response.result.as_ref().map_err(Fault::code), Err("ZoneFull"));
    let after = server.server().world().body_for(alice.identity()).expect("body").location();
    assert_eq!(before, after);
    assert_eq!(after.zone_id, Some(ZoneId(1)));
}

#[test]
fn resolution_misses_map_to_place_facing_faults() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");

    // unknown zone
    server.request_move(&alice, target(9, 10, 1), 0);
    server.tick();
    assert_eq!(single_response(&alice).result, Err(Fault::NoSuchZone));

    // unknown scene
    server.request_move(&alice, target(1, 99, 1), 0);
    server.tick();
    assert_eq!(single_response(&alice).result, Err(Fault::NoSuchPlace));

    // a scene that exists but belongs to another zone
    server.request_move(&alice, target(1, 30, 1), 0);
    server.tick();
    assert_eq!(single_response(&alice).result, Err(Fault::NoSuchPlace));

    let body = server.server().world().body_for(alice.identity()).expect("body");
    assert_eq!(body.place_id(), None);
}

#[test]
fn refused_commit_rolls_nothing_forward() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");
    let bob = server.connect("bob");

    server.request_move(&alice, target(1, 12, 1), 0);
    server.request_move(&bob, target(1, 10, 1), 0);
    server.tick();
    alice.drain();
    bob.drain();

    // scene 12 holds a single body
    server.request_move(&bob, target(1, 12, 1), 0);
    server.tick();

    let messages = bob.drain();
    let responses: Vec<_> = messages
        .iter()
        .filter_map(|message| match message {
            ServerMessage::Response(response) => Some(response),
            _ => None,
        })
        .collect();
    assert_eq!(responses.len(), 1);
    assert!(matches!(responses[0].result, Err(Fault::Internal(_))));
    assert!(occupant_deltas(&messages).is_empty(), "no membership change leaked");
    assert!(alice.drain().is_empty());

    let world = server.server().world();
    let bob_body = world.body_for(bob.identity()).expect("bob");
    assert_eq!(bob_body.scene_id(), Some(SceneId(10)));
    let small = world.place_for_scene_id(&SceneId(12)).expect("place");
    assert_eq!(world.place(&small).expect("place").occupants().len(), 1);
}

#[test]
fn occupants_see_arrivals_and_departures() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");
    let bob = server.connect("bob");

    server.request_move(&alice, target(1, 10, 1), 0);
    server.tick();
    alice.drain();

    server.request_move(&bob, target(1, 10, 2), 0);
    server.tick();
    let bob_entity = server.server().world().entity_for(bob.identity()).expect("bob");

    let deltas = occupant_deltas(&alice.drain());
    assert_eq!(deltas.len(), 1);
    match &deltas[0].1.delta {
        SetDelta::Added(info) => assert_eq!(info.identity, *bob.identity()),
        other => panic!("expected an add, got {:?}", other),
    }

    server.request_move(&bob, target(1, 11, 1), 0);
    server.tick();
    let deltas = occupant_deltas(&alice.drain());
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].1.delta, SetDelta::Removed(bob_entity));
}

#[test]
fn concurrent_moves_share_loads() {
    init_logging();
    let (mut server, control) = TestServer::manual();
    let alice = server.connect("alice");
    let bob = server.connect("bob");
    let zone_key = ResolutionKey::Zone(ZoneId(1));
    let scene_key = ResolutionKey::Scene(SceneId(10));

    server.request_move(&alice, target(1, 10, 1), 0);
    server.request_move(&bob, target(1, 10, 2), 0);
    server.tick();
    assert_eq!(control.loads_of(&zone_key), 1);
    assert!(alice.responses().is_empty());

    control.complete(&zone_key, Ok(plaza_server::Bundle::Zone(zone(1, &[10]))));
    server.tick();
    assert_eq!(control.loads_of(&scene_key), 1);

    control.complete(
        &scene_key,
        Ok(plaza_server::Bundle::Scene(scene(10, 1, 1, vec![]))),
    );
    server.tick();

    assert!(matches!(single_response(&alice).result, Ok(Reply::Moved(_))));
    assert!(matches!(single_response(&bob).result, Ok(Reply::Moved(_))));
    assert_eq!(control.loads_of(&zone_key), 1);
}

#[test]
fn moves_of_one_body_run_in_order() {
    init_logging();
    let (mut server, control) = TestServer::manual();
    let alice = server.connect("alice");

    let first = server.request_move(&alice, target(1, 10, 1), 0);
    let second = server.request_move(&alice, target(1, 11, 1), 0);
    server.tick();

    let pipeline = &server.server().simulation().pipeline;
    let entity = server.server().world().entity_for(alice.identity()).expect("alice");
    assert!(pipeline.is_moving(&entity));
    assert_eq!(pipeline.queued_count(&entity), 1);

    let zone_key = ResolutionKey::Zone(ZoneId(1));
    control.complete(&zone_key, Ok(plaza_server::Bundle::Zone(zone(1, &[10, 11]))));
    server.tick();
    // only the first move has reached its scene
    assert!(control.is_pending(&ResolutionKey::Scene(SceneId(10))));
    assert!(!control.is_pending(&ResolutionKey::Scene(SceneId(11))));

    control.complete(
        &ResolutionKey::Scene(SceneId(10)),
        Ok(plaza_server::Bundle::Scene(scene(10, 1, 1, vec![]))),
    );
    server.tick();
    control.complete(
        &ResolutionKey::Scene(SceneId(11)),
        Ok(plaza_server::Bundle::Scene(scene(11, 1, 1, vec![]))),
    );
    server.tick();

    let responses = alice.responses();
    let ids: Vec<_> = responses.iter().map(|response| response.request_id).collect();
    assert_eq!(ids, vec![first, second]);
    let body = server.server().world().body_for(alice.identity()).expect("alice");
    assert_eq!(body.scene_id(), Some(SceneId(11)));
}

#[test]
fn ratification_waits_for_zone_and_notify_follows_success() {
    init_logging();
    let (mut server, control) = TestServer::manual();
    let policy = Counting::default();
    server.server_mut().zones_mut().set_policy(ZoneId(1), policy.clone());
    let alice = server.connect("alice");

    server.request_move(&alice, target(1, 10, 1), 0);
    server.tick();
    assert_eq!(policy.ratified.get(), 0, "nothing to ratify against yet");

    control.complete(
        &ResolutionKey::Zone(ZoneId(1)),
        Ok(plaza_server::Bundle::Zone(zone(1, &[]))),
    );
    server.tick();
    assert_eq!(policy.ratified.get(), 1);
    assert_eq!(policy.entered.get(), 0);

    control.complete(
        &ResolutionKey::Scene(SceneId(10)),
        Ok(plaza_server::Bundle::Scene(scene(10, 1, 1, vec![]))),
    );
    server.tick();
    assert_eq!(policy.entered.get(), 1);
}

#[test]
fn forced_move_evicts_and_notifies() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");
    server.request_move(&alice, target(1, 10, 1), 0);
    server.tick();
    alice.drain();
    let entity = server.server().world().entity_for(alice.identity()).expect("alice");

    server
        .server_mut()
        .move_body(alice.identity(), ZoneId(2), SceneId(20))
        .expect("alice is connected");

    let messages = alice.drain();
    assert_eq!(
        occupant_deltas(&messages)[0].1.delta,
        SetDelta::Removed(entity)
    );
    assert_eq!(
        messages.last(),
        Some(&ServerMessage::ForcedMove {
            zone_id: ZoneId(2),
            scene_id: SceneId(20)
        })
    );
    assert_eq!(places_containing(&server, alice.identity(), &[10]), 0);
}

#[test]
fn leave_place_is_inherited_by_the_zone_service() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");
    server.request_move(&alice, target(1, 10, 1), 0);
    server.tick();
    alice.drain();

    server.request(&alice, ZONE_SERVICE, LEAVE_PLACE, vec![]);
    server.tick();
    assert_eq!(single_response(&alice).result, Ok(Reply::Ack));
    let body = server.server().world().body_for(alice.identity()).expect("alice");
    assert_eq!(body.place_id(), None);
    assert_eq!(body.zone_id(), Some(ZoneId(1)));

    // the location service does not know how to move between zones
    server.request(&alice, LOCATION_SERVICE, MOVE_TO, target(1, 10, 1).to_args(0));
    server.request(&alice, ZONE_SERVICE, MethodId(77), vec![]);
    server.request(&alice, ZONE_SERVICE, MOVE_TO, vec![Argument::Bool(true)]);
    server.tick();
    let results: Vec<_> = alice.responses().into_iter().map(|r| r.result).collect();
    assert!(matches!(results[0], Err(Fault::UnknownMethod { .. })));
    assert!(matches!(results[1], Err(Fault::UnknownMethod { .. })));
    assert!(matches!(results[2], Err(Fault::InvalidArguments { .. })));
}

#[test]
fn session_lifecycle_reaches_occupants() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");
    let bob = server.connect("bob");
    server.request_move(&alice, target(1, 10, 1), 0);
    server.request_move(&bob, target(1, 10, 2), 0);
    server.tick();
    alice.drain();

    server.server().registry().connection_closed(bob.id());
    server.tick();
    let deltas = occupant_deltas(&alice.drain());
    match &deltas[0].1.delta {
        SetDelta::Updated(info) => assert_eq!(info.status, OccupantStatus::Disconnected),
        other => panic!("expected an update, got {:?}", other),
    }

    assert!(server.server_mut().end_session(bob.identity()));
    server.tick();
    let deltas = occupant_deltas(&alice.drain());
    assert!(matches!(deltas[0].1.delta, SetDelta::Removed(_)));
    assert!(server.server().world().body_for(bob.identity()).is_none());
    assert_eq!(places_containing(&server, bob.identity(), &[10]), 0);
}

#[test]
fn emptied_places_are_dropped() {
    init_logging();
    let config = plaza_server::ServerConfig {
        cache: plaza_server::CacheConfig { idle_capacity: 0 },
        ..Default::default()
    };
    let mut server = TestServer::with_loader(config, plaza_server::ImmediateLoader::new(store()));
    let alice = server.connect("alice");

    for scene_id in [10, 11, 10, 11] {
        server.request_move(&alice, target(1, scene_id, 1), 0);
        server.tick();
        assert_eq!(server.server().world().places_count(), 1);
    }
    assert_eq!(server.server().world().place_for_scene_id(&SceneId(10)), None);

    assert!(server.server_mut().end_session(alice.identity()));
    server.tick();
    let world = server.server().world();
    assert_eq!(world.places_count(), 0);
    assert_eq!(world.bodies_count(), 0);
    assert!(world.cache().is_empty());
}

#[test]
fn recreated_place_takes_current_capacity() {
    init_logging();
    let mut server = TestServer::immediate(store());
    let alice = server.connect("alice");
    let bob = server.connect("bob");

    server.request_move(&alice, target(1, 12, 1), 0);
    server.tick();
    let first = server.server().world().place_for_scene_id(&SceneId(12)).expect("place");

    server.request(&alice, LOCATION_SERVICE, LEAVE_PLACE, vec![]);
    server.tick();
    assert!(server.server().world().place(&first).is_none());

    server.request_move(&bob, target(1, 12, 1), 0);
    server.tick();
    let second = server.server().world().place_for_scene_id(&SceneId(12)).expect("place");
    assert_ne!(first, second);
    assert_eq!(
        server.server().world().place(&second).and_then(|place| place.capacity()),
        Some(1)
    );
}
