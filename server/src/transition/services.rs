use log::debug;

use plaza_shared::{
    services::{LEAVE_PLACE, MOVE_TO},
    EntityId, Fault, Identity, MoveTarget, Reply,
};

use crate::{router::ServiceTable, server::Simulation, transition::MoveRequest};

/// Basic location services: leaving the occupied place
pub(crate) fn location_service() -> ServiceTable<Simulation> {
    ServiceTable::new("location").on(LEAVE_PLACE, |sim, caller, _args, listener| {
        let entity = body_of(sim, caller)?;
        if sim.world.leave_place(entity).is_none() {
            debug!("Leave requested outside any place [identity={}]", caller);
        }
        listener.succeed(Reply::Ack);
        Ok(())
    })
}

/// Zone services: moving between scenes of zones. Anything else falls
/// through to the location service.
pub(crate) fn zone_service() -> ServiceTable<Simulation> {
    ServiceTable::new("zone")
        .with_parent(location_service())
        .on(MOVE_TO, |sim, caller, args, listener| {
            let (target, scene_version) = MoveTarget::from_args(args)?;
            let entity = body_of(sim, caller)?;
            let Simulation {
                world,
                zones,
                pipeline,
            } = sim;
            pipeline.begin(
                world,
                zones,
                MoveRequest {
                    entity,
                    target,
                    scene_version,
                    listener,
                },
            );
            Ok(())
        })
}

fn body_of(sim: &Simulation, caller: &Identity) -> Result<EntityId, Fault> {
    sim.world
        .entity_for(caller)
        .ok_or_else(|| Fault::Internal(format!("no body for {}", caller)))
}
