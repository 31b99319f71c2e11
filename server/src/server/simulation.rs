use crate::{transition::TransitionPipeline, world::World, zone::ZoneRegistry};

/// State owned by the simulation context, handed to every service handler
pub struct Simulation {
    pub world: World,
    pub zones: ZoneRegistry,
    pub pipeline: TransitionPipeline,
}
