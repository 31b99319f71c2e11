mod move_request;
mod services;
mod transition_pipeline;

pub use move_request::MoveRequest;
pub(crate) use services::{location_service, zone_service};
pub use transition_pipeline::TransitionPipeline;
