mod body;
mod place;
mod world;

pub use body::{Body, BodyChange, BodyLocation};
pub use place::Place;
pub use world::World;
