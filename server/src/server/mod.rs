mod place_server;
pub use place_server::{PlaceServer, ServerHandle};

mod server_config;
pub use server_config::{CacheConfig, ServerConfig};

mod simulation;
pub use simulation::Simulation;
