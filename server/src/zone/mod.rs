mod zone_policy;
mod zone_registry;

pub use zone_policy::{OpenZonePolicy, ZonePolicy};
pub use zone_registry::ZoneRegistry;
