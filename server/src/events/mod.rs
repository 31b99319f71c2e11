pub(crate) mod server_events;

pub use server_events::*;
