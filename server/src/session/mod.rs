pub(crate) mod session;
pub(crate) mod session_registry;

pub use session::*;
pub use session_registry::*;
