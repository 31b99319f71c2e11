mod invocation_router;
mod response_listener;
mod service_table;

pub use invocation_router::InvocationRouter;
pub use response_listener::ResponseListener;
pub use service_table::{Handler, ServiceTable};
