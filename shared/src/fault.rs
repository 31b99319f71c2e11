use thiserror::Error;

use crate::{MethodId, ServiceId};

/// Stable codes reported to callers alongside a [`Fault`]
pub mod codes {
    pub const TRANSPORT_FAULT: &str = "m.transport_fault";
    pub const UNKNOWN_SERVICE: &str = "m.unknown_service";
    pub const UNKNOWN_METHOD: &str = "m.unknown_method";
    pub const INVALID_ARGUMENTS: &str = "m.invalid_arguments";
    pub const NO_SUCH_ZONE: &str = "m.no_such_zone";
    pub const NO_SUCH_PLACE: &str = "m.no_such_place";
    pub const ALREADY_PENDING: &str = "m.already_pending";
    pub const INTERNAL_ERROR: &str = "m.internal_error";
}

/// Caller-visible failure of a single request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// The connection carrying the request went away. Recoverable by
    /// reconnecting within the session grace period.
    #[error("Transport fault: {reason}")]
    TransportFault { reason: String },

    /// No service is registered under the requested service id
    #[error("No service registered for service id {service}")]
    UnknownService { service: ServiceId },

    /// Neither the service nor any table it delegates to handles the method
    #[error("Service {service} has no handler for method id {method}")]
    UnknownMethod { service: ServiceId, method: MethodId },

    /// The method exists but the argument list does not match it
    #[error("Malformed arguments for method {method}: {reason}")]
    InvalidArguments { method: MethodId, reason: String },

    /// The requested zone could not be resolved
    #[error("No such zone")]
    NoSuchZone,

    /// The requested scene could not be resolved. Scenes are presented to
    /// callers as places, so this is the place-facing code.
    #[error("No such place")]
    NoSuchPlace,

    /// Entry was declined by the zone's ratification policy
    #[error("Entry vetoed: {0}")]
    Vetoed(String),

    /// A transition request is already outstanding on this client
    #[error("A transition request is already pending")]
    AlreadyPending,

    /// Unexpected failure while committing a move. No partial state was left
    /// behind.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Fault {
    /// The stable code for this fault. A veto's code is the veto reason.
    pub fn code(&self) -> &str {
        match self {
            Fault::TransportFault { .. } => codes::TRANSPORT_FAULT,
            Fault::UnknownService { .. } => codes::UNKNOWN_SERVICE,
            Fault::UnknownMethod { .. } => codes::UNKNOWN_METHOD,
            Fault::InvalidArguments { .. } => codes::INVALID_ARGUMENTS,
            Fault::NoSuchZone => codes::NO_SUCH_ZONE,
            Fault::NoSuchPlace => codes::NO_SUCH_PLACE,
            Fault::Vetoed(reason) => reason,
            Fault::AlreadyPending => codes::ALREADY_PENDING,
            Fault::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Human-readable detail, when there is any beyond the code
    pub fn reason(&self) -> Option<&str> {
        match self {
            Fault::TransportFault { reason } => Some(reason),
            Fault::InvalidArguments { reason, .. } => Some(reason),
            Fault::Internal(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Fault::TransportFault {
            reason: reason.into(),
        }
    }
}
