use smol::channel::{self, Receiver};

use plaza_server::{ConnectionHandle, ConnectionId, SessionKey, SessionRegistry};
use plaza_shared::{Identity, InvocationResponse, OccupantDelta, PlaceId, ServerMessage};

/// The far end of one simulated transport connection
pub struct TestConnection {
    id: ConnectionId,
    identity: Identity,
    key: SessionKey,
    outbound: Receiver<ServerMessage>,
}

impl TestConnection {
    /// Establishes a connection for `name` with the registry
    pub fn connect(registry: &SessionRegistry, id: u64, name: &str) -> Self {
        let (sender, outbound) = channel::unbounded();
        let id = ConnectionId(id);
        let identity = Identity::new(name);
        let key = registry.connection_established(ConnectionHandle::new(id, sender), identity.clone());
        Self {
            id,
            identity,
            key,
            outbound,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    /// Everything the server has sent on this connection since the last
    /// drain
    pub fn drain(&self) -> Vec<ServerMessage> {
        std::iter::from_fn(|| self.outbound.try_recv().ok()).collect()
    }

    pub fn responses(&self) -> Vec<InvocationResponse> {
        self.drain()
            .into_iter()
            .filter_map(|message| match message {
                ServerMessage::Response(response) => Some(response),
                _ => None,
            })
            .collect()
    }
}

/// Splits drained messages into occupant deltas
pub fn occupant_deltas(messages: &[ServerMessage]) -> Vec<(PlaceId, OccupantDelta)> {
    messages
        .iter()
        .filter_map(|message| match message {
            ServerMessage::Occupants { place_id, delta } => Some((*place_id, delta.clone())),
            _ => None,
        })
        .collect()
}
