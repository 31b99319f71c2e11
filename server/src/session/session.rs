use std::{fmt, time::Instant};

use smol::channel::Sender;

use plaza_shared::{Identity, Key, ServerMessage};

// SessionKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct SessionKey(u64);

impl Key for SessionKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        SessionKey(value)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ConnectionId

/// Identifies one physical connection, as assigned by the transport
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

// ConnectionHandle

/// The transport handle bound to a session: the connection's id plus the
/// channel its writer drains
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: Sender<ServerMessage>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) fn send(&self, message: ServerMessage) -> bool {
        self.sender.try_send(message).is_ok()
    }
}

// SessionState

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    /// The transport went away; the session waits for its identity to
    /// reconnect until the grace period runs out
    DisconnectedGrace,
    Ended,
}

// Session

/// A participant's session, which outlives any single connection
#[derive(Clone, Debug)]
pub struct Session {
    key: SessionKey,
    identity: Identity,
    connection: Option<ConnectionHandle>,
    state: SessionState,
    disconnected_at: Option<Instant>,
}

impl Session {
    pub(crate) fn start(key: SessionKey, identity: Identity, connection: ConnectionHandle) -> Self {
        Self {
            key,
            identity,
            connection: Some(connection),
            state: SessionState::Active,
            disconnected_at: None,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(|connection| connection.id())
    }

    pub fn disconnected_at(&self) -> Option<Instant> {
        self.disconnected_at
    }

    pub(crate) fn connection(&self) -> Option<&ConnectionHandle> {
        self.connection.as_ref()
    }

    /// Rebinds the session to a new transport. Returns the handle it was
    /// bound to before, if a connection was still attached.
    pub(crate) fn resume(&mut self, connection: ConnectionHandle) -> Option<ConnectionHandle> {
        self.state = SessionState::Active;
        self.disconnected_at = None;
        self.connection.replace(connection)
    }

    pub(crate) fn was_unmapped(&mut self, now: Instant) {
        self.connection = None;
        self.state = SessionState::DisconnectedGrace;
        self.disconnected_at = Some(now);
    }

    pub(crate) fn end(&mut self) {
        self.connection = None;
        self.state = SessionState::Ended;
    }
}

// SessionEvent

/// Session lifecycle notifications, handed from the transport context to the
/// simulation context
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Started {
        key: SessionKey,
        identity: Identity,
    },
    Resumed {
        key: SessionKey,
        identity: Identity,
    },
    Disconnected {
        key: SessionKey,
        identity: Identity,
        cause: Option<String>,
    },
    Ended {
        key: SessionKey,
        identity: Identity,
    },
}

impl SessionEvent {
    pub fn identity(&self) -> &Identity {
        match self {
            SessionEvent::Started { identity, .. }
            | SessionEvent::Resumed { identity, .. }
            | SessionEvent::Disconnected { identity, .. }
            | SessionEvent::Ended { identity, .. } => identity,
        }
    }
}
