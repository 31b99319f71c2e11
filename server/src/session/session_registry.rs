use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use smol::channel::{self, Receiver, Sender};

use plaza_shared::{Identity, KeyGenerator, ServerMessage};

use crate::{
    session::session::{
        ConnectionHandle, ConnectionId, Session, SessionEvent, SessionKey, SessionState,
    },
    Outbox, SendError,
};

struct RegistryTables {
    sessions: HashMap<Identity, Session>,
    connections: HashMap<ConnectionId, Identity>,
    session_keys: KeyGenerator<SessionKey>,
}

/// Maps persistent identities to sessions across reconnects.
///
/// The registry is called from transport workers (connections showing up or
/// going away) and from the simulation context (sessions being ended for
/// application reasons), so its identity and connection tables live behind a
/// single mutex. Lifecycle changes are handed to the simulation context as
/// [`SessionEvent`]s over a channel, emitted while the lock is held so they
/// arrive in the order the tables changed.
#[derive(Clone)]
pub struct SessionRegistry {
    tables: Arc<Mutex<RegistryTables>>,
    events: Sender<SessionEvent>,
}

impl SessionRegistry {
    /// Creates a registry along with the receiving end of its lifecycle
    /// event channel
    pub fn new() -> (Self, Receiver<SessionEvent>) {
        let (events, receiver) = channel::unbounded();
        let registry = Self {
            tables: Arc::new(Mutex::new(RegistryTables {
                sessions: HashMap::new(),
                connections: HashMap::new(),
                session_keys: KeyGenerator::new(),
            })),
            events,
        };
        (registry, receiver)
    }

    // Transport context

    /// Called when an authenticated connection is established. Resumes the
    /// identity's existing session if there is one, otherwise starts a new
    /// one.
    pub fn connection_established(
        &self,
        connection: ConnectionHandle,
        identity: Identity,
    ) -> SessionKey {
        let mut guard = self.lock();
        let RegistryTables {
            sessions,
            connections,
            session_keys,
        } = &mut *guard;

        let connection_id = connection.id();
        if let Some(previous) = connections.remove(&connection_id) {
            if previous != identity {
                warn!(
                    "Connection reused for a different identity [conn={}, old={}, new={}]",
                    connection_id, previous, identity
                );
                if let Some(session) = sessions.get_mut(&previous) {
                    if session.connection_id() == Some(connection_id) {
                        session.was_unmapped(Instant::now());
                        self.emit(SessionEvent::Disconnected {
                            key: session.key(),
                            identity: previous,
                            cause: Some("connection reused".to_string()),
                        });
                    }
                }
            }
        }

        let key = if let Some(session) = sessions.get_mut(&identity) {
            info!(
                "Session resumed [identity={}, conn={}]",
                identity, connection_id
            );
            if let Some(superseded) = session.resume(connection) {
                if superseded.id() != connection_id {
                    warn!(
                        "Superseding live connection [identity={}, old={}, new={}]",
                        identity,
                        superseded.id(),
                        connection_id
                    );
                    connections.remove(&superseded.id());
                }
            }
            let key = session.key();
            self.emit(SessionEvent::Resumed {
                key,
                identity: identity.clone(),
            });
            key
        } else {
            info!(
                "Session initiated [identity={}, conn={}]",
                identity, connection_id
            );
            let key = session_keys.generate();
            sessions.insert(
                identity.clone(),
                Session::start(key, identity.clone(), connection),
            );
            self.emit(SessionEvent::Started {
                key,
                identity: identity.clone(),
            });
            key
        };

        connections.insert(connection_id, identity);

        key
    }

    /// Called when a connection has been closed in an orderly manner
    pub fn connection_closed(&self, connection: ConnectionId) {
        self.unmap(connection, None);
    }

    /// Called if a connection fails for any reason. The session degrades to
    /// a reconnectable state rather than ending.
    pub fn connection_failed(&self, connection: ConnectionId, cause: impl Into<String>) {
        self.unmap(connection, Some(cause.into()));
    }

    // Either context

    /// Removes the session's identity mapping. Reports, but tolerates, a
    /// registered session that is not the one passed in, including a
    /// disconnected snapshot of a session that has since been resumed.
    pub fn session_ended(&self, session: &Session) {
        let mut guard = self.lock();
        let tables = &mut *guard;

        let Some(registered) = tables.sessions.remove(session.identity()) else {
            warn!(
                "Unregistered session ended [identity={}, key={}]",
                session.identity(),
                session.key()
            );
            return;
        };

        if registered.key() != session.key() {
            warn!(
                "Different sessions with same identity!? [identity={}, registered={}, ended={}]",
                session.identity(),
                registered.key(),
                session.key()
            );
            tables
                .sessions
                .insert(registered.identity().clone(), registered);
            return;
        }

        if session.state() == SessionState::DisconnectedGrace
            && registered.disconnected_at() != session.disconnected_at()
        {
            info!(
                "Session resumed before it could be ended [identity={}, state={:?}]",
                registered.identity(),
                registered.state()
            );
            tables
                .sessions
                .insert(registered.identity().clone(), registered);
            return;
        }

        self.finish_session(tables, registered);
    }

    /// Explicit logout. Returns false if no session exists for the identity.
    pub fn end_session(&self, identity: &Identity) -> bool {
        let Some(session) = self.session(identity) else {
            return false;
        };
        self.session_ended(&session);
        true
    }

    /// Ends every session that has been disconnected for at least `grace`.
    /// Returns the identities whose sessions were ended.
    pub fn expire_sessions(&self, now: Instant, grace: Duration) -> Vec<Identity> {
        let mut guard = self.lock();
        let tables = &mut *guard;

        // checked and removed under the same lock, so a reconnect cannot
        // slip in between
        let expired: Vec<Identity> = tables
            .sessions
            .values()
            .filter(|session| session.state() == SessionState::DisconnectedGrace)
            .filter(|session| {
                session
                    .disconnected_at()
                    .map(|at| now.saturating_duration_since(at) >= grace)
                    .unwrap_or(false)
            })
            .map(|session| session.identity().clone())
            .collect();

        for identity in expired.iter() {
            let Some(session) = tables.sessions.remove(identity) else {
                continue;
            };
            info!("Session grace period expired [identity={}]", identity);
            self.finish_session(tables, session);
        }
        expired
    }

    // Queries

    /// Returns a snapshot of the identity's session
    pub fn session(&self, identity: &Identity) -> Option<Session> {
        self.lock().sessions.get(identity).cloned()
    }

    /// Returns the identity whose session the connection is bound to
    pub fn identity_for(&self, connection: &ConnectionId) -> Option<Identity> {
        self.lock().connections.get(connection).cloned()
    }

    /// Number of registered sessions, connected or not
    pub fn sessions_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Number of sessions with a bound transport
    pub fn active_count(&self) -> usize {
        self.lock()
            .sessions
            .values()
            .filter(|session| session.state() == SessionState::Active)
            .count()
    }

    /// Send a message down the session's current transport
    pub fn send_to(&self, identity: &Identity, message: ServerMessage) -> Result<(), SendError> {
        let guard = self.lock();
        let Some(session) = guard.sessions.get(identity) else {
            return Err(SendError::NoSession {
                identity: identity.clone(),
            });
        };
        let Some(connection) = session.connection() else {
            return Err(SendError::Disconnected {
                identity: identity.clone(),
            });
        };
        if connection.send(message) {
            Ok(())
        } else {
            Err(SendError::ChannelClosed {
                identity: identity.clone(),
            })
        }
    }

    // Private methods

    fn unmap(&self, connection: ConnectionId, cause: Option<String>) {
        let mut guard = self.lock();
        let tables = &mut *guard;

        let Some(identity) = tables.connections.remove(&connection) else {
            warn!(
                "Unmapped connection closed? [conn={}, cause={:?}]",
                connection, cause
            );
            return;
        };

        let Some(session) = tables.sessions.get_mut(&identity) else {
            warn!(
                "Connection mapped to a missing session [conn={}, identity={}]",
                connection, identity
            );
            return;
        };

        if session.connection_id() != Some(connection) {
            debug!(
                "Ignoring close of superseded connection [conn={}, identity={}]",
                connection, identity
            );
            return;
        }

        session.was_unmapped(Instant::now());
        info!(
            "Unmapped session [identity={}, conn={}, cause={:?}]",
            identity, connection, cause
        );
        let key = session.key();
        self.emit(SessionEvent::Disconnected {
            key,
            identity,
            cause,
        });
    }

    // The session has already been taken out of the identity table
    fn finish_session(&self, tables: &mut RegistryTables, mut session: Session) {
        info!("Ending session [identity={}]", session.identity());
        if let Some(connection_id) = session.connection_id() {
            tables.connections.remove(&connection_id);
        }
        session.end();
        self.emit(SessionEvent::Ended {
            key: session.key(),
            identity: session.identity().clone(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.try_send(event).is_err() {
            debug!("Session event dropped, simulation context has shut down");
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Outbox for SessionRegistry {
    fn deliver(&self, identity: &Identity, message: ServerMessage) -> Result<(), SendError> {
        self.send_to(identity, message)
    }
}
