use std::{mem, vec::IntoIter};

use plaza_shared::Identity;

use crate::{session::SessionKey, world::BodyChange};

/// Everything that happened during one [`PlaceServer::receive`] tick
///
/// [`PlaceServer::receive`]: crate::PlaceServer::receive
pub struct ServerEvents {
    starts: Vec<(SessionKey, Identity)>,
    resumes: Vec<(SessionKey, Identity)>,
    disconnections: Vec<(SessionKey, Identity, Option<String>)>,
    ends: Vec<(SessionKey, Identity)>,
    location_changes: Vec<BodyChange>,

    empty: bool,
}

impl ServerEvents {
    pub(crate) fn new() -> Self {
        Self {
            starts: Vec::new(),
            resumes: Vec::new(),
            disconnections: Vec::new(),
            ends: Vec::new(),
            location_changes: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: ServerEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: ServerEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_start(&mut self, key: SessionKey, identity: Identity) {
        self.starts.push((key, identity));
        self.empty = false;
    }

    pub(crate) fn push_resume(&mut self, key: SessionKey, identity: Identity) {
        self.resumes.push((key, identity));
        self.empty = false;
    }

    pub(crate) fn push_disconnection(
        &mut self,
        key: SessionKey,
        identity: Identity,
        cause: Option<String>,
    ) {
        self.disconnections.push((key, identity, cause));
        self.empty = false;
    }

    pub(crate) fn push_end(&mut self, key: SessionKey, identity: Identity) {
        self.ends.push((key, identity));
        self.empty = false;
    }

    pub(crate) fn push_location_changes(&mut self, changes: Vec<BodyChange>) {
        if changes.is_empty() {
            return;
        }
        self.location_changes.extend(changes);
        self.empty = false;
    }
}

// Event Trait
pub trait ServerEvent {
    type Iter;

    fn iter(events: &mut ServerEvents) -> Self::Iter;

    fn has(events: &ServerEvents) -> bool;
}

// StartSessionEvent
pub struct StartSessionEvent;
impl ServerEvent for StartSessionEvent {
    type Iter = IntoIter<(SessionKey, Identity)>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.starts).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.starts.is_empty()
    }
}

// ResumeSessionEvent
pub struct ResumeSessionEvent;
impl ServerEvent for ResumeSessionEvent {
    type Iter = IntoIter<(SessionKey, Identity)>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.resumes).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.resumes.is_empty()
    }
}

// DisconnectSessionEvent
pub struct DisconnectSessionEvent;
impl ServerEvent for DisconnectSessionEvent {
    type Iter = IntoIter<(SessionKey, Identity, Option<String>)>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.disconnections.is_empty()
    }
}

// EndSessionEvent
pub struct EndSessionEvent;
impl ServerEvent for EndSessionEvent {
    type Iter = IntoIter<(SessionKey, Identity)>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.ends).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.ends.is_empty()
    }
}

// LocationChangeEvent
pub struct LocationChangeEvent;
impl ServerEvent for LocationChangeEvent {
    type Iter = IntoIter<BodyChange>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.location_changes).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.location_changes.is_empty()
    }
}
