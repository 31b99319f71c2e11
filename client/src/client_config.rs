use plaza_shared::Identity;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// The identity this client authenticated as. Used to recognize the
    /// local participant among a place's occupants.
    pub identity: Identity,
}

impl ClientConfig {
    pub fn new(identity: impl Into<Identity>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}
