use std::{fmt, hash::Hash};

/// A key that can be produced by a [`KeyGenerator`](crate::KeyGenerator)
pub trait Key: Copy + Eq + Hash {
    fn to_u64(&self) -> u64;

    fn from_u64(value: u64) -> Self;
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
        pub struct $name(pub $inner);

        impl Key for $name {
            fn to_u64(&self) -> u64 {
                u64::from(self.0)
            }

            fn from_u64(value: u64) -> Self {
                $name(<$inner>::try_from(value).unwrap_or(<$inner>::MAX))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifies a zone, the top-level partition grouping many scenes
    ZoneId(u32)
);
id_type!(
    /// Identifies a scene within a zone
    SceneId(u32)
);
id_type!(
    /// Identifies a live place hosting the occupants of a scene
    PlaceId(u64)
);
id_type!(
    /// Identifies an authoritative body on the server
    EntityId(u64)
);
id_type!(
    /// Identifies a location (spot) within a scene
    LocationId(u32)
);
id_type!(
    /// Identifies a cluster feed that clients subscribe to while standing
    /// at a location belonging to that cluster
    GroupId(u64)
);
id_type!(
    /// Correlates an invocation request with its response
    RequestId(u64)
);

/// Version number of a scene model
pub type SceneVersion = u32;

/// Identifies a service registered with the invocation router
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ServiceId(pub u16);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a method within a service's routing table
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MethodId(pub u8);

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The stable, persistent identity of a participant (their username).
/// Survives reconnects, unlike any transport handle.
#[derive(PartialEq, Eq, Hash, Clone, Debug, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
