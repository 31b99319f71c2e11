use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// How long a session whose connection dropped is kept around waiting
    /// for the same identity to reconnect before it is ended
    pub session_grace: Duration,
    /// Used to configure the zone / scene resolution cache
    pub cache: CacheConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            session_grace: Duration::from_secs(60),
            cache: CacheConfig::default(),
        }
    }
}

/// Contains Config properties for the resolution cache
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// How many resolved entries nobody references are retained before the
    /// least recently used ones are evicted. Zero evicts as soon as an entry
    /// becomes unreferenced.
    pub idle_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { idle_capacity: 64 }
    }
}
