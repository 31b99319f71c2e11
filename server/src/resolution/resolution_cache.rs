use std::{collections::HashMap, fmt::Debug, hash::Hash, mem};

use log::{debug, trace, warn};
use lru::LruCache;
use smol::channel::{self, Receiver, Sender};

use crate::{
    resolution::{LoadCompletion, Loader, Resolution},
    CacheConfig, LoadError,
};

enum EntryState<P> {
    Pending(Vec<Sender<Result<P, LoadError>>>),
    Ready(P),
    /// The last load failed, but consumers still hold references
    Failed,
}

struct ResolutionEntry<P> {
    state: EntryState<P>,
    refs: usize,
}

/// Observable state of a cache entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryStatus {
    Pending { waiters: usize },
    Ready { refs: usize },
    Failed { refs: usize },
}

/// Demand-loads payloads by key, with at most one load in flight per key.
///
/// Concurrent resolutions of a key that is still loading join the pending
/// entry's waiter list instead of starting another load. When the load
/// completes, every waiter receives the same outcome exactly once and the
/// waiter list is cleared; later resolutions read the settled entry.
/// Failed loads are not cached, so the next resolution of that key loads
/// again. A failed entry is only kept while consumers still reference it.
///
/// Ready entries are reference counted by their consumers through
/// [`retain`](Self::retain) and [`release`](Self::release). Only entries
/// that are ready and unreferenced are eligible for least-recently-used
/// eviction; pending entries and referenced entries never are.
pub struct ResolutionCache<K: Clone, P> {
    entries: HashMap<K, ResolutionEntry<P>>,
    idle: LruCache<K, ()>,
    idle_capacity: usize,
    loader: Box<dyn Loader<K, P>>,
    completion_sender: Sender<(K, Result<P, LoadError>)>,
    completion_receiver: Receiver<(K, Result<P, LoadError>)>,
    loads_started: u64,
}

impl<K, P> ResolutionCache<K, P>
where
    K: Clone + Eq + Hash + Debug,
    P: Clone,
{
    pub fn new<L: Loader<K, P> + 'static>(config: &CacheConfig, loader: L) -> Self {
        let (completion_sender, completion_receiver) = channel::unbounded();
        Self {
            entries: HashMap::new(),
            idle: LruCache::unbounded(),
            idle_capacity: config.idle_capacity,
            loader: Box::new(loader),
            completion_sender,
            completion_receiver,
            loads_started: 0,
        }
    }

    /// Resolve `key`. A ready entry is returned immediately; a pending one
    /// gains another waiter; an absent or failed one starts the single load
    /// for it.
    pub fn resolve(&mut self, key: K) -> Resolution<P> {
        let (sender, receiver) = channel::bounded(1);
        match self.entries.get_mut(&key) {
            Some(entry) => match &mut entry.state {
                EntryState::Ready(payload) => {
                    let payload = payload.clone();
                    self.idle.promote(&key);
                    return Resolution::settled(Ok(payload));
                }
                EntryState::Pending(waiters) => {
                    waiters.push(sender);
                    trace!("Joined pending resolution of {:?} ({} waiters)", key, waiters.len());
                    return Resolution::waiting(receiver);
                }
                EntryState::Failed => {
                    entry.state = EntryState::Pending(vec![sender]);
                }
            },
            None => {
                self.entries.insert(
                    key.clone(),
                    ResolutionEntry {
                        state: EntryState::Pending(vec![sender]),
                        refs: 0,
                    },
                );
            }
        }

        self.loads_started += 1;
        debug!("Loading {:?}", key);
        self.loader
            .load(LoadCompletion::new(key, self.completion_sender.clone()));

        Resolution::waiting(receiver)
    }

    /// Settles every load that has completed since the last call, notifying
    /// their waiters. Returns how many loads were settled.
    pub fn maintain(&mut self) -> usize {
        let mut settled = 0;
        while let Ok((key, result)) = self.completion_receiver.try_recv() {
            self.settle(key, result);
            settled += 1;
        }
        settled
    }

    /// Adds a consumer reference to a resolved (or resolving) entry.
    /// Returns false if the key is not in the cache.
    pub fn retain(&mut self, key: &K) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            warn!("Retaining uncached key {:?}", key);
            return false;
        };
        entry.refs += 1;
        self.idle.pop(key);
        true
    }

    /// Drops a consumer reference. An unreferenced ready entry becomes
    /// eligible for eviction.
    pub fn release(&mut self, key: &K) {
        let Some(entry) = self.entries.get_mut(key) else {
            warn!("Releasing uncached key {:?}", key);
            return;
        };
        if entry.refs == 0 {
            warn!("Releasing unreferenced key {:?}", key);
            return;
        }
        entry.refs -= 1;
        if entry.refs > 0 {
            return;
        }
        match entry.state {
            EntryState::Ready(_) => {
                self.idle.put(key.clone(), ());
                self.trim_idle();
            }
            EntryState::Failed => {
                self.entries.remove(key);
            }
            EntryState::Pending(_) => {}
        }
    }

    pub fn status(&self, key: &K) -> Option<EntryStatus> {
        self.entries.get(key).map(|entry| match &entry.state {
            EntryState::Pending(waiters) => EntryStatus::Pending {
                waiters: waiters.len(),
            },
            EntryState::Ready(_) => EntryStatus::Ready { refs: entry.refs },
            EntryState::Failed => EntryStatus::Failed { refs: entry.refs },
        })
    }

    /// The payload of a ready entry, without touching recency
    pub fn peek(&self, key: &K) -> Option<&P> {
        match self.entries.get(key) {
            Some(ResolutionEntry {
                state: EntryState::Ready(payload),
                ..
            }) => Some(payload),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of loads this cache has started
    pub fn loads_started(&self) -> u64 {
        self.loads_started
    }

    // Private methods

    fn settle(&mut self, key: K, result: Result<P, LoadError>) {
        let Some(entry) = self.entries.get_mut(&key) else {
            warn!("Load completed for unknown key {:?}", key);
            return;
        };
        let waiters = match &mut entry.state {
            EntryState::Pending(waiters) => mem::take(waiters),
            EntryState::Ready(_) | EntryState::Failed => {
                warn!("Duplicate completion for settled key {:?}", key);
                return;
            }
        };

        match result {
            Ok(payload) => {
                debug!("Resolved {:?} for {} waiters", key, waiters.len());
                for waiter in waiters {
                    let _ = waiter.try_send(Ok(payload.clone()));
                }
                entry.state = EntryState::Ready(payload);
                if entry.refs == 0 {
                    self.idle.put(key, ());
                    self.trim_idle();
                }
            }
            Err(error) => {
                warn!(
                    "Unable to resolve {:?} [reason={}], failing {} waiters",
                    key,
                    error,
                    waiters.len()
                );
                for waiter in waiters {
                    let _ = waiter.try_send(Err(error.clone()));
                }
                if entry.refs == 0 {
                    self.entries.remove(&key);
                } else {
                    entry.state = EntryState::Failed;
                }
            }
        }
    }

    fn trim_idle(&mut self) {
        while self.idle.len() > self.idle_capacity {
            let Some((key, _)) = self.idle.pop_lru() else {
                break;
            };
            debug!("Evicting idle entry {:?}", key);
            self.entries.remove(&key);
        }
    }
}
