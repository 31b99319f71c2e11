use std::{sync::Arc, thread};

use log::warn;
use smol::channel::Sender;

use crate::LoadError;

/// Starts loads on behalf of a [`ResolutionCache`](crate::ResolutionCache).
/// A loader must eventually complete every completion it is handed, from
/// any thread; dropping one unfinished reports it as abandoned.
pub trait Loader<K: Clone, P> {
    fn load(&mut self, completion: LoadCompletion<K, P>);
}

/// Reports the outcome of exactly one load back to the cache
pub struct LoadCompletion<K: Clone, P> {
    key: K,
    sender: Sender<(K, Result<P, LoadError>)>,
    completed: bool,
}

impl<K: Clone, P> LoadCompletion<K, P> {
    pub(crate) fn new(key: K, sender: Sender<(K, Result<P, LoadError>)>) -> Self {
        Self {
            key,
            sender,
            completed: false,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn complete(mut self, result: Result<P, LoadError>) {
        self.completed = true;
        // a closed channel means the cache itself is gone
        let _ = self.sender.try_send((self.key.clone(), result));
    }
}

impl<K: Clone, P> Drop for LoadCompletion<K, P> {
    fn drop(&mut self) {
        if !self.completed {
            let _ = self
                .sender
                .try_send((self.key.clone(), Err(LoadError::Abandoned)));
        }
    }
}

/// The opaque store zone and scene payloads come from
pub trait BundleStore<K, P>: Send + Sync + 'static {
    fn load(&self, key: &K) -> Result<P, LoadError>;
}

/// Runs each load against a blocking store on its own thread
pub struct ThreadedLoader<S> {
    store: Arc<S>,
}

impl<S> ThreadedLoader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<K, P, S> Loader<K, P> for ThreadedLoader<S>
where
    K: Clone + Send + 'static,
    P: Send + 'static,
    S: BundleStore<K, P>,
{
    fn load(&mut self, completion: LoadCompletion<K, P>) {
        let store = self.store.clone();
        let spawned = thread::Builder::new()
            .name("plaza-loader".to_string())
            .spawn(move || {
                let result = store.load(completion.key());
                completion.complete(result);
            });
        if let Err(error) = spawned {
            warn!("Unable to spawn loader thread: {}", error);
        }
    }
}

/// Loads synchronously from an in-memory store. The outcome is still
/// delivered through the completion channel, so waiters are satisfied on
/// the cache's next `maintain` like any other load.
pub struct ImmediateLoader<S> {
    store: S,
}

impl<S> ImmediateLoader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<K, P, S> Loader<K, P> for ImmediateLoader<S>
where
    K: Clone,
    S: BundleStore<K, P>,
{
    fn load(&mut self, completion: LoadCompletion<K, P>) {
        let result = self.store.load(completion.key());
        completion.complete(result);
    }
}
