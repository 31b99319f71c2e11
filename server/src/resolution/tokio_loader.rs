use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::resolution::{BundleStore, LoadCompletion, Loader};

/// Runs loads as blocking tasks on a tokio runtime owned by the loader
pub struct TokioLoader<S> {
    store: Arc<S>,
    runtime: Runtime,
}

impl<S> TokioLoader<S> {
    pub fn new(store: S, worker_threads: usize) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("plaza-loader")
            .build()?;
        Ok(Self {
            store: Arc::new(store),
            runtime,
        })
    }
}

impl<K, P, S> Loader<K, P> for TokioLoader<S>
where
    K: Clone + Send + 'static,
    P: Send + 'static,
    S: BundleStore<K, P>,
{
    fn load(&mut self, completion: LoadCompletion<K, P>) {
        let store = self.store.clone();
        self.runtime.spawn_blocking(move || {
            let result = store.load(completion.key());
            completion.complete(result);
        });
    }
}
