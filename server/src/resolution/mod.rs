mod bundle;
mod loader;
mod resolution;
mod resolution_cache;

cfg_if! {
    if #[cfg(feature = "tokio_loader")] {
        mod tokio_loader;
        pub use tokio_loader::TokioLoader;
    }
}

pub use bundle::{Bundle, ResolutionKey};
pub use loader::{BundleStore, ImmediateLoader, LoadCompletion, Loader, ThreadedLoader};
pub use resolution::Resolution;
pub use resolution_cache::{EntryStatus, ResolutionCache};
