//! # Plaza Client
//! The client side of place transitions: issues at most one move request
//! at a time, applies confirmed moves to local state and group
//! subscriptions, caches scene models, and tracks whether the local
//! participant is still among the occupants of its place.

#![deny(unstable_features, unused_import_braces)]

mod client_config;
mod coordinator;
mod membership;
mod scene_cache;
mod traits;

pub use client_config::ClientConfig;
pub use coordinator::{ClientLocation, ClientTransitionCoordinator};
pub use membership::{is_member, MembershipTracker};
pub use scene_cache::SceneCache;
pub use traits::{GroupSubscriber, MembershipObserver, RequestSender, TransitionObserver};
