//! # studium-sync
//!
//! Offline-first content synchronization for studium.
//!
//! A [`SyncCoordinator`] pulls the server snapshot through a
//! [`RemoteContentSource`](studium_core::RemoteContentSource), merges it with
//! the local snapshot (remote wins per entity, local-only entities survive),
//! and atomically replaces the offline store. At most one sync runs at a
//! time; concurrent attempts are rejected, not queued.

pub mod coordinator;

pub use coordinator::{SyncConfig, SyncCoordinator, SyncEvent, SyncHandle};
