//! # studium-store
//!
//! Durable key-value storage for studium: pluggable [`StorageBackend`]
//! implementations plus the repositories layered on top of them: the
//! offline content snapshot store and the task / material / embedding
//! record stores.
//!
//! [`StorageBackend`]: studium_core::StorageBackend

pub mod content;
pub mod file;
pub mod memory;
pub mod tasks;

pub use content::LocalContentStore;
pub use file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use tasks::KvTaskStore;
