//! # studium-core
//!
//! Core types, traits, and abstractions for the studium offline-first
//! study-content client.
//!
//! This crate provides the foundational data structures, the pure content
//! merge engine, the word-boundary chunker, and the trait seams that other
//! studium crates depend on.

pub mod chunking;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod merge;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use chunking::{chunk_text, WordChunks};
pub use error::{Error, Result};
pub use merge::merge;
pub use models::*;
pub use traits::*;
