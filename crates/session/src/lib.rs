//! Session storage for conversation contexts
//!
//! Implements the core `ContextStore` capability with an in-memory
//! per-user map. Swapping in a persistent backend only requires another
//! `ContextStore` implementation.

pub mod store;

pub use store::InMemoryContextStore;
