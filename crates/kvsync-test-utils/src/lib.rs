//! Shared test utilities for the kvsync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`LocalTree`] temporary directory builder and snapshotter
//! - [`store`]: [`ScriptedStore`] store double that records calls and
//!   simulates concurrent writers
//! - [`agent`]: [`FakeConsul`] HTTP agent serving a [`MemoryStore`] over
//!   the Consul KV API
//!
//! [`MemoryStore`]: kvsync_store::MemoryStore

pub mod agent;
pub mod store;
pub mod tree;

pub use agent::{AgentRequest, FakeConsul};
pub use store::{ALWAYS, Call, ScriptedStore};
pub use tree::LocalTree;
