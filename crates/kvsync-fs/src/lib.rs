//! Filesystem primitives for kvsync
//!
//! Provides slash-normalized path handling, atomic writes, and the
//! regular-file walk that feeds the two-way sync.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::NormalizedPath;
