//! Command implementations for kvsync-cli

pub mod fetch;
pub mod sync;

pub use fetch::run_fetch;
pub use sync::run_sync;
