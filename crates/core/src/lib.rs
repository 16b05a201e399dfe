//! RtcHgBridge core library.
//!
//! One-way replay of an RTC SCM stream into a Mercurial repository:
//! configuration, the `scm` and `hg` clients, the compare-output parser, and
//! the sync engine that ties them together.

pub mod adapter;
pub mod config;
pub mod errors;
pub mod hg;
pub mod models;
pub mod rtc;
pub mod sync_engine;
pub mod workdir;

// Re-exports for convenience.
pub use adapter::{SourceAdapter, TargetAdapter};
pub use config::{BridgeConfig, BridgeSettings};
pub use models::Revision;
pub use sync_engine::BridgeEngine;
