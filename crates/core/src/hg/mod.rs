//! Mercurial `hg` CLI wrapper.

pub mod client;

pub use client::{redact_url, HgClient};
