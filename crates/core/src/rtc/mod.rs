//! RTC `scm` CLI wrapper.

pub mod client;
pub mod parser;

pub use client::RtcClient;
pub use parser::{parse_revision_line, parse_revision_log, RevisionLog};
