//! Domain model types used throughout the bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Revisions
// ---------------------------------------------------------------------------

/// One change set on the RTC stream that has not yet been accepted into the
/// bridge workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Opaque RTC change-set identifier, as printed by `scm compare`.
    pub id: String,
    /// Free-form change-set comment.
    pub message: String,
}

impl Revision {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }

    /// The Mercurial commit message recording this revision: `<id>: <message>`.
    pub fn commit_message(&self) -> String {
        format!("{}: {}", self.id, self.message)
    }
}

// ---------------------------------------------------------------------------
// Target outcomes
// ---------------------------------------------------------------------------

/// Result of a successful `commit_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed,
    /// The tool reported that there was nothing to commit.
    NothingChanged,
}

/// Result of a successful `push`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushOutcome {
    Pushed,
    /// The remote already had every local changeset.
    NothingToPush,
}

// ---------------------------------------------------------------------------
// Run statistics
// ---------------------------------------------------------------------------

/// Statistics for a single `run` invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Number of revisions reported pending by the source.
    pub pending: u64,
    /// Number of revisions applied, committed and pushed.
    pub applied: u64,
    /// Revisions whose commit produced no changes in the target.
    pub empty_commits: u64,
    /// Id of the last revision pushed, if any.
    pub last_revision: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
