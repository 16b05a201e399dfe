//! The two seams the sync engine depends on.
//!
//! [`SourceAdapter`] is implemented by [`crate::rtc::RtcClient`] and
//! [`TargetAdapter`] by [`crate::hg::HgClient`]. Tests drive the engine with
//! in-memory fakes instead.

use async_trait::async_trait;

use crate::models::{CommitOutcome, PushOutcome, Revision};

/// Read side: the centralized system being migrated from.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create the bridge workspace on the stream and load it into the
    /// working directory. Not idempotent.
    async fn create_and_load_workspace(&self) -> Result<(), Self::Error>;

    /// Revisions on the stream not yet accepted into the workspace, oldest
    /// first. Queried fresh on every call.
    async fn pending_revisions(&self) -> Result<Vec<Revision>, Self::Error>;

    /// Accept exactly the given revision into the working copy.
    async fn advance_to(&self, revision_id: &str) -> Result<(), Self::Error>;
}

/// Write side: the repository being migrated to.
#[async_trait]
pub trait TargetAdapter: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create an empty repository at the working directory root.
    async fn initialize_repository(&self) -> Result<(), Self::Error>;

    /// Stage every change except source metadata and commit it.
    async fn commit_all(&self, message: &str, author: &str)
        -> Result<CommitOutcome, Self::Error>;

    /// Push all local commits to `remote_url`.
    async fn push(&self, remote_url: &str) -> Result<PushOutcome, Self::Error>;
}
