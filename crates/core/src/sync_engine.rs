//! Synchronization engine: replays RTC change sets into Mercurial.
//!
//! State machine of a bridge directory:
//! `Uninitialized → Initializing → Initialized → Syncing → Synced`,
//! with `Failed` when a workflow aborts.
//!
//! The engine keeps no record of the last synced revision. Every `run`
//! re-queries the source for pending revisions and applies them strictly in
//! the order returned, one commit and one push per revision. The first
//! failure aborts the workflow; anything already pushed stays pushed.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{error, info, instrument, warn};

use crate::adapter::{SourceAdapter, TargetAdapter};
use crate::config::BridgeConfig;
use crate::errors::{InitStep, RevisionStage, SyncError};
use crate::hg::HgClient;
use crate::models::{CommitOutcome, PushOutcome, Revision, RunStats};
use crate::rtc::RtcClient;
use crate::workdir::reset_directory;

/// Lifecycle state of the bridge directory as seen by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    Initializing,
    Initialized,
    Syncing,
    Synced,
    Failed,
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Initialized => write!(f, "initialized"),
            Self::Syncing => write!(f, "syncing"),
            Self::Synced => write!(f, "synced"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Drives a [`SourceAdapter`] and a [`TargetAdapter`] over one bridge
/// directory.
pub struct BridgeEngine<S, T> {
    source: S,
    target: T,
    directory: PathBuf,
    remote: String,
    author: String,
    initial_message: String,
    state: Mutex<BridgeState>,
}

impl BridgeEngine<RtcClient, HgClient> {
    /// Build an engine backed by the `scm` and `hg` command-line tools.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let source = RtcClient::new(&config.rtc, &config.directory);
        let target = HgClient::new(&config.mercurial, &config.directory);
        Self::new(config, source, target)
    }
}

impl<S, T> BridgeEngine<S, T>
where
    S: SourceAdapter,
    T: TargetAdapter,
{
    pub fn new(config: &BridgeConfig, source: S, target: T) -> Self {
        Self {
            source,
            target,
            directory: config.directory.clone(),
            remote: config.mercurial.repository.clone(),
            author: config.mercurial.author.clone(),
            initial_message: config.mercurial.initial_message.clone(),
            state: Mutex::new(BridgeState::Uninitialized),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Bootstrap the bridge: wipe the directory, load the RTC workspace into
    /// it, create the Mercurial repository, and commit and push its initial
    /// contents.
    #[instrument(skip(self), fields(dir = %self.directory.display()))]
    pub async fn init(&self) -> Result<(), SyncError> {
        self.set_state(BridgeState::Initializing);
        match self.init_steps().await {
            Ok(()) => {
                self.set_state(BridgeState::Initialized);
                info!("bridge initialized");
                Ok(())
            }
            Err(e) => {
                self.set_state(BridgeState::Failed);
                error!(error = %e, "bridge init failed");
                Err(e)
            }
        }
    }

    async fn init_steps(&self) -> Result<(), SyncError> {
        reset_directory(&self.directory)
            .await
            .map_err(|e| init_error(InitStep::ResetDirectory, e))?;

        self.source
            .create_and_load_workspace()
            .await
            .map_err(|e| init_error(InitStep::LoadWorkspace, e))?;

        self.target
            .initialize_repository()
            .await
            .map_err(|e| init_error(InitStep::InitRepository, e))?;

        self.target
            .commit_all(&self.initial_message, &self.author)
            .await
            .map_err(|e| init_error(InitStep::Commit, e))?;

        self.target
            .push(&self.remote)
            .await
            .map_err(|e| init_error(InitStep::Push, e))?;

        Ok(())
    }

    /// Apply every pending revision in order, calling `on_synced` after each
    /// one has been pushed.
    #[instrument(skip(self, on_synced), fields(dir = %self.directory.display()))]
    pub async fn run<F>(&self, mut on_synced: F) -> Result<RunStats, SyncError>
    where
        F: FnMut(&Revision),
    {
        let mut stats = RunStats {
            started_at: Some(chrono::Utc::now()),
            ..Default::default()
        };

        self.set_state(BridgeState::Syncing);
        let pending = match self.source.pending_revisions().await {
            Ok(pending) => pending,
            Err(e) => {
                self.set_state(BridgeState::Failed);
                let err = SyncError::PendingRevisions(Box::new(e));
                error!(error = %err, "could not list pending revisions");
                return Err(err);
            }
        };
        stats.pending = pending.len() as u64;

        if pending.is_empty() {
            info!("no pending revisions, nothing to sync");
        } else {
            info!(count = pending.len(), "found pending revisions");
        }

        for revision in &pending {
            if let Err(e) = self.apply(revision, &mut stats).await {
                self.set_state(BridgeState::Failed);
                error!(error = %e, applied = stats.applied, "run aborted");
                return Err(e);
            }
            on_synced(revision);
        }

        stats.completed_at = Some(chrono::Utc::now());
        self.set_state(BridgeState::Synced);
        info!(applied = stats.applied, "run complete");
        Ok(stats)
    }

    async fn apply(&self, revision: &Revision, stats: &mut RunStats) -> Result<(), SyncError> {
        let id = revision.id.as_str();
        info!(revision = id, "syncing revision");

        self.source
            .advance_to(id)
            .await
            .map_err(|e| revision_error(id, RevisionStage::Advance, e))?;

        let outcome = self
            .target
            .commit_all(&revision.commit_message(), &self.author)
            .await
            .map_err(|e| revision_error(id, RevisionStage::Commit, e))?;
        if outcome == CommitOutcome::NothingChanged {
            stats.empty_commits += 1;
        }

        let pushed = self
            .target
            .push(&self.remote)
            .await
            .map_err(|e| revision_error(id, RevisionStage::Push, e))?;
        if pushed == PushOutcome::NothingToPush && outcome == CommitOutcome::Committed {
            warn!(revision = id, "commit created but remote reported nothing to push");
        }

        stats.applied += 1;
        stats.last_revision = Some(revision.id.clone());
        Ok(())
    }

    /// Get the current engine state.
    pub fn get_state(&self) -> BridgeState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, new_state: BridgeState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        info!(from = %*state, to = %new_state, "state transition");
        *state = new_state;
    }
}

fn init_error<E>(step: InitStep, e: E) -> SyncError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SyncError::Init {
        step,
        source: Box::new(e),
    }
}

fn revision_error<E>(id: &str, stage: RevisionStage, e: E) -> SyncError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SyncError::Revision {
        id: id.to_string(),
        stage,
        source: Box::new(e),
    }
}
