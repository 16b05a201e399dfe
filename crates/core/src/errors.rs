//! Error types for the RtcHgBridge core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. The sync
//! engine wraps adapter failures in [`SyncError`] together with the step that
//! was running.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// RTC errors
// ---------------------------------------------------------------------------

/// Errors from RTC `scm` CLI operations and output parsing.
#[derive(Debug, Error)]
pub enum RtcError {
    /// The `scm` binary was not found on `$PATH`.
    #[error("scm binary not found: {0}")]
    BinaryNotFound(String),

    /// The bridge directory `scm` should run in does not exist.
    #[error("bridge directory {} does not exist (run --init first)", .0.display())]
    WorkingDirMissing(PathBuf),

    /// An `scm` command exited with a non-zero status.
    #[error("scm command failed (exit {exit_code}): [{command}]: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// A line of `scm compare` output did not look like `(<id>) <message>`.
    #[error("unparseable revision log line {line_number}: {line:?}")]
    LogParse { line_number: usize, line: String },

    /// Generic I/O wrapper.
    #[error("scm I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Mercurial errors
// ---------------------------------------------------------------------------

/// Errors from Mercurial `hg` CLI operations.
#[derive(Debug, Error)]
pub enum HgError {
    /// The `hg` binary was not found on `$PATH`.
    #[error("hg binary not found: {0}")]
    BinaryNotFound(String),

    /// The repository directory `hg` should run in does not exist.
    #[error("bridge directory {} does not exist (run --init first)", .0.display())]
    WorkingDirMissing(PathBuf),

    /// An `hg` command exited with a status it does not document as success.
    #[error("hg command failed (exit {exit_code}): [{command}]: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Generic I/O wrapper.
    #[error("hg I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Sync engine errors
// ---------------------------------------------------------------------------

/// The step of the `init` workflow that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    ResetDirectory,
    LoadWorkspace,
    InitRepository,
    Commit,
    Push,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResetDirectory => write!(f, "reset working directory"),
            Self::LoadWorkspace => write!(f, "create and load workspace"),
            Self::InitRepository => write!(f, "initialize repository"),
            Self::Commit => write!(f, "initial commit"),
            Self::Push => write!(f, "initial push"),
        }
    }
}

/// The per-revision stage of the `run` workflow that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionStage {
    Advance,
    Commit,
    Push,
}

impl fmt::Display for RevisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advance => write!(f, "advance"),
            Self::Commit => write!(f, "commit"),
            Self::Push => write!(f, "push"),
        }
    }
}

/// Errors from the synchronization engine.
///
/// Adapter failures are boxed so the engine can be driven by any
/// [`crate::adapter::SourceAdapter`] / [`crate::adapter::TargetAdapter`]
/// implementation, not only the CLI-backed ones.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A step of the `init` workflow failed.
    #[error("init failed during {step}")]
    Init {
        step: InitStep,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Querying the source for pending revisions failed.
    #[error("failed to list pending revisions")]
    PendingRevisions(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Applying a single revision failed part way.
    #[error("revision {id} failed during {stage}")]
    Revision {
        id: String,
        stage: RevisionStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A mandatory parameter was not supplied, or was empty.
    #[error("missing required parameter '{field}' ({flag})")]
    MissingValue { field: String, flag: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
