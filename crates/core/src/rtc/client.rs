//! Asynchronous RTC `scm` CLI client.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::parser::parse_revision_log;
use crate::adapter::SourceAdapter;
use crate::config::RtcConfig;
use crate::errors::RtcError;
use crate::models::Revision;

/// Asynchronous client for a single RTC workspace, driven through `scm`.
///
/// Every command runs with the bridge directory as its working directory,
/// so `load` and `accept` operate on the bridge's copy.
#[derive(Debug, Clone)]
pub struct RtcClient {
    binary: String,
    repository: String,
    workspace: String,
    stream: String,
    username: String,
    password: String,
    working_dir: PathBuf,
}

impl RtcClient {
    /// Create a client for the workspace described by `config`, operating in
    /// `working_dir`.
    pub fn new(config: &RtcConfig, working_dir: impl Into<PathBuf>) -> Self {
        let client = Self {
            binary: config.binary.clone(),
            repository: config.repository.clone(),
            workspace: config.workspace.clone(),
            stream: config.stream.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            working_dir: working_dir.into(),
        };
        info!(
            repository = %client.repository,
            workspace = %client.workspace,
            stream = %client.stream,
            "created RtcClient"
        );
        client
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// `scm create workspace` on the configured stream.
    #[instrument(skip(self), fields(workspace = %self.workspace))]
    pub async fn create_workspace(&self) -> Result<(), RtcError> {
        self.run_scm(&[
            "create",
            "workspace",
            "--username",
            &self.username,
            "--password",
            &self.password,
            "--repository-uri",
            &self.repository,
            "--stream",
            &self.stream,
            &self.workspace,
        ])
        .await?;
        info!("rtc workspace created");
        Ok(())
    }

    /// `scm load` the workspace into the working directory.
    #[instrument(skip(self), fields(workspace = %self.workspace))]
    pub async fn load_workspace(&self) -> Result<(), RtcError> {
        let target = format!("{}@{}", self.workspace, self.repository);
        self.run_scm(&[
            "load",
            "--username",
            &self.username,
            "--password",
            &self.password,
            &target,
        ])
        .await?;
        info!(dir = %self.working_dir.display(), "rtc workspace loaded");
        Ok(())
    }

    /// `scm compare` the workspace against the stream, listing incoming
    /// change sets.
    #[instrument(skip(self), fields(workspace = %self.workspace, stream = %self.stream))]
    pub async fn compare(&self) -> Result<Vec<Revision>, RtcError> {
        let output = self
            .run_scm(&[
                "compare",
                "ws",
                &self.workspace,
                "stream",
                &self.stream,
                "--password",
                &self.password,
                "--include-types",
                "s",
            ])
            .await?;
        parse_revision_log(&output)
    }

    /// `scm accept` a single change set.
    #[instrument(skip(self))]
    pub async fn accept(&self, change_set: &str) -> Result<(), RtcError> {
        self.run_scm(&["accept", "--password", &self.password, "--changes", change_set])
            .await?;
        debug!(change_set, "accepted change set");
        Ok(())
    }

    async fn run_scm(&self, args: &[&str]) -> Result<String, RtcError> {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.working_dir)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let rendered = display_command(&self.binary, args);
        debug!(cmd = %rendered, "running scm command");
        let output = cmd.output().await.map_err(|e| match e.kind() {
            // Spawning in a missing directory also reports NotFound.
            std::io::ErrorKind::NotFound if !self.working_dir.is_dir() => {
                RtcError::WorkingDirMissing(self.working_dir.clone())
            }
            std::io::ErrorKind::NotFound => RtcError::BinaryNotFound(self.binary.clone()),
            _ => RtcError::IoError(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            warn!(exit_code, %stderr, cmd = %rendered, "scm command failed");
            return Err(RtcError::CommandFailed {
                command: rendered,
                exit_code,
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Render a command line for logs and errors with the value following
/// `--password` masked.
fn display_command(binary: &str, args: &[&str]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(binary.to_string());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            parts.push("****".to_string());
            mask_next = false;
        } else {
            mask_next = *arg == "--password";
            parts.push((*arg).to_string());
        }
    }
    parts.join(" ")
}

#[async_trait]
impl SourceAdapter for RtcClient {
    type Error = RtcError;

    async fn create_and_load_workspace(&self) -> Result<(), RtcError> {
        self.create_workspace().await?;
        self.load_workspace().await
    }

    async fn pending_revisions(&self) -> Result<Vec<Revision>, RtcError> {
        self.compare().await
    }

    async fn advance_to(&self, revision_id: &str) -> Result<(), RtcError> {
        self.accept(revision_id).await
    }
}
