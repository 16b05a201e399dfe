//! Bridge configuration.
//!
//! Settings can come from an optional TOML file and from command-line flags.
//! Both are read into a [`BridgeSettings`] where every field is optional;
//! the flags are overlaid on top of the file, and [`BridgeSettings::resolve`]
//! turns the result into an immutable, validated [`BridgeConfig`]. Resolution
//! happens before any external command is run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::hg::redact_url;

// ---------------------------------------------------------------------------
// Resolved config
// ---------------------------------------------------------------------------

/// Immutable configuration for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Directory holding both the RTC working copy and the Mercurial store.
    pub directory: PathBuf,
    /// Minimum tracing level: trace, debug, info, warn, error.
    pub log_level: String,
    pub mercurial: MercurialConfig,
    pub rtc: RtcConfig,
}

/// Target repository settings.
#[derive(Clone)]
pub struct MercurialConfig {
    /// URL pushed to after every commit.
    pub repository: String,
    /// Author recorded on every bridge commit.
    pub author: String,
    /// Message of the commit created by `init`.
    pub initial_message: String,
    /// Directories never staged into the target (RTC metadata).
    pub exclude: Vec<String>,
    /// Path or name of the `hg` executable.
    pub binary: String,
}

/// Source repository settings.
#[derive(Clone)]
pub struct RtcConfig {
    pub repository: String,
    pub workspace: String,
    pub stream: String,
    pub username: String,
    pub password: String,
    /// Path or name of the `scm` executable.
    pub binary: String,
}

impl fmt::Debug for MercurialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MercurialConfig")
            .field("repository", &redact_url(&self.repository))
            .field("author", &self.author)
            .field("initial_message", &self.initial_message)
            .field("exclude", &self.exclude)
            .field("binary", &self.binary)
            .finish()
    }
}

impl fmt::Debug for RtcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcConfig")
            .field("repository", &self.repository)
            .field("workspace", &self.workspace)
            .field("stream", &self.stream)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("binary", &self.binary)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unresolved settings
// ---------------------------------------------------------------------------

/// Partially specified settings, as read from a TOML file or from flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeSettings {
    #[serde(default)]
    pub bridge: BridgeSection,
    #[serde(default)]
    pub mercurial: MercurialSection,
    #[serde(default)]
    pub rtc: RtcSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeSection {
    pub directory: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct MercurialSection {
    pub repository: Option<String>,
    pub author: Option<String>,
    pub initial_message: Option<String>,
    pub exclude: Option<Vec<String>>,
    pub binary: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RtcSection {
    pub repository: Option<String>,
    pub workspace: Option<String>,
    pub stream: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Environment variable holding the RTC password, used when `password`
    /// is not given directly.
    pub password_env: Option<String>,
    pub binary: Option<String>,
}

impl fmt::Debug for MercurialSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MercurialSection")
            .field("repository", &self.repository.as_deref().map(redact_url))
            .field("author", &self.author)
            .field("initial_message", &self.initial_message)
            .field("exclude", &self.exclude)
            .field("binary", &self.binary)
            .finish()
    }
}

impl fmt::Debug for RtcSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcSection")
            .field("repository", &self.repository)
            .field("workspace", &self.workspace)
            .field("stream", &self.stream)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_env", &self.password_env)
            .field("binary", &self.binary)
            .finish()
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_author() -> String {
    "bridge".into()
}

fn default_initial_message() -> String {
    "Initial bridge checkin.".into()
}

fn default_exclude() -> Vec<String> {
    vec![".jazz5".into(), ".metadata".into()]
}

fn default_hg_binary() -> String {
    "hg".into()
}

fn default_scm_binary() -> String {
    "scm".into()
}

impl BridgeSettings {
    /// Load settings from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading bridge configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: BridgeSettings =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("bridge configuration parsed successfully");
        Ok(settings)
    }

    /// Overlay `other` on top of `self`: any value set in `other` wins.
    pub fn overlay(self, other: BridgeSettings) -> Self {
        Self {
            bridge: BridgeSection {
                directory: other.bridge.directory.or(self.bridge.directory),
                log_level: other.bridge.log_level.or(self.bridge.log_level),
            },
            mercurial: MercurialSection {
                repository: other.mercurial.repository.or(self.mercurial.repository),
                author: other.mercurial.author.or(self.mercurial.author),
                initial_message: other
                    .mercurial
                    .initial_message
                    .or(self.mercurial.initial_message),
                exclude: other.mercurial.exclude.or(self.mercurial.exclude),
                binary: other.mercurial.binary.or(self.mercurial.binary),
            },
            rtc: RtcSection {
                repository: other.rtc.repository.or(self.rtc.repository),
                workspace: other.rtc.workspace.or(self.rtc.workspace),
                stream: other.rtc.stream.or(self.rtc.stream),
                username: other.rtc.username.or(self.rtc.username),
                password: other.rtc.password.or(self.rtc.password),
                password_env: other.rtc.password_env.or(self.rtc.password_env),
                binary: other.rtc.binary.or(self.rtc.binary),
            },
        }
    }

    /// Apply defaults, resolve the password and validate every mandatory
    /// field.
    pub fn resolve(self) -> Result<BridgeConfig, ConfigError> {
        let password = match self.rtc.password {
            Some(pw) => Some(pw),
            None => self
                .rtc
                .password_env
                .as_deref()
                .and_then(|var| resolve_optional_env(var, "rtc.password_env")),
        };

        let directory = self
            .bridge
            .directory
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or_else(|| missing("bridge.directory", "--directory"))?;

        let config = BridgeConfig {
            directory,
            log_level: self.bridge.log_level.unwrap_or_else(default_log_level),
            mercurial: MercurialConfig {
                repository: required(
                    self.mercurial.repository,
                    "mercurial.repository",
                    "--mercurial-repository",
                )?,
                author: self.mercurial.author.unwrap_or_else(default_author),
                initial_message: self
                    .mercurial
                    .initial_message
                    .unwrap_or_else(default_initial_message),
                exclude: self.mercurial.exclude.unwrap_or_else(default_exclude),
                binary: self.mercurial.binary.unwrap_or_else(default_hg_binary),
            },
            rtc: RtcConfig {
                repository: required(self.rtc.repository, "rtc.repository", "--rtc-repository")?,
                workspace: required(self.rtc.workspace, "rtc.workspace", "--rtc-workspace")?,
                stream: required(self.rtc.stream, "rtc.stream", "--rtc-stream")?,
                username: required(self.rtc.username, "rtc.username", "--rtc-user")?,
                password: required(password, "rtc.password", "--rtc-password")?,
                binary: self.rtc.binary.unwrap_or_else(default_scm_binary),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r#"# RtcHgBridge configuration
# Command-line flags override anything set here.

[bridge]
directory = "/var/lib/rtchg/bridge"
log_level = "info"

[mercurial]
repository = "ssh://hg.example.com//repos/project"
author = "bridge"
# initial_message = "Initial bridge checkin."
# exclude = [".jazz5", ".metadata"]
# binary = "hg"

[rtc]
repository = "https://rtc.example.com:9443/ccm"
workspace = "bridge-workspace"
stream = "Project Stream"
username = "bridge"
password_env = "RTC_PASSWORD"
# binary = "scm"
"#
    }
}

impl BridgeConfig {
    /// Validate the non-mandatory fields that still need sane values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mercurial.author.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "mercurial.author".into(),
                detail: "author must not be empty".into(),
            });
        }
        if self.mercurial.initial_message.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "mercurial.initial_message".into(),
                detail: "initial commit message must not be empty".into(),
            });
        }
        if self.mercurial.exclude.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "mercurial.exclude".into(),
                detail: "exclude entries must not be empty".into(),
            });
        }
        if self.mercurial.binary.is_empty() || self.rtc.binary.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "binary".into(),
                detail: "tool paths must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn missing(field: &str, flag: &str) -> ConfigError {
    ConfigError::MissingValue {
        field: field.into(),
        flag: flag.into(),
    }
}

fn required(value: Option<String>, field: &str, flag: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(field, flag)),
    }
}

/// Try to read an environment variable by name.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
