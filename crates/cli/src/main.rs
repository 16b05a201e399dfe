//! RtcHgBridge command-line tool.
//!
//! `rtchg --init` seeds a Mercurial repository from an RTC stream; `rtchg
//! --run` replays every change set delivered to the stream since, one commit
//! and one push per change set.

mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rtchg_core::config::{BridgeSection, BridgeSettings, MercurialSection, RtcSection};
use rtchg_core::errors::ConfigError;
use rtchg_core::hg::redact_url;
use rtchg_core::{BridgeConfig, BridgeEngine};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Replay an RTC SCM stream into a Mercurial repository.
#[derive(Parser, Debug)]
#[command(
    name = "rtchg",
    version,
    about = "One-way bridge from an RTC SCM stream to a Mercurial repository",
    group(ArgGroup::new("action").required(true).args(["init", "run", "config_template"]))
)]
struct Cli {
    /// Initialize the bridge (creates or empties the working directory).
    #[arg(short, long)]
    init: bool,

    /// Run the bridge, replaying every pending change set.
    #[arg(short, long)]
    run: bool,

    /// Print an example configuration file and exit.
    #[arg(long)]
    config_template: bool,

    /// TOML configuration file; flags override its values.
    #[arg(short, long)]
    config: Option<String>,

    /// Working directory. Created or emptied on --init; keep it between runs.
    #[arg(short, long)]
    directory: Option<String>,

    /// URL of the Mercurial repository to push to.
    #[arg(short = 'm', long)]
    mercurial_repository: Option<String>,

    /// URI of the RTC repository.
    #[arg(short = 't', long)]
    rtc_repository: Option<String>,

    /// RTC workspace used by the bridge; created on --init.
    #[arg(short = 'w', long)]
    rtc_workspace: Option<String>,

    /// RTC stream to follow.
    #[arg(short = 's', long)]
    rtc_stream: Option<String>,

    /// RTC user name.
    #[arg(short = 'u', long)]
    rtc_user: Option<String>,

    /// RTC password.
    #[arg(short = 'p', long, env = "RTC_PASSWORD", hide_env_values = true)]
    rtc_password: Option<String>,

    /// Author recorded on bridge commits (default "bridge").
    #[arg(long)]
    author: Option<String>,

    /// Log level when RUST_LOG is not set (default "info").
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Init,
    Run,
}

impl Cli {
    fn action(&self) -> Action {
        if self.init {
            Action::Init
        } else {
            Action::Run
        }
    }

    /// Settings given on the command line, to be overlaid on the file.
    fn flag_settings(&self) -> BridgeSettings {
        BridgeSettings {
            bridge: BridgeSection {
                directory: self.directory.as_deref().map(expand_tilde),
                log_level: self.log_level.clone(),
            },
            mercurial: MercurialSection {
                repository: self.mercurial_repository.clone(),
                author: self.author.clone(),
                ..Default::default()
            },
            rtc: RtcSection {
                repository: self.rtc_repository.clone(),
                workspace: self.rtc_workspace.clone(),
                stream: self.rtc_stream.clone(),
                username: self.rtc_user.clone(),
                password: self.rtc_password.clone(),
                ..Default::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.config_template {
        print!("{}", BridgeSettings::default_template());
        return ExitCode::SUCCESS;
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => return usage_error(&e),
    };

    let level = settings
        .bridge
        .log_level
        .clone()
        .unwrap_or_else(|| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    let config = match settings.resolve() {
        Ok(config) => config,
        Err(e) => return usage_error(&e),
    };

    match run(cli.action(), &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<BridgeSettings, ConfigError> {
    let file = match &cli.config {
        Some(path) => BridgeSettings::load_from_file(expand_tilde(path))?,
        None => BridgeSettings::default(),
    };
    Ok(file.overlay(cli.flag_settings()))
}

/// Report a configuration problem with usage text and exit status 2.
fn usage_error(err: &ConfigError) -> ExitCode {
    eprintln!("{}", style::error(&format!("Error: {}", err)));
    eprintln!();
    eprintln!("{}", Cli::command().render_usage());
    eprintln!("{}", style::dim("Run with --help for the full list of parameters."));
    ExitCode::from(2)
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

async fn run(action: Action, config: &BridgeConfig) -> Result<()> {
    let engine = BridgeEngine::from_config(config);
    match action {
        Action::Init => cmd_init(&engine, config).await,
        Action::Run => cmd_run(&engine).await,
    }
}

async fn cmd_init<S, T>(engine: &BridgeEngine<S, T>, config: &BridgeConfig) -> Result<()>
where
    S: rtchg_core::SourceAdapter,
    T: rtchg_core::TargetAdapter,
{
    info!(dir = %config.directory.display(), "initializing bridge");
    engine.init().await.context("bridge init failed")?;
    println!(
        "{}",
        style::success(&format!(
            "Bridge initialized in {} and pushed to {}",
            config.directory.display(),
            redact_url(&config.mercurial.repository)
        ))
    );
    Ok(())
}

async fn cmd_run<S, T>(engine: &BridgeEngine<S, T>) -> Result<()>
where
    S: rtchg_core::SourceAdapter,
    T: rtchg_core::TargetAdapter,
{
    let stats = engine
        .run(|rev| println!("{}", style::syncing(&rev.id)))
        .await
        .context("bridge run failed")?;

    match stats.last_revision {
        Some(last) => println!(
            "{}",
            style::success(&format!(
                "Bridge up to date: {} revision(s) applied, last {}",
                stats.applied, last
            ))
        ),
        None => println!("{}", style::success("Bridge up to date: nothing pending")),
    }
    Ok(())
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
