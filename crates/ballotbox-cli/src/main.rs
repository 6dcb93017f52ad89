// crates/ballotbox-cli/src/main.rs
// ============================================================================
// Module: Ballotbox CLI Entry Point
// Description: Command dispatcher for the ballotbox server and config checks.
// Purpose: Build the configured store and recorder and run the HTTP server.
// Dependencies: ballotbox-config, ballotbox-core, ballotbox-server,
//               ballotbox-store-sqlite, clap, thiserror, tokio
// ============================================================================

//! ## Overview
//! The CLI wires configuration to the runtime: it selects the storage
//! backend, resolves the vote consistency strategy against the store's
//! advertised capabilities, and serves the HTTP API. A `config validate`
//! subcommand checks a config file without starting anything.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ballotbox_config::BallotboxConfig;
use ballotbox_config::StoreBackend;
use ballotbox_config::VoteStrategy;
use ballotbox_core::ConsistencyMode;
use ballotbox_core::InMemoryVoteStore;
use ballotbox_core::VoteAuditEvent;
use ballotbox_core::VoteAuditSink;
use ballotbox_core::VoteRecorder;
use ballotbox_core::VoteStore;
use ballotbox_server::build_server_state;
use ballotbox_store_sqlite::SqliteVoteStore;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "ballotbox", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the ballotbox HTTP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Path to the TOML config file; defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file and exit.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Path to the TOML config file; defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure carrying one user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// User-facing failure description.
    message: String,
}

impl CliError {
    /// Creates a CLI error from a message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Audit sink that writes vote-path events to stderr, one line per event.
struct StderrVoteAudit;

impl VoteAuditSink for StderrVoteAudit {
    fn record(&self, event: &VoteAuditEvent) {
        let line = match event {
            VoteAuditEvent::VoteRecorded {
                user_id,
                poll_id,
                option_id,
            } => {
                format!("vote recorded: user={user_id} poll={poll_id} option={option_id}")
            }
            VoteAuditEvent::CompensationApplied {
                ballot_id,
                poll_id,
            } => {
                format!("compensation applied: ballot={ballot_id} poll={poll_id}")
            }
            VoteAuditEvent::OrphanedBallot {
                ballot_id,
                poll_id,
                reason,
            } => {
                format!("orphaned ballot: ballot={ballot_id} poll={poll_id} reason={reason}")
            }
        };
        let _ = write_stderr_line(&line);
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("ballotbox {version}"))
            .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = BallotboxConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let bind = config
        .bind_addr()
        .map_err(|err| CliError::new(format!("config bind failed: {err}")))?;
    let store = build_store(&config)?;
    let recorder = build_recorder(&config, store, Arc::new(StderrVoteAudit))?;
    let state = build_server_state(recorder, &config.server.auth_tokens);
    write_stderr_line(&format!("ballotbox listening on {bind}"))
        .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
    ballotbox_server::run(bind, state)
        .await
        .map_err(|err| CliError::new(format!("serve failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the configured store backend.
fn build_store(config: &BallotboxConfig) -> CliResult<Arc<dyn VoteStore>> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryVoteStore::new())),
        StoreBackend::Sqlite => {
            let sqlite = config
                .store
                .sqlite
                .as_ref()
                .ok_or_else(|| CliError::new("sqlite backend requires a [store.sqlite] section"))?;
            let store = SqliteVoteStore::new(sqlite)
                .map_err(|err| CliError::new(format!("sqlite store init failed: {err}")))?;
            Ok(Arc::new(store))
        }
    }
}

/// Builds the recorder, resolving the configured strategy against the
/// store's advertised capabilities.
fn build_recorder(
    config: &BallotboxConfig,
    store: Arc<dyn VoteStore>,
    audit: Arc<dyn VoteAuditSink>,
) -> CliResult<VoteRecorder<dyn VoteStore>> {
    match config.vote.strategy {
        VoteStrategy::Auto => Ok(VoteRecorder::from_capabilities(store, audit)),
        VoteStrategy::Transactional => {
            VoteRecorder::new(store, ConsistencyMode::Transactional, audit)
                .map_err(|err| CliError::new(format!("recorder init failed: {err}")))
        }
        VoteStrategy::Compensating => {
            VoteRecorder::new(store, ConsistencyMode::Compensating, audit)
                .map_err(|err| CliError::new(format!("recorder init failed: {err}")))
        }
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
    }
}

/// Executes `config validate`.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    BallotboxConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    write_stdout_line("config ok")
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    write_stdout_line("").map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    Ok(())
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
