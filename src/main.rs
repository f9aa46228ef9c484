use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, trace};
use upgrade_hub::config::{self, HubConfig};
use upgrade_hub::stream::{self, ChannelSender, RemoteStreams, StandardStreams};
use upgrade_hub::subprocess::{run_with_streams, ExitStatus, ProcessCommandBuilder};
use upgrade_hub::version::{self, VersionGate};

/// Coordinate in-place cluster database upgrades
#[derive(Parser)]
#[command(name = "upgrade-hub")]
#[command(about = "Coordinate in-place cluster database upgrades", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that two installations form a supported upgrade
    CheckVersions {
        /// Installation directory of the source cluster
        #[arg(long)]
        source_home: PathBuf,
        /// Installation directory of the target cluster
        #[arg(long)]
        target_home: PathBuf,
    },
    /// Check a source and target version without inspecting installations
    ValidateVersions {
        /// Source cluster version, e.g. 6.24.0
        source: String,
        /// Target cluster version, e.g. 7.0.0
        target: String,
    },
    /// Run a command as an upgrade step, streaming its output
    Run {
        /// Disconnect the client before the step starts
        #[arg(long)]
        detach_client: bool,
        /// Kill the step after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Program and arguments to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    match upgrade_hub::logging::init(&config.log, cli.verbose) {
        Ok(Some(path)) => debug!("Writing hub log to {}", path.display()),
        Ok(None) => debug!("Hub log file disabled"),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = match cli.command {
        Commands::CheckVersions {
            source_home,
            target_home,
        } => check_versions(&source_home, &target_home).map(|()| 0),
        Commands::ValidateVersions { source, target } => {
            validate_versions(&source, &target).map(|()| 0)
        }
        Commands::Run {
            detach_client,
            timeout,
            command,
        } => run_step(command, detach_client, timeout, &config).await,
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HubConfig> {
    let mut config = match path {
        Some(path) => HubConfig::load(path)?,
        None => match config::default_config_path() {
            Some(path) => HubConfig::load_or_default(&path)?,
            None => HubConfig::default(),
        },
    };
    config.merge_env_vars();
    config.validate()?;
    Ok(config)
}

fn check_versions(source_home: &Path, target_home: &Path) -> anyhow::Result<()> {
    let verified = VersionGate::production().verify(source_home, target_home)?;
    println!(
        "Upgrade from {} to {} is supported.",
        verified.source, verified.target
    );
    Ok(())
}

fn validate_versions(source: &str, target: &str) -> anyhow::Result<()> {
    let source = version::parse_version(source)?;
    let target = version::parse_version(target)?;
    version::validate(&source, &target)?;
    println!("Upgrade from {} to {} is supported.", source, target);
    Ok(())
}

async fn run_step(
    command: Vec<String>,
    detach_client: bool,
    timeout: Option<u64>,
    config: &HubConfig,
) -> anyhow::Result<i32> {
    let (program, args) = command.split_first().context("no command given")?;
    let mut builder = ProcessCommandBuilder::new(program).args(args);
    if let Some(secs) = timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let process = builder.build();

    let (sender, receiver) = ChannelSender::pair();
    let client = if detach_client {
        drop(receiver);
        None
    } else {
        Some(tokio::spawn(async move {
            stream::render(receiver, &StandardStreams).await
        }))
    };

    let streams = RemoteStreams::with_config(sender, &config.stream);
    let outcome = run_with_streams(&process, &streams).await;
    // Dropping the last handle on the sender lets the client drain and finish.
    drop(streams);

    if let Some(client) = client {
        let summary = client.await.context("client task failed")??;
        debug!(
            "Client rendered {} messages ({} stdout bytes, {} stderr bytes)",
            summary.messages, summary.stdout_bytes, summary.stderr_bytes
        );
    }

    let outcome = outcome?;
    Ok(match outcome.status {
        ExitStatus::Success => 0,
        ExitStatus::Error(code) => code,
        ExitStatus::Signal(signal) => 128 + signal,
    })
}
