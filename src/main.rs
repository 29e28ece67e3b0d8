use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use procvisor::{ConfigFile, RuntimeError, Supervisor, SupervisorConfig, parse_addr};

/// procvisor - run a set of programs in dependency order and keep them alive
#[derive(Parser, Debug)]
#[command(name = "procvisor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML program file
    #[arg(short, long, default_value = "procvisor.toml")]
    config: PathBuf,

    /// Status endpoint address (ip:port); overrides `server` from the file
    #[arg(short, long)]
    server: Option<String>,

    /// Seconds to wait for children after a termination signal
    #[arg(short, long, default_value_t = 10)]
    grace: u64,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(label = e.as_label(), "{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), RuntimeError> {
    let file = ConfigFile::load(&cli.config)?;
    let status_addr = match cli.server.as_deref() {
        Some(addr) => Some(parse_addr(addr)?),
        None => file.server_addr()?,
    };

    let cfg = SupervisorConfig {
        grace: Duration::from_secs(cli.grace),
        status_addr,
        ..SupervisorConfig::default()
    };

    info!(
        config = %cli.config.display(),
        name = file.name.as_deref().unwrap_or("-"),
        programs = file.programs.len(),
        "loaded configuration"
    );

    let summary = Supervisor::builder(cfg)
        .with_programs(file.programs())
        .build()?
        .run()
        .await?;

    for (key, program) in &summary.programs {
        info!(
            program = %key,
            attempts = program.attempts,
            state = %program.info.lifecycle,
            exit_code = %program.info.exit_code,
            "final state"
        );
    }
    info!("Exit");
    Ok(())
}
