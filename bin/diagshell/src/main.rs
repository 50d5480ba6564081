//! diagshell - run commands on the switch NPU diagnostic shell
//!
//! With a command argument, runs it once and prints whatever the shell
//! printed. Without one, serves broker requests as JSON lines on
//! stdin/stdout until stdin closes.

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{debug, info, warn};

use diagshell::config::loader::{render_toml, ConfigLoader};
use diagshell::service::{bridge, DiagShellHandler, SERVICE_KEY};
use diagshell::{Config, ShellClient};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "diagshell", version, about = "Run commands on the NPU diagnostic shell")]
struct Cli {
    /// Command to run; omit to serve broker requests on stdin
    command: Option<String>,

    /// Shell socket path (overrides config and DIAGSHELL_SOCKET)
    #[arg(short, long)]
    socket: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// NPU unit to select before running the command
    #[arg(short, long)]
    unit: Option<String>,

    /// Response inactivity window in milliseconds
    #[arg(short, long, value_name = "MS")]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug);

    let config = load_configuration(&cli)?;

    if cli.dump_config {
        print!("{}", render_toml(&config)?);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let client = ShellClient::new(config);

    runtime.block_on(async move {
        match cli.command {
            Some(command) => {
                let output = client.run(&command).await;
                println!("{}", output);
                Ok(())
            }
            None => serve(client).await,
        }
    })
}

/// Logs go to stderr; stdout carries only shell output or bridge replies
fn init_logging(debug: bool) {
    let log_level = if debug
        || env::var("DIAGSHELL_DEBUG").map_or(false, |v| v == "1" || v.to_lowercase() == "true")
    {
        "debug"
    } else {
        "info"
    };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Load configuration, then apply command-line overrides
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ConfigLoader::load().context("failed to load configuration")?,
    };

    if let Some(socket) = &cli.socket {
        debug!("Socket override: {}", socket.display());
        config.endpoint.socket_path = socket.clone();
    }

    if let Some(unit) = &cli.unit {
        config.session.unit = Some(unit.clone());
    }

    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            warn!("Ignoring zero response timeout");
        } else {
            config.timeouts.response_ms = timeout;
        }
    }

    Ok(config)
}

/// Service mode: answer broker requests until stdin closes
async fn serve(client: ShellClient) -> anyhow::Result<()> {
    info!(
        "Handling {} via {}, requests on stdin",
        SERVICE_KEY,
        client.config().endpoint.socket_path.display()
    );

    let handler = DiagShellHandler::new(client);
    let stats = bridge::serve(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        &handler,
    )
    .await?;

    debug!("Served {} request(s)", stats.requests);
    Ok(())
}
