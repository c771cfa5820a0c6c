//! CLI entry point for rolegraph.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use rolegraph_store::CancelScope;

use rolegraph_cli::commands;
use rolegraph_cli::config::load_settings;

#[derive(Parser)]
#[command(name = "rolegraph")]
#[command(about = "Store and load RBAC role sets in a Neo4j graph")]
struct Cli {
    /// Config file prefix (default: rolegraph).
    #[arg(short, long, default_value = "rolegraph")]
    config: String,

    /// Abort the operation after this many seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the role and permission collections and the grant graph if missing.
    Schema,

    /// Save a role set from a JSON file.
    Save {
        /// JSON array of {"id": ..., "permissions": [...]}.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Load the stored role set and print it as JSON.
    Load {
        /// Pretty-print the output.
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;
    settings.graph.validate()?;

    let scope = match cli.timeout_secs {
        Some(secs) => CancelScope::with_timeout(Duration::from_secs(secs)),
        None => CancelScope::new(),
    };
    let token = scope.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            token.cancel();
        }
    });

    let graph = commands::connect(&settings).await?;

    match cli.command {
        Command::Schema => {
            let report = commands::schema(&graph, &settings, &scope).await?;
            tracing::info!(created = report.created_any(), "Schema ready");
        }
        Command::Save { input } => {
            let report = commands::save(&graph, &settings, &input, &scope).await?;
            println!("{}", serde_json::to_string(&report)?);
        }
        Command::Load { pretty } => {
            let roles = commands::load_roles(&graph, &settings, &scope).await?;
            let out = if pretty {
                serde_json::to_string_pretty(&roles)?
            } else {
                serde_json::to_string(&roles)?
            };
            println!("{out}");
        }
    }

    Ok(())
}
