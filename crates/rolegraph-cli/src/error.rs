//! Error types for the rolegraph-cli crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid role set in {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Sync error: {0}")]
    Sync(#[from] rolegraph_store::SyncError),

    #[error("Graph error: {0}")]
    Graph(#[from] rolegraph_store::GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
