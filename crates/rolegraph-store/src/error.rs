//! Error types for the rolegraph-store operations.

use thiserror::Error;

use rolegraph_core::RbacError;

use crate::client::GraphError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] GraphError),

    #[error("Shape error: {0}")]
    Shape(#[from] RbacError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl SyncError {
    /// True for caller-initiated termination (cancel or deadline).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
