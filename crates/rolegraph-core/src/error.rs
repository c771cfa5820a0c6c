use thiserror::Error;

/// Model-level error: something does not have the shape the store requires.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RbacError {
    #[error("Invalid {kind} identifier {value:?}: {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Duplicate role {0:?} in role set")]
    DuplicateRole(String),

    #[error("Invalid graph name for {field}: {value:?}")]
    InvalidName { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, RbacError>;
