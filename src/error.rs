use thiserror::Error;

/// Errors surfaced to callers of the graph and optimizer APIs.
///
/// Each variant maps to one class of caller misuse so the editor layer can
/// tell them apart when turning them into user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
