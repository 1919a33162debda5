//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No text selected")]
    NoSelection,
    /// The user dismissed the name prompt or submitted blank input.
    #[error("no component name given")]
    EmptyIdentifier,
    #[error("invalid selection {start}..{end} for a buffer of {len} bytes")]
    InvalidSelection { start: usize, end: usize, len: usize },
    #[error("Failed to create component: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to edit buffer: {0}")]
    BufferEdit(#[source] anyhow::Error),
    #[error("failed to render component template: {0}")]
    Template(String),
    #[error("Could not find @Component decorator in the original file.")]
    DeclarationBlockNotFound,
}

impl ExtractError {
    /// Cancellations end the invocation without any user facing message.
    pub fn is_silent(&self) -> bool {
        matches!(self, ExtractError::EmptyIdentifier)
    }
}
