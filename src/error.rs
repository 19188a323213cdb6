use std::path::PathBuf;

use thiserror::Error;

/// Failures the loader reports to the user by name. Anything else surfaces
/// as a generic `anyhow` chain.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot find '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: column '{column}' has invalid value '{value}'")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
    },
}
