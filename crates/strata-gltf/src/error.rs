use std::io;

use thiserror::Error;

/// Hard failures of the glTF crate.
///
/// Diagnostics produced while building an asset are not errors in this sense:
/// they go to the reader's [`crate::MessageLog`]. These variants cover the
/// convenience entry points and the pieces usable on their own.
#[derive(Error, Debug)]
pub enum GltfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid GLB: {0}")]
    InvalidGlb(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Draco decode error: {0}")]
    DracoDecode(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),

    #[error("Animation payload worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, GltfError>;
