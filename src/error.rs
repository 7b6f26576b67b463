//! Error types for the sandbox context.

use thiserror::Error;

/// Errors raised by sandbox context operations and their collaborators.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// `load_library` was called with a name missing from the library index.
    #[error("no valid js lib named [{0}], you should upload this lib first.")]
    LibraryNotRegistered(String),

    /// The library is registered but its path is empty.
    #[error("library [{0}] is registered with an empty path")]
    InvalidLibraryPath(String),

    /// A data file lookup missed.
    #[error("{0} not exists.")]
    FileNotFound(String),

    /// A file or project name that does not stay inside the data root.
    #[error("invalid file name [{0}]: only plain relative names are allowed")]
    InvalidFileName(String),

    /// The module loader failed to compile or instantiate a library.
    #[error("failed to load library: {0}")]
    ModuleLoad(#[source] anyhow::Error),

    /// A library exceeded its memory limit while loading or running.
    #[error("memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    /// A library call ran out of fuel (instruction limit).
    #[error("execution ran out of fuel")]
    OutOfFuel,

    /// A library call failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input (request records, config).
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SandboxError {
    /// Check if this error is an unregistered library lookup.
    pub fn is_library_not_registered(&self) -> bool {
        matches!(self, SandboxError::LibraryNotRegistered(_))
    }

    /// Check if this error is a registered library with an unusable path.
    pub fn is_invalid_library_path(&self) -> bool {
        matches!(self, SandboxError::InvalidLibraryPath(_))
    }

    /// Check if this error is a missing data file.
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, SandboxError::FileNotFound(_))
    }

    /// Check if this error is a rejected file or project name.
    pub fn is_invalid_file_name(&self) -> bool {
        matches!(self, SandboxError::InvalidFileName(_))
    }

    /// Check if this error represents a memory limit exceeded.
    pub fn is_memory_limit(&self) -> bool {
        matches!(self, SandboxError::MemoryLimitExceeded(_))
    }

    /// Check if this error represents an out-of-fuel condition.
    pub fn is_out_of_fuel(&self) -> bool {
        matches!(self, SandboxError::OutOfFuel)
    }
}

/// Result type alias for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;
