//! Prelude module for convenient imports.

pub use crate::error::{Result, SandboxError};
pub use crate::sandbox::{
    config::SandboxConfig,
    context::{SandboxContext, ScriptIdentity, ScriptOutcome, Variables},
    export::DEFAULT_EXPORT,
    loader::ModuleLoader,
    request::{HeaderRecord, RequestDescriptor, RequestRecord},
    store::{DirectoryFileStore, ProjectFileStore},
};
