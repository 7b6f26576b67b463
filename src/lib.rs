//! # Sandbox Context
//!
//! The capability object a script runner hands to each user script.
//!
//! A host resolves everything up front (project and environment ids, the
//! environment's variables, which libraries and data files the project has
//! uploaded, the request under test) and builds one [`SandboxContext`] per
//! run. The script then only sees:
//!
//! - **Project paths**: `resolve_project_file_path` formats
//!   `<data_root>/<project>/<category>/<file>`
//! - **Variables**: get/set/delete on the host's own map, visible after the run
//! - **Libraries**: `load_library` maps registered names to paths and defers
//!   to an injected [`ModuleLoader`] (closures, or [`WasmModuleLoader`])
//! - **Data files**: `read_file_via` through the data file index, plus
//!   read/write/delete through a [`ProjectFileStore`] (inert by default)
//! - **Request**: the flattened request descriptor, replaceable
//! - **Export**: a single result slot starting at [`DEFAULT_EXPORT`]
//!
//! ## Example
//!
//! ```rust
//! use sandbox_context_rs::prelude::*;
//! use std::collections::HashMap;
//! use std::path::{Path, PathBuf};
//!
//! let mut variables = Variables::new();
//! let libraries: HashMap<String, PathBuf> =
//!     [("lodash".to_string(), PathBuf::from("/libs/lodash.js"))].into_iter().collect();
//!
//! let mut ctx = SandboxContext::builder(
//!     ScriptIdentity::new("p1", "v1", "e1", "staging"),
//!     &mut variables,
//! )
//! .library_index(libraries)
//! .loader(|path: &Path| -> Result<String> { Ok(path.display().to_string()) })
//! .build();
//!
//! assert_eq!(ctx.load_library("lodash").unwrap(), "/libs/lodash.js");
//! assert_eq!(ctx.resolve_project_file_path("a.js", "scripts"), "./global_data/p1/scripts/a.js");
//!
//! ctx.set_variable("token", "abc");
//! ctx.export(42);
//! let outcome = ctx.finish();
//!
//! assert_eq!(outcome.export, Some(serde_json::json!(42)));
//! assert_eq!(variables["token"], "abc");
//! ```
//!
//! The context does not isolate anything: it narrows what a script is
//! offered, and the host's execution engine is responsible for enforcing it.

pub mod error;
pub mod prelude;
pub mod sandbox;

// Re-export main types at crate root for convenience
pub use error::{Result, SandboxError};
pub use sandbox::cache::LibraryCache;
pub use sandbox::config::{SandboxConfig, SandboxConfigBuilder};
pub use sandbox::context::{
    FileIndex, SandboxContext, SandboxContextBuilder, ScriptIdentity, ScriptOutcome, TestResults,
    Variables,
};
pub use sandbox::export::{ExportSlot, DEFAULT_EXPORT};
pub use sandbox::loader::{ModuleLoader, NoLoader};
pub use sandbox::request::{HeaderRecord, RequestDescriptor, RequestRecord};
pub use sandbox::store::{DirectoryFileStore, NoopFileStore, ProjectFileStore};
pub use sandbox::template::{apply_all_variables, apply_variables};
pub use sandbox::wasm::{WasmLibrary, WasmModuleLoader};
