//! The per-run context handed to a user script.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SandboxError};
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::export::ExportSlot;
use crate::sandbox::loader::{ModuleLoader, NoLoader};
use crate::sandbox::request::{RequestDescriptor, RequestRecord};
use crate::sandbox::store::{NoopFileStore, ProjectFileStore};
use crate::sandbox::template::apply_variables;

/// Environment variables, owned by the host and lent to one run at a time.
pub type Variables = HashMap<String, String>;

/// Logical name to path lookup table.
pub type FileIndex = HashMap<String, PathBuf>;

/// Test name to reported outcome.
pub type TestResults = BTreeMap<String, Value>;

/// Which project, version and environment a run belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptIdentity {
    pub project_id: String,
    pub version_id: String,
    pub environment_id: String,
    pub environment_name: String,
}

impl ScriptIdentity {
    pub fn new(
        project_id: impl Into<String>,
        version_id: impl Into<String>,
        environment_id: impl Into<String>,
        environment_name: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            version_id: version_id.into(),
            environment_id: environment_id.into(),
            environment_name: environment_name.into(),
        }
    }
}

/// What a finished run leaves behind. Variables are already in the host's map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptOutcome {
    pub tests: TestResults,
    /// `None` when the script never exported.
    pub export: Option<Value>,
    pub request: Option<RequestDescriptor>,
}

/// The narrow API a user script sees during one run.
///
/// Built by the host with everything pre-resolved, used by exactly one
/// script, then dropped or turned into a [`ScriptOutcome`] with
/// [`finish`](Self::finish).
pub struct SandboxContext<'a, L = NoLoader> {
    identity: ScriptIdentity,
    variables: &'a mut Variables,
    library_index: Arc<FileIndex>,
    data_file_index: Arc<FileIndex>,
    tests: TestResults,
    request: Option<RequestDescriptor>,
    export: ExportSlot,
    data_root: String,
    loader: L,
    store: Box<dyn ProjectFileStore + 'a>,
}

impl<'a> SandboxContext<'a, NoLoader> {
    /// Start building a context over the host's variable map.
    pub fn builder(
        identity: ScriptIdentity,
        variables: &'a mut Variables,
    ) -> SandboxContextBuilder<'a, NoLoader> {
        SandboxContextBuilder {
            identity,
            variables,
            library_index: Arc::default(),
            data_file_index: Arc::default(),
            record: None,
            config: SandboxConfig::default(),
            loader: NoLoader,
            store: Box::new(NoopFileStore),
        }
    }
}

impl<'a, L> SandboxContext<'a, L> {
    pub fn project_id(&self) -> &str {
        &self.identity.project_id
    }

    pub fn version_id(&self) -> &str {
        &self.identity.version_id
    }

    pub fn environment_id(&self) -> &str {
        &self.identity.environment_id
    }

    /// Name of the selected environment. Fixed for the context's lifetime.
    pub fn environment(&self) -> &str {
        &self.identity.environment_name
    }

    /// `<data_root>/<project_id>/<category>/<file>`, without touching the disk.
    pub fn resolve_project_file_path(&self, file: &str, category: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.data_root, self.identity.project_id, category, file
        )
    }

    /// Read a project data file through the configured store.
    ///
    /// The default store has nothing wired and returns `""` for any name.
    pub fn read_file(&self, file: &str) -> Result<String> {
        self.store.read(&self.identity.project_id, file)
    }

    /// Resolve `file` through the data file index and hand its path to `reader`.
    ///
    /// `reader` is not called when the name is not indexed.
    pub fn read_file_via<T, F>(&self, file: &str, reader: F) -> Result<T>
    where
        F: FnOnce(&Path) -> T,
    {
        match self.data_file_index.get(file) {
            Some(path) => Ok(reader(path)),
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(file, "data file not indexed");
                Err(SandboxError::FileNotFound(file.to_string()))
            }
        }
    }

    pub fn write_file(&self, file: &str, content: &str, replace_if_existing: bool) -> Result<()> {
        self.store
            .write(&self.identity.project_id, file, content, replace_if_existing)
    }

    /// [`write_file`](Self::write_file) replacing any existing file.
    pub fn write_file_default(&self, file: &str, content: &str) -> Result<()> {
        self.write_file(file, content, true)
    }

    pub fn delete_file(&self, file: &str) -> Result<()> {
        self.store.remove(&self.identity.project_id, file)
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn get_variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Remove a variable, returning its previous value.
    pub fn delete_variable(&mut self, key: &str) -> Option<String> {
        self.variables.remove(key)
    }

    pub fn variables(&self) -> &Variables {
        self.variables
    }

    /// Substitute `{{name}}` placeholders with the current variables.
    pub fn render(&self, template: &str) -> String {
        apply_variables(template, self.variables)
    }

    pub fn request(&self) -> Option<&RequestDescriptor> {
        self.request.as_ref()
    }

    /// Replace the request wholesale. `None` clears it.
    pub fn set_request(&mut self, request: impl Into<Option<RequestDescriptor>>) {
        self.request = request.into();
    }

    pub fn tests(&self) -> &TestResults {
        &self.tests
    }

    pub fn tests_mut(&mut self) -> &mut TestResults {
        &mut self.tests
    }

    /// Set the script's result. Last call wins.
    pub fn export(&mut self, value: impl Into<Value>) {
        self.export.set(value);
    }

    pub fn export_slot(&self) -> &ExportSlot {
        &self.export
    }

    /// End the run, releasing the borrow on the host's variables.
    pub fn finish(self) -> ScriptOutcome {
        ScriptOutcome {
            tests: self.tests,
            export: self.export.into_exported(),
            request: self.request,
        }
    }
}

impl<'a, L: ModuleLoader> SandboxContext<'a, L> {
    /// Load a registered library through the injected loader.
    ///
    /// Only names present in the library index can be loaded; the loader is
    /// called once with the indexed path and its result returned as is.
    pub fn load_library(&self, name: &str) -> Result<L::Module> {
        let path = self.library_index.get(name).ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::warn!(library = name, "library not registered");
            SandboxError::LibraryNotRegistered(name.to_string())
        })?;

        if path.as_os_str().is_empty() {
            return Err(SandboxError::InvalidLibraryPath(name.to_string()));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(library = name, path = %path.display(), "loading library");

        self.loader.load(path)
    }
}

impl<L> std::fmt::Debug for SandboxContext<'_, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxContext")
            .field("identity", &self.identity)
            .field("variables", &self.variables.len())
            .field("libraries", &self.library_index.len())
            .field("data_files", &self.data_file_index.len())
            .field("request", &self.request)
            .field("export", &self.export)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SandboxContext`].
pub struct SandboxContextBuilder<'a, L> {
    identity: ScriptIdentity,
    variables: &'a mut Variables,
    library_index: Arc<FileIndex>,
    data_file_index: Arc<FileIndex>,
    record: Option<RequestRecord>,
    config: SandboxConfig,
    loader: L,
    store: Box<dyn ProjectFileStore + 'a>,
}

impl<'a, L> SandboxContextBuilder<'a, L> {
    /// Libraries scripts may load, by logical name.
    pub fn library_index(mut self, index: impl Into<Arc<FileIndex>>) -> Self {
        self.library_index = index.into();
        self
    }

    /// Data files scripts may read, by logical name.
    pub fn data_file_index(mut self, index: impl Into<Arc<FileIndex>>) -> Self {
        self.data_file_index = index.into();
        self
    }

    /// The request this run represents.
    pub fn request_record(mut self, record: RequestRecord) -> Self {
        self.record = Some(record);
        self
    }

    pub fn config(mut self, config: SandboxConfig) -> Self {
        self.config = config;
        self
    }

    /// Back file operations with a real store.
    pub fn store(mut self, store: impl ProjectFileStore + 'a) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Set the loader behind `load_library`.
    pub fn loader<M: ModuleLoader>(self, loader: M) -> SandboxContextBuilder<'a, M> {
        SandboxContextBuilder {
            identity: self.identity,
            variables: self.variables,
            library_index: self.library_index,
            data_file_index: self.data_file_index,
            record: self.record,
            config: self.config,
            loader,
            store: self.store,
        }
    }

    pub fn build(self) -> SandboxContext<'a, L> {
        let request = self
            .record
            .as_ref()
            .map(|record| RequestDescriptor::from_record(record, &self.config.default_method));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            project_id = %self.identity.project_id,
            version_id = %self.identity.version_id,
            environment = %self.identity.environment_name,
            libraries = self.library_index.len(),
            data_files = self.data_file_index.len(),
            has_request = request.is_some(),
            "sandbox context created"
        );

        SandboxContext {
            identity: self.identity,
            variables: self.variables,
            library_index: self.library_index,
            data_file_index: self.data_file_index,
            tests: TestResults::new(),
            request,
            export: ExportSlot::default(),
            data_root: self.config.data_root,
            loader: self.loader,
            store: self.store,
        }
    }
}
