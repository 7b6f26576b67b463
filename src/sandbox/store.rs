//! Project data file storage behind `read_file`, `write_file` and `delete_file`.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SandboxError};
use crate::sandbox::config::SandboxConfig;

/// Persistence for a project's data files.
pub trait ProjectFileStore {
    /// Read a data file as UTF-8.
    fn read(&self, project_id: &str, file: &str) -> Result<String>;

    /// Save a data file. With `replace_if_existing == false` an existing
    /// file is left untouched.
    fn write(
        &self,
        project_id: &str,
        file: &str,
        content: &str,
        replace_if_existing: bool,
    ) -> Result<()>;

    /// Remove a data file.
    fn remove(&self, project_id: &str, file: &str) -> Result<()>;
}

/// Store that persists nothing: reads are empty, writes and removes vanish.
///
/// This is what contexts use unless the host wires a real store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFileStore;

impl ProjectFileStore for NoopFileStore {
    fn read(&self, _project_id: &str, _file: &str) -> Result<String> {
        Ok(String::new())
    }

    fn write(&self, _project_id: &str, _file: &str, _content: &str, _replace: bool) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _project_id: &str, _file: &str) -> Result<()> {
        Ok(())
    }
}

/// Store backed by `<root>/<project>/<data_folder>/<file>` on disk.
#[derive(Debug, Clone)]
pub struct DirectoryFileStore {
    root: PathBuf,
    data_folder: String,
}

impl DirectoryFileStore {
    pub fn new(root: impl Into<PathBuf>, data_folder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            data_folder: data_folder.into(),
        }
    }

    /// Build a store from the configured data root and folder.
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(&config.data_root, &config.data_folder)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a project's data file.
    ///
    /// Both names must be relative paths made only of normal components, so
    /// the result always stays under `<root>/<project>/<data_folder>`.
    pub fn file_path(&self, project_id: &str, file: &str) -> Result<PathBuf> {
        check_name(project_id)?;
        check_name(file)?;
        Ok(self.root.join(project_id).join(&self.data_folder).join(file))
    }
}

/// Reject empty, absolute, `.` and `..` names before touching the disk.
fn check_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let plain = path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!(name, "rejected data file name");
        Err(SandboxError::InvalidFileName(name.to_string()))
    }
}

impl ProjectFileStore for DirectoryFileStore {
    fn read(&self, project_id: &str, file: &str) -> Result<String> {
        let path = self.file_path(project_id, file)?;
        std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SandboxError::FileNotFound(file.to_string())
            } else {
                SandboxError::Io(e)
            }
        })
    }

    fn write(
        &self,
        project_id: &str,
        file: &str,
        content: &str,
        replace_if_existing: bool,
    ) -> Result<()> {
        let path = self.file_path(project_id, file)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if replace_if_existing {
            std::fs::write(&path, content)?;
        } else {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut f) => f.write_all(content.as_bytes())?,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(path = %path.display(), "data file exists, keeping it");
                    return Ok(());
                }
                Err(e) => return Err(SandboxError::Io(e)),
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), bytes = content.len(), "data file saved");
        Ok(())
    }

    fn remove(&self, project_id: &str, file: &str) -> Result<()> {
        let path = self.file_path(project_id, file)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(path = %path.display(), "data file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SandboxError::Io(e)),
        }
    }
}
