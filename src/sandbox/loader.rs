//! The capability `load_library` delegates to.

use std::path::Path;

use crate::error::{Result, SandboxError};

/// Turns a resolved library path into a loaded module.
///
/// The context only maps logical names to paths; resolution and loading
/// belong to the implementor. Closures of shape `Fn(&Path) -> Result<M>`
/// are loaders too.
pub trait ModuleLoader {
    /// What a successful load hands back to the script.
    type Module;

    fn load(&self, path: &Path) -> Result<Self::Module>;
}

impl<F, M> ModuleLoader for F
where
    F: Fn(&Path) -> Result<M>,
{
    type Module = M;

    fn load(&self, path: &Path) -> Result<M> {
        self(path)
    }
}

/// Loader for contexts whose host offers no libraries. Every load fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoader;

impl ModuleLoader for NoLoader {
    type Module = ();

    fn load(&self, path: &Path) -> Result<()> {
        Err(SandboxError::ModuleLoad(anyhow::anyhow!(
            "no module loader configured for {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_closure_is_loader() {
        let loader = |path: &Path| -> Result<PathBuf> { Ok(path.join("index.js")) };
        let module = loader.load(Path::new("/libs/x")).unwrap();
        assert_eq!(module, PathBuf::from("/libs/x/index.js"));
    }

    #[test]
    fn test_no_loader_fails() {
        let err = NoLoader.load(Path::new("/libs/x.js")).unwrap_err();
        assert!(matches!(err, SandboxError::ModuleLoad(_)));
        assert!(err.to_string().contains("/libs/x.js"));
    }
}
