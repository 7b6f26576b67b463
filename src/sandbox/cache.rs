//! Compiled library cache.
//!
//! Libraries are compiled once per engine and reused by every context that
//! loads them, so repeated `load_library` calls across script runs only pay
//! for instantiation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use wasmtime::{Engine, Module};

use crate::error::{Result, SandboxError};

/// A thread-safe cache of compiled modules keyed by canonical path.
///
/// Modules belong to the engine that compiled them; keep one cache per
/// engine.
#[derive(Debug, Default)]
pub struct LibraryCache {
    modules: RwLock<HashMap<PathBuf, Arc<Module>>>,
}

impl LibraryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached module or compile it if not present.
    ///
    /// The path is canonicalized first so `./libs/a.wasm` and an absolute
    /// spelling of the same file share one entry.
    pub fn get_or_compile(&self, engine: &Engine, path: impl AsRef<Path>) -> Result<Arc<Module>> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SandboxError::ModuleLoad(anyhow::anyhow!(
                    "library file not found: {}",
                    path.display()
                ))
            } else {
                SandboxError::Io(e)
            }
        })?;

        {
            let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(module) = modules.get(&canonical) {
                return Ok(Arc::clone(module));
            }
        }

        // Compile outside any lock.
        let bytes = std::fs::read(&canonical)?;
        let module = Module::new(engine, &bytes).map_err(|e| {
            SandboxError::ModuleLoad(anyhow::anyhow!(
                "failed to compile {}: {}",
                canonical.display(),
                e
            ))
        })?;
        let module = Arc::new(module);

        #[cfg(feature = "tracing")]
        tracing::debug!(path = %canonical.display(), "compiled library");

        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have compiled it meanwhile; keep the first.
        let entry = modules.entry(canonical).or_insert(module);
        Ok(Arc::clone(entry))
    }

    /// Check if a library is cached.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        match std::fs::canonicalize(path.as_ref()) {
            Ok(canonical) => self
                .modules
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(&canonical),
            Err(_) => false,
        }
    }

    /// Drop a library so the next load recompiles it.
    ///
    /// Returns `true` if the library was present.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        match std::fs::canonicalize(path.as_ref()) {
            Ok(canonical) => self
                .modules
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&canonical)
                .is_some(),
            Err(_) => false,
        }
    }

    pub fn clear(&self) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER_WAT: &str = r#"(module (func (export "answer") (result i32) i32.const 42))"#;

    #[test]
    fn test_cache_new() {
        let cache = LibraryCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_compiles_once_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answer.wat");
        std::fs::write(&path, ANSWER_WAT).unwrap();

        let engine = Engine::default();
        let cache = LibraryCache::new();

        let first = cache.get_or_compile(&engine, &path).unwrap();
        let second = cache.get_or_compile(&engine, &path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&path));

        assert!(cache.remove(&path));
        assert!(!cache.contains(&path));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_file_is_module_load_error() {
        let engine = Engine::default();
        let cache = LibraryCache::new();
        let err = cache
            .get_or_compile(&engine, "/definitely/not/here.wasm")
            .unwrap_err();
        assert!(matches!(err, SandboxError::ModuleLoad(_)));
    }

    #[test]
    fn test_invalid_module_is_module_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wasm");
        std::fs::write(&path, b"\0asm garbage").unwrap();

        let engine = Engine::default();
        let cache = LibraryCache::new();
        let err = cache.get_or_compile(&engine, &path).unwrap_err();
        assert!(matches!(err, SandboxError::ModuleLoad(_)));
        assert!(cache.is_empty());
    }
}
