//! WebAssembly libraries for `load_library`.

use std::path::Path;
use std::sync::Arc;

use wasmtime::{Engine, Instance, Linker, Store, Trap, Val};
use wasmtime_wasi::preview1;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

use crate::error::{Result, SandboxError};
use crate::sandbox::cache::LibraryCache;
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::limits::{LibraryState, StoreLimiterExt};
use crate::sandbox::loader::ModuleLoader;

/// Loads wasm libraries into memory-limited, WASI-restricted instances.
///
/// Clones share the engine and the compiled-module cache.
#[derive(Clone)]
pub struct WasmModuleLoader {
    engine: Engine,
    cache: Arc<LibraryCache>,
    max_memory: u64,
    max_fuel: Option<u64>,
}

impl std::fmt::Debug for WasmModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmModuleLoader")
            .field("engine", &"<wasmtime::Engine>")
            .field("cached", &self.cache.len())
            .field("max_memory", &self.max_memory)
            .field("max_fuel", &self.max_fuel)
            .finish()
    }
}

impl WasmModuleLoader {
    /// Create a loader using the memory and fuel limits from `config`.
    pub fn new(config: &SandboxConfig) -> Result<Self> {
        let mut engine_config = wasmtime::Config::new();
        engine_config.consume_fuel(config.max_fuel.is_some());

        let engine = Engine::new(&engine_config).map_err(|e| {
            SandboxError::Config(format!("failed to create wasm engine: {e}"))
        })?;

        Ok(Self {
            engine,
            cache: Arc::new(LibraryCache::new()),
            max_memory: config.max_memory,
            max_fuel: config.max_fuel,
        })
    }

    pub fn cache(&self) -> &LibraryCache {
        &self.cache
    }
}

impl ModuleLoader for WasmModuleLoader {
    type Module = WasmLibrary;

    fn load(&self, path: &Path) -> Result<WasmLibrary> {
        let module = self.cache.get_or_compile(&self.engine, path)?;

        // No preopens, no inherited env or args.
        let wasi = WasiCtxBuilder::new().build_p1();
        let mut store = Store::new(&self.engine, LibraryState::new(self.max_memory, wasi));
        store.configure_limiter();

        if let Some(fuel) = self.max_fuel {
            store.set_fuel(fuel).map_err(|e| {
                SandboxError::Config(format!("failed to set fuel: {e}"))
            })?;
        }

        let mut linker = Linker::new(&self.engine);
        preview1::add_to_linker_sync(&mut linker, |state: &mut LibraryState| &mut state.wasi)
            .map_err(|e| SandboxError::ModuleLoad(anyhow::anyhow!("failed to link WASI: {}", e)))?;

        let instance = linker.instantiate(&mut store, &module).map_err(|e| {
            if store.data().limiter.limit_exceeded() {
                return SandboxError::MemoryLimitExceeded(format!(
                    "{} exceeds {} bytes during instantiation",
                    path.display(),
                    self.max_memory
                ));
            }
            SandboxError::ModuleLoad(anyhow::anyhow!(
                "failed to instantiate {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(WasmLibrary { store, instance })
    }
}

/// An instantiated wasm library.
pub struct WasmLibrary {
    store: Store<LibraryState>,
    instance: Instance,
}

impl std::fmt::Debug for WasmLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmLibrary")
            .field("peak_memory", &self.peak_memory())
            .finish_non_exhaustive()
    }
}

impl WasmLibrary {
    /// Names of everything the library exports.
    pub fn export_names(&mut self) -> Vec<String> {
        self.instance
            .exports(&mut self.store)
            .map(|export| export.name().to_string())
            .collect()
    }

    /// Call an exported function whose parameters and results are all `i32`.
    pub fn call_i32(&mut self, name: &str, args: &[i32]) -> Result<Vec<i32>> {
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| SandboxError::ExecutionFailed(format!("no exported function `{name}`")))?;

        let params: Vec<Val> = args.iter().map(|a| Val::I32(*a)).collect();
        let result_count = func.ty(&self.store).results().len();
        let mut results: Vec<Val> = (0..result_count).map(|_| Val::I32(0)).collect();

        if let Err(e) = func.call(&mut self.store, &params, &mut results) {
            return Err(self.classify_failure(e));
        }

        results
            .iter()
            .map(|v| {
                v.i32().ok_or_else(|| {
                    SandboxError::ExecutionFailed(format!("`{name}` returned a non-i32 value"))
                })
            })
            .collect()
    }

    /// Highest linear memory size granted to the library.
    pub fn peak_memory(&self) -> u64 {
        self.store.data().limiter.peak_memory()
    }

    /// Fuel left, when fuel metering is on.
    pub fn remaining_fuel(&self) -> Option<u64> {
        self.store.get_fuel().ok()
    }

    fn classify_failure(&self, e: anyhow::Error) -> SandboxError {
        if self.store.data().limiter.limit_exceeded() {
            return SandboxError::MemoryLimitExceeded(
                "memory limit exceeded during call".to_string(),
            );
        }
        if matches!(e.downcast_ref::<Trap>(), Some(Trap::OutOfFuel)) {
            return SandboxError::OutOfFuel;
        }
        if let Some(exit) = e.downcast_ref::<I32Exit>() {
            return SandboxError::ExecutionFailed(format!("library exited with code {}", exit.0));
        }
        SandboxError::ExecutionFailed(e.to_string())
    }
}
