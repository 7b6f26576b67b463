//! Resource limiting for wasm libraries.

use wasmtime::{ResourceLimiter, Store};
use wasmtime_wasi::preview1::WasiP1Ctx;

/// Resource limiter that enforces memory and table size limits.
pub struct LibraryLimiter {
    max_memory: u64,
    peak_memory: u64,
    max_table_elements: u64,
    limit_exceeded: bool,
}

impl LibraryLimiter {
    /// Create a limiter with the given memory ceiling in bytes.
    pub fn new(max_memory: u64) -> Self {
        Self {
            max_memory,
            peak_memory: 0,
            max_table_elements: 10_000,
            limit_exceeded: false,
        }
    }

    /// Whether any growth request was refused.
    pub fn limit_exceeded(&self) -> bool {
        self.limit_exceeded
    }

    /// Highest memory size granted so far.
    pub fn peak_memory(&self) -> u64 {
        self.peak_memory
    }

    pub fn max_memory(&self) -> u64 {
        self.max_memory
    }
}

impl ResourceLimiter for LibraryLimiter {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        let desired = desired as u64;
        if desired > self.max_memory {
            self.limit_exceeded = true;
            return Ok(false);
        }
        self.peak_memory = self.peak_memory.max(desired);
        Ok(true)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired as u64 > self.max_table_elements {
            self.limit_exceeded = true;
            return Ok(false);
        }
        Ok(true)
    }
}

/// Per-library store state.
pub struct LibraryState {
    pub limiter: LibraryLimiter,
    /// WASI context with no preopened directories.
    pub wasi: WasiP1Ctx,
}

impl LibraryState {
    pub fn new(max_memory: u64, wasi: WasiP1Ctx) -> Self {
        Self {
            limiter: LibraryLimiter::new(max_memory),
            wasi,
        }
    }
}

/// Extension trait wiring the limiter into a store.
pub trait StoreLimiterExt {
    fn configure_limiter(&mut self);
}

impl StoreLimiterExt for Store<LibraryState> {
    fn configure_limiter(&mut self) {
        self.limiter(|state| &mut state.limiter);
    }
}
