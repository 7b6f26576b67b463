//! Sandbox context and the capabilities it hands to scripts.

pub mod cache;
pub mod config;
pub mod context;
pub mod export;
pub mod limits;
pub mod loader;
pub mod request;
pub mod store;
pub mod template;
pub mod wasm;
