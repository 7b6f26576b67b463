//! Sandbox configuration with builder pattern.

use serde::Deserialize;

use crate::error::{Result, SandboxError};

/// Configuration shared by every context a host creates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandboxConfig {
    /// Base directory for project files, used by `resolve_project_file_path`.
    pub data_root: String,
    /// Category folder that holds project data files.
    pub data_folder: String,
    /// Method given to request records that carry none.
    pub default_method: String,
    /// Maximum linear memory in bytes for wasm libraries.
    pub max_memory: u64,
    /// Maximum fuel (instruction count limit) for wasm library calls.
    pub max_fuel: Option<u64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            data_root: "./global_data".to_string(),
            data_folder: "data".to_string(),
            default_method: "GET".to_string(),
            max_memory: 64 * 1024 * 1024, // 64MB
            max_fuel: None,
        }
    }
}

impl SandboxConfig {
    /// Create a new builder for SandboxConfig.
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }

    /// Parse a JSON config document. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SandboxConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.data_root.is_empty() {
            return Err(SandboxError::Config("dataRoot must not be empty".to_string()));
        }
        if self.default_method.is_empty() {
            return Err(SandboxError::Config(
                "defaultMethod must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for creating SandboxConfig instances.
#[derive(Debug, Clone, Default)]
pub struct SandboxConfigBuilder {
    data_root: Option<String>,
    data_folder: Option<String>,
    default_method: Option<String>,
    max_memory: Option<u64>,
    max_fuel: Option<u64>,
}

impl SandboxConfigBuilder {
    /// Set the base directory for project files.
    pub fn data_root(mut self, root: impl Into<String>) -> Self {
        self.data_root = Some(root.into());
        self
    }

    /// Set the category folder for project data files.
    pub fn data_folder(mut self, folder: impl Into<String>) -> Self {
        self.data_folder = Some(folder.into());
        self
    }

    /// Set the fallback request method.
    pub fn default_method(mut self, method: impl Into<String>) -> Self {
        self.default_method = Some(method.into());
        self
    }

    /// Set the maximum memory limit in bytes for wasm libraries.
    pub fn max_memory(mut self, bytes: u64) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Set the maximum fuel (instruction count).
    pub fn max_fuel(mut self, fuel: u64) -> Self {
        self.max_fuel = Some(fuel);
        self
    }

    /// Build the SandboxConfig.
    pub fn build(self) -> SandboxConfig {
        let default = SandboxConfig::default();
        SandboxConfig {
            data_root: self.data_root.unwrap_or(default.data_root),
            data_folder: self.data_folder.unwrap_or(default.data_folder),
            default_method: self.default_method.unwrap_or(default.default_method),
            max_memory: self.max_memory.unwrap_or(default.max_memory),
            max_fuel: self.max_fuel.or(default.max_fuel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();
        assert_eq!(config.data_root, "./global_data");
        assert_eq!(config.data_folder, "data");
        assert_eq!(config.default_method, "GET");
        assert_eq!(config.max_memory, 64 * 1024 * 1024);
        assert_eq!(config.max_fuel, None);
    }

    #[test]
    fn test_builder() {
        let config = SandboxConfig::builder()
            .data_root("/srv/projects")
            .max_memory(32 * 1024 * 1024)
            .max_fuel(1_000_000)
            .build();

        assert_eq!(config.data_root, "/srv/projects");
        assert_eq!(config.data_folder, "data");
        assert_eq!(config.max_memory, 32 * 1024 * 1024);
        assert_eq!(config.max_fuel, Some(1_000_000));
    }

    #[test]
    fn test_from_json_partial() {
        let config = SandboxConfig::from_json_str(r#"{"dataRoot": "/tmp/gd", "maxFuel": 500}"#)
            .unwrap();
        assert_eq!(config.data_root, "/tmp/gd");
        assert_eq!(config.max_fuel, Some(500));
        assert_eq!(config.default_method, "GET");
    }

    #[test]
    fn test_from_json_rejects_empty_root() {
        let err = SandboxConfig::from_json_str(r#"{"dataRoot": ""}"#).unwrap_err();
        assert!(matches!(err, SandboxError::Config(_)));

        let err = SandboxConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, SandboxError::Json(_)));
    }
}
