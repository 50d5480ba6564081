//! Configuration File Loading
//!
//! Finds the config file in the usual locations, applies environment
//! overrides and validates the result.

use super::Config;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "DIAGSHELL_CONFIG";

/// Environment variable overriding the shell socket path
pub const SOCKET_ENV: &str = "DIAGSHELL_SOCKET";

/// Configuration file loader
pub struct ConfigLoader {
    /// Candidate config files, in priority order
    search_paths: Vec<PathBuf>,
    /// Current configuration file path (if loaded)
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Fall back to defaults when no file is found
    pub create_default: bool,
    /// Apply `DIAGSHELL_SOCKET` after loading
    pub apply_env: bool,
    /// Whether to validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            create_default: true,
            apply_env: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            current_path: None,
        }
    }

    /// Load configuration with default options
    pub fn load() -> Result<Config> {
        Self::load_with_options(LoadOptions::default())
    }

    /// Load configuration with custom options
    pub fn load_with_options(options: LoadOptions) -> Result<Config> {
        let mut loader = Self::new();
        loader.load_config(&options)
    }

    /// Load an explicitly named file; a missing file is an error here
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let loader = Self::new();
        let mut config = loader.load_config_file(path)?;
        Self::apply_env_overrides(&mut config);
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Run the search with this loader's paths
    pub fn load_config(&mut self, options: &LoadOptions) -> Result<Config> {
        let mut config = match self.find_and_load_config()? {
            Some((path, config)) => {
                debug!("Loaded configuration from {}", path.display());
                self.current_path = Some(path);
                config
            }
            None if options.create_default => {
                debug!("No configuration file found, using defaults");
                Config::default()
            }
            None => return Err(Error::ConfigNotFound),
        };

        if options.apply_env {
            Self::apply_env_overrides(&mut config);
        }

        if options.validate {
            Self::validate_config(&config)?;
        }

        Ok(config)
    }

    /// Save configuration to a specific path as TOML
    pub fn save_to_path(&self, config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::ConfigSaveFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let content = render_toml(config)?;
        fs::write(path, content).map_err(|e| Error::ConfigSaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Find and load configuration from search paths
    fn find_and_load_config(&self) -> Result<Option<(PathBuf, Config)>> {
        for path in &self.search_paths {
            if !path.exists() {
                continue;
            }

            match self.load_config_file(path) {
                Ok(config) => return Ok(Some((path.clone(), config))),
                Err(e) => {
                    // Keep searching; a broken user file should not hide /etc
                    warn!("Failed to load config from {}: {}", path.display(), e);
                    continue;
                }
            }
        }

        Ok(None)
    }

    /// Load a specific configuration file
    fn load_config_file(&self, path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
            format: "TOML".to_string(),
            reason: e.to_string(),
        })
    }

    /// Get default search paths for configuration files
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(explicit) = env::var(CONFIG_ENV) {
            if !explicit.trim().is_empty() {
                paths.push(PathBuf::from(explicit));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("diagshell").join("config.toml"));
        }

        paths.push(PathBuf::from("/etc/diagshell/config.toml"));

        paths
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(config: &mut Config) {
        Self::apply_overrides_from(config, |key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (used by tests)
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(socket) = lookup(SOCKET_ENV).filter(|s| !s.trim().is_empty()) {
            debug!("Socket path overridden by {}: {}", SOCKET_ENV, socket);
            config.endpoint.socket_path = PathBuf::from(socket);
        }
    }

    /// Validate configuration
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.endpoint.socket_path.as_os_str().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "endpoint.socket_path".to_string(),
                reason: "Socket path cannot be empty".to_string(),
            });
        }

        let timeouts = [
            ("timeouts.drain_ms", config.timeouts.drain_ms),
            ("timeouts.negotiate_ms", config.timeouts.negotiate_ms),
            ("timeouts.response_ms", config.timeouts.response_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(Error::ConfigValidationFailed {
                    field: field.to_string(),
                    reason: "Timeout must be greater than 0".to_string(),
                });
            }
            if value > 3_600_000 {
                return Err(Error::ConfigValidationFailed {
                    field: field.to_string(),
                    reason: "Timeout cannot exceed 1 hour".to_string(),
                });
            }
        }

        if config.negotiation.max_attempts == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "negotiation.max_attempts".to_string(),
                reason: "At least one attempt is required".to_string(),
            });
        }

        if config.negotiation.prompt_marker.is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "negotiation.prompt_marker".to_string(),
                reason: "Prompt marker cannot be empty".to_string(),
            });
        }

        if config.negotiation.prompt_request.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "negotiation.prompt_request".to_string(),
                reason: "Prompt request cannot be empty".to_string(),
            });
        }

        if config.session.read_chunk_size == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "session.read_chunk_size".to_string(),
                reason: "Read chunk size must be greater than 0".to_string(),
            });
        }

        if config.session.max_output_bytes < config.session.read_chunk_size {
            return Err(Error::ConfigValidationFailed {
                field: "session.max_output_bytes".to_string(),
                reason: "Output limit cannot be smaller than one read chunk".to_string(),
            });
        }

        Ok(())
    }

    /// Get the current configuration file path
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a config as pretty TOML
pub fn render_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| Error::ConfigParseFailed {
        format: "TOML".to_string(),
        reason: e.to_string(),
    })
}
