//! Configuration File Loading
//!
//! Handles loading and saving configuration files from various locations
//! with support for multiple formats and fallback mechanisms.

use super::Config;
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "SHELLGATE_CONFIG";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files, without extension
    search_paths: Vec<PathBuf>,
    /// Supported configuration file formats
    supported_formats: Vec<ConfigFormat>,
    /// Current configuration file path (if loaded)
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Format implied by a file extension; anything unknown is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Whether to fall back to the default config if none exists
    pub create_default: bool,
    /// Whether to validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            create_default: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            supported_formats: vec![ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Load configuration with default options
    pub fn load() -> Result<Config> {
        Self::load_with_options(LoadOptions::default())
    }

    /// Load configuration with custom options
    pub fn load_with_options(options: LoadOptions) -> Result<Config> {
        Self::new().load_config(&options)
    }

    /// Load from the search paths of this loader
    pub fn load_config(&mut self, options: &LoadOptions) -> Result<Config> {
        if let Some((path, config)) = self.find_and_load_config()? {
            info!("Loaded configuration from {}", path.display());
            self.current_path = Some(path);
            if options.validate {
                self.validate_config(&config)?;
            }
            return Ok(config);
        }

        // No configuration found, use defaults if requested
        if options.create_default {
            debug!("No configuration file found, using defaults");
            let config = Config::default();
            if options.validate {
                self.validate_config(&config)?;
            }
            Ok(config)
        } else {
            Err(Error::ConfigNotFound)
        }
    }

    /// Load and validate one specific file
    pub fn load_from_path(&mut self, path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(Error::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }
        let config = self.load_config_file(path, ConfigFormat::from_path(path))?;
        self.validate_config(&config)?;
        self.current_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Save configuration to the current path or default location
    pub fn save(&self, config: &Config) -> Result<PathBuf> {
        let path = self
            .current_path
            .clone()
            .unwrap_or_else(Self::get_default_config_path);
        self.save_to_path(config, &path)?;
        Ok(path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config: &Config, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = Self::render(config, ConfigFormat::from_path(path))?;
        fs::write(path, content)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Serialize `config` in `format`
    pub fn render(config: &Config, format: ConfigFormat) -> Result<String> {
        let rendered = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
        };
        rendered.map_err(|reason| Error::ConfigSerializationFailed {
            format: format.label().to_string(),
            reason,
        })
    }

    /// Find and load configuration from search paths
    fn find_and_load_config(&self) -> Result<Option<(PathBuf, Config)>> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR).map(PathBuf::from) {
            if path.exists() {
                let config = self.load_config_file(&path, ConfigFormat::from_path(&path))?;
                return Ok(Some((path, config)));
            }
            warn!(
                "{} points at {}, which does not exist",
                CONFIG_ENV_VAR,
                path.display()
            );
        }

        for path in &self.search_paths {
            for format in &self.supported_formats {
                let config_path = self.get_config_path_for_format(path, *format);

                if config_path.exists() {
                    match self.load_config_file(&config_path, *format) {
                        Ok(config) => return Ok(Some((config_path, config))),
                        Err(e) => {
                            // Log warning but continue searching
                            warn!(
                                "Failed to load config from {}: {}",
                                config_path.display(),
                                e
                            );
                            continue;
                        }
                    }
                }
            }
        }

        Ok(None)
    }

    /// Load a specific configuration file
    fn load_config_file(&self, path: &Path, format: ConfigFormat) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let parsed = match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| Error::ConfigParseFailed {
            format: format.label().to_string(),
            reason,
        })
    }

    /// Get configuration file path for a specific format
    fn get_config_path_for_format(&self, base_path: &Path, format: ConfigFormat) -> PathBuf {
        base_path.with_extension(format.extension())
    }

    /// Get default search paths for configuration files
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("shellgate").join("config"));
        }

        // Home directory fallback
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".shellgate"));
        }

        paths
    }

    /// Get the default configuration path
    fn get_default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellgate")
            .join("config.toml")
    }

    /// Validate configuration
    pub fn validate_config(&self, config: &Config) -> Result<()> {
        if config.shell.program.as_os_str().is_empty() {
            return Err(invalid("shell.program", "Shell program cannot be empty"));
        }

        if config.shell.max_history == 0 {
            return Err(invalid(
                "shell.max_history",
                "History size must be greater than 0",
            ));
        }

        if config.credential.prefix.trim().is_empty() {
            return Err(invalid(
                "credential.prefix",
                "Elevation prefix cannot be empty",
            ));
        }

        if let Err(e) = Regex::new(&config.credential.pattern) {
            return Err(invalid("credential.pattern", &e.to_string()));
        }

        if config.substitution.sigil_char().is_none() {
            return Err(invalid(
                "substitution.sigil",
                "Sigil must be exactly one character",
            ));
        }

        if config.substitution.command.trim().is_empty() {
            return Err(invalid(
                "substitution.command",
                "Substitution command cannot be empty",
            ));
        }

        if !config.relabel.template.contains(crate::host::LabelTemplate::PLACEHOLDER) {
            return Err(invalid(
                "relabel.template",
                "Label template must contain {seed}",
            ));
        }

        if config.relabel.initial_label.trim().is_empty() {
            return Err(invalid(
                "relabel.initial_label",
                "Initial label cannot be empty",
            ));
        }

        let mut seen = HashSet::new();
        for kind in &config.pipeline.preprocessors {
            if !seen.insert(kind) {
                return Err(invalid(
                    "pipeline.preprocessors",
                    &format!("Preprocessor '{}' is listed more than once", kind),
                ));
            }
        }

        for binding in &config.pipeline.processors {
            if binding.command.is_empty() || binding.command.chars().any(char::is_whitespace) {
                return Err(invalid(
                    "pipeline.processors",
                    &format!("Invalid command name '{}'", binding.command),
                ));
            }
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

    /// Add a custom search path
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
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

fn invalid(field: &str, reason: &str) -> Error {
    Error::ConfigValidationFailed {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
