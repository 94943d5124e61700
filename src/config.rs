//! Configuration system for Taskpulse
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (TASKPULSE_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values
//!
//! Missing credentials are not an error: the tracker simply stays
//! disabled. Partial credentials are rejected at load time.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::api::HttpApiConfig;
use crate::error::{Error, Result};
use crate::tracker::DEFAULT_CACHE_SIZE;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tracking service connection settings
    pub api: ApiSettings,

    /// Lifecycle tracking behavior
    pub tracking: TrackingSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Tracking service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Service base URL
    pub host: String,

    /// Organization slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Project slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// API token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Lifecycle tracking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    /// Track every published task, not only those explicitly marked
    pub auto_track: bool,

    /// Capacity of the local task cache
    pub cache_size: usize,

    /// Name prefix of host-internal tasks that are never tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_namespace: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "https://taskpulse.net".to_string(),
            organization: None,
            project: None,
            token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            auto_track: false,
            cache_size: DEFAULT_CACHE_SIZE,
            internal_namespace: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl ApiSettings {
    /// Whether all credentials needed to talk to the service are present
    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of the credential fields that are still unset
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !present(&self.organization) {
            missing.push("organization");
        }
        if !present(&self.project) {
            missing.push("project");
        }
        if !present(&self.token) {
            missing.push("token");
        }
        missing
    }

    /// Connection details for the HTTP client
    pub fn http_config(&self) -> Result<HttpApiConfig> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(Error::not_configured(&missing));
        }
        Ok(HttpApiConfig {
            host: self.host.clone(),
            organization: self.organization.clone().unwrap_or_default(),
            project: self.project.clone().unwrap_or_default(),
            token: self.token.clone().unwrap_or_default(),
            timeout_secs: self.timeout_secs,
        })
    }

    /// Dashboard URL of a task, for human consumption
    pub fn dashboard_task_url(&self, task_id: &str) -> Option<String> {
        let organization = self.organization.as_deref().filter(|s| !s.is_empty())?;
        let project = self.project.as_deref().filter(|s| !s.is_empty())?;
        Some(format!(
            "{}/a/{}/p/{}/tasks/{}/",
            self.host.trim_end_matches('/'),
            organization,
            project,
            task_id
        ))
    }
}

fn present(value: &Option<String>) -> bool {
    matches!(value, Some(s) if !s.is_empty())
}

impl Settings {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut settings = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            settings = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("Failed to parse {}", path.display()),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        settings.apply_env_overrides();

        // 3. Expand paths
        settings.expand_paths();

        // 4. Validate
        settings.validate()?;

        Ok(settings)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let expanded = shellexpand::tilde(path);
            let path = PathBuf::from(expanded.as_ref());
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::config_not_found(path));
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("taskpulse.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("taskpulse").join("config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".taskpulse").join("config.toml"))
                .unwrap_or_default(),
            // System config (Linux)
            PathBuf::from("/etc/taskpulse/config.toml"),
        ];

        for path in &search_paths {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // API settings
        if let Ok(val) = std::env::var("TASKPULSE_HOST") {
            self.api.host = val;
        }
        if let Ok(val) = std::env::var("TASKPULSE_ORG") {
            self.api.organization = Some(val);
        }
        if let Ok(val) = std::env::var("TASKPULSE_PROJECT") {
            self.api.project = Some(val);
        }
        if let Ok(val) = std::env::var("TASKPULSE_API_KEY") {
            self.api.token = Some(val);
        }
        if let Ok(val) = std::env::var("TASKPULSE_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.api.timeout_secs = n;
            }
        }

        // Tracking settings
        if let Ok(val) = std::env::var("TASKPULSE_AUTO_TRACK") {
            self.tracking.auto_track = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = std::env::var("TASKPULSE_CACHE_SIZE") {
            if let Ok(n) = val.parse() {
                self.tracking.cache_size = n;
            }
        }
        if let Ok(val) = std::env::var("TASKPULSE_INTERNAL_NAMESPACE") {
            self.tracking.internal_namespace = Some(val);
        }

        // Logging settings
        if let Ok(val) = std::env::var("TASKPULSE_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("TASKPULSE_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("TASKPULSE_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        // Validate the service URL
        if self.api.host.is_empty() {
            return Err(Error::config_field_invalid("api.host", "host cannot be empty"));
        }
        match Url::parse(&self.api.host) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(Error::config_field_invalid(
                    "api.host",
                    format!("unsupported URL scheme '{}'", url.scheme()),
                ));
            }
            Err(e) => {
                return Err(Error::config_field_invalid(
                    "api.host",
                    format!("'{}' is not a valid URL: {}", self.api.host, e),
                ));
            }
        }

        // Credentials are all-or-nothing
        let missing = self.api.missing_fields();
        if !missing.is_empty() && missing.len() < 3 {
            return Err(Error::config_validation(format!(
                "Incomplete tracking credentials; missing: {}",
                missing.join(", ")
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "api.timeout_secs",
                "timeout must be at least 1 second",
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<()> {
    let config_path = path.map(|p| PathBuf::from(expand_path(p))).unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskpulse")
            .join("config.toml")
    });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    // Generate default config with comments
    let config_content = generate_default_config();

    // Write the file
    fs::write(&config_path, config_content).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    println!("Configuration file created: {}", config_path.display());
    Ok(())
}

/// Generate default configuration content with comments
pub fn generate_default_config() -> String {
    r#"# Taskpulse configuration
# https://github.com/taskpulse/taskpulse-rs

[api]
# Base URL of the tracking service
host = "https://taskpulse.net"

# Organization and project slugs plus the API token.
# Tracking stays disabled until all three are set.
# organization = "my-org"
# project = "my-project"
# token = "tp_..."

# Request timeout in seconds
timeout_secs = 30

[tracking]
# Track every published task, not only those explicitly marked
auto_track = false

# Capacity of the local task cache
cache_size = 128

# Name prefix of host-internal tasks that are never tracked
# internal_namespace = "celery."

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.taskpulse/logs/taskpulse.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
