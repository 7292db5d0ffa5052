//! Configuration system for the school console
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (SCHOOL_CONSOLE_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::types::{CurrentUser, Role, SchoolId};

/// Upper bound for `api.max_retries`
pub const MAX_RETRIES: u32 = 10;

/// Main console configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Remote API connection settings
    pub api: ApiSettings,

    /// Session the console acts as
    pub session: SessionSettings,

    /// Local storage paths
    pub storage: StorageSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// API base URL (empty = no remote, serve from the local seed store)
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for reads on transient failures
    pub max_retries: u32,
}

/// Current user settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Role name: "Super Admin", "Admin", "Teacher", "Student"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Affiliated school (required for Admin dashboards)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,

    /// User identifier, for log correlation only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Storage path settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Base data directory
    pub data_dir: String,

    /// File backing the local seed store (relative to data_dir unless absolute)
    pub seed_file: String,
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

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: None,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.school-console".to_string(),
            seed_file: "seed.json".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: e.to_string(),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        let search_paths = [
            PathBuf::from("school-console.toml"),
            dirs::config_dir()
                .map(|p| p.join("school-console").join("config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".school-console").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_API_URL") {
            self.api.base_url = val;
        }
        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_API_TOKEN") {
            self.api.auth_token = Some(val);
        }
        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_API_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.api.timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_API_MAX_RETRIES") {
            if let Ok(n) = val.parse() {
                self.api.max_retries = n;
            }
        }

        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_ROLE") {
            self.session.role = Some(val);
        }
        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_SCHOOL_ID") {
            self.session.school_id = Some(val);
        }

        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_DATA_DIR") {
            self.storage.data_dir = val;
        }

        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("SCHOOL_CONSOLE_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.storage.data_dir = expand_path(&self.storage.data_dir);
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.api.base_url.is_empty() {
            let parsed = Url::parse(&self.api.base_url).map_err(|e| {
                Error::config_field_invalid("api.base_url", format!("Invalid URL: {}", e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(Error::config_field_invalid(
                    "api.base_url",
                    "API URL must start with http:// or https://",
                ));
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "api.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        if self.api.max_retries > MAX_RETRIES {
            return Err(Error::config_field_invalid(
                "api.max_retries",
                format!("max_retries must be at most {}", MAX_RETRIES),
            ));
        }

        if let Some(ref role) = self.session.role {
            role.parse::<Role>()
                .map_err(|e| Error::config_field_invalid("session.role", e))?;
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Whether a remote API is configured
    pub fn has_remote(&self) -> bool {
        !self.api.base_url.trim().is_empty()
    }

    /// Path of the file backing the seed store
    pub fn seed_path(&self) -> PathBuf {
        let seed = PathBuf::from(expand_path(&self.storage.seed_file));
        if seed.is_absolute() {
            seed
        } else {
            PathBuf::from(&self.storage.data_dir).join(seed)
        }
    }

    /// Build the current user from the session section.
    ///
    /// Returns `None` when no role is configured (unauthenticated).
    pub fn current_user(&self) -> Result<Option<CurrentUser>> {
        let Some(ref role) = self.session.role else {
            return Ok(None);
        };
        let role: Role = role
            .parse()
            .map_err(|e| Error::config_field_invalid("session.role", e))?;
        Ok(Some(CurrentUser {
            user_id: self.session.user_id.clone(),
            role,
            school_id: self.session.school_id.clone().map(SchoolId::from),
        }))
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".school-console")
                .join("config.toml")
        });

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# School Console Configuration

[api]
# API base URL; leave empty to work from the local seed store
base_url = ""

# Bearer token for the API
# auth_token = ""

# Request timeout in seconds
timeout_secs = 30

# Retries for reads on transient failures (writes are never retried)
max_retries = 2

[session]
# Role: "Super Admin", "Admin", "Teacher", "Student"
# role = "Super Admin"

# Affiliated school, required for the Admin dashboard
# school_id = "1"

[storage]
# Base data directory
data_dir = "~/.school-console"

# Seed store file, relative to data_dir
seed_file = "seed.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log file path (comment out to disable file logging)
# file = "~/.school-console/logs/console.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert!(config.api.base_url.is_empty());
        assert!(!config.has_remote());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_env_override() {
        env::set_var("SCHOOL_CONSOLE_API_URL", "https://api.example.com");
        env::set_var("SCHOOL_CONSOLE_API_MAX_RETRIES", "5");
        env::set_var("SCHOOL_CONSOLE_ROLE", "Admin");

        let mut config = ConsoleConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.max_retries, 5);
        assert_eq!(config.session.role.as_deref(), Some("Admin"));

        env::remove_var("SCHOOL_CONSOLE_API_URL");
        env::remove_var("SCHOOL_CONSOLE_API_MAX_RETRIES");
        env::remove_var("SCHOOL_CONSOLE_ROLE");
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let mut config = ConsoleConfig::default();
        config.api.base_url = "ftp://files.example.com".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut config = ConsoleConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_max_retries_bound() {
        let mut config = ConsoleConfig::default();
        config.api.max_retries = MAX_RETRIES;
        assert!(config.validate().is_ok());

        config.api.max_retries = 40;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigValidation { field: Some(ref f), .. } if f == "api.max_retries"
        ));
    }

    #[test]
    fn test_validation_unknown_role() {
        let mut config = ConsoleConfig::default();
        config.session.role = Some("Principal".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = ConsoleConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_current_user_from_session() {
        let mut config = ConsoleConfig::default();
        assert!(config.current_user().unwrap().is_none());

        config.session.role = Some("Admin".to_string());
        config.session.school_id = Some("1".to_string());
        let user = config.current_user().unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.school_id, Some(SchoolId::from("1")));
    }

    #[test]
    fn test_seed_path_relative_to_data_dir() {
        let mut config = ConsoleConfig::default();
        config.storage.data_dir = "/var/lib/console".to_string();
        assert_eq!(config.seed_path(), PathBuf::from("/var/lib/console/seed.json"));

        config.storage.seed_file = "/tmp/other.json".to_string();
        assert_eq!(config.seed_path(), PathBuf::from("/tmp/other.json"));
    }

    #[test]
    fn test_generated_default_config_parses() {
        let parsed: ConsoleConfig = toml::from_str(&generate_default_config()).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.storage.seed_file, "seed.json");
    }

    #[test]
    fn test_parse_config_file() {
        let config_str = r#"
[api]
base_url = "https://school.example.com/api"
auth_token = "secret"
max_retries = 0

[session]
role = "Super Admin"

[logging]
level = "debug"
"#;

        let config: ConsoleConfig = toml::from_str(config_str).unwrap();
        assert!(config.has_remote());
        assert_eq!(config.api.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.current_user().unwrap().unwrap().role, Role::SuperAdmin);
        assert_eq!(config.logging.level, "debug");
    }
}
