//! Server configuration loading and management.
//!
//! Configuration can be loaded from TOML, YAML, or JSON files, discovered by
//! walking up from the working directory, or built programmatically. A few
//! settings can be overridden from the environment for container deployments.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 9998
//!
//! [paths]
//! docs = "/srv/documents/"
//! intranet = "https://intranet.example.com/files/"
//!
//! [limits]
//! max_request_body_bytes = 52428800
//!
//! [text]
//! write_limit = 1000000
//! ```

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::serialize::NumberLocale;
use crate::{DocextractError, Result};

/// File name searched for by [`ServerConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "docextract.toml";

pub const HOST_ENV: &str = "DOCEXTRACT_HOST";
pub const PORT_ENV: &str = "DOCEXTRACT_PORT";
pub const MAX_REQUEST_BODY_BYTES_ENV: &str = "DOCEXTRACT_MAX_REQUEST_BODY_BYTES";

const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path keys available to GET requests, mapped to a base directory or URL prefix.
    /// The resource is appended to the base verbatim, so bases usually end in `/`.
    #[serde(default)]
    pub paths: HashMap<String, String>,

    #[serde(default)]
    pub limits: LimitsConfig,

    /// Number format used for metadata numeric inference
    #[serde(default)]
    pub serialization: NumberLocale,

    #[serde(default)]
    pub text: TextConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Request size limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,
}

/// Text extraction settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextConfig {
    /// Maximum characters collected per document; unlimited when unset.
    #[serde(default)]
    pub write_limit: Option<usize>,
}

/// Settings for URL-backed sources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_request_body_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BODY_BYTES
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            paths: HashMap::new(),
            limits: LimitsConfig::default(),
            serialization: NumberLocale::default(),
            text: TextConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_body_bytes: default_max_request_body_bytes(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `DocextractError::Config` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        toml::from_str(&content)
            .map_err(|e| DocextractError::config(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_yaml_ng::from_str(&content)
            .map_err(|e| DocextractError::config(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_json::from_str(&content)
            .map_err(|e| DocextractError::config(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => Self::from_toml_file(path),
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            other => Err(DocextractError::config(format!(
                "Unsupported config format '{}' for {}: expected .toml, .yaml, .yml or .json",
                other,
                path.display()
            ))),
        }
    }

    /// Discover `docextract.toml` in the current directory or its parents.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(DocextractError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::info!("Loading configuration from {}", candidate.display());
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Apply `DOCEXTRACT_HOST`, `DOCEXTRACT_PORT` and
    /// `DOCEXTRACT_MAX_REQUEST_BODY_BYTES`. Unparseable values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var(HOST_ENV)
            && !host.trim().is_empty()
        {
            self.host = host.trim().to_string();
        }

        if let Ok(value) = std::env::var(PORT_ENV) {
            match value.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Failed to parse {}='{}', must be a valid port", PORT_ENV, value),
            }
        }

        if let Ok(value) = std::env::var(MAX_REQUEST_BODY_BYTES_ENV) {
            match value.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => {
                    tracing::info!(
                        "Request body limit configured from environment: {} bytes ({:.1} MB)",
                        bytes,
                        bytes as f64 / (1024.0 * 1024.0)
                    );
                    self.limits.max_request_body_bytes = bytes;
                }
                _ => tracing::warn!(
                    "Failed to parse {}='{}', must be a positive integer",
                    MAX_REQUEST_BODY_BYTES_ENV,
                    value
                ),
            }
        }
    }

    /// Check the configuration for values that can't work.
    ///
    /// # Errors
    ///
    /// Returns `DocextractError::Validation` for an unparseable host, a zero
    /// body limit, or identical number separators.
    pub fn validate(&self) -> Result<()> {
        self.host
            .parse::<IpAddr>()
            .map_err(|e| DocextractError::validation(format!("Invalid host address '{}': {}", self.host, e)))?;

        if self.limits.max_request_body_bytes == 0 {
            return Err(DocextractError::validation("max_request_body_bytes must be greater than 0"));
        }

        if self.serialization.grouping_separator == self.serialization.decimal_separator {
            return Err(DocextractError::validation(format!(
                "grouping_separator and decimal_separator must differ (both are '{}')",
                self.serialization.decimal_separator
            )));
        }

        if self.text.write_limit == Some(0) {
            return Err(DocextractError::validation("text.write_limit must be greater than 0 when set"));
        }

        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        DocextractError::config_with_source(format!("Failed to read config file {}", path.display()), e)
    })
}
