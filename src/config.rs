//! Service configuration
//!
//! Loaded from a TOML file, by default `~/.config/descil/config.toml` (XDG
//! standard). The file supplies the service key, the project code and either
//! the service URI or a local file of codes used instead of a live fetch:
//!
//! ```toml
//! key = "service-key"
//! project = "PROJECT-CODE"
//! uri = "https://www.descil.ethz.ch/apps/mturk2/api/service.ashx"
//! # file = "codes.json"
//! # timeout_secs = 30
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV: &str = "DESCIL_CONFIG";

/// Config filename inside the config directory
const CONFIG_FILE: &str = "config.toml";

/// Raw, unvalidated contents of a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Service key
    #[serde(default)]
    pub key: Option<String>,
    /// Project code
    #[serde(default)]
    pub project: Option<String>,
    /// Remote endpoint
    #[serde(default)]
    pub uri: Option<String>,
    /// Local codes file used instead of a live fetch
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Validated configuration for one Descil project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Service key sent with every request
    pub service_key: String,
    /// Project code sent with every request
    pub project: String,
    /// Remote endpoint
    pub uri: Option<Url>,
    /// Local codes file; takes precedence over `uri` for fetching codes
    pub file: Option<PathBuf>,
    /// Per-request timeout, none by default
    pub timeout: Option<Duration>,
}

impl ServiceConfig {
    /// Build a config for a remote endpoint
    pub fn new(service_key: &str, project: &str, uri: &str) -> Result<Self> {
        ConfigFile {
            key: Some(service_key.to_string()),
            project: Some(project.to_string()),
            uri: Some(uri.to_string()),
            ..ConfigFile::default()
        }
        .validate(None)
    }

    /// Get the default config directory
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("descil")
    }

    /// Get the default config file path
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    /// Pick the config path: explicit argument, then `DESCIL_CONFIG`, then the default
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map_or_else(Self::config_path, PathBuf::from)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("could not read {}: {e}", path.display()))
        })?;
        let raw: ConfigFile = toml::from_str(&content).map_err(|e| {
            Error::configuration(format!("could not parse {}: {e}", path.display()))
        })?;
        let config = raw.validate(path.parent())?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Replace the endpoint with a local codes file
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set a per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Service key with all but the last four characters hidden
    #[must_use]
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.service_key.chars().collect();
        let visible = chars.len().saturating_sub(4);
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { *c })
            .collect()
    }
}

impl ConfigFile {
    /// Check required fields and build a [`ServiceConfig`]
    ///
    /// A relative `file` is resolved against `base_dir` when given.
    pub fn validate(self, base_dir: Option<&Path>) -> Result<ServiceConfig> {
        let service_key = required(self.key, "service key (key)")?;
        let project = required(self.project, "project code (project)")?;

        let uri = match self.uri.filter(|u| !u.trim().is_empty()) {
            Some(raw) => Some(parse_uri(&raw)?),
            None => None,
        };

        let file = self.file.filter(|f| !f.as_os_str().is_empty()).map(|f| {
            match base_dir {
                Some(base) if f.is_relative() => base.join(f),
                _ => f,
            }
        });

        if self.timeout_secs == Some(0) {
            return Err(Error::configuration("timeout_secs must be at least 1"));
        }

        if uri.is_none() && file.is_none() {
            return Err(Error::configuration(
                "no service uri (uri) or local codes file (file) configured",
            ));
        }

        Ok(ServiceConfig {
            service_key,
            project,
            uri,
            file,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

fn required(value: Option<String>, what: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::configuration(format!("no {what} found")))
}

fn parse_uri(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::configuration(format!("invalid service uri {raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::configuration(format!(
            "service uri must be http or https, got {other}"
        ))),
    }
}
