//! Where access codes come from
//!
//! Codes are normally fetched from the service with `GetCodes`. A configured
//! local file replaces the live fetch; it holds JSON, either an array of records
//! or an object with a `Codes` array (the shape of a `GetCodes` reply).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::client::ServiceClient;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::models::AccessCodeRecord;

/// Source of access codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    /// Live `GetCodes` exchange
    Remote,
    /// Local JSON file
    File(PathBuf),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CodesFile {
    List(Vec<AccessCodeRecord>),
    Envelope {
        #[serde(rename = "Codes", alias = "codes")]
        codes: Vec<AccessCodeRecord>,
    },
}

impl CodeSource {
    /// Pick the source for a configuration; a local file wins over the uri
    #[must_use]
    pub fn for_config(config: &ServiceConfig) -> Self {
        config
            .file
            .as_ref()
            .map_or(Self::Remote, |file| Self::File(file.clone()))
    }

    /// Load every record from the source
    pub async fn fetch(&self, client: &ServiceClient) -> Result<Vec<AccessCodeRecord>> {
        match self {
            Self::Remote => Ok(client.get_codes().await?.codes),
            Self::File(path) => load_file(path).await,
        }
    }
}

impl std::fmt::Display for CodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote service"),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Read records from a local codes file
pub async fn load_file(path: &Path) -> Result<Vec<AccessCodeRecord>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::configuration(format!("could not read codes file {}: {e}", path.display()))
    })?;
    parse_codes(&content)
        .map_err(|e| Error::configuration(format!("invalid codes file {}: {e}", path.display())))
}

fn parse_codes(content: &str) -> serde_json::Result<Vec<AccessCodeRecord>> {
    Ok(match serde_json::from_str(content)? {
        CodesFile::List(codes) | CodesFile::Envelope { codes } => codes,
    })
}
