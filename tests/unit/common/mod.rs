//! Shared test fixtures and helpers
//!
//! This module provides common utilities for testing descil-mturk components.

use std::fs;
use std::path::{Path, PathBuf};

use descil_mturk::{Descil, ServiceConfig};
use serde_json::{Value, json};
use tempfile::TempDir;

pub const SERVICE_KEY: &str = "test-service-key";
pub const PROJECT: &str = "TEST-PROJECT";

/// A `GetCodes` reply carrying the given access codes
pub fn codes_reply(codes: &[&str]) -> String {
    let codes: Vec<Value> = codes
        .iter()
        .map(|c| json!({"AccessCode": c, "ExitCode": format!("EXIT-{c}")}))
        .collect();
    json!({ "Codes": codes }).to_string()
}

/// Config pointing at a mock server
pub fn config_for(url: &str) -> ServiceConfig {
    ServiceConfig::new(SERVICE_KEY, PROJECT, url).expect("valid test config")
}

/// Facade with its own registry, pointing at a mock server
pub fn descil_for(url: &str) -> Descil {
    Descil::new(config_for(url)).expect("facade builds")
}

/// A temporary directory holding config and codes files
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Get the root path
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file and return its path
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a config.toml with the given body
    pub fn config(&self, body: &str) -> PathBuf {
        self.write("config.toml", body)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}
