//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use colored::Colorize;
use serde::Serialize;

use crate::descil::FetchOutcome;
use crate::error::Error;
use crate::models::{AccessCodeRecord, ServiceResponse};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

fn render_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Result of fetching codes
#[derive(Debug, Serialize)]
pub struct CodesResult {
    /// Where the codes came from
    pub source: String,
    /// Fetch details
    pub fetch: FetchOutcome,
    /// Every record in the registry
    pub codes: Vec<AccessCodeRecord>,
}

impl CodesResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => render_json(self),
        }
    }

    fn render_human(&self) {
        if self.codes.is_empty() {
            println!("No codes available from {}.", self.source);
            return;
        }

        println!("{} code(s) from {}:\n", self.codes.len(), self.source);
        for record in &self.codes {
            let state = session_state(record);
            let validity = if record.valid {
                String::new()
            } else {
                format!(" {}", "invalid".red())
            };
            println!("  {:<24} {}{}", record.access_code, state, validity);
        }
    }
}

fn session_state(record: &AccessCodeRecord) -> String {
    if record.dropped_out {
        "dropped out".yellow().to_string()
    } else if record.checked_out {
        "checked out".green().to_string()
    } else if record.checked_in {
        "checked in".cyan().to_string()
    } else if record.used {
        "used".to_string()
    } else {
        "available".dimmed().to_string()
    }
}

/// Result of a remote operation
#[derive(Debug, Serialize)]
pub struct ExchangeResult {
    /// Operation name
    pub operation: String,
    /// Access code involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
    /// Local record after the operation, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AccessCodeRecord>,
    /// Decoded reply from the service
    pub response: ServiceResponse,
}

impl ExchangeResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => render_json(self),
        }
    }

    fn render_human(&self) {
        match &self.access_code {
            Some(code) => println!("{} {}: {}", "✓".green(), self.operation, code),
            None => println!("{} {}", "✓".green(), self.operation),
        }

        if let Some(record) = &self.record {
            println!("  State: {}", session_state(record));
            if let Some(exit_code) = &record.exit_code {
                println!("  Exit code: {exit_code}");
            }
            if record.bonus > 0.0 {
                println!("  Bonus: {}", record.bonus);
            }
        }

        if !self.response.payoffs.is_empty() {
            println!("  Payoffs: {}", self.response.payoffs.len());
        }
        if !self.response.extra.is_empty() {
            let extra = serde_json::to_string(&self.response.extra).unwrap_or_default();
            println!("  Response: {extra}");
        }
    }
}

/// The loaded configuration, with the service key masked
#[derive(Debug, Serialize)]
pub struct ConfigInfo {
    /// Config file the values came from
    pub path: String,
    /// Masked service key
    pub key: String,
    /// Project code
    pub project: String,
    /// Service endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Local codes file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ConfigInfo {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => {
                println!("Config: {}", self.path);
                println!("  Key:     {}", self.key);
                println!("  Project: {}", self.project);
                println!("  URI:     {}", self.uri.as_deref().unwrap_or("(none)"));
                if let Some(file) = &self.file {
                    println!("  File:    {file}");
                }
                if let Some(timeout) = self.timeout_secs {
                    println!("  Timeout: {timeout}s");
                }
            },
            OutputMode::Json => render_json(self),
        }
    }
}

/// An error, for reporting a failed command
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    /// Error code string
    pub code: String,
    /// HTTP status, for transport errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable message
    pub message: String,
}

impl From<&Error> for ErrorOutput {
    fn from(err: &Error) -> Self {
        let status = match err {
            Error::Transport { status, .. } => *status,
            _ => None,
        };
        Self {
            code: err.kind().as_str().to_string(),
            status,
            message: err.to_string(),
        }
    }
}

impl ErrorOutput {
    /// Render the error based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => eprintln!("{} {}", "error:".red().bold(), self.message),
            OutputMode::Json => render_json(&serde_json::json!({ "error": self })),
        }
    }
}
