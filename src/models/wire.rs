//! Request and response envelopes exchanged with the service
//!
//! Every request carries all eight fields; the ones an operation does not use
//! are sent blank, zero or empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AccessCodeRecord, CodeResult, Operation, null_as_default, serialize_amount};

/// Request body of every exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRequest {
    /// Operation name
    pub operation: Operation,
    /// Configured service key
    pub service_key: String,
    /// Configured project code
    pub project_code: String,
    /// Access code, blank when unused
    pub access_code: String,
    /// Exit code, blank when unused
    pub exit_code: String,
    /// Bonus, zero when unused
    #[serde(serialize_with = "serialize_amount")]
    pub bonus: f64,
    /// Payoff records, empty when unused
    pub payoffs: Vec<Value>,
    /// Session results, empty when unused
    pub codes: Vec<CodeResult>,
}

impl ServiceRequest {
    /// Create a request with every operation-specific field blank
    #[must_use]
    pub fn new(operation: Operation, service_key: &str, project_code: &str) -> Self {
        Self {
            operation,
            service_key: service_key.to_string(),
            project_code: project_code.to_string(),
            access_code: String::new(),
            exit_code: String::new(),
            bonus: 0.0,
            payoffs: Vec::new(),
            codes: Vec::new(),
        }
    }

    /// Set the access code
    #[must_use]
    pub fn access_code(mut self, access_code: &str) -> Self {
        self.access_code = access_code.to_string();
        self
    }

    /// Set the exit code and bonus
    #[must_use]
    pub fn exit(mut self, exit_code: &str, bonus: f64) -> Self {
        self.exit_code = exit_code.to_string();
        self.bonus = bonus;
        self
    }

    /// Set the session results
    #[must_use]
    pub fn codes(mut self, codes: Vec<CodeResult>) -> Self {
        self.codes = codes;
        self
    }

    /// Set the payoff records
    #[must_use]
    pub fn payoffs(mut self, payoffs: Vec<Value>) -> Self {
        self.payoffs = payoffs;
        self
    }

    /// JSON rendering with the service key withheld, for logs
    #[must_use]
    pub fn redacted(&self) -> String {
        let mut copy = self.clone();
        copy.service_key = "<redacted>".to_string();
        serde_json::to_string(&copy).unwrap_or_default()
    }
}

/// Decoded response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceResponse {
    /// Access code records (`GetCodes`)
    #[serde(default, deserialize_with = "null_as_default")]
    pub codes: Vec<AccessCodeRecord>,
    /// Payoff records (`GetPayoffs`)
    #[serde(default, deserialize_with = "null_as_default")]
    pub payoffs: Vec<Value>,
    /// Anything else the service sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
