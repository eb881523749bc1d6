//! Access code records
//!
//! A record arrives from the service (or a local codes file) as an entry of the
//! `Codes` array and is then annotated locally with session state. Fields the
//! connector does not know about are kept as they came.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{is_valid_amount, null_as_default, null_as_true, serialize_amount};
use crate::error::{Error, Result};

/// Wire name of the access code field
pub const ACCESS_CODE_FIELD: &str = "AccessCode";
/// Wire name of the exit code field
pub const EXIT_CODE_FIELD: &str = "ExitCode";

/// One access code and its local session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCodeRecord {
    /// The access code, unique within a registry
    #[serde(rename = "AccessCode", alias = "accessCode")]
    pub access_code: String,

    /// Exit code paired with the access code, once known
    #[serde(
        rename = "ExitCode",
        alias = "exitCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub exit_code: Option<String>,

    /// Whether the code has been used
    #[serde(default, deserialize_with = "null_as_default")]
    pub used: bool,

    /// How many times the code has been used
    #[serde(default, deserialize_with = "null_as_default")]
    pub usage: u32,

    /// Session started
    #[serde(default, deserialize_with = "null_as_default")]
    pub checked_in: bool,

    /// Session completed
    #[serde(default, deserialize_with = "null_as_default")]
    pub checked_out: bool,

    /// Session abandoned
    #[serde(default, deserialize_with = "null_as_default")]
    pub dropped_out: bool,

    /// Whether the code is still accepted
    #[serde(default = "default_valid", deserialize_with = "null_as_true")]
    pub valid: bool,

    /// Bonus assigned at check-out or drop-out
    #[serde(
        default,
        deserialize_with = "null_as_default",
        serialize_with = "serialize_amount"
    )]
    pub bonus: f64,

    /// Any other fields carried by the source
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const fn default_valid() -> bool {
    true
}

impl AccessCodeRecord {
    /// Create a fresh record for an access code
    #[must_use]
    pub fn new(access_code: impl Into<String>) -> Self {
        Self {
            access_code: access_code.into(),
            exit_code: None,
            used: false,
            usage: 0,
            checked_in: false,
            checked_out: false,
            dropped_out: false,
            valid: true,
            bonus: 0.0,
            extra: Map::new(),
        }
    }

    /// Merge a JSON field map into this record
    ///
    /// Keys use the same names as the serialized record. The access code itself
    /// cannot be changed. On error the record is left untouched.
    pub fn apply_fields(&mut self, fields: &Value) -> Result<()> {
        let Value::Object(fields) = fields else {
            return Err(Error::validation(format!(
                "update for {} must be a JSON object",
                self.access_code
            )));
        };

        let mut merged = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                return Err(Error::validation(format!(
                    "record {} cannot be serialized",
                    self.access_code
                )));
            },
        };

        for (key, value) in fields {
            let key = canonical_key(key);
            if key == ACCESS_CODE_FIELD {
                if value.as_str() != Some(self.access_code.as_str()) {
                    return Err(Error::validation(format!(
                        "the access code of {} cannot be changed",
                        self.access_code
                    )));
                }
                continue;
            }
            merged.insert(key.to_string(), value.clone());
        }

        let updated: Self = serde_json::from_value(Value::Object(merged)).map_err(|e| {
            Error::validation(format!("invalid update for {}: {e}", self.access_code))
        })?;
        if !is_valid_amount(updated.bonus) {
            return Err(Error::validation(format!(
                "bonus of {} must be a non-negative number, got {}",
                self.access_code, updated.bonus
            )));
        }
        *self = updated;
        Ok(())
    }

    /// The session result to post back, if the session has ended with an exit code
    #[must_use]
    pub fn result(&self) -> Option<CodeResult> {
        if !(self.checked_out || self.dropped_out) {
            return None;
        }
        self.exit_code.as_ref().map(|exit_code| CodeResult {
            access_code: self.access_code.clone(),
            exit_code: exit_code.clone(),
            bonus: self.bonus,
        })
    }
}

/// Map accepted spellings onto the serialized field names
fn canonical_key(key: &str) -> &str {
    match key {
        "accessCode" => ACCESS_CODE_FIELD,
        "exitCode" => EXIT_CODE_FIELD,
        other => other,
    }
}

/// The outcome of one session, as posted in a `PostCodes` batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeResult {
    /// Access code of the session
    #[serde(alias = "accessCode")]
    pub access_code: String,
    /// Exit code handed to the worker
    #[serde(alias = "exitCode")]
    pub exit_code: String,
    /// Bonus to pay
    #[serde(default, alias = "bonus", serialize_with = "serialize_amount")]
    pub bonus: f64,
}
