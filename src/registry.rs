//! In-memory registry of access codes
//!
//! Records are keyed by access code. They are created in bulk when codes are
//! fetched or imported, mutated in place afterwards, and never removed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{AccessCodeRecord, CodeResult, is_valid_amount};

/// A registry shared between a facade and its callers
pub type SharedRegistry = Arc<Mutex<CodeRegistry>>;

/// Indexed collection of access-code records
#[derive(Debug, Clone, Default)]
pub struct CodeRegistry {
    codes: BTreeMap<String, AccessCodeRecord>,
}

impl CodeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry ready to be shared
    #[must_use]
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Lock a shared registry
    ///
    /// A poisoned lock is recovered: every mutation leaves the map consistent.
    pub fn lock(registry: &SharedRegistry) -> MutexGuard<'_, Self> {
        registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether no codes have been loaded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// All records, ordered by access code
    pub fn records(&self) -> impl Iterator<Item = &AccessCodeRecord> {
        self.codes.values()
    }

    /// Look up a record
    #[must_use]
    pub fn get(&self, access_code: &str) -> Option<&AccessCodeRecord> {
        if self.codes.is_empty() {
            log::warn!("lookup of {access_code} in an empty code registry");
        }
        self.codes.get(access_code)
    }

    /// Whether a record exists
    #[must_use]
    pub fn exists(&self, access_code: &str) -> bool {
        self.get(access_code).is_some()
    }

    fn record_mut(&mut self, access_code: &str) -> Result<&mut AccessCodeRecord> {
        if self.codes.is_empty() {
            log::warn!("lookup of {access_code} in an empty code registry");
        }
        self.codes
            .get_mut(access_code)
            .ok_or_else(|| Error::NotFound(access_code.to_string()))
    }

    /// Whether the code is marked as used
    pub fn is_used(&self, access_code: &str) -> Result<bool> {
        self.get(access_code)
            .map(|r| r.used)
            .ok_or_else(|| Error::NotFound(access_code.to_string()))
    }

    /// Mark the code as used
    pub fn mark_used(&mut self, access_code: &str) -> Result<&AccessCodeRecord> {
        let record = self.record_mut(access_code)?;
        record.used = true;
        Ok(record)
    }

    /// Mark the code as unused
    pub fn mark_unused(&mut self, access_code: &str) -> Result<&AccessCodeRecord> {
        let record = self.record_mut(access_code)?;
        record.used = false;
        Ok(record)
    }

    /// Mark the code as valid
    pub fn mark_valid(&mut self, access_code: &str) -> Result<&AccessCodeRecord> {
        let record = self.record_mut(access_code)?;
        record.valid = true;
        Ok(record)
    }

    /// Mark the code as invalid
    pub fn mark_invalid(&mut self, access_code: &str) -> Result<&AccessCodeRecord> {
        let record = self.record_mut(access_code)?;
        record.valid = false;
        Ok(record)
    }

    /// Increment the usage counter
    pub fn increment_usage(&mut self, access_code: &str) -> Result<&AccessCodeRecord> {
        let record = self.record_mut(access_code)?;
        record.usage = record.usage.checked_add(1).ok_or_else(|| {
            Error::InvalidState(format!("usage of {access_code} cannot grow further"))
        })?;
        Ok(record)
    }

    /// Decrement the usage counter; it never goes below zero
    pub fn decrement_usage(&mut self, access_code: &str) -> Result<&AccessCodeRecord> {
        let record = self.record_mut(access_code)?;
        if record.usage == 0 {
            return Err(Error::InvalidState(format!(
                "usage cannot be negative. Access code: {access_code}"
            )));
        }
        record.usage -= 1;
        Ok(record)
    }

    /// Merge a JSON field map into a record
    pub fn update(&mut self, access_code: &str, fields: &Value) -> Result<&AccessCodeRecord> {
        let record = self.record_mut(access_code)?;
        record.apply_fields(fields)?;
        Ok(record)
    }

    /// Record the start of a session
    pub fn mark_checked_in(&mut self, access_code: &str) -> Result<&AccessCodeRecord> {
        let record = self.record_mut(access_code)?;
        record.checked_in = true;
        Ok(record)
    }

    /// Record a completed session
    pub fn mark_checked_out(
        &mut self,
        access_code: &str,
        exit_code: &str,
        bonus: f64,
    ) -> Result<&AccessCodeRecord> {
        require_amount(access_code, bonus)?;
        let record = self.record_mut(access_code)?;
        record.checked_out = true;
        record.exit_code = Some(exit_code.to_string());
        record.bonus = bonus;
        Ok(record)
    }

    /// Record an abandoned session
    pub fn mark_dropped_out(
        &mut self,
        access_code: &str,
        exit_code: &str,
        bonus: f64,
    ) -> Result<&AccessCodeRecord> {
        require_amount(access_code, bonus)?;
        let record = self.record_mut(access_code)?;
        record.dropped_out = true;
        record.exit_code = Some(exit_code.to_string());
        record.bonus = bonus;
        Ok(record)
    }

    /// Merge a batch of records; a record replaces any existing one with the same code
    ///
    /// Records with a negative or non-finite bonus are skipped. Returns the number
    /// of records merged.
    pub fn import_batch(&mut self, records: impl IntoIterator<Item = AccessCodeRecord>) -> usize {
        let mut count = 0;
        for record in records {
            if !is_valid_amount(record.bonus) {
                log::warn!(
                    "skipping {}: bonus must be a non-negative number, got {}",
                    record.access_code,
                    record.bonus
                );
                continue;
            }
            self.codes.insert(record.access_code.clone(), record);
            count += 1;
        }
        log::debug!("imported {count} code(s), registry holds {}", self.codes.len());
        count
    }

    /// Results of every ended session that has an exit code
    #[must_use]
    pub fn pending_results(&self) -> Vec<CodeResult> {
        self.codes.values().filter_map(AccessCodeRecord::result).collect()
    }
}

fn require_amount(access_code: &str, bonus: f64) -> Result<()> {
    if is_valid_amount(bonus) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "bonus of {access_code} must be a non-negative number, got {bonus}"
        )))
    }
}
