//! The Descil facade
//!
//! Ties a [`ServiceClient`] to an injected [`CodeRegistry`]. Session events are
//! mirrored into the registry before the corresponding request is sent, so local
//! state reflects a call as soon as it is made, whatever the network does.
//!
//! Only one `GetCodes` exchange per facade runs at a time. A fetch requested while the
//! registry is already populated returns immediately; a fetch requested while
//! another is in flight waits for that exchange and shares its result.

use std::mem;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::client::{ServiceClient, validate_access_code, validate_session_end};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::models::{AccessCodeRecord, CodeResult, Operation, ServiceResponse};
use crate::registry::{CodeRegistry, SharedRegistry};
use crate::source::CodeSource;

/// Result of a [`Descil::get_codes`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
    /// Whether this call performed the exchange itself
    pub requested: bool,
    /// Records merged by the exchange that satisfied this call
    pub imported: usize,
    /// Records in the registry afterwards
    pub total: usize,
}

type Waiter = oneshot::Sender<Result<FetchOutcome>>;

#[derive(Debug, Default)]
struct FetchState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// Marks a fetch as in flight until finished or dropped
///
/// Dropping it unfinished (the fetching future was cancelled) releases the
/// waiters with an error instead of leaving them pending.
struct InFlight<'a> {
    state: &'a Mutex<FetchState>,
    finished: bool,
}

impl InFlight<'_> {
    fn take_waiters(&self) -> Vec<Waiter> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = false;
        mem::take(&mut state.waiters)
    }

    fn finish(mut self, result: &Result<FetchOutcome>) {
        self.finished = true;
        let waiters = self.take_waiters();
        if !waiters.is_empty() {
            log::debug!("resolving {} queued GetCodes call(s)", waiters.len());
        }
        for waiter in waiters {
            let shared = result.clone().map(|outcome| FetchOutcome {
                requested: false,
                ..outcome
            });
            // A waiter that stopped listening needs no answer
            let _ = waiter.send(shared);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.take_waiters());
        }
    }
}

/// Named operations against one Descil project
#[derive(Debug)]
pub struct Descil {
    config: ServiceConfig,
    client: ServiceClient,
    source: CodeSource,
    registry: SharedRegistry,
    fetch: Mutex<FetchState>,
}

impl Descil {
    /// Create a facade with its own empty registry
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Self::with_registry(config, CodeRegistry::shared())
    }

    /// Create a facade around an existing registry
    ///
    /// `GetCodes` calls are coalesced per facade. Facades sharing a registry see
    /// each other's records but can each fetch while the registry is empty.
    pub fn with_registry(config: ServiceConfig, registry: SharedRegistry) -> Result<Self> {
        let client = ServiceClient::new(&config)?;
        let source = CodeSource::for_config(&config);
        Ok(Self {
            config,
            client,
            source,
            registry,
            fetch: Mutex::new(FetchState::default()),
        })
    }

    /// Load a config file and create a facade for it
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Self::new(ServiceConfig::load(path)?)
    }

    /// The active configuration
    #[must_use]
    pub const fn configuration(&self) -> &ServiceConfig {
        &self.config
    }

    /// The underlying client
    #[must_use]
    pub const fn client(&self) -> &ServiceClient {
        &self.client
    }

    /// Where codes are fetched from
    #[must_use]
    pub const fn source(&self) -> &CodeSource {
        &self.source
    }

    /// A handle on the registry
    #[must_use]
    pub fn registry(&self) -> SharedRegistry {
        SharedRegistry::clone(&self.registry)
    }

    fn codes(&self) -> MutexGuard<'_, CodeRegistry> {
        CodeRegistry::lock(&self.registry)
    }

    /// Snapshot of every record, ordered by access code
    #[must_use]
    pub fn records(&self) -> Vec<AccessCodeRecord> {
        self.codes().records().cloned().collect()
    }

    // === Codes ===

    /// Load the project's codes into the registry
    ///
    /// Resolves immediately when codes are already loaded. If another call is
    /// fetching, waits for it and shares its result. On failure the registry is
    /// left as it was.
    pub async fn get_codes(&self) -> Result<FetchOutcome> {
        let waiting = {
            let mut state = self.fetch.lock().unwrap_or_else(PoisonError::into_inner);
            let total = self.codes().len();
            if total > 0 {
                return Ok(FetchOutcome {
                    requested: false,
                    imported: 0,
                    total,
                });
            }
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiting {
            log::debug!("GetCodes already in flight, waiting for it");
            return rx
                .await
                .unwrap_or_else(|_| Err(Error::transport("GetCodes exchange was abandoned")));
        }

        let in_flight = InFlight {
            state: &self.fetch,
            finished: false,
        };
        let result = self.fetch_and_merge().await;
        in_flight.finish(&result);
        result
    }

    async fn fetch_and_merge(&self) -> Result<FetchOutcome> {
        log::info!("fetching codes from {}", self.source);
        let records = self.source.fetch(&self.client).await?;

        let mut registry = self.codes();
        let imported = registry.import_batch(records);
        log::info!("imported {imported} code(s) from {}", self.source);
        Ok(FetchOutcome {
            requested: true,
            imported,
            total: registry.len(),
        })
    }

    // === Session events ===

    /// Check a worker in
    ///
    /// The record is marked checked in before the request is sent.
    pub async fn check_in(&self, access_code: &str) -> Result<ServiceResponse> {
        validate_access_code(access_code, Operation::CheckIn)?;
        self.codes().mark_checked_in(access_code)?;
        self.client.check_in(access_code).await
    }

    /// Check a worker out with an exit code and bonus
    ///
    /// The record is marked checked out, with exit code and bonus, before the
    /// request is sent.
    pub async fn check_out(
        &self,
        access_code: &str,
        exit_code: &str,
        bonus: f64,
    ) -> Result<ServiceResponse> {
        validate_session_end(access_code, exit_code, bonus, Operation::CheckOut)?;
        self.codes()
            .mark_checked_out(access_code, exit_code, bonus)?;
        self.client.check_out(access_code, exit_code, bonus).await
    }

    /// Mark a worker as dropped out with an exit code and bonus
    pub async fn drop_out(
        &self,
        access_code: &str,
        exit_code: &str,
        bonus: f64,
    ) -> Result<ServiceResponse> {
        validate_session_end(access_code, exit_code, bonus, Operation::DropOut)?;
        self.codes()
            .mark_dropped_out(access_code, exit_code, bonus)?;
        self.client.drop_out(access_code, exit_code, bonus).await
    }

    /// Post a batch of session results
    pub async fn post_codes(&self, codes: &[CodeResult]) -> Result<ServiceResponse> {
        self.client.post_codes(codes).await
    }

    /// Post the results of every ended session in the registry
    pub async fn post_pending(&self) -> Result<ServiceResponse> {
        let results = self.codes().pending_results();
        log::info!("posting {} session result(s)", results.len());
        self.client.post_codes(&results).await
    }

    /// Connectivity check
    pub async fn hello_world(&self) -> Result<ServiceResponse> {
        self.client.hello_world().await
    }

    /// Fetch payoff records
    pub async fn get_payoffs(&self) -> Result<ServiceResponse> {
        self.client.get_payoffs().await
    }

    /// Post payoff records
    pub async fn post_payoffs(&self, payoffs: &[Value]) -> Result<ServiceResponse> {
        self.client.post_payoffs(payoffs).await
    }

    // === Registry ===

    /// Look up a record
    #[must_use]
    pub fn code_exists(&self, access_code: &str) -> Option<AccessCodeRecord> {
        self.codes().get(access_code).cloned()
    }

    /// Whether the code is marked as used
    pub fn is_used(&self, access_code: &str) -> Result<bool> {
        self.codes().is_used(access_code)
    }

    /// Mark the code as used
    pub fn mark_used(&self, access_code: &str) -> Result<AccessCodeRecord> {
        self.codes().mark_used(access_code).cloned()
    }

    /// Mark the code as unused
    pub fn mark_unused(&self, access_code: &str) -> Result<AccessCodeRecord> {
        self.codes().mark_unused(access_code).cloned()
    }

    /// Mark the code as valid
    pub fn mark_valid(&self, access_code: &str) -> Result<AccessCodeRecord> {
        self.codes().mark_valid(access_code).cloned()
    }

    /// Mark the code as invalid
    pub fn mark_invalid(&self, access_code: &str) -> Result<AccessCodeRecord> {
        self.codes().mark_invalid(access_code).cloned()
    }

    /// Increment the usage counter
    pub fn increment_usage(&self, access_code: &str) -> Result<AccessCodeRecord> {
        self.codes().increment_usage(access_code).cloned()
    }

    /// Decrement the usage counter
    pub fn decrement_usage(&self, access_code: &str) -> Result<AccessCodeRecord> {
        self.codes().decrement_usage(access_code).cloned()
    }

    /// Merge a JSON field map into a record
    pub fn update(&self, access_code: &str, fields: &Value) -> Result<AccessCodeRecord> {
        self.codes().update(access_code, fields).cloned()
    }
}
