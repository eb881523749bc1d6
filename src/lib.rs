//! descil-mturk - Client connector for the Descil access-code service
//!
//! Authenticates MTurk workers for experiment sessions: fetches one-time access
//! codes, keeps them in a local [`CodeRegistry`], and reports check-in, check-out,
//! drop-out and bonus events back to the remote service.

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod client;
pub mod config;
pub mod descil;
pub mod error;
pub mod models;
pub mod output;
pub mod registry;
pub mod source;

pub use client::ServiceClient;
pub use config::ServiceConfig;
pub use descil::{Descil, FetchOutcome};
pub use error::{Error, ErrorKind, Result};
pub use models::{AccessCodeRecord, CodeResult, Operation, ServiceRequest, ServiceResponse};
pub use registry::{CodeRegistry, SharedRegistry};
pub use source::CodeSource;
