//! descil - command-line client for the Descil access-code service
//!
//! Fetches access codes and reports worker check-in, check-out and drop-out
//! events for an MTurk experiment project.

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

mod cli;

/// Main entry point for the descil CLI
#[tokio::main]
async fn main() -> std::process::ExitCode {
    cli::run().await
}
