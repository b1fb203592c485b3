//! Command line runner for `apibdd` feature files.
//!
//! The binary loads API settings, parses every feature file it is pointed at,
//! runs the scenarios against the signed API and reports a summary.
//!
//! # Configuration
//!
//! - `APIBDD_BASE_URL`, `APIBDD_PUBLIC_KEY`, `APIBDD_PRIVATE_KEY`: override
//!   the settings file
//! - `APIBDD_LOG_LEVEL`: log verbosity (trace, debug, info, warn, error)
//! - `APIBDD_TIMEOUT_SECS`: per-request timeout
//! - `APIBDD_FAIL_ON_SKIPPED`: count skipped scenarios as failures

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
