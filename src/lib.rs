//! tgate workspace-level test utilities.
//!
//! This crate exists solely to support workspace-level integration tests,
//! particularly the BDD/cucumber tests in `tests/cucumber.rs`.
//!
//! The actual tgate functionality is in the workspace member crates:
//! - `tgate-types`: Shared types, constants and JSON schemas
//! - `tgate-error`: Error enums
//! - `tgate-ingest`: Benchmark CSV reading
//! - `tgate-domain`: Pure throughput math and threshold policy
//! - `tgate-config`: Config file loading and merging
//! - `tgate-app`: Application use case and renderers
//! - `tgate-cli`: CLI interface (`tgate` binary)
