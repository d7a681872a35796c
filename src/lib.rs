//! Rebase the timestamps of a captured telemetry sample so it replays as if
//! freshly generated.
//!
//! - `archive` - gzip-tar extraction and expected-member checks
//! - `rebase` - two-pass timestamp discovery and rewrite
//! - `config` - optional YAML configuration
//! - `cli` - pipeline driver and command handlers

pub mod archive;
pub mod cli;
pub mod config;
pub mod rebase;
