//! hargreaves-cli: command-line dealing for Hargreaves Lansdown accounts.
//!
//! Loads credentials and session settings from a TOML file (with environment
//! fallback), drives the site through the `hargreaves` library and keeps a
//! JSONL audit trail of every deal and cancellation.

pub mod audit;
pub mod commands;
pub mod config;
pub mod error;
