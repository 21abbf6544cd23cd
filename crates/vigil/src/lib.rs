//! Vigil: data custody for unattended field monitoring nodes.
//!
//! The binary wires together the library crates: `vigil_archive` for
//! classification and migration, `vigil_telemetry` for store-and-forward
//! delivery and instrument queries, `vigil_exec` for external commands, and
//! `vigil_logging` for tracing setup. This crate owns the configuration
//! schema and the file pipeline monitor.

pub mod config;
pub mod monitor;
