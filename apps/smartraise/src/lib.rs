//! # smartraise
//!
//! HTTP prediction service, CLI and configuration for SmartRaise.
//!
//! The binary in `main.rs` is a thin wrapper over [`cli::execute`]; the
//! modules live in this library so integration tests can build the router
//! directly.

pub mod api;
pub mod cli;
pub mod config;
