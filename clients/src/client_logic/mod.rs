//! # Client Logic
//!
//! Shared plumbing of the `abacus_client` and `standings_board` binaries:
//! layered configuration, log setup and the console front-end.

pub mod config;
pub mod console;
pub mod logger;
