//! routine_call library - typed calls to database functions and procedures
//!
//! Provides call descriptors, the value codec, the call executor with its
//! uniform result envelope, a PostgreSQL backend, the routine catalog, and
//! the command and output infrastructure for the CLI.

pub mod backend;
pub mod call;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error_log;
pub mod logging;
pub mod output;
pub mod session;

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod test_utils;
