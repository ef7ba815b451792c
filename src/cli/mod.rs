//! CLI module
//!
//! Command-line interface for talking to the LMS API.
//!
//! # Commands
//!
//! - `login` - Sign in and persist the session credential
//! - `request` - Send an authenticated request
//! - `logout` - Sign out and forget the credential
//! - `config` - Show the effective configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
