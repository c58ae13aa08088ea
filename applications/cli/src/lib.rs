//! WaveVault command-line host
//!
//! Loads configuration, wires the library crates together and exposes one
//! function per subcommand. This library exists so the commands can be
//! tested without spawning the binary.

pub mod commands;
pub mod config;
pub mod error;

pub use crate::commands::Outcome;
pub use crate::config::VaultConfig;
pub use crate::error::{CliError, Result};
