//! Configuration loading for the CLI

pub mod loader;

pub use loader::{CadenceConfig, CliConfigLoader};
