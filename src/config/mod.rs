//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    AlertsSection, Config, ConfigError, CycleSection, FundsSection, JupiterSection, LoggingSection,
    RetrySection, SolanaSection, StoreSection, load_config,
};
