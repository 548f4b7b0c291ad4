//! xwalkify configuration
//!
//! Provides the configuration model for a Crosswalk migration run:
//! - Release channels and their pinned versions
//! - Architecture selection for bundle downloads
//! - Global user configuration (~/.xwalkify/config.toml)
//! - The immutable `ReleaseConfiguration` handed to the pipeline
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults (channel table, download host)
//! 2. Global config (~/.xwalkify/config.toml)
//! 3. Environment variables (XWALKIFY_*, ANDROID_HOME)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use xwalk_config::{ConfigLoader, Overrides};
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load(Path::new("."), Overrides::default()).unwrap();
//! println!("{}", config.channel);
//! ```

pub mod architecture;
pub mod channel;
pub mod global;
pub mod loader;
pub mod release;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Unknown release channel '{0}' (expected one of: stable, beta, canary)")]
    UnknownChannel(String),

    #[error("Unknown architecture '{0}' (expected one of: x86, arm)")]
    UnknownArchitecture(String),

    #[error("Invalid bundle version '{0}': expected dotted numeric form like 10.39.235.15")]
    InvalidVersion(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use architecture::{Architecture, ArchitectureFilter};
pub use channel::ReleaseChannel;
pub use global::GlobalConfig;
pub use loader::{ConfigLoader, Overrides};
pub use release::{ReleaseConfigBuilder, ReleaseConfiguration, DEFAULT_BASE_URL};
