//! Global Configuration (~/.xwalkify/config.toml)
//!
//! Handles user-level configuration stored in `~/.xwalkify/config.toml`.

use crate::architecture::ArchitectureFilter;
use crate::channel::ReleaseChannel;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.xwalkify/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default selections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Download settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadConfig>,

    /// Android toolchain settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<ToolchainConfig>,
}

/// Default selections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Default release channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Default architecture ("x86" or "arm"; absent means both)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
}

/// Download settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    /// Mirror of the Crosswalk download host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Bundle cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// HTTP timeout per bundle, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Android toolchain settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Android SDK root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_home: Option<PathBuf>,

    /// Android build target (e.g. "android-19")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(defaults) = &self.defaults {
            if let Some(channel) = &defaults.channel {
                channel.parse::<ReleaseChannel>()?;
            }
            if let Some(arch) = &defaults.architecture {
                ArchitectureFilter::from_option(Some(arch)).validate()?;
            }
        }

        if let Some(download) = &self.download {
            if download.timeout_secs == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "download.timeout_secs".to_string(),
                    reason: "timeout must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".xwalkify").join("config.toml"))
    }

    /// Default channel, if configured
    pub fn channel(&self) -> Option<&str> {
        self.defaults.as_ref()?.channel.as_deref()
    }

    /// Default architecture, if configured
    pub fn architecture(&self) -> Option<&str> {
        self.defaults.as_ref()?.architecture.as_deref()
    }

    /// Download host mirror, if configured
    pub fn base_url(&self) -> Option<&str> {
        self.download.as_ref()?.base_url.as_deref()
    }

    /// Bundle cache directory, if configured
    pub fn cache_dir(&self) -> Option<&Path> {
        self.download.as_ref()?.cache_dir.as_deref()
    }

    /// Download timeout, if configured
    pub fn timeout_secs(&self) -> Option<u64> {
        self.download.as_ref()?.timeout_secs
    }

    /// Android SDK root, if configured
    pub fn android_home(&self) -> Option<&Path> {
        self.toolchain.as_ref()?.android_home.as_deref()
    }

    /// Android build target, if configured
    pub fn target(&self) -> Option<&str> {
        self.toolchain.as_ref()?.target.as_deref()
    }
}
