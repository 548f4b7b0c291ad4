//! Configuration Loader
//!
//! Merges the channel table, the global config file, environment variables
//! and CLI flags into one [`ReleaseConfiguration`].

use crate::architecture::ArchitectureFilter;
use crate::channel::ReleaseChannel;
use crate::global::GlobalConfig;
use crate::release::{ReleaseConfigBuilder, ReleaseConfiguration};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values supplied on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub channel: Option<String>,
    pub artifact_version: Option<String>,
    pub target: Option<String>,
    pub architecture: Option<String>,
    pub preserve_existing: bool,
    pub force_override: bool,
    pub cache_dir: Option<PathBuf>,
}

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Channel table defaults
/// 2. Global config (~/.xwalkify/config.toml)
/// 3. Environment variables (XWALKIFY_CHANNEL, XWALKIFY_ARCH, XWALKIFY_BASE_URL,
///    XWALKIFY_CACHE_DIR, ANDROID_HOME)
/// 4. CLI flags
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.xwalkify/config.toml
    pub fn with_global_config(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Resolve the configuration for the project at `project_root`
    pub fn load(
        &mut self,
        project_root: &Path,
        overrides: Overrides,
    ) -> ConfigResult<ReleaseConfiguration> {
        let global = self.load_global_config()?;
        let env = EnvSettings::capture();

        let channel = match overrides
            .channel
            .as_deref()
            .or(env.channel.as_deref())
            .or(global.channel())
        {
            Some(name) => name.parse::<ReleaseChannel>()?,
            None => ReleaseChannel::default(),
        };

        let architecture = ArchitectureFilter::from_option(
            overrides
                .architecture
                .as_deref()
                .or(env.architecture.as_deref())
                .or(global.architecture()),
        );

        let mut builder = ReleaseConfigBuilder::new(project_root)
            .channel(channel)
            .architecture(architecture)
            .preserve_existing(overrides.preserve_existing)
            .force_override(overrides.force_override);

        if let Some(version) = overrides.artifact_version {
            builder = builder.artifact_version(version);
        }

        if let Some(target) = overrides.target.or_else(|| global.target().map(String::from)) {
            builder = builder.target_platform_id(target);
        }

        if let Some(url) = env.base_url.or_else(|| global.base_url().map(String::from)) {
            builder = builder.base_url(url);
        }

        let cache_dir = overrides
            .cache_dir
            .or(env.cache_dir)
            .or_else(|| global.cache_dir().map(Path::to_path_buf));
        if let Some(dir) = cache_dir {
            builder = builder.cache_root(resolve_relative(project_root, dir));
        }

        if let Some(sdk) = env
            .android_home
            .or_else(|| global.android_home().map(Path::to_path_buf))
        {
            builder = builder.sdk_root(sdk);
        }

        if let Some(secs) = global.timeout_secs() {
            builder = builder.download_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Load global configuration; a missing file or home directory yields defaults
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            match GlobalConfig::global_config_path() {
                Ok(path) => self.global_config_path = Some(path),
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            }
        }

        let Some(path) = self.global_config_path.as_ref() else {
            return Ok(GlobalConfig::default());
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment overrides, captured once per load
#[derive(Debug, Default)]
struct EnvSettings {
    channel: Option<String>,
    architecture: Option<String>,
    base_url: Option<String>,
    cache_dir: Option<PathBuf>,
    android_home: Option<PathBuf>,
}

impl EnvSettings {
    fn capture() -> Self {
        Self {
            channel: non_empty_var("XWALKIFY_CHANNEL"),
            architecture: non_empty_var("XWALKIFY_ARCH"),
            base_url: non_empty_var("XWALKIFY_BASE_URL"),
            cache_dir: non_empty_var("XWALKIFY_CACHE_DIR").map(PathBuf::from),
            android_home: non_empty_var("ANDROID_HOME").map(PathBuf::from),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn resolve_relative(project_root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}
